use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::modules::goal::DistanceMetric;
use crate::modules::grid::DEFAULT_RESOURCE_AMOUNT;
use crate::modules::tile::Amount;

fn default_capacity() -> Amount {
    10
}

fn default_resource_amount() -> Amount {
    DEFAULT_RESOURCE_AMOUNT
}

fn default_collect_per_turn() -> Amount {
    1
}

/// Settings shared by every command. Flags override them per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub metric: DistanceMetric,
    /// Carrying capacity used when a command does not specify one.
    #[serde(default = "default_capacity")]
    pub capacity: Amount,
    /// Amount given to `$` tiles in text maps.
    #[serde(default = "default_resource_amount")]
    pub resource_amount: Amount,
    /// How much one collect action transfers in the local simulation.
    #[serde(default = "default_collect_per_turn")]
    pub collect_per_turn: Amount,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::default(),
            capacity: default_capacity(),
            resource_amount: default_resource_amount(),
            collect_per_turn: default_collect_per_turn(),
        }
    }
}

impl BotConfig {
    /// Applies a `key=value` style update; returns the key that changed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<&'static str, String> {
        match key.trim().to_lowercase().replace('-', "_").as_str() {
            "metric" => {
                self.metric = value.parse()?;
                Ok("metric")
            }
            "capacity" => {
                self.capacity = parse_amount(value, "capacity")?;
                Ok("capacity")
            }
            "resource_amount" => {
                self.resource_amount = parse_amount(value, "resource_amount")?;
                Ok("resource_amount")
            }
            "collect_per_turn" => {
                let amount = parse_amount(value, "collect_per_turn")?;
                if amount == 0 {
                    return Err("collect_per_turn must be greater than 0".into());
                }
                self.collect_per_turn = amount;
                Ok("collect_per_turn")
            }
            other => Err(format!(
                "unknown config key '{}'; use metric|capacity|resource_amount|collect_per_turn",
                other
            )),
        }
    }
}

fn parse_amount(value: &str, key: &str) -> Result<Amount, String> {
    value
        .trim()
        .parse::<Amount>()
        .map_err(|_| format!("{} must be a non-negative integer", key))
}

pub fn state_dir() -> PathBuf {
    PathBuf::from(".forager")
}

pub fn config_file_path() -> PathBuf {
    config_path_in(&state_dir())
}

fn config_path_in(dir: &Path) -> PathBuf {
    dir.join("config.json")
}

pub fn load_config() -> io::Result<BotConfig> {
    load_config_from(&state_dir())
}

pub fn save_config(config: &BotConfig) -> io::Result<()> {
    save_config_to(&state_dir(), config)
}

pub fn load_config_from(dir: &Path) -> io::Result<BotConfig> {
    let path = config_path_in(dir);
    if !path.exists() {
        return Ok(BotConfig::default());
    }

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(BotConfig::default());
    }

    let config: BotConfig = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse config {}; delete it or run `forager config reset`: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(config)
}

pub fn save_config_to(dir: &Path, config: &BotConfig) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_vec_pretty(config)?;
    fs::write(config_path_in(dir), json)?;
    Ok(())
}
