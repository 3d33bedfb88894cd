use clap::Subcommand;
use forager::{BotConfig, config_file_path, load_config, save_config};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Change one setting: metric | capacity | resource_amount | collect_per_turn
    Set { key: String, value: String },
    /// Restore the defaults
    Reset,
}

pub(super) fn run_config(cmd: ConfigCommand) -> Result<(), String> {
    match cmd {
        ConfigCommand::Show => {
            let config = load_config().map_err(|e| e.to_string())?;
            let out = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
            println!("{}", out);
            println!("(from {})", config_file_path().display());
        }
        ConfigCommand::Set { key, value } => {
            let mut config = load_config().map_err(|e| e.to_string())?;
            let changed = config.set(&key, &value)?;
            save_config(&config).map_err(|e| e.to_string())?;
            println!("Set {} = {}", changed, value.trim());
        }
        ConfigCommand::Reset => {
            save_config(&BotConfig::default()).map_err(|e| e.to_string())?;
            println!("Reset config at {}", config_file_path().display());
        }
    }
    Ok(())
}
