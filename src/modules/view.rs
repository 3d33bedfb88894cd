use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::modules::action::Action;
use crate::modules::config::state_dir;
use crate::modules::grid::Grid;
use crate::modules::player::Player;
use crate::modules::sim::Sim;
use crate::modules::tile::Amount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub turn: u64,
    pub recorded_at: String,
    pub player: Player,
    pub grid: Grid,
    #[serde(default)]
    pub last_action: Option<Action>,
}

impl SimSnapshot {
    pub fn capture(sim: &Sim, last_action: Option<Action>) -> Self {
        Self {
            turn: sim.turn(),
            recorded_at: Utc::now().to_rfc3339(),
            player: sim.player().clone(),
            grid: sim.grid().clone(),
            last_action,
        }
    }

    /// Rebuilds a simulation that continues from this snapshot's turn.
    pub fn into_sim(self, collect_per_turn: Amount) -> Sim {
        let mut sim = Sim::new(self.grid, self.player, collect_per_turn);
        sim.set_turn(self.turn);
        sim
    }
}

pub fn snapshot_file_path() -> PathBuf {
    state_dir().join("snapshot.json")
}

pub fn snapshots_dir() -> PathBuf {
    state_dir().join("snapshots")
}

pub fn save_snapshot(snapshot: &SimSnapshot) -> io::Result<PathBuf> {
    let path = snapshot_file_path();
    write_json(&path, snapshot)?;
    Ok(path)
}

pub fn save_snapshot_turn(snapshot: &SimSnapshot) -> io::Result<PathBuf> {
    save_snapshot_turn_in(&snapshots_dir(), snapshot)
}

pub fn save_snapshot_turn_in(dir: &Path, snapshot: &SimSnapshot) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("turn_{:06}.json", snapshot.turn));
    write_json(&path, snapshot)?;
    Ok(path)
}

fn write_json(path: &Path, snapshot: &SimSnapshot) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(snapshot)?;
    fs::write(path, json)
}

pub fn load_snapshot() -> io::Result<Option<SimSnapshot>> {
    load_snapshot_from(&state_dir())
}

/// Reads `snapshot.json` in `dir`, falling back to the newest per-turn file.
pub fn load_snapshot_from(dir: &Path) -> io::Result<Option<SimSnapshot>> {
    let path = dir.join("snapshot.json");
    let turns = dir.join("snapshots");
    if !path.exists() {
        return load_latest_snapshot_from(&turns);
    }
    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return load_latest_snapshot_from(&turns);
    }
    let snapshot = serde_json::from_slice(&bytes)?;
    Ok(Some(snapshot))
}

/// Newest `turn_*.json` in `dir`; file names sort by turn.
pub fn load_latest_snapshot_from(dir: &Path) -> io::Result<Option<SimSnapshot>> {
    let mut latest: Option<PathBuf> = None;
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                match &latest {
                    Some(current) if path <= *current => {}
                    _ => latest = Some(path),
                }
            }
        }
    }

    let Some(path) = latest else {
        return Ok(None);
    };

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let snapshot = serde_json::from_slice(&bytes)?;
    Ok(Some(snapshot))
}

/// Removes per-turn snapshots left by an earlier run.
pub fn clear_snapshots_in(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
