use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::modules::action::Action;
use crate::modules::config::state_dir;
use crate::modules::player::PlayerId;
use crate::modules::sim::TurnResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    pub move_count: u64,
    pub collect_count: u64,
    pub melee_count: u64,
    pub idle_count: u64,
    /// Actions the simulation refused.
    #[serde(default)]
    pub rejected_count: u64,
}

impl ActionStats {
    pub fn record(&mut self, action: &Action) {
        match action {
            Action::Move(_) => self.move_count = self.move_count.saturating_add(1),
            Action::Collect(_) => self.collect_count = self.collect_count.saturating_add(1),
            Action::MeleeAttack(_) => self.melee_count = self.melee_count.saturating_add(1),
            Action::Idle => self.idle_count = self.idle_count.saturating_add(1),
        }
    }

    pub fn record_turn(&mut self, result: &TurnResult) {
        if result.rejection.is_some() {
            self.rejected_count = self.rejected_count.saturating_add(1);
        } else {
            self.record(&result.action);
        }
    }

    pub fn total(&self) -> u64 {
        self.move_count
            .saturating_add(self.collect_count)
            .saturating_add(self.melee_count)
            .saturating_add(self.idle_count)
            .saturating_add(self.rejected_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionStatsStore {
    pub per_player: HashMap<PlayerId, ActionStats>,
}

impl ActionStatsStore {
    pub fn record_turn(&mut self, player: PlayerId, result: &TurnResult) {
        self.per_player.entry(player).or_default().record_turn(result);
    }
}

fn stats_path_in(dir: &Path) -> PathBuf {
    dir.join("action_stats.json")
}

pub fn reset_action_stats() -> io::Result<()> {
    save_action_stats(&ActionStatsStore::default())
}

pub fn load_action_stats() -> io::Result<ActionStatsStore> {
    load_action_stats_from(&state_dir())
}

pub fn save_action_stats(store: &ActionStatsStore) -> io::Result<()> {
    save_action_stats_to(&state_dir(), store)
}

pub fn load_action_stats_from(dir: &Path) -> io::Result<ActionStatsStore> {
    let path = stats_path_in(dir);
    if !path.exists() {
        return Ok(ActionStatsStore::default());
    }

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(ActionStatsStore::default());
    }

    let store: ActionStatsStore = serde_json::from_slice(&bytes)?;
    Ok(store)
}

pub fn save_action_stats_to(dir: &Path, store: &ActionStatsStore) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_vec_pretty(store)?;
    fs::write(stats_path_in(dir), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::grid::{Direction, Position};
    use crate::modules::sim::SimError;

    fn turn(action: Action, rejection: Option<SimError>) -> TurnResult {
        TurnResult {
            turn: 1,
            action,
            events: Vec::new(),
            rejection,
        }
    }

    #[test]
    fn counts_by_kind_and_rejections() {
        let mut stats = ActionStats::default();
        stats.record_turn(&turn(Action::Move(Direction::Up), None));
        stats.record_turn(&turn(Action::Move(Direction::Left), None));
        stats.record_turn(&turn(Action::Collect(Direction::Right), None));
        stats.record_turn(&turn(Action::Idle, None));
        stats.record_turn(&turn(
            Action::MeleeAttack(Direction::Down),
            Some(SimError::OffMap(Position::new(0, -1))),
        ));

        assert_eq!(stats.move_count, 2);
        assert_eq!(stats.collect_count, 1);
        assert_eq!(stats.idle_count, 1);
        assert_eq!(stats.melee_count, 0);
        assert_eq!(stats.rejected_count, 1);
        assert_eq!(stats.total(), 5);
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ActionStatsStore::default();
        store.record_turn(1, &turn(Action::Collect(Direction::Up), None));
        save_action_stats_to(dir.path(), &store).unwrap();

        let loaded = load_action_stats_from(dir.path()).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.per_player[&1].collect_count, 1);
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_action_stats_from(dir.path()).unwrap().per_player.is_empty());
    }
}
