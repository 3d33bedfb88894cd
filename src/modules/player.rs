use serde::{Deserialize, Serialize};

use crate::modules::grid::Position;
use crate::modules::tile::Amount;

pub type PlayerId = u64;

/// The agent as the engine reports it at the start of a turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub id: PlayerId,
    pub position: Position,
    pub house: Position,
    #[serde(default)]
    pub carried: Amount,
    pub capacity: Amount,
    #[serde(default)]
    pub score: u64,
}

impl Player {
    pub fn new(position: Position, house: Position, capacity: Amount) -> Self {
        Self {
            id: 1,
            position,
            house,
            carried: 0,
            capacity,
            score: 0,
        }
    }

    pub fn with_carried(mut self, carried: Amount) -> Self {
        self.carried = carried;
        self
    }

    pub fn is_full(&self) -> bool {
        self.carried >= self.capacity
    }

    pub fn room(&self) -> Amount {
        self.capacity.saturating_sub(self.carried)
    }

    pub fn at_home(&self) -> bool {
        self.position == self.house
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_when_carrying_capacity() {
        let player = Player::new(Position::origin(), Position::new(3, 3), 5);
        assert!(!player.is_full());
        assert_eq!(player.room(), 5);

        let loaded = player.with_carried(5);
        assert!(loaded.is_full());
        assert_eq!(loaded.room(), 0);
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{"position":{"x":1,"y":2},"house":{"x":0,"y":0},"capacity":10}"#;
        let player: Player = serde_json::from_str(json).unwrap();
        assert_eq!(player.carried, 0);
        assert_eq!(player.position, Position::new(1, 2));
        assert!(!player.at_home());
    }
}
