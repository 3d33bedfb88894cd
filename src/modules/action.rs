use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::modules::grid::Direction;

/// What the bot asks the engine to do this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "direction", rename_all = "lowercase")]
pub enum Action {
    Move(Direction),
    Collect(Direction),
    MeleeAttack(Direction),
    /// Stay in place. Used when nothing else is legal.
    Idle,
}

impl Action {
    pub const fn label(&self) -> &'static str {
        match self {
            Action::Move(_) => "move",
            Action::Collect(_) => "collect",
            Action::MeleeAttack(_) => "melee",
            Action::Idle => "idle",
        }
    }

    pub const fn direction(&self) -> Option<Direction> {
        match *self {
            Action::Move(dir) | Action::Collect(dir) | Action::MeleeAttack(dir) => Some(dir),
            Action::Idle => None,
        }
    }

    /// Offset vector handed to the engine.
    pub const fn offset(&self) -> (i32, i32) {
        match self.direction() {
            Some(dir) => dir.offset(),
            None => (0, 0),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (dx, dy) = self.offset();
        match self {
            Action::Idle => write!(f, "idle"),
            _ => write!(f, "{}({},{})", self.label(), dx, dy),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let (verb, rest) = match trimmed.split_once(':') {
            Some((verb, rest)) => (verb.to_lowercase(), Some(rest)),
            None => (trimmed.to_lowercase(), None),
        };

        if verb == "idle" {
            return Ok(Action::Idle);
        }

        let direction = rest
            .ok_or_else(|| format!("{} requires a direction e.g. {}:up", verb, verb))?
            .parse::<Direction>()?;

        match verb.as_str() {
            "move" => Ok(Action::Move(direction)),
            "collect" => Ok(Action::Collect(direction)),
            "melee" | "attack" => Ok(Action::MeleeAttack(direction)),
            _ => Err(format!(
                "Unknown action '{}'. Use move:<dir> | collect:<dir> | melee:<dir> | idle",
                verb
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_offsets() {
        assert_eq!(Action::Move(Direction::Up).to_string(), "move(0,1)");
        assert_eq!(Action::MeleeAttack(Direction::Right).to_string(), "melee(1,0)");
        assert_eq!(Action::Idle.to_string(), "idle");
    }

    #[test]
    fn parses_verbs() {
        assert_eq!("move:left".parse::<Action>(), Ok(Action::Move(Direction::Left)));
        assert_eq!("Collect: down".parse::<Action>(), Ok(Action::Collect(Direction::Down)));
        assert_eq!("attack:r".parse::<Action>(), Ok(Action::MeleeAttack(Direction::Right)));
        assert_eq!("idle".parse::<Action>(), Ok(Action::Idle));
        assert!("move".parse::<Action>().is_err());
        assert!("jump:up".parse::<Action>().is_err());
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_string(&Action::Collect(Direction::Left)).unwrap();
        assert_eq!(json, r#"{"action":"collect","direction":"left"}"#);
        let idle = serde_json::to_string(&Action::Idle).unwrap();
        assert_eq!(idle, r#"{"action":"idle"}"#);
    }
}
