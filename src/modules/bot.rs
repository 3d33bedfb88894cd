use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::modules::action::Action;
use crate::modules::config::BotConfig;
use crate::modules::goal::{DistanceMetric, select_goal};
use crate::modules::grid::{Direction, Grid, Position};
use crate::modules::log::{DecisionLog, NoopLog};
use crate::modules::pathfinder::{PathError, PathStep, find_path};
use crate::modules::player::Player;

/// Which branch of the turn logic produced the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    SeekResource,
    ReturnHome,
    BlockedFallback,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::SeekResource => write!(f, "seek_resource"),
            TurnState::ReturnHome => write!(f, "return_home"),
            TurnState::BlockedFallback => write!(f, "blocked_fallback"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("no legal action from {position}: {reason}")]
    NoLegalAction {
        position: Position,
        reason: &'static str,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub state: TurnState,
    pub action: Action,
    pub goal: Option<Position>,
    pub path: Option<PathStep>,
}

/// Per-turn decision routine. Holds no state between turns.
pub struct Bot<L: DecisionLog = NoopLog> {
    metric: DistanceMetric,
    log: L,
}

impl Bot<NoopLog> {
    pub fn new() -> Self {
        Self {
            metric: DistanceMetric::default(),
            log: NoopLog,
        }
    }
}

impl Default for Bot<NoopLog> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: DecisionLog> Bot<L> {
    pub fn with_log(metric: DistanceMetric, log: L) -> Self {
        Self { metric, log }
    }

    pub fn from_config(config: &BotConfig, log: L) -> Self {
        Self::with_log(config.metric, log)
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Engine-facing entry point. Never fails: when nothing is legal the bot stays put.
    pub fn next_action(&self, grid: &Grid, player: &Player) -> Action {
        match self.decide(grid, player) {
            Ok(decision) => decision.action,
            Err(err) => {
                self.log.idle(&err);
                Action::Idle
            }
        }
    }

    pub fn decide(&self, grid: &Grid, player: &Player) -> Result<Decision, DecisionError> {
        let (state, goal) = if player.is_full() {
            (TurnState::ReturnHome, player.house)
        } else {
            let resource = select_goal(grid.resources(), player.house, self.metric, &self.log);
            match resource {
                Some(tile) => (TurnState::SeekResource, tile.position),
                None => {
                    self.log.fallback("no resources visible");
                    return self.fallback(grid, player);
                }
            }
        };
        self.log.target(goal, state == TurnState::ReturnHome);

        let step = match find_path(grid, player.position, goal) {
            Ok(step) => step,
            Err(err @ PathError::GoalUnreachable { .. }) => {
                self.log.unreachable(&err);
                return self.fallback(grid, player);
            }
            Err(err) => return Err(err.into()),
        };
        self.log.route(player.position, goal, &step);

        let action = match step.direction {
            None => Action::Idle,
            Some(direction) if step.adjacent() && state != TurnState::ReturnHome => {
                Action::Collect(direction)
            }
            Some(direction) => Action::Move(direction),
        };
        self.log.chosen(&action);

        Ok(Decision {
            state,
            action,
            goal: Some(goal),
            path: Some(step),
        })
    }

    /// Probe to the right: break a wall, otherwise walk, unless that means the edge or lava.
    fn fallback(&self, grid: &Grid, player: &Player) -> Result<Decision, DecisionError> {
        let action = match grid.right_of(player.position) {
            Some(tile) if tile.is_wall() => Action::MeleeAttack(Direction::Right),
            Some(tile) if !tile.is_lava() => Action::Move(Direction::Right),
            Some(_) => {
                return Err(DecisionError::NoLegalAction {
                    position: player.position,
                    reason: "lava to the right",
                });
            }
            None => {
                return Err(DecisionError::NoLegalAction {
                    position: player.position,
                    reason: "map edge to the right",
                });
            }
        };
        self.log.chosen(&action);

        Ok(Decision {
            state: TurnState::BlockedFallback,
            action,
            goal: None,
            path: None,
        })
    }
}
