//! Minimal local turn engine used to drive the bot without a game server.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::modules::action::Action;
use crate::modules::bot::Bot;
use crate::modules::grid::{Direction, Grid, Position};
use crate::modules::log::DecisionLog;
use crate::modules::player::Player;
use crate::modules::tile::{Amount, TileKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Moved {
        from: Position,
        to: Position,
    },
    Collected {
        from: Position,
        amount: Amount,
        remaining: Amount,
    },
    ResourceDepleted {
        position: Position,
    },
    Deposited {
        amount: Amount,
        score: u64,
    },
    WallDestroyed {
        position: Position,
    },
    Idled,
}

#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
pub enum SimError {
    #[error("target {0} is outside the map")]
    OffMap(Position),
    #[error("cannot move onto {kind} at {target}")]
    Blocked { target: Position, kind: TileKind },
    #[error("nothing to collect at {0}")]
    NothingToCollect(Position),
    #[error("carrying capacity {capacity} already reached")]
    Full { capacity: Amount },
    #[error("cannot attack {kind} at {target}")]
    NotAttackable { target: Position, kind: TileKind },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnResult {
    pub turn: u64,
    pub action: Action,
    pub events: Vec<Event>,
    pub rejection: Option<SimError>,
}

#[derive(Debug)]
pub struct Sim {
    grid: Grid,
    player: Player,
    turn: u64,
    collect_per_turn: Amount,
    events: Vec<Event>,
}

impl Sim {
    pub fn new(grid: Grid, player: Player, collect_per_turn: Amount) -> Self {
        Self {
            grid,
            player,
            turn: 0,
            collect_per_turn: collect_per_turn.max(1),
            events: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn set_turn(&mut self, turn: u64) {
        self.turn = turn;
    }

    /// Every event since the simulation started.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// True once nothing is left to collect or deliver.
    pub fn is_exhausted(&self) -> bool {
        self.player.carried == 0 && self.grid.resources().next().is_none()
    }

    /// Asks the bot for an action and applies it.
    pub fn play_turn<L: DecisionLog>(&mut self, bot: &Bot<L>) -> TurnResult {
        let action = bot.next_action(&self.grid, &self.player);
        self.step(action)
    }

    pub fn step(&mut self, action: Action) -> TurnResult {
        self.turn += 1;
        trace!(turn = self.turn, %action, "applying action");

        let (events, rejection) = match self.apply(action) {
            Ok(events) => (events, None),
            Err(err) => {
                debug!(turn = self.turn, %action, %err, "action rejected");
                (Vec::new(), Some(err))
            }
        };
        self.events.extend(events.iter().cloned());

        TurnResult {
            turn: self.turn,
            action,
            events,
            rejection,
        }
    }

    fn apply(&mut self, action: Action) -> Result<Vec<Event>, SimError> {
        match action {
            Action::Idle => Ok(vec![Event::Idled]),
            Action::Move(direction) => self.apply_move(direction),
            Action::Collect(direction) => self.apply_collect(direction),
            Action::MeleeAttack(direction) => self.apply_melee(direction),
        }
    }

    fn target(&self, direction: Direction) -> Result<(Position, TileKind), SimError> {
        let target = self.player.position.step(direction);
        let tile = self.grid.tile(target).ok_or(SimError::OffMap(target))?;
        Ok((target, tile.kind))
    }

    fn apply_move(&mut self, direction: Direction) -> Result<Vec<Event>, SimError> {
        let (target, kind) = self.target(direction)?;
        // Resources and foreign houses can be stood on; only the player's house deposits.
        if matches!(kind, TileKind::Wall | TileKind::Lava) {
            return Err(SimError::Blocked { target, kind });
        }
        let home = target == self.player.house;

        let from = self.player.position;
        self.player.position = target;
        let mut events = vec![Event::Moved { from, to: target }];

        if home && self.player.carried > 0 {
            let amount = self.player.carried;
            self.player.carried = 0;
            self.player.score = self.player.score.saturating_add(u64::from(amount));
            events.push(Event::Deposited {
                amount,
                score: self.player.score,
            });
        }
        Ok(events)
    }

    fn apply_collect(&mut self, direction: Direction) -> Result<Vec<Event>, SimError> {
        let (target, _) = self.target(direction)?;
        if self.player.is_full() {
            return Err(SimError::Full {
                capacity: self.player.capacity,
            });
        }

        let room = self.player.room();
        let per_turn = self.collect_per_turn;
        let tile = self
            .grid
            .tile_mut(target)
            .filter(|t| t.has_resource())
            .ok_or(SimError::NothingToCollect(target))?;

        let amount = tile.resource.min(room).min(per_turn);
        tile.resource -= amount;
        let remaining = tile.resource;
        self.player.carried += amount;

        let mut events = vec![Event::Collected {
            from: target,
            amount,
            remaining,
        }];
        if remaining == 0 {
            self.grid.set(target, TileKind::Open);
            events.push(Event::ResourceDepleted { position: target });
        }
        Ok(events)
    }

    fn apply_melee(&mut self, direction: Direction) -> Result<Vec<Event>, SimError> {
        let (target, kind) = self.target(direction)?;
        if kind != TileKind::Wall {
            return Err(SimError::NotAttackable { target, kind });
        }
        self.grid.set(target, TileKind::Open);
        Ok(vec![Event::WallDestroyed { position: target }])
    }
}
