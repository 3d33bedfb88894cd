pub mod modules;

pub use modules::action::Action;
pub use modules::bot::{Bot, Decision, DecisionError, TurnState};
pub use modules::config::{
    self, BotConfig, config_file_path, load_config, save_config, state_dir,
};
pub use modules::goal::{DistanceMetric, select_goal};
pub use modules::grid::{
    DEFAULT_RESOURCE_AMOUNT, Direction, Grid, GridError, MapLayout, Position, load_map, save_map,
};
pub use modules::log::{DecisionLog, NoopLog, TracingLog};
pub use modules::mapgen::{self, MapSpec};
pub use modules::pathfinder::{
    NodeTable, PathError, PathStep, SearchNode, find_path, search,
};
pub use modules::player::{Player, PlayerId};
pub use modules::sim::{Event, Sim, SimError, TurnResult};
pub use modules::stats::{
    ActionStats, ActionStatsStore, load_action_stats, reset_action_stats, save_action_stats,
};
pub use modules::tile::{Amount, Tile, TileKind};
pub use modules::view::{
    SimSnapshot, clear_snapshots_in, load_snapshot, load_snapshot_from, save_snapshot,
    save_snapshot_turn, snapshot_file_path, snapshots_dir,
};
