use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use forager::{
    Action, ActionStatsStore, Amount, Bot, BotConfig, DistanceMetric, Event, MapLayout, MapSpec,
    Player, Position, Sim, SimSnapshot, TracingLog, TurnResult, clear_snapshots_in, find_path,
    load_action_stats, load_config, load_map, load_snapshot, mapgen, reset_action_stats,
    save_action_stats, save_snapshot, save_snapshot_turn, search, snapshots_dir,
};

mod config;
mod map;

use config::{ConfigCommand, run_config};
use map::{MapCommand, run_map};

#[derive(Parser)]
#[command(
    name = "forager",
    version,
    about = "Grid resource-gathering bot: pathfinding, turn decisions and a local simulator",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decide a single turn for a player on a map file
    Decide {
        /// Map file (text glyphs or .json)
        map: PathBuf,
        /// Player position as x,y (defaults to the map's @ marker)
        #[arg(short = 'p', long)]
        position: Option<Position>,
        /// House position as x,y (defaults to the map's first H)
        #[arg(long)]
        house: Option<Position>,
        /// Resources already carried
        #[arg(long, default_value_t = 0)]
        carried: Amount,
        /// Carrying capacity (defaults to config)
        #[arg(long)]
        capacity: Option<Amount>,
        /// Metric used to rank resources (defaults to config)
        #[arg(long, value_enum)]
        metric: Option<DistanceMetric>,
        /// Print the full decision as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the pathfinder between two tiles
    Path {
        /// Map file (text glyphs or .json)
        map: PathBuf,
        /// Start as x,y (defaults to the map's @ marker)
        #[arg(long)]
        from: Option<Position>,
        /// Goal as x,y
        #[arg(long)]
        to: Position,
        /// Dump the whole node table as JSON
        #[arg(long)]
        table: bool,
    },
    /// Simulate turns locally with the bot driving the player
    Run {
        /// Map file (omit to generate one)
        #[arg(long)]
        map: Option<PathBuf>,
        /// Seed for the generated map
        #[arg(long)]
        seed: Option<u64>,
        /// Maximum number of turns
        #[arg(short = 't', long, default_value_t = 100)]
        turns: u64,
        /// Delay between turns in milliseconds
        #[arg(short = 'd', long, default_value_t = 0)]
        delay_ms: u64,
        /// Carrying capacity (defaults to config)
        #[arg(long)]
        capacity: Option<Amount>,
        /// Metric used to rank resources (defaults to config)
        #[arg(long, value_enum)]
        metric: Option<DistanceMetric>,
        /// Skip writing snapshots and action stats under .forager/
        #[arg(long = "no-persist", action = ArgAction::SetFalse, default_value_t = true)]
        persist: bool,
    },
    /// Play one more turn on top of the latest saved snapshot
    Step {
        /// Action to apply: move:<dir> | collect:<dir> | melee:<dir> | idle (omit to let the bot decide)
        #[arg(short = 'a', long, value_name = "ACTION")]
        action: Option<Action>,
        /// Metric used to rank resources when the bot decides (defaults to config)
        #[arg(long, value_enum)]
        metric: Option<DistanceMetric>,
    },
    /// Map operations (generate, show)
    Map {
        #[command(subcommand)]
        command: MapCommand,
    },
    /// Persistent settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli.command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Decide {
            map,
            position,
            house,
            carried,
            capacity,
            metric,
            json,
        } => run_decide(&map, position, house, carried, capacity, metric, json),
        Command::Path {
            map,
            from,
            to,
            table,
        } => run_path(&map, from, to, table),
        Command::Run {
            map,
            seed,
            turns,
            delay_ms,
            capacity,
            metric,
            persist,
        } => run_sim(map, seed, turns, delay_ms, capacity, metric, persist),
        Command::Step { action, metric } => run_step(action, metric),
        Command::Map { command } => run_map(command),
        Command::Config { command } => run_config(command),
    }
}

fn load_layout(path: &Path, config: &BotConfig) -> Result<MapLayout, String> {
    load_map(path, config.resource_amount).map_err(|e| format!("{}: {}", path.display(), e))
}

fn run_decide(
    map: &Path,
    position: Option<Position>,
    house: Option<Position>,
    carried: Amount,
    capacity: Option<Amount>,
    metric: Option<DistanceMetric>,
    json: bool,
) -> Result<(), String> {
    let config = load_config().map_err(|e| e.to_string())?;
    let layout = load_layout(map, &config)?;

    let position = position
        .or(layout.start)
        .ok_or("no player position; pass --position or mark the map with @")?;
    let house = house
        .or(layout.house)
        .ok_or("no house; pass --house or add an H to the map")?;
    let capacity = capacity.unwrap_or(config.capacity);
    let player = Player::new(position, house, capacity).with_carried(carried);

    let bot = Bot::with_log(metric.unwrap_or(config.metric), TracingLog);
    match bot.decide(&layout.grid, &player) {
        Ok(decision) if json => {
            let out = serde_json::to_string_pretty(&decision).map_err(|e| e.to_string())?;
            println!("{}", out);
        }
        Ok(decision) => {
            let goal = decision
                .goal
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".into());
            println!(
                "state={} goal={} action={}",
                decision.state, goal, decision.action
            );
            if let Some(path) = decision.path {
                println!("distance={}", path.distance);
            }
        }
        Err(err) => {
            println!("action={} ({})", Action::Idle, err);
        }
    }
    Ok(())
}

fn run_path(map: &Path, from: Option<Position>, to: Position, table: bool) -> Result<(), String> {
    let config = load_config().map_err(|e| e.to_string())?;
    let layout = load_layout(map, &config)?;
    let from = from
        .or(layout.start)
        .ok_or("no start; pass --from or mark the map with @")?;

    if table {
        let nodes = search(&layout.grid, from).map_err(|e| e.to_string())?;
        let out = serde_json::to_string_pretty(&nodes).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    let step = find_path(&layout.grid, from, to).map_err(|e| e.to_string())?;
    println!("{} -> {}: {}", from, to, step);
    Ok(())
}

fn run_sim(
    map: Option<PathBuf>,
    seed: Option<u64>,
    turns: u64,
    delay_ms: u64,
    capacity: Option<Amount>,
    metric: Option<DistanceMetric>,
    persist: bool,
) -> Result<(), String> {
    let config = load_config().map_err(|e| e.to_string())?;
    let layout = match map {
        Some(path) => load_layout(&path, &config)?,
        None => {
            let layout = mapgen::generate(&MapSpec {
                seed,
                resource_amount: config.resource_amount,
                ..MapSpec::default()
            })?;
            println!("Generated map:");
            print!("{}", layout.render());
            layout
        }
    };

    let start = layout
        .start
        .or(layout.house)
        .ok_or("map has neither a start (@) nor a house (H)")?;
    let house = layout.house.ok_or("map has no house (H)")?;
    let player = Player::new(start, house, capacity.unwrap_or(config.capacity));
    let player_id = player.id;

    let mut sim = Sim::new(layout.grid, player, config.collect_per_turn);
    let bot = Bot::with_log(metric.unwrap_or(config.metric), TracingLog);

    if persist {
        reset_action_stats().map_err(|e| format!("reset stats: {}", e))?;
        clear_snapshots_in(&snapshots_dir()).map_err(|e| format!("clear snapshots: {}", e))?;
    }

    let delay = Duration::from_millis(delay_ms);
    let mut stats = ActionStatsStore::default();
    for _ in 0..turns {
        let result = sim.play_turn(&bot);
        print_turn(&result, &sim);
        stats.record_turn(player_id, &result);

        if persist {
            persist_turn(&sim, &result, &stats);
        }

        if sim.is_exhausted() {
            println!("All resources delivered after {} turn(s).", sim.turn());
            break;
        }
        if delay > Duration::ZERO {
            std::thread::sleep(delay);
        }
    }

    let player = sim.player();
    println!(
        "Finished: turns={} score={} carried={}/{} resources_left={}",
        sim.turn(),
        player.score,
        player.carried,
        player.capacity,
        sim.grid().resources().count()
    );
    if persist {
        print_action_summary()?;
    }
    Ok(())
}

fn run_step(action: Option<Action>, metric: Option<DistanceMetric>) -> Result<(), String> {
    let config = load_config().map_err(|e| e.to_string())?;
    let snapshot = load_snapshot()
        .map_err(|e| format!("load snapshot: {}", e))?
        .ok_or("no snapshot found; start one with `forager run`")?;
    println!("Resuming from turn {}", snapshot.turn);

    let mut sim = snapshot.into_sim(config.collect_per_turn);
    let result = match action {
        Some(action) => sim.step(action),
        None => {
            let bot = Bot::with_log(metric.unwrap_or(config.metric), TracingLog);
            sim.play_turn(&bot)
        }
    };
    print_turn(&result, &sim);

    let mut stats = load_action_stats().map_err(|e| e.to_string())?;
    stats.record_turn(sim.player().id, &result);
    persist_turn(&sim, &result, &stats);
    Ok(())
}

fn persist_turn(sim: &Sim, result: &TurnResult, stats: &ActionStatsStore) {
    let snapshot = SimSnapshot::capture(sim, Some(result.action));
    if let Err(err) = save_snapshot(&snapshot) {
        eprintln!("warning: failed to write snapshot: {}", err);
    }
    if let Err(err) = save_snapshot_turn(&snapshot) {
        eprintln!("warning: failed to write turn snapshot: {}", err);
    }
    if let Err(err) = save_action_stats(stats) {
        eprintln!("warning: failed to save action stats: {}", err);
    }
}

fn print_action_summary() -> Result<(), String> {
    let store = load_action_stats().map_err(|e| e.to_string())?;
    if store.per_player.is_empty() {
        println!("No action stats recorded.");
        return Ok(());
    }

    println!("Action summary per player:");
    for (player, stats) in store.per_player.iter() {
        println!(
            " - player {} | move={} collect={} melee={} idle={} rejected={}",
            player,
            stats.move_count,
            stats.collect_count,
            stats.melee_count,
            stats.idle_count,
            stats.rejected_count
        );
    }
    Ok(())
}

fn print_turn(result: &TurnResult, sim: &Sim) {
    let player = sim.player();
    println!(
        "Turn {}: {} | position={} carried={}/{} score={}",
        result.turn,
        result.action,
        player.position,
        player.carried,
        player.capacity,
        player.score
    );
    for event in &result.events {
        if !matches!(event, Event::Moved { .. } | Event::Idled) {
            println!(" - {}", describe_event(event));
        }
    }
    if let Some(err) = &result.rejection {
        println!(" - rejected: {}", err);
    }
}

fn describe_event(event: &Event) -> String {
    match event {
        Event::Moved { from, to } => format!("moved {} -> {}", from, to),
        Event::Collected {
            from,
            amount,
            remaining,
        } => format!("collected {} from {} ({} left)", amount, from, remaining),
        Event::ResourceDepleted { position } => format!("resource at {} depleted", position),
        Event::Deposited { amount, score } => format!("deposited {} (score {})", amount, score),
        Event::WallDestroyed { position } => format!("wall at {} destroyed", position),
        Event::Idled => "idled".into(),
    }
}
