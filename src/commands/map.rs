use std::path::PathBuf;

use clap::Subcommand;
use forager::{Amount, MapSpec, TileKind, load_config, load_map, mapgen, save_map};

#[derive(Subcommand)]
pub enum MapCommand {
    /// Generate a random walled map
    Generate {
        #[arg(long, default_value_t = 16)]
        width: u32,
        #[arg(long, default_value_t = 12)]
        height: u32,
        /// Share of interior tiles turned into walls
        #[arg(long, default_value_t = 0.12)]
        walls: f64,
        /// Share of interior tiles turned into lava
        #[arg(long, default_value_t = 0.04)]
        lava: f64,
        /// Number of resource tiles
        #[arg(long, default_value_t = 6)]
        resources: u32,
        /// Stock per resource tile (defaults to config)
        #[arg(long)]
        amount: Option<Amount>,
        /// Optional RNG seed for reproducible maps
        #[arg(long)]
        seed: Option<u64>,
        /// Write the map here (.json for JSON, anything else for text); prints when omitted
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Print a map file and a tile summary
    Show {
        map: PathBuf,
        /// Print the map as JSON
        #[arg(long)]
        json: bool,
    },
}

pub(super) fn run_map(cmd: MapCommand) -> Result<(), String> {
    let config = load_config().map_err(|e| e.to_string())?;

    match cmd {
        MapCommand::Generate {
            width,
            height,
            walls,
            lava,
            resources,
            amount,
            seed,
            out,
        } => {
            let layout = mapgen::generate(&MapSpec {
                width,
                height,
                walls,
                lava,
                resources,
                resource_amount: amount.unwrap_or(config.resource_amount),
                seed,
            })?;

            match out {
                Some(path) => {
                    save_map(&path, &layout).map_err(|e| e.to_string())?;
                    println!(
                        "Wrote {}x{} map with {} resource(s) to {}",
                        width,
                        height,
                        resources,
                        path.display()
                    );
                }
                None => print!("{}", layout.render()),
            }
        }
        MapCommand::Show { map, json } => {
            let layout = load_map(&map, config.resource_amount)
                .map_err(|e| format!("{}: {}", map.display(), e))?;

            if json {
                let out = serde_json::to_string_pretty(&layout).map_err(|e| e.to_string())?;
                println!("{}", out);
                return Ok(());
            }

            print!("{}", layout.render());
            let grid = &layout.grid;
            println!(
                "{}x{} | walls={} lava={} houses={} resources={}",
                grid.width(),
                grid.height(),
                grid.count(TileKind::Wall),
                grid.count(TileKind::Lava),
                grid.count(TileKind::House),
                grid.count(TileKind::Resource)
            );
            let stock: Amount = grid.resources().map(|t| t.resource).sum();
            println!("total stock={}", stock);
            if let Some(start) = layout.start {
                println!("start={}", start);
            }
            if let Some(house) = layout.house {
                println!("house={}", house);
            }
        }
    }

    Ok(())
}
