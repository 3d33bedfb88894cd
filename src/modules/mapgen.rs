use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::modules::grid::{Grid, MapLayout, Position};
use crate::modules::tile::{Amount, TileKind};

#[derive(Debug, Clone)]
pub struct MapSpec {
    pub width: u32,
    pub height: u32,
    /// Share of interior tiles turned into walls.
    pub walls: f64,
    /// Share of interior tiles turned into lava.
    pub lava: f64,
    pub resources: u32,
    pub resource_amount: Amount,
    pub seed: Option<u64>,
}

impl Default for MapSpec {
    fn default() -> Self {
        Self {
            width: 16,
            height: 12,
            walls: 0.12,
            lava: 0.04,
            resources: 6,
            resource_amount: 10,
            seed: None,
        }
    }
}

const MIN_SIDE: u32 = 4;
const MAX_SIDE: u32 = 1024;

/// Builds a walled map with a house, a start next to it and scattered resources.
pub fn generate(spec: &MapSpec) -> Result<MapLayout, String> {
    if spec.width < MIN_SIDE || spec.height < MIN_SIDE {
        return Err(format!("map must be at least {}x{}", MIN_SIDE, MIN_SIDE));
    }
    if spec.width > MAX_SIDE || spec.height > MAX_SIDE {
        return Err(format!("map must be at most {}x{}", MAX_SIDE, MAX_SIDE));
    }
    if !(0.0..=1.0).contains(&spec.walls) || !(0.0..=1.0).contains(&spec.lava) {
        return Err("walls and lava must be ratios between 0 and 1".into());
    }
    if spec.walls + spec.lava > 0.8 {
        return Err("walls + lava leave too little open ground (max 0.8)".into());
    }
    if spec.resource_amount == 0 {
        return Err("resource amount must be greater than 0".into());
    }

    let interior = (spec.width - 2).checked_mul(spec.height - 2);
    let needed = spec.resources.checked_add(2);
    let fits = matches!((needed, interior), (Some(needed), Some(interior)) if needed <= interior);
    if !fits {
        return Err(format!(
            "{} resources do not fit in a {}x{} map",
            spec.resources, spec.width, spec.height
        ));
    }

    let mut rng = match spec.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut grid = Grid::new(spec.width, spec.height);
    let max_x = spec.width as i32 - 1;
    let max_y = spec.height as i32 - 1;
    for y in 0..=max_y {
        for x in 0..=max_x {
            if x == 0 || y == 0 || x == max_x || y == max_y {
                grid.set(Position::new(x, y), TileKind::Wall);
            }
        }
    }

    let house = random_interior(spec, &mut rng);
    grid.set(house, TileKind::House);
    let start = [house.offset(1, 0), house.offset(-1, 0), house.offset(0, 1), house.offset(0, -1)]
        .into_iter()
        .find(|p| is_interior(spec, *p))
        .ok_or_else(|| "no room next to the house".to_string())?;

    for y in 1..max_y {
        for x in 1..max_x {
            let position = Position::new(x, y);
            if position == house || position == start {
                continue;
            }
            let roll: f64 = rng.r#gen();
            if roll < spec.walls {
                grid.set(position, TileKind::Wall);
            } else if roll < spec.walls + spec.lava {
                grid.set(position, TileKind::Lava);
            }
        }
    }

    let mut placed = 0;
    while placed < spec.resources {
        let position = random_interior(spec, &mut rng);
        if position == house || position == start {
            continue;
        }
        let occupied = grid
            .tile(position)
            .map(|t| t.kind == TileKind::Resource)
            .unwrap_or(true);
        if occupied {
            continue;
        }
        grid.set_resource(position, spec.resource_amount);
        placed += 1;
    }

    Ok(MapLayout {
        grid,
        start: Some(start),
        house: Some(house),
    })
}

fn is_interior(spec: &MapSpec, position: Position) -> bool {
    position.x > 0
        && position.y > 0
        && position.x < spec.width as i32 - 1
        && position.y < spec.height as i32 - 1
}

fn random_interior(spec: &MapSpec, rng: &mut StdRng) -> Position {
    Position::new(
        rng.gen_range(1..spec.width as i32 - 1),
        rng.gen_range(1..spec.height as i32 - 1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> MapSpec {
        MapSpec {
            seed: Some(seed),
            ..MapSpec::default()
        }
    }

    #[test]
    fn same_seed_same_map() {
        let a = generate(&seeded(5)).unwrap();
        let b = generate(&seeded(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn border_is_walled_and_markers_are_set() {
        let layout = generate(&seeded(9)).unwrap();
        let grid = &layout.grid;
        for tile in grid.tiles() {
            let p = tile.position;
            let border = p.x == 0 || p.y == 0 || p.x == 15 || p.y == 11;
            if border {
                assert!(tile.is_wall(), "{} should be wall", p);
            }
        }
        let house = layout.house.unwrap();
        let start = layout.start.unwrap();
        assert!(grid.tile(house).unwrap().is_house());
        assert_eq!(grid.tile(start).unwrap().kind, TileKind::Open);
        assert_eq!(house.manhattan(start), 1);
        assert_eq!(grid.count(TileKind::Resource), 6);
        assert!(grid.resources().all(|t| t.resource == 10));
    }

    #[test]
    fn rejects_bad_specs() {
        let tiny = MapSpec {
            width: 3,
            ..MapSpec::default()
        };
        assert!(generate(&tiny).is_err());

        let crowded = MapSpec {
            width: 4,
            height: 4,
            resources: 3,
            ..MapSpec::default()
        };
        assert!(generate(&crowded).is_err());

        let solid = MapSpec {
            walls: 0.7,
            lava: 0.2,
            ..MapSpec::default()
        };
        assert!(generate(&solid).is_err());
    }

    #[test]
    fn oversized_inputs_are_errors() {
        let wide = MapSpec {
            width: u32::MAX,
            height: u32::MAX,
            ..MapSpec::default()
        };
        assert!(generate(&wide).is_err());

        let greedy = MapSpec {
            resources: u32::MAX,
            ..MapSpec::default()
        };
        let err = generate(&greedy).unwrap_err();
        assert!(err.contains("do not fit"), "{}", err);
    }
}
