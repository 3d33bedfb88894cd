use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::modules::grid::Position;
use crate::modules::log::DecisionLog;
use crate::modules::tile::Tile;

/// Straight-line metric used to rank resources by how close they are to home.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Manhattan,
    Euclidean,
}

impl DistanceMetric {
    pub fn measure(self, a: Position, b: Position) -> f64 {
        match self {
            DistanceMetric::Manhattan => f64::from(a.manhattan(b)),
            DistanceMetric::Euclidean => a.euclidean(b),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DistanceMetric::Manhattan => "manhattan",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manhattan" | "taxicab" => Ok(DistanceMetric::Manhattan),
            "euclidean" | "straight" => Ok(DistanceMetric::Euclidean),
            other => Err(format!(
                "unknown metric '{}', use manhattan|euclidean",
                other
            )),
        }
    }
}

/// Picks the resource closest to `home`, ignoring where the agent stands.
///
/// Ties keep the first tile in enumeration order. Does not run the pathfinder.
pub fn select_goal<'a>(
    resources: impl IntoIterator<Item = &'a Tile>,
    home: Position,
    metric: DistanceMetric,
    log: &dyn DecisionLog,
) -> Option<&'a Tile> {
    let mut best: Option<(f64, &'a Tile)> = None;
    for tile in resources {
        let dist = metric.measure(tile.position, home);
        log.candidate(tile.position, dist);
        match &mut best {
            Some((best_dist, best_tile)) => {
                if dist < *best_dist {
                    *best_dist = dist;
                    *best_tile = tile;
                }
            }
            None => best = Some((dist, tile)),
        }
    }
    best.map(|(_, tile)| tile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::log::NoopLog;
    use crate::modules::log::recording::RecordingLog;

    fn resource(x: i32, y: i32) -> Tile {
        Tile::resource(Position::new(x, y), 5)
    }

    #[test]
    fn empty_set_has_no_target() {
        let none: Vec<Tile> = Vec::new();
        assert!(select_goal(&none, Position::origin(), DistanceMetric::Manhattan, &NoopLog).is_none());
    }

    #[test]
    fn closest_to_home_wins_not_closest_to_agent() {
        let tiles = vec![resource(1, 0), resource(8, 8), resource(9, 9)];
        let home = Position::new(10, 10);
        let found = select_goal(&tiles, home, DistanceMetric::Manhattan, &NoopLog).unwrap();
        assert_eq!(found.position, Position::new(9, 9));
    }

    #[test]
    fn ties_keep_first_encountered() {
        let tiles = vec![resource(2, 0), resource(0, 2), resource(1, 1)];
        let found =
            select_goal(&tiles, Position::origin(), DistanceMetric::Manhattan, &NoopLog).unwrap();
        assert_eq!(found.position, Position::new(2, 0));
    }

    #[test]
    fn metric_changes_the_winner() {
        // (3,3) is 6 away by taxicab and ~4.24 in a straight line; (5,0) is 5 either way.
        let tiles = vec![resource(3, 3), resource(5, 0)];
        let home = Position::origin();
        let manhattan = select_goal(&tiles, home, DistanceMetric::Manhattan, &NoopLog).unwrap();
        let euclidean = select_goal(&tiles, home, DistanceMetric::Euclidean, &NoopLog).unwrap();
        assert_eq!(manhattan.position, Position::new(5, 0));
        assert_eq!(euclidean.position, Position::new(3, 3));
    }

    #[test]
    fn logs_one_line_per_candidate() {
        let tiles = vec![resource(1, 0), resource(0, 3)];
        let log = RecordingLog::default();
        select_goal(&tiles, Position::origin(), DistanceMetric::Manhattan, &log);
        assert_eq!(
            *log.lines.borrow(),
            vec!["candidate (1, 0) 1", "candidate (0, 3) 3"]
        );
    }
}
