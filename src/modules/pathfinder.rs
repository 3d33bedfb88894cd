//! Breadth-first route search over the 4-connected grid.
//!
//! Each call builds its own [`NodeTable`] keyed by position. Predecessor links
//! are positions inside that table, so the search tree can be inspected or
//! serialized after the fact and is dropped when the caller is done with it.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use crate::modules::grid::{Direction, Grid, Position};
use crate::modules::tile::Tile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("goal {end} is unreachable from {start}")]
    GoalUnreachable { start: Position, end: Position },
    #[error("position {0} is outside the map")]
    OutOfBounds(Position),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SearchNode {
    pub tile: Tile,
    pub predecessor: Option<Position>,
    pub distance: u32,
    /// Obstacle nodes keep their first predecessor and are never expanded.
    pub frozen: bool,
}

impl SearchNode {
    fn root(tile: Tile) -> Self {
        Self {
            tile,
            predecessor: None,
            distance: 0,
            frozen: false,
        }
    }

    fn discovered(tile: Tile, predecessor: Position, distance: u32) -> Self {
        Self {
            tile,
            predecessor: Some(predecessor),
            distance,
            frozen: tile.kind.is_obstacle(),
        }
    }

    fn relax(&mut self, from: Position, from_distance: u32) -> bool {
        if self.predecessor.is_none() || self.frozen {
            return false;
        }
        let candidate = from_distance + 1;
        if candidate < self.distance {
            self.predecessor = Some(from);
            self.distance = candidate;
            return true;
        }
        false
    }
}

/// Result of a route query: where to step first and how far the goal is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PathStep {
    /// `None` when the start already is the goal.
    pub first_step: Option<Position>,
    pub direction: Option<Direction>,
    /// Distance from the start to the goal, not to the first step.
    pub distance: u32,
}

impl PathStep {
    pub fn arrived(&self) -> bool {
        self.first_step.is_none()
    }

    pub fn adjacent(&self) -> bool {
        self.distance == 1
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "distance={} first_step=", self.distance)?;
        match self.first_step {
            Some(step) => write!(f, "{}", step)?,
            None => write!(f, "-")?,
        }
        match self.direction {
            Some(direction) => write!(f, " direction={}", direction),
            None => write!(f, " direction=-"),
        }
    }
}

/// Search tree produced by one traversal.
#[derive(Debug)]
pub struct NodeTable {
    start: Position,
    nodes: HashMap<Position, SearchNode>,
}

impl NodeTable {
    pub fn start(&self) -> Position {
        self.start
    }

    pub fn node(&self, position: Position) -> Option<&SearchNode> {
        self.nodes.get(&position)
    }

    pub fn distance_to(&self, position: Position) -> Option<u32> {
        self.nodes.get(&position).map(|n| n.distance)
    }

    /// Nodes ordered by position, for stable output.
    pub fn sorted_nodes(&self) -> Vec<&SearchNode> {
        let mut nodes: Vec<_> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.tile.position);
        nodes
    }

    /// Walks predecessor links back from `end` until the hop right after the start.
    pub fn first_step(&self, end: Position) -> Result<PathStep, PathError> {
        if end == self.start {
            return Ok(PathStep {
                first_step: None,
                direction: None,
                distance: 0,
            });
        }

        let unreachable = PathError::GoalUnreachable {
            start: self.start,
            end,
        };
        let goal = self.nodes.get(&end).ok_or(unreachable)?;
        let distance = goal.distance;

        let mut node = goal;
        loop {
            let predecessor = node.predecessor.ok_or(unreachable)?;
            if predecessor == self.start {
                break;
            }
            node = self.nodes.get(&predecessor).ok_or(unreachable)?;
        }

        let step = node.tile.position;
        let (dx, dy) = step.relative_to(self.start);
        Ok(PathStep {
            first_step: Some(step),
            direction: Direction::from_offset(dx, dy),
            distance,
        })
    }

    /// Full route from the start (exclusive) to `end` (inclusive).
    pub fn route(&self, end: Position) -> Result<Vec<Position>, PathError> {
        let unreachable = PathError::GoalUnreachable {
            start: self.start,
            end,
        };
        let mut route = Vec::new();
        let mut current = end;
        while current != self.start {
            let node = self.nodes.get(&current).ok_or(unreachable)?;
            route.push(current);
            current = node.predecessor.ok_or(unreachable)?;
        }
        route.reverse();
        Ok(route)
    }
}

impl Serialize for NodeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NodeTable", 2)?;
        state.serialize_field("start", &self.start)?;
        state.serialize_field("nodes", &self.sorted_nodes())?;
        state.end()
    }
}

/// Builds the search tree rooted at `start`.
pub fn search(grid: &Grid, start: Position) -> Result<NodeTable, PathError> {
    search_in_order(grid, start, Direction::ALL)
}

fn search_in_order(
    grid: &Grid,
    start: Position,
    order: [Direction; 4],
) -> Result<NodeTable, PathError> {
    let root = *grid.tile(start).ok_or(PathError::OutOfBounds(start))?;

    let mut nodes = HashMap::new();
    nodes.insert(start, SearchNode::root(root));
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let current_distance = match nodes.get(&current) {
            Some(node) => node.distance,
            None => continue,
        };

        for direction in order {
            let Some(tile) = grid.neighbor(current, direction) else {
                continue;
            };
            let position = tile.position;
            match nodes.get_mut(&position) {
                Some(node) => {
                    node.relax(current, current_distance);
                }
                None => {
                    let node = SearchNode::discovered(*tile, current, current_distance + 1);
                    if !node.frozen {
                        queue.push_back(position);
                    }
                    nodes.insert(position, node);
                }
            }
        }
    }

    Ok(NodeTable { start, nodes })
}

/// Shortest-route query: first step from `start` toward `end` and the total distance.
pub fn find_path(grid: &Grid, start: Position, end: Position) -> Result<PathStep, PathError> {
    if !grid.contains(end) {
        return Err(PathError::OutOfBounds(end));
    }
    search(grid, start)?.first_step(end)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::modules::grid::MapLayout;
    use crate::modules::tile::TileKind;

    fn random_grid(rng: &mut StdRng, width: u32, height: u32, obstacles: f64) -> Grid {
        let mut grid = Grid::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                if rng.gen_bool(obstacles) {
                    let kind = match rng.gen_range(0..3) {
                        0 => TileKind::Wall,
                        1 => TileKind::Lava,
                        _ => TileKind::House,
                    };
                    grid.set(Position::new(x, y), kind);
                } else if rng.gen_bool(0.1) {
                    grid.set_resource(Position::new(x, y), rng.gen_range(1..20));
                }
            }
        }
        grid
    }

    #[test]
    fn open_grid_straight_line() {
        let grid = Grid::new(5, 5);
        let step = find_path(&grid, Position::new(0, 0), Position::new(0, 4)).unwrap();
        assert_eq!(step.distance, 4);
        assert_eq!(step.first_step, Some(Position::new(0, 1)));
        assert_eq!(step.direction, Some(Direction::Up));
    }

    #[test]
    fn walled_pocket_is_unreachable() {
        let mut grid = Grid::new(4, 4);
        grid.set(Position::new(0, 1), TileKind::Wall);
        grid.set(Position::new(1, 0), TileKind::Wall);

        let err = find_path(&grid, Position::new(0, 0), Position::new(3, 3)).unwrap_err();
        assert_eq!(
            err,
            PathError::GoalUnreachable {
                start: Position::new(0, 0),
                end: Position::new(3, 3)
            }
        );
    }

    #[test]
    fn obstacles_are_reachable_dead_ends() {
        // The wall itself is a valid goal, but nothing behind it is reached through it.
        let layout = MapLayout::parse("@#.\n###\n", 1).unwrap();
        let start = layout.start.unwrap();

        let table = search(&layout.grid, start).unwrap();
        let wall = table.node(Position::new(1, 0)).unwrap();
        assert!(wall.frozen);
        assert_eq!(wall.distance, 1);
        assert!(table.node(Position::new(2, 0)).is_none());

        let step = find_path(&layout.grid, start, Position::new(1, 0)).unwrap();
        assert_eq!(step.distance, 1);
        assert_eq!(step.direction, Some(Direction::Right));
    }

    #[test]
    fn house_goal_is_reached_around_lava() {
        let text = "\
@~H
...
";
        let layout = MapLayout::parse(text, 1).unwrap();
        let start = layout.start.unwrap();
        let house = layout.house.unwrap();

        let step = find_path(&layout.grid, start, house).unwrap();
        assert_eq!(step.distance, 4);
        assert_eq!(step.direction, Some(Direction::Up));
        assert_eq!(
            search(&layout.grid, start).unwrap().route(house).unwrap(),
            vec![
                Position::new(0, 1),
                Position::new(1, 1),
                Position::new(2, 1),
                Position::new(2, 0)
            ]
        );
    }

    #[test]
    fn resources_do_not_block() {
        let layout = MapLayout::parse("@5.\n###\n", 1).unwrap();
        let step = find_path(&layout.grid, Position::new(0, 0), Position::new(2, 0)).unwrap();
        assert_eq!(step.distance, 2);
        assert_eq!(step.first_step, Some(Position::new(1, 0)));
    }

    #[test]
    fn starting_on_an_obstacle_still_expands() {
        let layout = MapLayout::parse("H..\n", 1).unwrap();
        let step = find_path(&layout.grid, Position::new(0, 0), Position::new(2, 0)).unwrap();
        assert_eq!(step.distance, 2);
    }

    #[test]
    fn start_equal_to_end_has_no_step() {
        let grid = Grid::new(3, 3);
        let here = Position::new(1, 1);
        let step = find_path(&grid, here, here).unwrap();
        assert_eq!(step.distance, 0);
        assert!(step.arrived());
        assert_eq!(step.direction, None);
    }

    #[test]
    fn endpoints_off_the_map_are_rejected() {
        let grid = Grid::new(2, 2);
        assert_eq!(
            find_path(&grid, Position::new(-1, 0), Position::new(1, 1)),
            Err(PathError::OutOfBounds(Position::new(-1, 0)))
        );
        assert_eq!(
            find_path(&grid, Position::new(0, 0), Position::new(2, 2)),
            Err(PathError::OutOfBounds(Position::new(2, 2)))
        );
    }

    #[test]
    fn open_grid_distance_is_manhattan() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..40 {
            let width = rng.gen_range(1..12);
            let height = rng.gen_range(1..12);
            let grid = Grid::new(width, height);
            let start = Position::new(rng.gen_range(0..width as i32), rng.gen_range(0..height as i32));
            let table = search(&grid, start).unwrap();
            for tile in grid.tiles() {
                let end = tile.position;
                let step = table.first_step(end).unwrap();
                assert_eq!(step.distance, start.manhattan(end), "{} -> {}", start, end);
                if let Some(first) = step.first_step {
                    assert_eq!(first.manhattan(start), 1);
                    assert_eq!(first.manhattan(end) + 1, step.distance);
                }
            }
        }
    }

    #[test]
    fn distances_do_not_depend_on_neighbor_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let reversed = [Direction::Left, Direction::Right, Direction::Down, Direction::Up];
        for _ in 0..30 {
            let grid = random_grid(&mut rng, 10, 8, 0.25);
            let start = Position::new(rng.gen_range(0..10), rng.gen_range(0..8));
            let a = search(&grid, start).unwrap();
            let b = search_in_order(&grid, start, reversed).unwrap();
            for tile in grid.tiles() {
                assert_eq!(a.distance_to(tile.position), b.distance_to(tile.position));
            }
        }
    }

    #[test]
    fn repeated_queries_agree() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = random_grid(&mut rng, 12, 12, 0.2);
        let start = Position::new(0, 0);
        for tile in grid.tiles() {
            let first = find_path(&grid, start, tile.position);
            let second = find_path(&grid, start, tile.position);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn every_node_is_one_past_its_predecessor() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let grid = random_grid(&mut rng, 9, 9, 0.3);
            let table = search(&grid, Position::new(4, 4)).unwrap();
            for node in table.sorted_nodes() {
                match node.predecessor {
                    None => {
                        assert_eq!(node.tile.position, Position::new(4, 4));
                        assert_eq!(node.distance, 0);
                    }
                    Some(pred) => {
                        let parent = table.node(pred).unwrap();
                        assert_eq!(node.distance, parent.distance + 1);
                        assert!(!parent.frozen || parent.predecessor.is_none());
                    }
                }
            }
        }
    }

    #[test]
    fn frozen_nodes_ignore_shorter_offers() {
        let mut node = SearchNode::discovered(
            Tile::new(Position::new(1, 0), TileKind::Wall),
            Position::new(0, 0),
            5,
        );
        assert!(!node.relax(Position::new(2, 0), 1));
        assert_eq!(node.distance, 5);

        let mut open = SearchNode::discovered(
            Tile::new(Position::new(1, 0), TileKind::Open),
            Position::new(0, 0),
            5,
        );
        assert!(open.relax(Position::new(2, 0), 1));
        assert_eq!(open.distance, 2);
        assert_eq!(open.predecessor, Some(Position::new(2, 0)));
    }

    #[test]
    fn table_serializes_in_position_order() {
        let grid = Grid::new(2, 1);
        let table = search(&grid, Position::new(1, 0)).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["start"]["x"], 1);
        let nodes = json["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["tile"]["position"]["x"], 0);
        assert_eq!(nodes[0]["distance"], 1);
        assert_eq!(nodes[1]["predecessor"], serde_json::Value::Null);
    }

    #[test]
    fn step_display_marks_missing_hop() {
        let grid = Grid::new(3, 1);
        let step = find_path(&grid, Position::new(0, 0), Position::new(2, 0)).unwrap();
        assert_eq!(step.to_string(), "distance=2 first_step=(1, 0) direction=right");

        let here = find_path(&grid, Position::new(1, 0), Position::new(1, 0)).unwrap();
        assert_eq!(here.to_string(), "distance=0 first_step=- direction=-");
    }
}
