use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modules::tile::{Amount, Tile, TileKind};

/// Amount given to `$` tiles when a text map does not spell it out.
pub const DEFAULT_RESOURCE_AMOUNT: Amount = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        self.offset(dx, dy)
    }

    /// Offset that leads from `origin` to `self`.
    pub const fn relative_to(self, origin: Position) -> (i32, i32) {
        (self.x - origin.x, self.y - origin.y)
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn euclidean(self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<_> = s.trim().split(',').collect();
        if parts.len() != 2 {
            return Err("position must be formatted as x,y".into());
        }

        let x = parts[0]
            .trim()
            .parse::<i32>()
            .map_err(|_| "x must be an integer")?;
        let y = parts[1]
            .trim()
            .parse::<i32>()
            .map_err(|_| "y must be an integer")?;

        Ok(Position { x, y })
    }
}

/// One of the four grid moves. Up increases y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    /// Neighbor enumeration order used by the pathfinder.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Right,
        Direction::Left,
    ];

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
        }
    }

    pub const fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, 1) => Some(Direction::Up),
            (0, -1) => Some(Direction::Down),
            (1, 0) => Some(Direction::Right),
            (-1, 0) => Some(Direction::Left),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Right => "right",
            Direction::Left => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            "right" | "r" => Ok(Direction::Right),
            "left" | "l" => Ok(Direction::Left),
            other => Err(format!(
                "unknown direction '{}', use up|down|left|right",
                other
            )),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("map is empty")]
    Empty,
    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown glyph '{glyph}' at {position}")]
    UnknownGlyph { glyph: char, position: Position },
    #[error("tile count {found} does not match {width}x{height}")]
    TileCount {
        width: u32,
        height: u32,
        found: usize,
    },
    #[error("tile at index {index} claims position {found}, expected {expected}")]
    Misplaced {
        index: usize,
        expected: Position,
        found: Position,
    },
}

/// Rectangular snapshot of the map, indexed row-major from (0, 0).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRecord", into = "GridRecord")]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

#[derive(Serialize, Deserialize)]
struct GridRecord {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TryFrom<GridRecord> for Grid {
    type Error = GridError;

    fn try_from(record: GridRecord) -> Result<Self, Self::Error> {
        let expected = record.width as usize * record.height as usize;
        if record.tiles.len() != expected {
            return Err(GridError::TileCount {
                width: record.width,
                height: record.height,
                found: record.tiles.len(),
            });
        }
        let grid = Grid {
            width: record.width,
            height: record.height,
            tiles: record.tiles,
        };
        for (index, tile) in grid.tiles.iter().enumerate() {
            let expected = grid.position_of(index);
            if tile.position != expected {
                return Err(GridError::Misplaced {
                    index,
                    expected,
                    found: tile.position,
                });
            }
        }
        Ok(grid)
    }
}

impl From<Grid> for GridRecord {
    fn from(grid: Grid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            tiles: grid.tiles,
        }
    }
}

impl Grid {
    /// An all-open grid.
    pub fn new(width: u32, height: u32) -> Self {
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                tiles.push(Tile::new(Position::new(x, y), TileKind::Open));
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }

    fn index_of(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        Some(position.y as usize * self.width as usize + position.x as usize)
    }

    fn position_of(&self, index: usize) -> Position {
        let width = self.width.max(1) as usize;
        Position::new((index % width) as i32, (index / width) as i32)
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.index_of(position).map(|idx| &self.tiles[idx])
    }

    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.index_of(position).map(move |idx| &mut self.tiles[idx])
    }

    /// Overwrites the tile kind at `position`; returns false when off-grid.
    pub fn set(&mut self, position: Position, kind: TileKind) -> bool {
        match self.tile_mut(position) {
            Some(tile) => {
                tile.kind = kind;
                tile.resource = 0;
                true
            }
            None => false,
        }
    }

    pub fn set_resource(&mut self, position: Position, amount: Amount) -> bool {
        match self.tile_mut(position) {
            Some(tile) => {
                *tile = Tile::resource(position, amount);
                true
            }
            None => false,
        }
    }

    /// Neighbor of `position` in `direction`; `None` past the border.
    pub fn neighbor(&self, position: Position, direction: Direction) -> Option<&Tile> {
        self.tile(position.step(direction))
    }

    pub fn above(&self, position: Position) -> Option<&Tile> {
        self.neighbor(position, Direction::Up)
    }

    pub fn below(&self, position: Position) -> Option<&Tile> {
        self.neighbor(position, Direction::Down)
    }

    pub fn right_of(&self, position: Position) -> Option<&Tile> {
        self.neighbor(position, Direction::Right)
    }

    pub fn left_of(&self, position: Position) -> Option<&Tile> {
        self.neighbor(position, Direction::Left)
    }

    pub fn neighbors(&self, position: Position) -> impl Iterator<Item = &Tile> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| self.neighbor(position, dir))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Resource tiles that still hold something, in row-major order.
    pub fn resources(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| t.has_resource())
    }

    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| t.kind == kind).count()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(self.width.max(1) as usize) {
            for tile in row {
                let glyph = match tile.kind {
                    TileKind::Resource if (1..=9).contains(&tile.resource) => {
                        char::from_digit(tile.resource, 10).unwrap_or('$')
                    }
                    kind => kind.glyph(),
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A grid plus the markers a map file may carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    pub grid: Grid,
    #[serde(default)]
    pub start: Option<Position>,
    #[serde(default)]
    pub house: Option<Position>,
}

impl MapLayout {
    /// Parses the text form: one line per row, line index is y.
    pub fn parse(text: &str, default_amount: Amount) -> Result<Self, GridError> {
        let mut rows: Vec<&str> = text.lines().map(str::trim_end).collect();
        // Blank lines around the map are ignored; a blank row inside it is ragged.
        while rows.last().is_some_and(|line| line.is_empty()) {
            rows.pop();
        }
        let leading = rows.iter().take_while(|line| line.is_empty()).count();
        rows.drain(..leading);
        let Some(first) = rows.first() else {
            return Err(GridError::Empty);
        };
        let width = first.chars().count();
        if width == 0 {
            return Err(GridError::Empty);
        }

        let mut grid = Grid::new(width as u32, rows.len() as u32);
        let mut start = None;
        let mut house = None;

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(GridError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let position = Position::new(x as i32, y as i32);
                match glyph {
                    '@' => {
                        start = Some(position);
                    }
                    '$' => {
                        grid.set_resource(position, default_amount);
                    }
                    '1'..='9' => {
                        grid.set_resource(position, glyph.to_digit(10).unwrap_or(1));
                    }
                    other => {
                        let kind = TileKind::from_glyph(other)
                            .ok_or(GridError::UnknownGlyph {
                                glyph: other,
                                position,
                            })?;
                        if kind == TileKind::House && house.is_none() {
                            house = Some(position);
                        }
                        grid.set(position, kind);
                    }
                }
            }
        }

        Ok(Self { grid, start, house })
    }

    /// Renders the text form, marking the start with `@` when it sits on open ground.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (y, line) in self.grid.to_string().lines().enumerate() {
            for (x, glyph) in line.chars().enumerate() {
                let here = Position::new(x as i32, y as i32);
                if self.start == Some(here) && glyph == '.' {
                    out.push('@');
                } else {
                    out.push(glyph);
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Loads a map file; `.json` files use serde, anything else the text form.
pub fn load_map(path: &Path, default_amount: Amount) -> io::Result<MapLayout> {
    let bytes = fs::read(path)?;
    let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
    if is_json {
        return serde_json::from_slice(&bytes).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse map {}: {}", path.display(), e),
            )
        });
    }

    let text = String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    MapLayout::parse(&text, default_amount).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed to parse map {}: {}", path.display(), e),
        )
    })
}

pub fn save_map(path: &Path, layout: &MapLayout) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
    if is_json {
        let json = serde_json::to_vec_pretty(layout)?;
        fs::write(path, json)
    } else {
        fs::write(path, layout.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_stop_at_the_border() {
        let grid = Grid::new(3, 3);
        let corner = Position::origin();
        assert!(grid.below(corner).is_none());
        assert!(grid.left_of(corner).is_none());
        assert_eq!(grid.above(corner).map(|t| t.position), Some(Position::new(0, 1)));
        assert_eq!(grid.right_of(corner).map(|t| t.position), Some(Position::new(1, 0)));
        assert_eq!(grid.neighbors(corner).count(), 2);
        assert_eq!(grid.neighbors(Position::new(1, 1)).count(), 4);
    }

    #[test]
    fn up_increases_y() {
        assert_eq!(Position::origin().step(Direction::Up), Position::new(0, 1));
        assert_eq!(Direction::from_offset(0, 1), Some(Direction::Up));
        assert_eq!(Direction::from_offset(1, 1), None);
    }

    #[test]
    fn parses_text_map_with_markers() {
        let text = "#####\n#@.3#\n#H~$#\n#####\n";
        let layout = MapLayout::parse(text, 7).unwrap();

        assert_eq!(layout.grid.width(), 5);
        assert_eq!(layout.grid.height(), 4);
        assert_eq!(layout.start, Some(Position::new(1, 1)));
        assert_eq!(layout.house, Some(Position::new(1, 2)));

        let three = layout.grid.tile(Position::new(3, 1)).unwrap();
        assert_eq!(three.kind, TileKind::Resource);
        assert_eq!(three.resource, 3);
        let dollar = layout.grid.tile(Position::new(3, 2)).unwrap();
        assert_eq!(dollar.resource, 7);
        assert!(layout.grid.tile(Position::new(2, 2)).unwrap().is_lava());
        assert_eq!(layout.grid.tile(Position::new(1, 1)).unwrap().kind, TileKind::Open);
    }

    #[test]
    fn rejects_ragged_rows_and_unknown_glyphs() {
        assert_eq!(
            MapLayout::parse("...\n..\n", 1),
            Err(GridError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert!(matches!(
            MapLayout::parse("..?\n", 1),
            Err(GridError::UnknownGlyph { glyph: '?', .. })
        ));
        assert_eq!(MapLayout::parse("\n\n", 1), Err(GridError::Empty));
    }

    #[test]
    fn blank_row_inside_map_is_ragged() {
        assert_eq!(
            MapLayout::parse("H@.\n\n..3\n", 1),
            Err(GridError::RaggedRow {
                row: 1,
                expected: 3,
                found: 0
            })
        );

        let padded = MapLayout::parse("\n\nH@.\n..3\n\n", 1).unwrap();
        assert_eq!(padded.grid.height(), 2);
        assert_eq!(padded.house, Some(Position::new(0, 0)));
        assert!(padded.grid.tile(Position::new(2, 1)).unwrap().has_resource());
    }

    #[test]
    fn render_matches_parsed_text() {
        let text = "#####\n#@.3#\n#H~.#\n#####\n";
        let layout = MapLayout::parse(text, 1).unwrap();
        assert_eq!(layout.render(), text);
    }

    #[test]
    fn json_rejects_mismatched_tile_count() {
        let json = r#"{"width":2,"height":2,"tiles":[]}"#;
        let err = serde_json::from_str::<Grid>(json).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn map_files_load_in_both_forms() {
        let dir = tempfile::tempdir().unwrap();
        let layout = MapLayout::parse("@.$\n#H.\n", 4).unwrap();

        let text_path = dir.path().join("map.txt");
        save_map(&text_path, &layout).unwrap();
        assert_eq!(load_map(&text_path, 4).unwrap(), layout);

        let json_path = dir.path().join("map.json");
        save_map(&json_path, &layout).unwrap();
        assert_eq!(load_map(&json_path, 99).unwrap(), layout);
    }

    #[test]
    fn resources_skip_depleted_tiles() {
        let mut grid = Grid::new(3, 1);
        grid.set_resource(Position::new(0, 0), 0);
        grid.set_resource(Position::new(2, 0), 5);
        let found: Vec<_> = grid.resources().map(|t| t.position).collect();
        assert_eq!(found, vec![Position::new(2, 0)]);
    }
}
