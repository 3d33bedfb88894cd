use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::modules::grid::Position;

/// Resource amount held by a tile (or carried by a player).
pub type Amount = u32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    #[default]
    Open,
    Wall,
    Lava,
    House,
    Resource,
}

impl TileKind {
    pub const fn label(self) -> &'static str {
        match self {
            TileKind::Open => "open",
            TileKind::Wall => "wall",
            TileKind::Lava => "lava",
            TileKind::House => "house",
            TileKind::Resource => "resource",
        }
    }

    pub const fn glyph(self) -> char {
        match self {
            TileKind::Open => '.',
            TileKind::Wall => '#',
            TileKind::Lava => '~',
            TileKind::House => 'H',
            TileKind::Resource => '$',
        }
    }

    pub const fn from_glyph(c: char) -> Option<Self> {
        match c {
            '.' => Some(TileKind::Open),
            '#' => Some(TileKind::Wall),
            '~' => Some(TileKind::Lava),
            'H' => Some(TileKind::House),
            '$' => Some(TileKind::Resource),
            _ => None,
        }
    }

    /// Walls, lava and houses can be reached but never routed through.
    pub const fn is_obstacle(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Lava | TileKind::House)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TileKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" | "empty" => Ok(TileKind::Open),
            "wall" => Ok(TileKind::Wall),
            "lava" => Ok(TileKind::Lava),
            "house" | "home" => Ok(TileKind::House),
            "resource" | "mine" => Ok(TileKind::Resource),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub position: Position,
    pub kind: TileKind,
    #[serde(default)]
    pub resource: Amount,
}

impl Tile {
    pub const fn new(position: Position, kind: TileKind) -> Self {
        Self {
            position,
            kind,
            resource: 0,
        }
    }

    pub const fn resource(position: Position, amount: Amount) -> Self {
        Self {
            position,
            kind: TileKind::Resource,
            resource: amount,
        }
    }

    pub fn is_wall(&self) -> bool {
        self.kind == TileKind::Wall
    }

    pub fn is_lava(&self) -> bool {
        self.kind == TileKind::Lava
    }

    pub fn is_house(&self) -> bool {
        self.kind == TileKind::House
    }

    pub fn is_resource(&self) -> bool {
        self.kind == TileKind::Resource
    }

    pub fn has_resource(&self) -> bool {
        self.is_resource() && self.resource > 0
    }
}
