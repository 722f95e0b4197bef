use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A hashable triple of universe coordinates, usable as a map key.
///
/// Sectors and everything generated inside them are keyed by `Coordinates`.
/// Equal triples always compare equal and hash equal, so lookups done with a
/// freshly computed neighbor hit the same entry as the original visit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinates {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Coordinates {
    pub const ORIGIN: Coordinates = Coordinates { x: 0, y: 0, z: 0 };

    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The neighboring coordinates one unit along a cardinal direction.
    pub fn adjacent(&self, direction: Direction) -> Coordinates {
        match direction {
            Direction::North => Coordinates::new(self.x, self.y + 1, self.z),
            Direction::South => Coordinates::new(self.x, self.y - 1, self.z),
            Direction::East => Coordinates::new(self.x + 1, self.y, self.z),
            Direction::West => Coordinates::new(self.x - 1, self.y, self.z),
        }
    }

    /// Stable textual form used in sled keys, e.g. `0:0:0`.
    pub fn storage_key(&self) -> String {
        format!("{}:{}:{}", self.x, self.y, self.z)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// Cardinal movement directions exposed on the wire as `n`/`s`/`e`/`w`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// Wire spellings in the order clients see them in `commands.move.direction`.
pub const WIRE_DIRECTIONS: [&str; 4] = ["n", "s", "e", "w"];

impl Direction {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::South => "s",
            Direction::East => "e",
            Direction::West => "w",
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Direction::North),
            "s" | "south" => Ok(Direction::South),
            "e" | "east" => Ok(Direction::East),
            "w" | "west" => Ok(Direction::West),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn equal_triples_hash_equal() {
        let mut map = HashMap::new();
        map.insert(Coordinates::new(1, -2, 3), "sector");
        assert_eq!(map.get(&Coordinates::new(1, -2, 3)), Some(&"sector"));
    }

    #[test]
    fn adjacency_offsets() {
        let origin = Coordinates::ORIGIN;
        assert_eq!(origin.adjacent(Direction::North), Coordinates::new(0, 1, 0));
        assert_eq!(origin.adjacent(Direction::South), Coordinates::new(0, -1, 0));
        assert_eq!(origin.adjacent(Direction::East), Coordinates::new(1, 0, 0));
        assert_eq!(origin.adjacent(Direction::West), Coordinates::new(-1, 0, 0));
    }

    #[test]
    fn north_then_south_round_trips() {
        let start = Coordinates::new(4, 7, 0);
        assert_eq!(
            start.adjacent(Direction::North).adjacent(Direction::South),
            start
        );
    }

    #[test]
    fn direction_parsing_is_case_insensitive() {
        assert_eq!("N".parse::<Direction>(), Ok(Direction::North));
        assert_eq!("south".parse::<Direction>(), Ok(Direction::South));
        assert!("up".parse::<Direction>().is_err());
    }
}
