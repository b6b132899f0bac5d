use std::fmt;

use nalgebra::Vector2;

/// Compass label for a vehicle's overall travel between entry and exit.
///
/// The camera is mounted rotated a quarter turn from the display, so image x
/// maps to the compass north/south axis and image y to east/west.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Stationary,
}

impl Heading {
    /// Heading from entry to exit. An axis counts only when its movement
    /// exceeds `threshold` in magnitude.
    pub fn between(entry: Vector2<f32>, exit: Vector2<f32>, threshold: f32) -> Self {
        let dy = exit.x - entry.x;
        let dx = exit.y - entry.y;

        let west = dx < -threshold;
        let east = dx > threshold;
        let north = dy < -threshold;
        let south = dy > threshold;

        match (west, east, north, south) {
            (true, _, true, _) => Heading::NorthWest,
            (_, true, true, _) => Heading::NorthEast,
            (true, _, _, true) => Heading::SouthWest,
            (_, true, _, true) => Heading::SouthEast,
            (true, ..) => Heading::West,
            (_, true, ..) => Heading::East,
            (_, _, true, _) => Heading::North,
            (_, _, _, true) => Heading::South,
            _ => Heading::Stationary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Heading::North => "north",
            Heading::NorthEast => "northeast",
            Heading::East => "east",
            Heading::SouthEast => "southeast",
            Heading::South => "south",
            Heading::SouthWest => "southwest",
            Heading::West => "west",
            Heading::NorthWest => "northwest",
            Heading::Stationary => "stationary",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
