use std::fmt;

/// Frame-to-frame motion direction of a tracked object, in image axes
/// (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Displacement below the threshold on both axes
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// Classify a centroid displacement.
    ///
    /// An axis counts as moving only when its displacement exceeds
    /// `threshold` in magnitude. Diagonals win when both axes move.
    pub fn from_displacement(dx: f32, dy: f32, threshold: f32) -> Self {
        let right = dx > threshold;
        let left = dx < -threshold;
        let down = dy > threshold;
        let up = dy < -threshold;

        match (left, right, up, down) {
            (true, _, true, _) => Direction::UpLeft,
            (_, true, true, _) => Direction::UpRight,
            (true, _, _, true) => Direction::DownLeft,
            (_, true, _, true) => Direction::DownRight,
            (true, _, _, _) => Direction::Left,
            (_, true, _, _) => Direction::Right,
            (_, _, true, _) => Direction::Up,
            (_, _, _, true) => Direction::Down,
            _ => Direction::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::None => "",
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::UpLeft => "UpLeft",
            Direction::UpRight => "UpRight",
            Direction::DownLeft => "DownLeft",
            Direction::DownRight => "DownRight",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal() {
        assert_eq!(Direction::from_displacement(0.03, 0.03, 0.02), Direction::DownRight);
        assert_eq!(Direction::from_displacement(-0.03, -0.03, 0.02), Direction::UpLeft);
        assert_eq!(Direction::from_displacement(0.03, -0.03, 0.02), Direction::UpRight);
        assert_eq!(Direction::from_displacement(-0.03, 0.03, 0.02), Direction::DownLeft);
    }

    #[test]
    fn test_single_axis() {
        assert_eq!(Direction::from_displacement(0.005, 0.03, 0.02), Direction::Down);
        assert_eq!(Direction::from_displacement(0.005, -0.03, 0.02), Direction::Up);
        assert_eq!(Direction::from_displacement(0.05, 0.0, 0.02), Direction::Right);
        assert_eq!(Direction::from_displacement(-0.05, 0.01, 0.02), Direction::Left);
    }

    #[test]
    fn test_below_threshold() {
        let d = Direction::from_displacement(0.005, 0.005, 0.02);
        assert_eq!(d, Direction::None);
        assert_eq!(d.to_string(), "");
    }
}
