//! Single object track for centroid tracking.

use nalgebra::Vector2;

use crate::tracker::detection::Detection;
use crate::tracker::direction::Direction;
use crate::tracker::track_state::TrackState;

/// Single object track.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    /// Unique track identifier for the tracker's lifetime
    pub track_id: u64,
    /// 1-based sequence within `current.class_name`
    pub sequence: u32,
    /// Current centroid
    pub centroid: Vector2<f32>,
    /// Most recent detection (shifted when extrapolating)
    pub current: Detection,
    /// Direction of the last matched displacement
    pub direction: Direction,
    /// Centroid before the last match
    pub last_centroid: Option<Vector2<f32>>,
    /// Exponentially smoothed per-frame displacement
    pub velocity: Vector2<f32>,
    /// Consecutive frames without a match
    pub disappeared: u32,
    /// Whether the last update matched a detection
    pub state: TrackState,
}

impl TrackedObject {
    /// Register a new track from a detection.
    pub fn new(track_id: u64, sequence: u32, detection: Detection) -> Self {
        let (cx, cy) = detection.center();
        Self {
            track_id,
            sequence,
            centroid: Vector2::new(cx, cy),
            current: detection,
            direction: Direction::None,
            last_centroid: None,
            velocity: Vector2::zeros(),
            disappeared: 0,
            state: TrackState::Tracked,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.current.class_name
    }

    /// Apply a matched detection.
    ///
    /// `smoothing` weighs the new displacement against the previous velocity.
    pub fn update(&mut self, detection: Detection, smoothing: f32, direction_threshold: f32) {
        let (cx, cy) = detection.center();
        let new_centroid = Vector2::new(cx, cy);
        let displacement = new_centroid - self.centroid;

        self.last_centroid = Some(self.centroid);
        self.centroid = new_centroid;
        self.velocity = displacement * smoothing + self.velocity * (1.0 - smoothing);
        self.direction =
            Direction::from_displacement(displacement.x, displacement.y, direction_threshold);
        self.current = detection;
        self.disappeared = 0;
        self.state = TrackState::Tracked;
    }

    /// Flag the track as unseen this frame without aging it.
    pub fn mark_unmatched(&mut self) {
        self.state = TrackState::Missing;
    }

    /// Record a frame without a match. Returns the new disappeared count.
    pub fn mark_missed(&mut self, extrapolate: bool) -> u32 {
        self.disappeared += 1;
        self.state = TrackState::Missing;

        if extrapolate {
            self.centroid += self.velocity;
            self.current.bbox = self.current.bbox.translated(self.velocity.x, self.velocity.y);
        }

        self.disappeared
    }

    /// Snapshot of the track for callers.
    pub fn to_box(&self) -> TrackedBox {
        TrackedBox {
            track_id: self.track_id,
            class_name: self.current.class_name.clone(),
            sequence: self.sequence,
            direction: self.direction,
            state: self.state,
            detection: self.current.clone(),
        }
    }
}

/// A tracker output box carrying structured identity.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedBox {
    pub track_id: u64,
    pub class_name: String,
    pub sequence: u32,
    pub direction: Direction,
    pub state: TrackState,
    pub detection: Detection,
}

impl TrackedBox {
    /// Display label: `"{class} #{sequence}\n{direction}"`.
    pub fn label(&self) -> String {
        format!("{} #{}\n{}", self.class_name, self.sequence, self.direction)
    }
}
