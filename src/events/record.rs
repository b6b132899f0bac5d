use chrono::{DateTime, TimeDelta, Utc};
use nalgebra::Vector2;

use crate::events::capture::Frame;
use crate::tracker::TrackedBox;

/// Lifecycle of one vehicle identity as seen by the event detector.
#[derive(Debug, Clone)]
pub struct VehicleRecord {
    /// `"{class}-{sequence}"`
    pub key: String,
    pub class_name: String,
    pub sequence: u32,
    pub track_id: u64,
    pub entry_time: DateTime<Utc>,
    /// Box center at first sighting
    pub entry_position: Vector2<f32>,
    pub last_position: Vector2<f32>,
    pub last_update_time: DateTime<Utc>,
    pub exit_position: Option<Vector2<f32>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub confidence: f32,
    pub exit_reported: bool,
    /// Most recent entry or exit crop
    pub captured_image: Option<Frame>,
}

impl VehicleRecord {
    pub fn new(key: String, class_name: String, tracked: &TrackedBox, now: DateTime<Utc>) -> Self {
        let position = center_of(tracked);
        Self {
            key,
            class_name,
            sequence: tracked.sequence,
            track_id: tracked.track_id,
            entry_time: now,
            entry_position: position,
            last_position: position,
            last_update_time: now,
            exit_position: None,
            exit_time: None,
            confidence: tracked.detection.confidence,
            exit_reported: false,
            captured_image: None,
        }
    }

    /// Refresh position, time and confidence from a later sighting.
    pub fn observe(&mut self, tracked: &TrackedBox, now: DateTime<Utc>) {
        self.last_position = center_of(tracked);
        self.last_update_time = now;
        self.confidence = tracked.detection.confidence;
        self.track_id = tracked.track_id;
    }

    /// Record the exit at the last observed position. Returns `false` when the
    /// exit was already recorded.
    pub fn mark_exit(&mut self, now: DateTime<Utc>) -> bool {
        if self.exit_reported {
            return false;
        }
        self.exit_position = Some(self.last_position);
        self.exit_time = Some(now);
        self.exit_reported = true;
        true
    }

    pub fn time_in_frame(&self) -> Option<TimeDelta> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }

    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: TimeDelta) -> bool {
        self.exit_reported && now - self.last_update_time > stale_after
    }

    /// Never exited and unseen for longer than `abandon_after`.
    pub fn is_abandoned(&self, now: DateTime<Utc>, abandon_after: TimeDelta) -> bool {
        !self.exit_reported && now - self.last_update_time > abandon_after
    }
}

pub(crate) fn center_of(tracked: &TrackedBox) -> Vector2<f32> {
    let (cx, cy) = tracked.detection.center();
    Vector2::new(cx, cy)
}
