use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use nalgebra::Vector2;

use crate::events::capture::Frame;
use crate::events::heading::Heading;
use crate::events::record::VehicleRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// First sighting of a vehicle identity.
    Entry,
    /// The vehicle reached the frame border.
    Exit,
    /// Throttled image of a vehicle still in view.
    Snapshot,
}

impl EventKind {
    /// Name used in report payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Entry => "entry",
            EventKind::Exit => "exit",
            EventKind::Snapshot => "continuous",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value snapshot of a vehicle record taken when an event fires.
///
/// Owns everything needed to report the event; later changes to the record do
/// not show up here.
#[derive(Debug, Clone)]
pub struct VehicleEvent {
    pub kind: EventKind,
    pub class_name: String,
    pub sequence: u32,
    pub track_id: u64,
    pub timestamp: DateTime<Utc>,
    pub entry_time: DateTime<Utc>,
    pub entry_position: Vector2<f32>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_position: Option<Vector2<f32>>,
    /// Box center when the event fired
    pub position: Vector2<f32>,
    pub confidence: f32,
    /// Set on exit events only
    pub heading: Option<Heading>,
    pub image: Option<Frame>,
}

impl VehicleEvent {
    pub(crate) fn from_record(
        kind: EventKind,
        record: &VehicleRecord,
        timestamp: DateTime<Utc>,
        heading: Option<Heading>,
    ) -> Self {
        Self {
            kind,
            class_name: record.class_name.clone(),
            sequence: record.sequence,
            track_id: record.track_id,
            timestamp,
            entry_time: record.entry_time,
            entry_position: record.entry_position,
            exit_time: record.exit_time,
            exit_position: record.exit_position,
            position: record.last_position,
            confidence: record.confidence,
            heading,
            image: record.captured_image.clone(),
        }
    }

    /// `"{class}-{sequence}"`, the key records are stored under.
    pub fn key(&self) -> String {
        format!("{}-{}", self.class_name, self.sequence)
    }

    /// Identifier sent to the reporter: the class-scoped sequence number.
    pub fn vehicle_id(&self) -> String {
        self.sequence.to_string()
    }

    pub fn time_in_frame(&self) -> Option<TimeDelta> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }
}
