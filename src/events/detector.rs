//! Entry/exit event derivation from tracked vehicle boxes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use nalgebra::Vector2;
use serde::Deserialize;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::events::capture::{Frame, crop_box};
use crate::events::event::{EventKind, VehicleEvent};
use crate::events::heading::Heading;
use crate::events::record::VehicleRecord;
use crate::tracker::{TrackState, TrackedBox};

/// Configuration for the VehicleEventDetector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Lowercase classes that produce events at all.
    pub vehicle_classes: BTreeSet<String>,
    /// Classes whose entry and exit carry a cropped image.
    pub capture_classes: BTreeSet<String>,
    /// When false, capture classes also send throttled snapshots while in view.
    pub capture_only_entry_exit: bool,
    /// A box with any edge this close to a frame border is exiting.
    pub edge_margin: f32,
    /// Per-axis movement needed for a non-stationary exit heading.
    pub heading_threshold: f32,
    pub image_cooldown_ms: i64,
    /// Snapshots closer than this to an earlier one of the same vehicle are skipped.
    pub min_image_distance: f32,
    /// Exited records idle this long are dropped.
    pub stale_after_ms: i64,
    /// Records that never reached an edge are dropped after this much idle time.
    pub abandon_after_ms: i64,
    /// How long a reported vehicle key blocks a new entry under the same key.
    pub report_cooldown_ms: i64,
    pub image_marker_ttl_ms: i64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            vehicle_classes: ["car", "truck", "bus", "motorcycle", "bicycle"]
                .into_iter()
                .map(String::from)
                .collect(),
            capture_classes: BTreeSet::from(["bus".to_string()]),
            capture_only_entry_exit: true,
            edge_margin: 0.1,
            heading_threshold: 0.1,
            image_cooldown_ms: 5_000,
            min_image_distance: 0.1,
            stale_after_ms: 5_000,
            abandon_after_ms: 120_000,
            report_cooldown_ms: 20_000,
            image_marker_ttl_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ImageMarker {
    position: Vector2<f32>,
    sent_at: DateTime<Utc>,
}

pub struct VehicleEventDetector {
    config: EventConfig,
    clock: Arc<dyn Clock>,
    records: HashMap<String, VehicleRecord>,
    /// Last entry or exit report per key
    reported: HashMap<String, DateTime<Utc>>,
    /// Positions images were sent from, per key
    images: HashMap<String, Vec<ImageMarker>>,
}

impl VehicleEventDetector {
    pub fn new(config: EventConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EventConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            records: HashMap::new(),
            reported: HashMap::new(),
            images: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    pub fn record(&self, key: &str) -> Option<&VehicleRecord> {
        self.records.get(key)
    }

    pub fn records(&self) -> impl Iterator<Item = &VehicleRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `key` was reported within the report cooldown.
    pub fn is_reported(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.reported
            .get(key)
            .is_some_and(|at| now - *at <= millis(self.config.report_cooldown_ms))
    }

    /// Forget every record and marker.
    pub fn clear(&mut self) {
        self.records.clear();
        self.reported.clear();
        self.images.clear();
        debug!("vehicle event detector cleared");
    }

    /// Process one frame of tracker output.
    ///
    /// Only boxes matched this frame count as sightings. `frame` is the camera
    /// image the boxes were detected on; without it no images are captured.
    pub fn process(&mut self, boxes: &[TrackedBox], frame: Option<&Frame>) -> Vec<VehicleEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();

        for tracked in boxes {
            if tracked.state != TrackState::Tracked {
                continue;
            }
            let class_name = tracked.class_name.to_lowercase();
            if class_name.is_empty() || !self.config.vehicle_classes.contains(&class_name) {
                continue;
            }

            let key = format!("{class_name}-{}", tracked.sequence);
            let event = if self.records.contains_key(&key) {
                self.on_sighting(&key, tracked, frame, now)
            } else {
                self.on_first_sighting(key, class_name, tracked, frame, now)
            };
            events.extend(event);
        }

        self.cleanup(now);
        events
    }

    fn on_first_sighting(
        &mut self,
        key: String,
        class_name: String,
        tracked: &TrackedBox,
        frame: Option<&Frame>,
        now: DateTime<Utc>,
    ) -> Option<VehicleEvent> {
        if self.is_reported(&key) {
            debug!(key = %key, "vehicle reported recently, ignoring re-entry");
            return None;
        }

        let mut record = VehicleRecord::new(key.clone(), class_name, tracked, now);
        record.captured_image = capture(&self.config, &record.class_name, tracked, frame);
        if record.captured_image.is_some() {
            remember_image(&mut self.images, &key, record.entry_position, now);
        }

        info!(
            key = %key,
            track_id = tracked.track_id,
            has_image = record.captured_image.is_some(),
            "vehicle entered"
        );
        let event = VehicleEvent::from_record(EventKind::Entry, &record, now, None);
        self.reported.insert(key.clone(), now);
        self.records.insert(key, record);
        Some(event)
    }

    fn on_sighting(
        &mut self,
        key: &str,
        tracked: &TrackedBox,
        frame: Option<&Frame>,
        now: DateTime<Utc>,
    ) -> Option<VehicleEvent> {
        let record = self.records.get_mut(key)?;
        record.observe(tracked, now);

        if tracked.detection.bbox.touches_edge(self.config.edge_margin) && record.mark_exit(now) {
            let heading = Heading::between(
                record.entry_position,
                record.last_position,
                self.config.heading_threshold,
            );
            if let Some(image) = capture(&self.config, &record.class_name, tracked, frame) {
                record.captured_image = Some(image);
                remember_image(&mut self.images, key, record.last_position, now);
            }

            info!(
                key = %key,
                track_id = tracked.track_id,
                heading = %heading,
                "vehicle exited"
            );
            let event = VehicleEvent::from_record(EventKind::Exit, record, now, Some(heading));
            self.reported.insert(key.to_string(), now);
            return Some(event);
        }

        if self.config.capture_only_entry_exit || !self.config.capture_classes.contains(&record.class_name) {
            return None;
        }
        let frame = frame?;

        let position = record.last_position;
        let should_send = self.images.get(key).is_none_or(|markers| {
            let cooldown = millis(self.config.image_cooldown_ms);
            markers.iter().all(|m| {
                now - m.sent_at > cooldown
                    && (m.position - position).norm() >= self.config.min_image_distance
            })
        });
        if !should_send {
            return None;
        }

        debug!(key = %key, x = position.x, y = position.y, "sending vehicle snapshot");
        let mut event = VehicleEvent::from_record(EventKind::Snapshot, record, now, None);
        event.image = Some(crop_box(frame, &tracked.detection.bbox));
        remember_image(&mut self.images, key, position, now);
        Some(event)
    }

    fn cleanup(&mut self, now: DateTime<Utc>) {
        let stale_after = millis(self.config.stale_after_ms);
        let abandon_after = millis(self.config.abandon_after_ms);
        self.records.retain(|key, record| {
            if record.is_stale(now, stale_after) {
                debug!(key = %key, "dropping stale vehicle record");
                false
            } else if record.is_abandoned(now, abandon_after) {
                debug!(key = %key, "dropping vehicle record that never exited");
                false
            } else {
                true
            }
        });

        let report_cooldown = millis(self.config.report_cooldown_ms);
        self.reported.retain(|_, at| now - *at <= report_cooldown);

        let ttl = millis(self.config.image_marker_ttl_ms);
        self.images.retain(|_, markers| {
            markers.retain(|m| now - m.sent_at <= ttl);
            !markers.is_empty()
        });
    }
}

impl Default for VehicleEventDetector {
    fn default() -> Self {
        Self::new(EventConfig::default())
    }
}

fn millis(ms: i64) -> TimeDelta {
    TimeDelta::milliseconds(ms)
}

fn capture(
    config: &EventConfig,
    class_name: &str,
    tracked: &TrackedBox,
    frame: Option<&Frame>,
) -> Option<Frame> {
    if !config.capture_classes.contains(class_name) {
        return None;
    }
    frame.map(|f| crop_box(f, &tracked.detection.bbox))
}

fn remember_image(
    images: &mut HashMap<String, Vec<ImageMarker>>,
    key: &str,
    position: Vector2<f32>,
    sent_at: DateTime<Utc>,
) {
    images
        .entry(key.to_string())
        .or_default()
        .push(ImageMarker { position, sent_at });
}
