//! Centroid tracker: associates detections across frames and hands out
//! per-class sequential identities.

use std::collections::{BTreeMap, HashMap};

use crossbeam_channel::Receiver;
use nalgebra::Vector2;
use serde::Deserialize;
use tracing::debug;

use crate::tracker::detection::Detection;
use crate::tracker::listener::{FnListener, TrackerEvent, TrackerListener};
use crate::tracker::matching::{self, AssignmentResult, Association};
use crate::tracker::tracked_object::{TrackedBox, TrackedObject};

/// Configuration for the CentroidTracker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// A track is dropped once it has been unmatched for more than this many frames.
    pub max_disappeared: u32,
    /// Centroid distance (normalized units) above which a pair is never matched.
    pub max_distance: f32,
    /// Per-axis displacement that counts as movement.
    pub direction_threshold: f32,
    /// Weight of the newest displacement in the velocity estimate.
    pub velocity_smoothing: f32,
    pub association: Association,
    /// Move unmatched tracks along their velocity instead of freezing them.
    pub extrapolate_missing: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_disappeared: 15,
            max_distance: 0.2,
            direction_threshold: 0.02,
            velocity_smoothing: 0.8,
            association: Association::Greedy,
            extrapolate_missing: false,
        }
    }
}

pub struct CentroidTracker {
    objects: BTreeMap<u64, TrackedObject>,
    class_sequences: HashMap<String, u32>,
    next_track_id: u64,
    config: TrackerConfig,
    listeners: Vec<Box<dyn TrackerListener>>,
}

impl CentroidTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            objects: BTreeMap::new(),
            class_sequences: HashMap::new(),
            next_track_id: 1,
            config,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn add_listener(&mut self, listener: Box<dyn TrackerListener>) {
        self.listeners.push(listener);
    }

    /// Call `f` whenever the tracked set becomes empty.
    pub fn on_cleared<F>(&mut self, f: F)
    where
        F: Fn() + Send + 'static,
    {
        self.add_listener(Box::new(FnListener(f)));
    }

    /// Receive [`TrackerEvent`]s over a channel.
    pub fn subscribe(&mut self) -> Receiver<TrackerEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.add_listener(Box::new(tx));
        rx
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, track_id: u64) -> Option<&TrackedObject> {
        self.objects.get(&track_id)
    }

    /// Tracked objects in track id order.
    pub fn objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values()
    }

    /// Drop every track and every sequence counter. Listeners are kept and
    /// not notified.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.class_sequences.clear();
        self.next_track_id = 1;
    }

    /// Advance one frame.
    ///
    /// Returns every object still tracked after the update, matched or not,
    /// ordered by track id. Unmatched objects keep reporting their last known
    /// box until they are deregistered.
    pub fn update(&mut self, detections: &[Detection]) -> Vec<TrackedBox> {
        let was_empty = self.objects.is_empty();

        if detections.is_empty() {
            let ids: Vec<u64> = self.objects.keys().copied().collect();
            for id in ids {
                self.mark_missed(id);
            }
        } else if self.objects.is_empty() {
            for det in detections {
                self.register(det.clone());
            }
        } else {
            self.associate(detections);
        }

        if !was_empty && self.objects.is_empty() {
            debug!("tracked set is empty");
            for listener in &self.listeners {
                listener.on_tracking_cleared();
            }
        }

        self.objects.values().map(TrackedObject::to_box).collect()
    }

    fn associate(&mut self, detections: &[Detection]) {
        let ids: Vec<u64> = self.objects.keys().copied().collect();
        let tracked: Vec<Vector2<f32>> = self.objects.values().map(|o| o.centroid).collect();
        let centers: Vec<Vector2<f32>> = detections
            .iter()
            .map(|d| {
                let (cx, cy) = d.center();
                Vector2::new(cx, cy)
            })
            .collect();

        let dists = matching::centroid_distance(&tracked, &centers);
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::assign(&dists, self.config.max_distance, self.config.association);

        for (row, col) in matches {
            let id = ids[row];
            let det = &detections[col];
            let smoothing = self.config.velocity_smoothing;
            let threshold = self.config.direction_threshold;

            let Some(obj) = self.objects.get_mut(&id) else {
                continue;
            };
            if obj.class_name() == det.class_name {
                obj.update(det.clone(), smoothing, threshold);
            } else {
                // The old track is neither refreshed nor aged, only flagged unseen.
                obj.mark_unmatched();
                debug!(
                    track_id = id,
                    detected_class = %det.class_name,
                    "class changed on nearest match, registering new object"
                );
                self.register(det.clone());
            }
        }

        for row in unmatched_tracks {
            self.mark_missed(ids[row]);
        }

        for col in unmatched_detections {
            self.register(detections[col].clone());
        }
    }

    fn register(&mut self, detection: Detection) {
        let sequence = self
            .class_sequences
            .entry(detection.class_name.clone())
            .and_modify(|s| *s += 1)
            .or_insert(1);
        let sequence = *sequence;

        let track_id = self.next_track_id;
        self.next_track_id += 1;

        debug!(
            track_id,
            class = %detection.class_name,
            sequence,
            "registered object"
        );
        self.objects
            .insert(track_id, TrackedObject::new(track_id, sequence, detection));
    }

    fn mark_missed(&mut self, track_id: u64) {
        let Some(obj) = self.objects.get_mut(&track_id) else {
            return;
        };

        let disappeared = obj.mark_missed(self.config.extrapolate_missing);
        if disappeared > self.config.max_disappeared {
            debug!(track_id, disappeared, "deregistered object");
            self.objects.remove(&track_id);
        }
    }
}

impl Default for CentroidTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Direction, Rect, TrackState};

    fn det(class: &str, cx: f32, cy: f32) -> Detection {
        Detection::from_rect(Rect::from_cxcywh(cx, cy, 0.1, 0.1), 0.9, 0, class)
    }

    #[test]
    fn test_register_all_when_empty() {
        let mut tracker = CentroidTracker::default();
        let boxes = tracker.update(&[det("car", 0.2, 0.2), det("car", 0.7, 0.7), det("bus", 0.5, 0.5)]);

        assert_eq!(boxes.len(), 3);
        let seqs: Vec<(String, u32)> = boxes.iter().map(|b| (b.class_name.clone(), b.sequence)).collect();
        assert_eq!(
            seqs,
            vec![("car".into(), 1), ("car".into(), 2), ("bus".into(), 1)]
        );
        assert!(boxes.iter().all(|b| b.direction == Direction::None));
    }

    #[test]
    fn test_match_keeps_identity_and_sets_direction() {
        let mut tracker = CentroidTracker::default();
        let first = tracker.update(&[det("car", 0.3, 0.3)]);
        let second = tracker.update(&[det("car", 0.33, 0.33)]);

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].track_id, first[0].track_id);
        assert_eq!(second[0].direction, Direction::DownRight);
        assert_eq!(second[0].label(), "car #1\nDownRight");
    }

    #[test]
    fn test_far_detection_registers_new_track() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[det("car", 0.1, 0.1)]);
        let boxes = tracker.update(&[det("car", 0.9, 0.9)]);

        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].state, TrackState::Missing);
        assert_eq!(boxes[1].sequence, 2);
    }

    #[test]
    fn test_class_mismatch_registers_new_object() {
        let mut tracker = CentroidTracker::default();
        let first = tracker.update(&[det("car", 0.5, 0.5)]);
        let boxes = tracker.update(&[det("truck", 0.51, 0.5)]);

        // The car track stays untouched, the truck is a fresh identity.
        assert_eq!(boxes.len(), 2);
        let car = tracker.get(first[0].track_id).unwrap();
        assert_eq!(car.disappeared, 0);
        assert_eq!(boxes[0].track_id, first[0].track_id);
        assert_eq!(boxes[0].state, TrackState::Missing);
        assert_eq!(boxes[1].class_name, "truck");
        assert_eq!(boxes[1].sequence, 1);

        // A later same-class match makes it a sighting again.
        let boxes = tracker.update(&[det("car", 0.45, 0.5), det("truck", 0.9, 0.9)]);
        assert_eq!(boxes[0].state, TrackState::Tracked);
    }

    #[test]
    fn test_cleared_fires_once_per_transition() {
        let mut tracker = CentroidTracker::new(TrackerConfig {
            max_disappeared: 1,
            ..Default::default()
        });
        let events = tracker.subscribe();

        tracker.update(&[det("car", 0.2, 0.2), det("bus", 0.8, 0.8)]);
        tracker.update(&[]);
        assert!(events.try_recv().is_err());
        assert!(tracker.update(&[]).is_empty());
        assert_eq!(events.try_recv(), Ok(TrackerEvent::Cleared));
        assert!(events.try_recv().is_err());

        tracker.update(&[]);
        assert!(events.try_recv().is_err());
    }
}
