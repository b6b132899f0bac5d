//! TrackerPipeline for combining detection with tracking and event derivation.

use tracing::{debug, warn};

use crate::config::Config;
use crate::events::{Frame, VehicleEvent, VehicleEventDetector};
use crate::report::EventDispatcher;
use crate::suppress::{BoxSuppressor, Labels};
use crate::tracker::{CentroidTracker, Detection, TrackedBox};

use super::DetectionSource;

/// Everything one frame produced.
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    /// Every tracked object, ordered by track id
    pub tracks: Vec<TrackedBox>,
    pub events: Vec<VehicleEvent>,
}

/// One camera stream end to end: inference, suppression, tracking, events
/// and, optionally, reporting.
///
/// All state is owned here; frames must be fed in order from one thread.
pub struct TrackerPipeline<D: DetectionSource> {
    source: D,
    suppressor: BoxSuppressor,
    tracker: CentroidTracker,
    events: VehicleEventDetector,
    dispatcher: Option<EventDispatcher>,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    pub fn new(
        source: D,
        suppressor: BoxSuppressor,
        tracker: CentroidTracker,
        events: VehicleEventDetector,
    ) -> Self {
        Self {
            source,
            suppressor,
            tracker,
            events,
            dispatcher: None,
        }
    }

    /// Build every stage from `config`, using the system clock.
    pub fn from_config(source: D, labels: Labels, config: &Config) -> Self {
        Self::new(
            source,
            BoxSuppressor::new(config.suppressor.clone(), labels),
            CentroidTracker::new(config.tracker.clone()),
            VehicleEventDetector::new(config.events.clone()),
        )
    }

    /// Report every event through `dispatcher`.
    pub fn with_dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Process a single camera frame.
    ///
    /// Inference or suppression failures are logged and the frame is treated
    /// as having no detections.
    pub fn process_frame(&mut self, frame: &Frame) -> FrameOutput {
        let detections = self.detect(frame);
        self.process_detections(&detections, Some(frame))
    }

    /// Track already suppressed detections. `frame` is only used for image
    /// capture.
    pub fn process_detections(&mut self, detections: &[Detection], frame: Option<&Frame>) -> FrameOutput {
        let tracks = self.tracker.update(detections);
        let events = self.events.process(&tracks, frame);

        if let Some(dispatcher) = &self.dispatcher {
            // Reporting threads are detached; their outcome is only logged.
            let started = dispatcher.dispatch_all(events.iter().cloned()).len();
            if started > 0 {
                debug!(started, "dispatched vehicle events");
            }
        }

        FrameOutput { tracks, events }
    }

    /// Reset tracking and event state for a new session.
    pub fn clear(&mut self) {
        self.tracker.clear();
        self.events.clear();
    }

    fn detect(&mut self, frame: &Frame) -> Vec<Detection> {
        let output = match self.source.infer(frame) {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "inference failed, treating frame as empty");
                return Vec::new();
            }
        };

        self.suppressor
            .suppress(&output.data, output.channels, output.elements)
            .unwrap_or_else(|e| {
                warn!(error = %e, "discarding malformed model output");
                Vec::new()
            })
    }

    /// Get a reference to the underlying detector.
    pub fn source(&self) -> &D {
        &self.source
    }

    /// Get a mutable reference to the underlying detector.
    pub fn source_mut(&mut self) -> &mut D {
        &mut self.source
    }

    pub fn suppressor(&self) -> &BoxSuppressor {
        &self.suppressor
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker, e.g. to add listeners.
    pub fn tracker_mut(&mut self) -> &mut CentroidTracker {
        &mut self.tracker
    }

    pub fn event_detector(&self) -> &VehicleEventDetector {
        &self.events
    }

    pub fn dispatcher(&self) -> Option<&EventDispatcher> {
        self.dispatcher.as_ref()
    }
}
