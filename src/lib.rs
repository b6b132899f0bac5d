//! Vehicle tracking for a fixed camera.
//!
//! Raw detector output is suppressed into [`Detection`]s, associated across
//! frames by a [`CentroidTracker`] that hands out per-class identities, and
//! turned into entry/exit [`VehicleEvent`]s by a [`VehicleEventDetector`].
//! Events are reported asynchronously through an [`EventDispatcher`].
//!
//! ```ignore
//! use vehicle_track::{CentroidTracker, Detection, VehicleEventDetector};
//!
//! let mut tracker = CentroidTracker::default();
//! let mut events = VehicleEventDetector::default();
//!
//! let boxes = tracker.update(&[Detection::new(0.4, 0.4, 0.5, 0.5, 0.9, 2, "car")]);
//! for event in events.process(&boxes, None) {
//!     println!("{} {}", event.kind, event.key());
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod integration;
pub mod report;
pub mod suppress;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventConfig, EventKind, Frame, Heading, VehicleEvent, VehicleEventDetector, VehicleRecord};
pub use integration::{
    DetectionBuilder, DetectionSource, FrameOutput, PipelineWorker, RawOutput, TrackerPipeline,
};
pub use report::{
    ChannelReporter, DispatchOutcome, EventDispatcher, EventPayload, EventReporter, GpsFix,
    LocationProvider, ReportConfig, Session, SharedLocation,
};
pub use suppress::{BoxSuppressor, Labels, SuppressorConfig};
pub use tracker::{
    Association, CentroidTracker, Detection, Direction, Rect, TrackState, TrackedBox, TrackedObject,
    TrackerConfig, TrackerEvent, TrackerListener,
};
