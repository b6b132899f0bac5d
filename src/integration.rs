//! Integration module for connecting object detection backends with the
//! tracker and event detector.
//!
//! Inference itself lives outside this crate behind [`DetectionSource`].

mod builder;
mod detector;
mod pipeline;
mod worker;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, RawOutput};
pub use pipeline::{FrameOutput, TrackerPipeline};
pub use worker::{FRAME_QUEUE_CAPACITY, PipelineWorker};
