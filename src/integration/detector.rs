//! Trait for object detection inference backends.

use ndarray::ArrayView3;

use crate::error::{Error, Result};
use crate::events::Frame;

/// Raw output tensor of a YOLO-style detector, laid out `[1, channels, elements]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOutput {
    pub data: Vec<f32>,
    /// 4 box channels followed by one score channel per class
    pub channels: usize,
    /// Number of candidate boxes
    pub elements: usize,
}

impl RawOutput {
    pub fn new(data: Vec<f32>, channels: usize, elements: usize) -> Self {
        Self {
            data,
            channels,
            elements,
        }
    }

    /// An output with no candidates.
    pub fn empty(channels: usize) -> Self {
        Self::new(Vec::new(), channels, 0)
    }

    pub fn view(&self) -> Result<ArrayView3<'_, f32>> {
        ArrayView3::from_shape((1, self.channels, self.elements), &self.data).map_err(|_| {
            Error::OutputShape {
                len: self.data.len(),
                channels: self.channels,
                elements: self.elements,
            }
        })
    }
}

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the pipeline.
///
/// # Example
///
/// ```ignore
/// use vehicle_track::{DetectionSource, Frame, RawOutput};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn infer(&mut self, frame: &Frame) -> Result<RawOutput, Self::Error> {
///         // Run inference and return the output tensor
///         Ok(RawOutput::empty(84))
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for inference failures.
    type Error: std::fmt::Display;

    /// Run inference on one camera frame.
    fn infer(&mut self, frame: &Frame) -> std::result::Result<RawOutput, Self::Error>;
}
