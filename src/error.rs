//! Error types shared across the crate.

use std::path::PathBuf;

/// Errors surfaced by fallible operations.
///
/// Per-frame processing never propagates these out of the pipeline; they are
/// logged and the frame degrades to "no detections" instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw model output does not match the declared `[1, channels, elements]` shape.
    #[error("model output has {len} values, expected 1 x {channels} x {elements}")]
    OutputShape {
        len: usize,
        channels: usize,
        elements: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The event reporter rejected or failed to deliver a payload.
    #[error("report failed: {0}")]
    Report(String),
}

pub type Result<T> = std::result::Result<T, Error>;
