mod labels;
mod nms;
mod suppressor;

pub use labels::{Labels, PLACEHOLDER_CLASSES};
pub use nms::non_max_suppression;
pub use suppressor::{BoxSuppressor, SuppressorConfig};
