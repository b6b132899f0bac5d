mod dispatch;
mod location;
mod payload;
mod session;

pub use dispatch::{
    ChannelReporter, DispatchOutcome, EventDispatcher, EventReporter, ReportConfig, archive_file_name,
};
pub use location::{GpsFix, LocationProvider, NoLocation, SharedLocation, wait_for_fix};
pub use payload::{
    DEFAULT_JPEG_QUALITY, EventPayload, TIMESTAMP_FORMAT, encode_base64, encode_jpeg, format_timestamp,
};
pub use session::{Session, SessionInfo};
