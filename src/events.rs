mod capture;
mod detector;
mod event;
mod heading;
mod record;

pub use capture::{Frame, crop_box};
pub use detector::{EventConfig, VehicleEventDetector};
pub use event::{EventKind, VehicleEvent};
pub use heading::Heading;
pub use record::VehicleRecord;
