mod centroid_tracker;
mod detection;
mod direction;
mod listener;
mod matching;
mod rect;
mod track_state;
mod tracked_object;

pub use centroid_tracker::{CentroidTracker, TrackerConfig};
pub use detection::Detection;
pub use direction::Direction;
pub use listener::{TrackerEvent, TrackerListener};
pub use matching::{AssignmentResult, Association, centroid_distance, greedy_assignment, linear_assignment};
pub use rect::Rect;
pub use track_state::TrackState;
pub use tracked_object::{TrackedBox, TrackedObject};
