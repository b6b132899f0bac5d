/// Whether a reported box reflects this frame's detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Matched or registered in the current frame
    #[default]
    Tracked,
    /// Not matched this frame; the box is the last known (or extrapolated) position
    Missing,
}
