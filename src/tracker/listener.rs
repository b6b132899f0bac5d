//! Notification when the tracked set becomes empty.

use crossbeam_channel::Sender;

/// State transitions a tracker reports to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    /// The last tracked object was deregistered.
    Cleared,
}

/// Receives tracker state transitions.
///
/// Listeners run on the tracker's thread after the update that caused the
/// transition has finished mutating state.
pub trait TrackerListener: Send {
    fn on_tracking_cleared(&self);
}

impl TrackerListener for Sender<TrackerEvent> {
    fn on_tracking_cleared(&self) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(TrackerEvent::Cleared);
    }
}

/// Adapts a closure into a [`TrackerListener`].
pub(crate) struct FnListener<F>(pub F);

impl<F> TrackerListener for FnListener<F>
where
    F: Fn() + Send,
{
    fn on_tracking_cleared(&self) {
        (self.0)()
    }
}
