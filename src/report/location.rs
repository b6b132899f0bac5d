use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for GpsFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Source of the device position.
pub trait LocationProvider: Send + Sync {
    /// Latest fix, if one is known.
    fn current_fix(&self) -> Option<GpsFix>;
}

/// Location holder updated by the embedding application.
#[derive(Debug, Clone, Default)]
pub struct SharedLocation {
    fix: Arc<RwLock<Option<GpsFix>>>,
}

impl SharedLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, fix: GpsFix) {
        *self.fix.write() = Some(fix);
    }

    pub fn clear(&self) {
        *self.fix.write() = None;
    }
}

impl LocationProvider for SharedLocation {
    fn current_fix(&self) -> Option<GpsFix> {
        *self.fix.read()
    }
}

/// A provider that never has a fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn current_fix(&self) -> Option<GpsFix> {
        None
    }
}

/// Poll `provider` every `poll` until it has a fix or `wait` has elapsed.
pub fn wait_for_fix(provider: &dyn LocationProvider, wait: Duration, poll: Duration) -> Option<GpsFix> {
    let poll = poll.max(Duration::from_millis(1));
    let deadline = Instant::now() + wait;
    loop {
        if let Some(fix) = provider.current_fix() {
            return Some(fix);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        thread::sleep(poll.min(deadline - now));
    }
}
