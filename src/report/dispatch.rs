//! Asynchronous event reporting.
//!
//! Every event is moved into its own reporting thread. The thread waits a
//! bounded time for a GPS fix, encodes the event image, and hands the payload
//! to the [`EventReporter`]. Failures are logged and the event is dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Local;
use crossbeam_channel::{Receiver, Sender};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::VehicleEvent;
use crate::report::location::{LocationProvider, wait_for_fix};
use crate::report::payload::{DEFAULT_JPEG_QUALITY, EventPayload, encode_base64, encode_jpeg};
use crate::report::session::{Session, SessionInfo};

/// Delivers payloads to wherever reports go.
pub trait EventReporter: Send + Sync {
    fn send_data(&self, payload: EventPayload) -> Result<()>;
}

/// Forwards payloads into a channel.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<EventPayload>,
}

impl ChannelReporter {
    pub fn new() -> (Self, Receiver<EventPayload>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: Sender<EventPayload>) -> Self {
        Self { tx }
    }
}

impl EventReporter for ChannelReporter {
    fn send_data(&self, payload: EventPayload) -> Result<()> {
        self.tx
            .send(payload)
            .map_err(|_| Error::Report("payload receiver was dropped".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Longest wait for a GPS fix before reporting without one.
    pub gps_wait_ms: u64,
    pub gps_poll_interval_ms: u64,
    pub jpeg_quality: u8,
    /// Log payloads instead of sending them.
    pub dry_run: bool,
    /// Save every event image as a JPEG in this directory.
    pub archive_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            gps_wait_ms: 2_000,
            gps_poll_interval_ms: 500,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            dry_run: false,
            archive_dir: None,
        }
    }
}

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Logged only, `dry_run` is set.
    Logged,
    /// No GPS fix and no signed-in user.
    Dropped,
    /// The reporter returned an error.
    Failed,
}

pub struct EventDispatcher {
    reporter: Arc<dyn EventReporter>,
    location: Arc<dyn LocationProvider>,
    session: Session,
    config: ReportConfig,
}

impl EventDispatcher {
    pub fn new(
        reporter: Arc<dyn EventReporter>,
        location: Arc<dyn LocationProvider>,
        session: Session,
        config: ReportConfig,
    ) -> Self {
        Self {
            reporter,
            location,
            session,
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Report `event` on a new thread.
    ///
    /// The session is snapshotted now; later session changes do not affect
    /// this report.
    pub fn dispatch(&self, event: VehicleEvent) -> std::io::Result<JoinHandle<DispatchOutcome>> {
        let job = ReportJob {
            reporter: Arc::clone(&self.reporter),
            location: Arc::clone(&self.location),
            session: self.session.snapshot(),
            config: self.config.clone(),
        };
        thread::Builder::new()
            .name(format!("report-{}-{}", event.kind, event.key()))
            .spawn(move || job.run(event))
    }

    /// Dispatch every event, logging any that could not be started.
    pub fn dispatch_all(
        &self,
        events: impl IntoIterator<Item = VehicleEvent>,
    ) -> Vec<JoinHandle<DispatchOutcome>> {
        events
            .into_iter()
            .filter_map(|event| match self.dispatch(event) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(error = %e, "failed to start reporting thread");
                    None
                }
            })
            .collect()
    }
}

struct ReportJob {
    reporter: Arc<dyn EventReporter>,
    location: Arc<dyn LocationProvider>,
    session: SessionInfo,
    config: ReportConfig,
}

impl ReportJob {
    fn run(self, event: VehicleEvent) -> DispatchOutcome {
        let key = event.key();
        let fix = wait_for_fix(
            &*self.location,
            Duration::from_millis(self.config.gps_wait_ms),
            Duration::from_millis(self.config.gps_poll_interval_ms),
        );
        if fix.is_none() && self.session.user_id.is_none() {
            warn!(key = %key, event = %event.kind, "no GPS fix and no user, dropping event");
            return DispatchOutcome::Dropped;
        }

        let image_data = event.image.as_ref().and_then(|image| {
            match encode_jpeg(image, self.config.jpeg_quality) {
                Ok(jpeg) => {
                    if let Some(dir) = &self.config.archive_dir {
                        archive_image(dir, &event, &jpeg);
                    }
                    Some(encode_base64(&jpeg))
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "failed to encode event image");
                    None
                }
            }
        });

        let payload = EventPayload::build(&event, &self.session, fix, image_data);

        if self.config.dry_run {
            info!(key = %key, payload = %payload.redacted(), "dry run, payload not sent");
            return DispatchOutcome::Logged;
        }

        match self.reporter.send_data(payload) {
            Ok(()) => {
                debug!(key = %key, event = %event.kind, "event reported");
                DispatchOutcome::Sent
            }
            Err(e) => {
                warn!(key = %key, event = %event.kind, error = %e, "failed to report event");
                DispatchOutcome::Failed
            }
        }
    }
}

/// `{class}_{id}_{event}_{yyyyMMdd_HHmmss}.jpg`
pub fn archive_file_name(event: &VehicleEvent) -> String {
    format!(
        "{}_{}_{}_{}.jpg",
        event.class_name,
        event.vehicle_id(),
        event.kind,
        event.timestamp.with_timezone(&Local).format("%Y%m%d_%H%M%S")
    )
}

fn archive_image(dir: &Path, event: &VehicleEvent, jpeg: &[u8]) {
    let path = dir.join(archive_file_name(event));
    match std::fs::write(&path, jpeg) {
        Ok(()) => debug!(path = %path.display(), "archived event image"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to archive event image"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::report::location::{GpsFix, NoLocation, SharedLocation};
    use chrono::Utc;
    use image::RgbImage;
    use nalgebra::Vector2;

    struct FailingReporter;

    impl EventReporter for FailingReporter {
        fn send_data(&self, _payload: EventPayload) -> Result<()> {
            Err(Error::Report("server unavailable".into()))
        }
    }

    fn event(kind: EventKind, image: Option<RgbImage>) -> VehicleEvent {
        let now = Utc::now();
        VehicleEvent {
            kind,
            class_name: "bus".into(),
            sequence: 2,
            track_id: 5,
            timestamp: now,
            entry_time: now,
            entry_position: Vector2::new(0.5, 0.5),
            exit_time: None,
            exit_position: None,
            position: Vector2::new(0.5, 0.5),
            confidence: 0.9,
            heading: None,
            image,
        }
    }

    fn fast_config() -> ReportConfig {
        ReportConfig {
            gps_wait_ms: 30,
            gps_poll_interval_ms: 5,
            ..Default::default()
        }
    }

    fn dispatcher(
        reporter: Arc<dyn EventReporter>,
        location: Arc<dyn LocationProvider>,
        config: ReportConfig,
    ) -> EventDispatcher {
        EventDispatcher::new(reporter, location, Session::new(), config)
    }

    #[test]
    fn test_sends_with_gps_fix() {
        let (reporter, rx) = ChannelReporter::new();
        let location = SharedLocation::new();
        location.set(GpsFix::new(10.0, 20.0));
        let d = dispatcher(Arc::new(reporter), Arc::new(location), fast_config());

        let handle = d.dispatch(event(EventKind::Entry, None)).unwrap();
        assert_eq!(handle.join().unwrap(), DispatchOutcome::Sent);

        let payload = rx.try_recv().unwrap();
        assert_eq!(payload.get_str("gps_location"), Some("10,20"));
        assert_eq!(payload.get_str("session_id"), Some(d.session().session_id().as_str()));
    }

    #[test]
    fn test_drops_without_fix_or_user() {
        let (reporter, rx) = ChannelReporter::new();
        let d = dispatcher(Arc::new(reporter), Arc::new(NoLocation), fast_config());

        let handle = d.dispatch(event(EventKind::Entry, None)).unwrap();
        assert_eq!(handle.join().unwrap(), DispatchOutcome::Dropped);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_sends_without_fix_for_signed_in_user() {
        let (reporter, rx) = ChannelReporter::new();
        let d = dispatcher(Arc::new(reporter), Arc::new(NoLocation), fast_config());
        d.session().set_user_id("driver-7");

        let handle = d.dispatch(event(EventKind::Entry, None)).unwrap();
        assert_eq!(handle.join().unwrap(), DispatchOutcome::Sent);

        let payload = rx.try_recv().unwrap();
        assert_eq!(payload.get_str("user_id"), Some("driver-7"));
        assert!(!payload.contains_key("gps_location"));
    }

    #[test]
    fn test_reporter_failure_is_contained() {
        let location = SharedLocation::new();
        location.set(GpsFix::new(0.0, 0.0));
        let d = dispatcher(Arc::new(FailingReporter), Arc::new(location), fast_config());

        let handles = d.dispatch_all(vec![event(EventKind::Entry, None), event(EventKind::Exit, None)]);
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(outcomes, vec![DispatchOutcome::Failed, DispatchOutcome::Failed]);
    }

    #[test]
    fn test_dry_run_archives_without_sending() {
        let dir = tempfile::tempdir().unwrap();
        let (reporter, rx) = ChannelReporter::new();
        let location = SharedLocation::new();
        location.set(GpsFix::new(1.5, 2.5));
        let config = ReportConfig {
            dry_run: true,
            archive_dir: Some(dir.path().to_path_buf()),
            ..fast_config()
        };
        let d = dispatcher(Arc::new(reporter), Arc::new(location), config);

        let ev = event(EventKind::Exit, Some(RgbImage::new(12, 12)));
        let name = archive_file_name(&ev);
        assert!(name.starts_with("bus_2_exit_") && name.ends_with(".jpg"));

        let handle = d.dispatch(ev).unwrap();
        assert_eq!(handle.join().unwrap(), DispatchOutcome::Logged);
        assert!(rx.try_recv().is_err());

        let bytes = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
