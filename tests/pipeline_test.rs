use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use image::RgbImage;
use vehicle_track::integration::FRAME_QUEUE_CAPACITY;
use vehicle_track::report::EventPayload;
use vehicle_track::{
    ChannelReporter, Config, DetectionSource, EventDispatcher, Frame, GpsFix, Labels, PipelineWorker,
    RawOutput, ReportConfig, Session, SharedLocation, TrackerPipeline,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// One candidate of class channel 1 (`bus`) at `(cx, cy)`.
fn bus_output(cx: f32, cy: f32) -> RawOutput {
    RawOutput::new(vec![cx, cy, 0.1, 0.1, 0.0, 0.9], 6, 1)
}

fn labels() -> Labels {
    Labels::new(["person", "bus"])
}

/// Replays canned outputs in order, then reports empty frames.
struct ScriptedSource {
    outputs: VecDeque<RawOutput>,
}

impl DetectionSource for ScriptedSource {
    type Error = std::convert::Infallible;

    fn infer(&mut self, _frame: &Frame) -> Result<RawOutput, Self::Error> {
        Ok(self.outputs.pop_front().unwrap_or_else(|| RawOutput::empty(6)))
    }
}

/// Blocks every inference until the gate sender is dropped.
struct GatedSource {
    started: Sender<()>,
    gate: Receiver<()>,
}

impl DetectionSource for GatedSource {
    type Error = std::convert::Infallible;

    fn infer(&mut self, _frame: &Frame) -> Result<RawOutput, Self::Error> {
        let _ = self.started.send(());
        let _ = self.gate.recv();
        Ok(bus_output(0.5, 0.5))
    }
}

fn recv_payloads(rx: &Receiver<EventPayload>, n: usize) -> Vec<EventPayload> {
    let mut payloads: Vec<EventPayload> = (0..n).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
    payloads.sort_by_key(|p| p.get_str("event").map(String::from));
    payloads
}

#[test]
fn test_pipeline_reports_entry_and_exit() {
    let (reporter, rx) = ChannelReporter::new();
    let location = SharedLocation::new();
    location.set(GpsFix::new(48.0, 11.5));
    let dispatcher = EventDispatcher::new(
        Arc::new(reporter),
        Arc::new(location),
        Session::new(),
        ReportConfig {
            gps_wait_ms: 50,
            gps_poll_interval_ms: 10,
            ..Default::default()
        },
    );

    let source = ScriptedSource {
        outputs: [0.5, 0.6, 0.7, 0.8, 0.88].into_iter().map(|cx| bus_output(cx, 0.5)).collect(),
    };
    let mut pipeline =
        TrackerPipeline::from_config(source, labels(), &Config::default()).with_dispatcher(dispatcher);

    let frame = RgbImage::new(320, 240);
    let emitted: usize = (0..5).map(|_| pipeline.process_frame(&frame).events.len()).sum();
    assert_eq!(emitted, 2);

    let payloads = recv_payloads(&rx, 2);
    let (entry, exit) = (&payloads[0], &payloads[1]);

    assert_eq!(entry.get_str("event"), Some("entry"));
    assert_eq!(entry.get_str("vehicle_type"), Some("bus"));
    assert_eq!(entry.get_str("vehicle_id"), Some("1"));
    assert_eq!(entry.get_str("gps_location"), Some("48,11.5"));
    assert!(entry.get_str("image_data").is_some_and(|d| !d.is_empty()));

    assert_eq!(exit.get_str("event"), Some("exit"));
    assert_eq!(exit.get_str("direction"), Some("south"));
    assert!(exit.contains_key("time_in_frame_ms"));
    assert!(exit.contains_key("image_data"));
    assert_eq!(exit.get_str("session_id"), entry.get_str("session_id"));

    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn test_worker_drops_frames_when_queue_is_full() {
    let (started_tx, started_rx) = crossbeam_channel::unbounded();
    let (gate_tx, gate_rx) = crossbeam_channel::unbounded::<()>();
    let source = GatedSource {
        started: started_tx,
        gate: gate_rx,
    };
    let pipeline = TrackerPipeline::from_config(source, labels(), &Config::default());
    let worker = PipelineWorker::spawn(pipeline).unwrap();
    let frame = RgbImage::new(16, 16);

    // The first frame occupies the worker, the next ones fill the queue.
    assert!(worker.try_submit(frame.clone()));
    started_rx.recv_timeout(TIMEOUT).unwrap();
    for _ in 0..FRAME_QUEUE_CAPACITY {
        assert!(worker.try_submit(frame.clone()));
    }
    assert!(!worker.try_submit(frame.clone()));

    drop(gate_tx);
    let outputs: Vec<_> = (0..=FRAME_QUEUE_CAPACITY)
        .map(|_| worker.recv_timeout(TIMEOUT).unwrap())
        .collect();
    assert!(worker.recv_timeout(Duration::from_millis(100)).is_none());

    // Frames were processed in order on one track.
    assert_eq!(outputs[0].events.len(), 1);
    let id = outputs[0].tracks[0].track_id;
    assert!(outputs.iter().all(|o| o.tracks.len() == 1 && o.tracks[0].track_id == id));
    assert!(outputs[1..].iter().all(|o| o.events.is_empty()));

    worker.shutdown();
}

#[test]
fn test_worker_clear_restarts_identities() {
    let source = ScriptedSource {
        outputs: VecDeque::from([bus_output(0.5, 0.5), bus_output(0.5, 0.5)]),
    };
    let pipeline = TrackerPipeline::from_config(source, labels(), &Config::default());
    let worker = PipelineWorker::spawn(pipeline).unwrap();
    let frame = RgbImage::new(16, 16);

    assert!(worker.try_submit(frame.clone()));
    let first = worker.recv_timeout(TIMEOUT).unwrap();
    worker.clear();
    assert!(worker.try_submit(frame));
    let second = worker.recv_timeout(TIMEOUT).unwrap();

    assert_eq!(first.tracks[0].sequence, 1);
    assert_eq!(second.tracks[0].sequence, 1);
    assert_eq!(second.events.len(), 1);
}
