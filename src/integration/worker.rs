//! Dedicated tracking thread fed through a bounded frame queue.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::events::Frame;

use super::{DetectionSource, FrameOutput, TrackerPipeline};

/// Frames waiting beyond this are dropped rather than queued.
pub const FRAME_QUEUE_CAPACITY: usize = 3;

enum Job {
    Frame(Frame),
    Clear,
}

/// Runs a [`TrackerPipeline`] on its own thread so frames are processed
/// strictly in submission order.
///
/// Results arrive on [`output`](Self::output). Dropping the worker closes the
/// queue; frames already queued are still processed before the thread exits.
pub struct PipelineWorker {
    jobs: Option<Sender<Job>>,
    output: Receiver<FrameOutput>,
    handle: Option<JoinHandle<()>>,
}

impl PipelineWorker {
    pub fn spawn<D>(pipeline: TrackerPipeline<D>) -> std::io::Result<Self>
    where
        D: DetectionSource + Send + 'static,
    {
        Self::with_capacity(pipeline, FRAME_QUEUE_CAPACITY)
    }

    pub fn with_capacity<D>(mut pipeline: TrackerPipeline<D>, capacity: usize) -> std::io::Result<Self>
    where
        D: DetectionSource + Send + 'static,
    {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(capacity);
        let (out_tx, out_rx) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name("tracking-worker".into())
            .spawn(move || {
                for job in job_rx {
                    match job {
                        Job::Frame(frame) => {
                            let output = pipeline.process_frame(&frame);
                            if out_tx.send(output).is_err() {
                                break;
                            }
                        }
                        Job::Clear => pipeline.clear(),
                    }
                }
                debug!("tracking worker stopped");
            })?;

        info!(capacity, "tracking worker started");
        Ok(Self {
            jobs: Some(job_tx),
            output: out_rx,
            handle: Some(handle),
        })
    }

    /// Queue a frame. Returns `false` when the queue is full and the frame was
    /// dropped.
    pub fn try_submit(&self, frame: Frame) -> bool {
        let Some(jobs) = &self.jobs else {
            return false;
        };
        match jobs.try_send(Job::Frame(frame)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("frame queue full, dropping frame");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("tracking worker is gone, dropping frame");
                false
            }
        }
    }

    /// Reset tracking state once the frames queued so far are processed.
    pub fn clear(&self) {
        if let Some(jobs) = &self.jobs {
            if jobs.send(Job::Clear).is_err() {
                warn!("tracking worker is gone, clear ignored");
            }
        }
    }

    pub fn output(&self) -> &Receiver<FrameOutput> {
        &self.output
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<FrameOutput> {
        match self.output.recv_timeout(timeout) {
            Ok(output) => Some(output),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Close the queue and wait for queued frames to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("tracking worker panicked");
            }
        }
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
