//! Per-frame processing and the polling loop.

use crate::capture::{CaptureOrchestrator, CaptureSession};
use crate::prelude::{ClientError, ClientResult, Estimate};
use crate::processing::SpectralSpeedEstimator;
use crate::sensor::{FrameSource, SweepFrame};
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::tracking::{MotionStateTracker, MotionUpdate};
use log::{debug, info};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything derived from one interpreted frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub estimate: Estimate,
    pub motion: MotionUpdate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub armed: Option<CaptureSession>,
}

#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// Frame read while the radar was locked, not interpreted.
    Skipped,
    Processed(FrameReport),
}

/// Estimator, motion tracker and capture orchestrator wired in frame order.
pub struct SpeedTrap {
    estimator: SpectralSpeedEstimator,
    tracker: MotionStateTracker,
    orchestrator: CaptureOrchestrator,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl SpeedTrap {
    pub fn new(
        estimator: SpectralSpeedEstimator,
        tracker: MotionStateTracker,
        orchestrator: CaptureOrchestrator,
    ) -> Self {
        let logger = LogManager::new(tracker.config().unit);
        Self {
            estimator,
            tracker,
            orchestrator,
            logger,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn orchestrator(&self) -> &CaptureOrchestrator {
        &self.orchestrator
    }

    pub fn tracker(&self) -> &MotionStateTracker {
        &self.tracker
    }

    pub fn estimator(&self) -> &SpectralSpeedEstimator {
        &self.estimator
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn process_frame(&mut self, frame: &SweepFrame) -> FrameOutcome {
        if self.orchestrator.is_locked() {
            self.tracker.clear_latch();
            self.metrics.record_skipped();
            return FrameOutcome::Skipped;
        }

        let estimate = self.estimator.estimate(frame);
        let motion = self.tracker.update(estimate.speed, estimate.distance);
        if let Some(direction) = motion.latched {
            debug!("episode direction latched: {}", direction);
            self.orchestrator.record_direction(direction);
        }
        self.logger.record(&motion);

        let armed = motion
            .speed
            .and_then(|speed| self.orchestrator.observe(speed));
        if armed.is_some() {
            self.metrics.record_capture();
        }
        self.metrics.record_processed(estimate.speed.is_some());

        FrameOutcome::Processed(FrameReport {
            estimate,
            motion,
            armed,
        })
    }

    /// Reads and processes frames in arrival order until `stop` is raised,
    /// `max_frames` is reached or the source ends.
    ///
    /// Client errors other than the end of the stream terminate the loop and
    /// are returned.
    pub fn run<S, F>(
        &mut self,
        source: &mut S,
        stop: &AtomicBool,
        max_frames: Option<u64>,
        mut on_frame: F,
    ) -> ClientResult<u64>
    where
        S: FrameSource,
        F: FnMut(&FrameOutcome),
    {
        let mut processed = 0u64;
        while !stop.load(Ordering::Relaxed) {
            if max_frames.is_some_and(|limit| processed >= limit) {
                break;
            }
            let (_info, frame) = match source.next_frame() {
                Ok(next) => next,
                Err(ClientError::EndOfStream) => {
                    info!("frame source exhausted");
                    break;
                }
                Err(err) => return Err(err),
            };
            let outcome = self.process_frame(&frame);
            on_frame(&outcome);
            processed += 1;
        }
        Ok(processed)
    }
}
