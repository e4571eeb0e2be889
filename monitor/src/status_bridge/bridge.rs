use crate::status_bridge::model::StatusModel;
use log::info;
use radarcore::capture::CaptureOrchestrator;
use radarcore::telemetry::Metrics;
use radarcore::FrameOutcome;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use warp::Filter;

/// HTTP endpoint exposing the latest estimate and capture state.
pub struct StatusBridge {
    state: Arc<RwLock<StatusModel>>,
}

impl StatusBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StatusModel::default())),
        }
    }

    /// Serves `GET /status` on `addr` from the given runtime.
    pub fn serve(&self, runtime: &Handle, addr: SocketAddr) {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());
        let status_route = warp::path("status")
            .and(warp::get())
            .and(state_filter)
            .map(|state: Arc<RwLock<StatusModel>>| {
                let model = state.read().unwrap_or_else(PoisonError::into_inner).clone();
                warp::reply::json(&model)
            });

        runtime.spawn(async move {
            info!("status bridge listening on http://{}/status", addr);
            warp::serve(status_route).run(addr).await;
        });
    }

    pub fn publish(
        &self,
        outcome: &FrameOutcome,
        orchestrator: &CaptureOrchestrator,
        metrics: Metrics,
    ) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let FrameOutcome::Processed(report) = outcome {
            guard.estimate = Some(report.estimate);
            guard.motion = Some(report.motion);
        }
        guard.capture_state = orchestrator.state();
        guard.session = orchestrator.session();
        guard.peak_speed = orchestrator.peak_speed();
        guard.locked = orchestrator.is_locked();
        guard.metrics = metrics;
    }

    pub fn snapshot(&self) -> StatusModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for StatusBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radarcore::capture::{
        CaptureConfig, CaptureState, Collaborators, CommandCamera, FileEvidenceStore,
        ScriptHooks,
    };
    use radarcore::tracking::{MotionEvent, MotionUpdate};
    use radarcore::{Direction, Estimate, FrameReport};

    #[tokio::test]
    async fn publish_updates_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(
            CaptureConfig::default(),
            Collaborators {
                camera: Arc::new(CommandCamera::new("true", Vec::new())),
                store: Arc::new(FileEvidenceStore::new(dir.path())),
                hooks: Arc::new(ScriptHooks::new("true", "true")),
            },
            Handle::current(),
        )
        .unwrap();
        let bridge = StatusBridge::new();
        let outcome = FrameOutcome::Processed(FrameReport {
            estimate: Estimate {
                speed: Some(1.5),
                distance: 2.4,
            },
            motion: MotionUpdate {
                speed: Some(5.4),
                distance: 2.4,
                direction: Some(Direction::Receding),
                latched: Some(Direction::Receding),
                event: MotionEvent::Moving,
            },
            armed: None,
        });

        bridge.publish(&outcome, &orchestrator, Metrics::default());
        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.estimate.unwrap().speed, Some(1.5));
        assert_eq!(snapshot.capture_state, CaptureState::Idle);
        assert_eq!(snapshot.peak_speed, 4.0);
        assert!(!snapshot.locked);

        bridge.publish(&FrameOutcome::Skipped, &orchestrator, Metrics::default());
        assert_eq!(bridge.snapshot().motion.unwrap().event, MotionEvent::Moving);
    }
}
