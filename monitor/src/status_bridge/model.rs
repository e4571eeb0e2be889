use radarcore::capture::{CaptureSession, CaptureState};
use radarcore::telemetry::Metrics;
use radarcore::tracking::MotionUpdate;
use radarcore::Estimate;
use serde::Serialize;

/// Snapshot served to front ends.
#[derive(Debug, Clone, Serialize, Default)]
pub struct StatusModel {
    pub estimate: Option<Estimate>,
    pub motion: Option<MotionUpdate>,
    pub capture_state: CaptureState,
    pub session: Option<CaptureSession>,
    pub peak_speed: f64,
    pub locked: bool,
    pub metrics: Metrics,
}
