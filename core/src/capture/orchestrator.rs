//! Single-flight capture sequence.
//!
//! An arm decision schedules three independent deferred actions on the tokio
//! runtime: the image capture right away, the radar lock after `lock_delay`
//! and the report after `report_delay`. Each action runs on its own timer and
//! none of them is awaited by the polling loop.

use crate::capture::collaborators::{CameraDriver, EvidenceStore, ReportHooks};
use crate::capture::context::{lock_context, CaptureSession, CaptureState, EpisodeContext};
use crate::prelude::{ConfigError, Direction, SpeedUnit};
use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Limit in `unit`.
    pub speed_limit: f64,
    pub unit: SpeedUnit,
    #[serde(with = "duration_secs")]
    pub lock_delay: Duration,
    #[serde(with = "duration_secs")]
    pub report_delay: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            speed_limit: 4.0,
            unit: SpeedUnit::KilometersPerHour,
            lock_delay: Duration::from_secs(2),
            report_delay: Duration::from_secs(10),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Side-effect collaborators driven by the capture actions.
#[derive(Clone)]
pub struct Collaborators {
    pub camera: Arc<dyn CameraDriver>,
    pub store: Arc<dyn EvidenceStore>,
    pub hooks: Arc<dyn ReportHooks>,
}

struct Inner {
    config: CaptureConfig,
    context: Mutex<EpisodeContext>,
    collaborators: Collaborators,
    state: watch::Sender<CaptureState>,
    pending: Mutex<Vec<AbortHandle>>,
}

/// Coordinates capture, lock and report for at most one session at a time.
#[derive(Clone)]
pub struct CaptureOrchestrator {
    inner: Arc<Inner>,
    runtime: Handle,
}

impl CaptureOrchestrator {
    pub fn new(
        config: CaptureConfig,
        collaborators: Collaborators,
        runtime: Handle,
    ) -> Result<Self, ConfigError> {
        if config.lock_delay >= config.report_delay {
            return Err(ConfigError::Capture(format!(
                "lock delay {:?} must be shorter than report delay {:?}",
                config.lock_delay, config.report_delay
            )));
        }
        let (state, _) = watch::channel(CaptureState::Idle);
        let inner = Inner {
            context: Mutex::new(EpisodeContext::new(config.speed_limit)),
            config,
            collaborators,
            state,
            pending: Mutex::new(Vec::new()),
        };
        Ok(Self {
            inner: Arc::new(inner),
            runtime,
        })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.inner.config
    }

    /// Observes a speed in the configured unit; returns the session started by it.
    pub fn observe(&self, speed: f64) -> Option<CaptureSession> {
        let session = {
            let mut context = lock_context(&self.inner.context);
            let previous_peak = context.monitor().peak();
            let session = context.observe(speed);
            if context.monitor().peak() > previous_peak {
                info!("Maximal current speed: {:.1}", context.monitor().peak());
            }
            session
        }?;

        info!(
            "Speed limit {} exceeded with {:.1}, starting capture session {}",
            self.inner.config.speed_limit, session.peak_speed, session.id
        );
        self.inner.state.send_replace(CaptureState::Capturing);
        self.schedule(session.id);
        Some(session)
    }

    pub fn record_direction(&self, direction: Direction) {
        lock_context(&self.inner.context).record_direction(direction);
    }

    /// True while the radar is locked and frames must not be interpreted.
    pub fn is_locked(&self) -> bool {
        lock_context(&self.inner.context).is_locked()
    }

    pub fn state(&self) -> CaptureState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.inner.state.subscribe()
    }

    pub fn session(&self) -> Option<CaptureSession> {
        lock_context(&self.inner.context).session().cloned()
    }

    pub fn peak_speed(&self) -> f64 {
        lock_context(&self.inner.context).monitor().peak()
    }

    /// Aborts the pending actions of the active session and returns to idle.
    pub fn cancel(&self) {
        for handle in take_pending(&self.inner) {
            handle.abort();
        }
        lock_context(&self.inner.context).clear();
        self.inner.state.send_replace(CaptureState::Idle);
        info!("Capture session cancelled");
    }

    fn schedule(&self, id: u64) {
        let lock_delay = self.inner.config.lock_delay;
        let report_delay = self.inner.config.report_delay;

        let capture = self.runtime.spawn(capture_image(self.inner.clone()));

        let inner = self.inner.clone();
        let lock = self.runtime.spawn(async move {
            tokio::time::sleep(lock_delay).await;
            lock_radar(&inner, id);
        });

        let inner = self.inner.clone();
        let report = self.runtime.spawn(async move {
            tokio::time::sleep(report_delay).await;
            send_report(inner, id).await;
        });

        let mut pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.clear();
        pending.extend([
            capture.abort_handle(),
            lock.abort_handle(),
            report.abort_handle(),
        ]);
    }
}

fn take_pending(inner: &Inner) -> Vec<AbortHandle> {
    let mut pending = inner
        .pending
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    std::mem::take(&mut *pending)
}

async fn capture_image(inner: Arc<Inner>) {
    let captured_at = Local::now();
    let camera = inner.collaborators.camera.clone();
    match tokio::task::spawn_blocking(move || camera.capture_image()).await {
        Ok(Ok(path)) => {
            info!("Captured image {}", path.display());
            if let Err(err) = inner.collaborators.store.write_capture_time(captured_at) {
                warn!("failed to persist capture time: {}", err);
            }
        }
        Ok(Err(err)) => warn!("image capture failed: {}", err),
        Err(err) => warn!("image capture task failed: {}", err),
    }
}

fn lock_radar(inner: &Inner, id: u64) {
    let Some(direction) = lock_context(&inner.context).lock(id) else {
        return;
    };
    inner.state.send_replace(CaptureState::Locked);
    info!("Lock radar until the report is sent");
    if let Err(err) = inner.collaborators.store.write_direction(direction) {
        warn!("failed to persist direction: {}", err);
    }
}

async fn send_report(inner: Arc<Inner>, id: u64) {
    let Some((peak, limit)) = lock_context(&inner.context).report_values(id) else {
        return;
    };
    let unit = inner.config.unit;
    let store = &inner.collaborators.store;
    if let Err(err) = store.write_speed(peak, unit) {
        warn!("failed to persist speed: {}", err);
    }
    if let Err(err) = store.write_speed_limit(limit, unit) {
        warn!("failed to persist speed limit: {}", err);
    }

    let hooks = inner.collaborators.hooks.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        if let Err(err) = hooks.post_process() {
            warn!("post-processing failed: {}", err);
        }
        if let Err(err) = hooks.notify() {
            warn!("notification failed: {}", err);
        }
    })
    .await;
    if let Err(err) = outcome {
        warn!("report task failed: {}", err);
    }

    if lock_context(&inner.context).finish(id) {
        take_pending(&inner);
        inner.state.send_replace(CaptureState::Idle);
        info!("Release radar lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{PeripheralError, PeripheralResult};
    use chrono::DateTime;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn position(&self, prefix: &str) -> Option<usize> {
            self.events().iter().position(|e| e.starts_with(prefix))
        }

        fn count(&self, prefix: &str) -> usize {
            self.events().iter().filter(|e| e.starts_with(prefix)).count()
        }
    }

    struct FakeCamera {
        recorder: Arc<Recorder>,
        fail: bool,
    }

    impl CameraDriver for FakeCamera {
        fn capture_image(&self) -> PeripheralResult<PathBuf> {
            self.recorder.push("camera");
            if self.fail {
                return Err(PeripheralError::Camera("no camera".into()));
            }
            Ok(PathBuf::from("capt0000.jpg"))
        }
    }

    struct FakeStore(Arc<Recorder>);

    impl EvidenceStore for FakeStore {
        fn write_direction(&self, direction: Option<Direction>) -> PeripheralResult<()> {
            let token = direction.map_or("", Direction::token);
            self.0.push(format!("direction:{}", token));
            Ok(())
        }

        fn write_speed(&self, speed: f64, _unit: SpeedUnit) -> PeripheralResult<()> {
            self.0.push(format!("speed:{:.1}", speed));
            Ok(())
        }

        fn write_speed_limit(&self, limit: f64, _unit: SpeedUnit) -> PeripheralResult<()> {
            self.0.push(format!("limit:{:.1}", limit));
            Ok(())
        }

        fn write_capture_time(&self, _at: DateTime<Local>) -> PeripheralResult<()> {
            self.0.push("capture_time");
            Ok(())
        }
    }

    struct FakeHooks(Arc<Recorder>);

    impl ReportHooks for FakeHooks {
        fn post_process(&self) -> PeripheralResult<()> {
            self.0.push("post");
            Ok(())
        }

        fn notify(&self) -> PeripheralResult<()> {
            self.0.push("notify");
            Ok(())
        }
    }

    fn orchestrator(recorder: &Arc<Recorder>, camera_fails: bool) -> CaptureOrchestrator {
        let collaborators = Collaborators {
            camera: Arc::new(FakeCamera {
                recorder: recorder.clone(),
                fail: camera_fails,
            }),
            store: Arc::new(FakeStore(recorder.clone())),
            hooks: Arc::new(FakeHooks(recorder.clone())),
        };
        CaptureOrchestrator::new(CaptureConfig::default(), collaborators, Handle::current())
            .unwrap()
    }

    async fn wait_idle(orchestrator: &CaptureOrchestrator) {
        let mut state = orchestrator.subscribe();
        state
            .wait_for(|state| *state == CaptureState::Idle)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn lock_is_observable_before_report() {
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&recorder, false);
        orchestrator.record_direction(Direction::Approaching);

        let session = orchestrator.observe(5.0).unwrap();
        assert_eq!(session.direction, Some(Direction::Approaching));
        assert_eq!(orchestrator.state(), CaptureState::Capturing);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(orchestrator.state(), CaptureState::Locked);
        assert!(orchestrator.is_locked());
        assert_eq!(recorder.count("direction:T"), 1);
        assert_eq!(recorder.count("speed:"), 0);

        wait_idle(&orchestrator).await;
        let direction = recorder.position("direction:").unwrap();
        let speed = recorder.position("speed:5.0").unwrap();
        assert!(direction < speed);
        assert!(recorder.position("post").unwrap() < recorder.position("notify").unwrap());
        assert_eq!(recorder.count("limit:4.0"), 1);
        assert_eq!(recorder.count("capture_time"), 1);
        assert!(!orchestrator.is_locked());
        assert_eq!(orchestrator.peak_speed(), 4.0);
        assert!(orchestrator.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rising_speeds_trigger_a_single_sequence() {
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&recorder, false);

        assert!(orchestrator.observe(5.0).is_some());
        for speed in [6.0, 7.0, 8.0, 9.0] {
            assert!(orchestrator.observe(speed).is_none());
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(orchestrator.state(), CaptureState::Locked);
        assert!(orchestrator.observe(12.0).is_none());

        wait_idle(&orchestrator).await;
        assert_eq!(recorder.count("camera"), 1);
        assert_eq!(recorder.count("speed:"), 1);
        assert_eq!(recorder.count("speed:12.0"), 1);

        let next = orchestrator.observe(4.5).unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn camera_failure_does_not_stop_lock_and_report() {
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&recorder, true);

        orchestrator.observe(6.0).unwrap();
        wait_idle(&orchestrator).await;
        assert_eq!(recorder.count("capture_time"), 0);
        assert_eq!(recorder.count("direction:"), 1);
        assert_eq!(recorder.count("speed:6.0"), 1);
        assert_eq!(recorder.count("notify"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_actions() {
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&recorder, false);

        orchestrator.observe(6.0).unwrap();
        orchestrator.cancel();
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(recorder.count("direction:"), 0);
        assert_eq!(recorder.count("speed:"), 0);
        assert_eq!(orchestrator.state(), CaptureState::Idle);
        assert!(orchestrator.observe(5.0).is_some());
    }

    #[tokio::test]
    async fn lock_delay_must_precede_report_delay() {
        let recorder = Arc::new(Recorder::default());
        let collaborators = Collaborators {
            camera: Arc::new(FakeCamera {
                recorder: recorder.clone(),
                fail: false,
            }),
            store: Arc::new(FakeStore(recorder.clone())),
            hooks: Arc::new(FakeHooks(recorder)),
        };
        let config = CaptureConfig {
            lock_delay: Duration::from_secs(10),
            report_delay: Duration::from_secs(10),
            ..CaptureConfig::default()
        };
        let result = CaptureOrchestrator::new(config, collaborators, Handle::current());
        assert!(matches!(result, Err(ConfigError::Capture(_))));
    }
}
