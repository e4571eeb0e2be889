use crate::status_bridge::bridge::StatusBridge;
use crate::workflow::config::MonitorConfig;
use anyhow::Context;
use log::{info, warn};
use radarcore::capture::{
    CaptureOrchestrator, CaptureState, Collaborators, CommandCamera, FileEvidenceStore,
    ScriptHooks,
};
use radarcore::processing::{EstimatorConfig, SpectralSpeedEstimator};
use radarcore::sensor::{SensorClient, Transport};
use radarcore::telemetry::Metrics;
use radarcore::tracking::MotionStateTracker;
use radarcore::SpeedTrap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

pub struct RunSummary {
    pub frames: u64,
    pub metrics: Metrics,
}

#[derive(Clone)]
pub struct Runner {
    config: MonitorConfig,
}

impl Runner {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            camera: Arc::new(CommandCamera::new(
                self.config.camera.program.clone(),
                self.config.camera.args.clone(),
            )),
            store: Arc::new(FileEvidenceStore::new(self.config.output_dir.clone())),
            hooks: Arc::new(ScriptHooks::new(
                self.config.hooks.post_process.clone(),
                self.config.hooks.notify.clone(),
            )),
        }
    }

    /// Runs the polling loop on the calling thread; capture actions run on
    /// `runtime`.
    pub fn execute<T: Transport>(
        &self,
        transport: T,
        collaborators: Option<Collaborators>,
        runtime: &Handle,
        stop: &AtomicBool,
        max_frames: Option<u64>,
        bridge: Option<&StatusBridge>,
    ) -> anyhow::Result<RunSummary> {
        let mut client = SensorClient::new(transport);
        let session = client
            .setup_session(&self.config.sensor)
            .context("setting up sensor session")?;
        info!("{:?}", session);

        let estimator_config = EstimatorConfig::from_session(
            &session,
            self.config.sensor.number_of_subsweeps,
            &self.config.processing,
        )
        .context("building estimator configuration")?;
        let orchestrator = CaptureOrchestrator::new(
            self.config.capture.clone(),
            collaborators.unwrap_or_else(|| self.collaborators()),
            runtime.clone(),
        )
        .context("building capture orchestrator")?;

        let mut trap = SpeedTrap::new(
            SpectralSpeedEstimator::new(estimator_config),
            MotionStateTracker::new(self.config.motion.clone()),
            orchestrator.clone(),
        );
        let metrics = trap.metrics();

        client.start_streaming().context("starting stream")?;
        info!("Streaming started, speed limit {}", self.config.capture.speed_limit);

        let result = trap.run(&mut client, stop, max_frames, |outcome| {
            if let Some(bridge) = bridge {
                bridge.publish(outcome, &orchestrator, metrics.snapshot());
            }
        });

        info!("Disconnecting...");
        if let Err(err) = client.disconnect() {
            warn!("disconnect failed: {}", err);
        }
        let frames = result.context("polling sensor frames")?;

        self.drain(&orchestrator, runtime);
        Ok(RunSummary {
            frames,
            metrics: metrics.snapshot(),
        })
    }

    /// Waits for an in-flight capture session to finish reporting.
    fn drain(&self, orchestrator: &CaptureOrchestrator, runtime: &Handle) {
        if orchestrator.state() == CaptureState::Idle {
            return;
        }
        info!("Waiting for the pending capture report");
        let mut state = orchestrator.subscribe();
        let timeout = self.config.capture.report_delay + Duration::from_secs(60);
        let finished = runtime.block_on(async {
            tokio::time::timeout(
                timeout,
                state.wait_for(|state| *state == CaptureState::Idle),
            )
            .await
            .map(|changed| changed.is_ok())
            .unwrap_or(false)
        });
        if !finished {
            warn!("capture session did not finish within {:?}", timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{GeneratorConfig, SyntheticTransport};
    use radarcore::capture::{CameraDriver, EvidenceStore, ReportHooks};
    use radarcore::PeripheralError;
    use std::path::PathBuf;

    struct NoCamera;

    impl CameraDriver for NoCamera {
        fn capture_image(&self) -> Result<PathBuf, PeripheralError> {
            Err(PeripheralError::Camera("not attached".into()))
        }
    }

    struct Silent;

    impl ReportHooks for Silent {
        fn post_process(&self) -> Result<(), PeripheralError> {
            Ok(())
        }

        fn notify(&self) -> Result<(), PeripheralError> {
            Ok(())
        }
    }

    #[test]
    fn synthetic_pass_is_captured_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MonitorConfig::default().with_overrides(None, Some(4.0), None);
        config.output_dir = dir.path().to_path_buf();
        config.capture.lock_delay = Duration::from_millis(20);
        config.capture.report_delay = Duration::from_millis(60);
        config.generator = GeneratorConfig {
            realtime: false,
            idle_frames: 20,
            pass_frames: 20,
            ..Default::default()
        };

        let runner = Runner::new(config.clone());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let store: Arc<dyn EvidenceStore> =
            Arc::new(FileEvidenceStore::new(dir.path().to_path_buf()));
        let collaborators = Collaborators {
            camera: Arc::new(NoCamera),
            store,
            hooks: Arc::new(Silent),
        };
        let stop = AtomicBool::new(false);

        let summary = runner
            .execute(
                SyntheticTransport::new(config.generator.clone()),
                Some(collaborators),
                runtime.handle(),
                &stop,
                Some(40),
                None,
            )
            .unwrap();

        assert_eq!(summary.frames, 40);
        assert_eq!(summary.metrics.captures, 1);
        let speed = std::fs::read_to_string(dir.path().join("speed.txt")).unwrap();
        assert!(speed.ends_with(" km/h"));
        let limit = std::fs::read_to_string(dir.path().join("speedLimit.txt")).unwrap();
        assert_eq!(limit, "4.0 km/h");
        let direction = std::fs::read_to_string(dir.path().join("direction.txt")).unwrap();
        assert_eq!(direction, "T");
    }
}
