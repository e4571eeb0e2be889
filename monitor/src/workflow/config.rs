use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use radarcore::capture::CaptureConfig;
use radarcore::processing::ProcessingConfig;
use radarcore::sensor::SensorConfig;
use radarcore::tracking::MotionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// External command used to trigger the camera.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CameraCommand {
    fn default() -> Self {
        Self {
            program: "./captureImage.sh".into(),
            args: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HookCommands {
    pub post_process: String,
    pub notify: String,
}

impl Default for HookCommands {
    fn default() -> Self {
        Self {
            post_process: "./postProcessing.sh".into(),
            notify: "./sendmail.sh".into(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub sensor: SensorConfig,
    pub processing: ProcessingConfig,
    pub motion: MotionConfig,
    pub capture: CaptureConfig,
    /// Directory receiving the report files.
    pub output_dir: PathBuf,
    pub camera: CameraCommand,
    pub hooks: HookCommands,
    pub generator: GeneratorConfig,
}

impl MonitorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading monitor config {}", path_ref.display()))?;
        let config: MonitorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing monitor config {}", path_ref.display()))?;
        Ok(config.normalized())
    }

    /// Reports use the unit the motion thresholds are expressed in.
    pub fn normalized(mut self) -> Self {
        self.capture.unit = self.motion.unit;
        if self.output_dir.as_os_str().is_empty() {
            self.output_dir = PathBuf::from(".");
        }
        self
    }

    pub fn with_overrides(
        mut self,
        sensor: Option<u32>,
        speed_limit: Option<f64>,
        output_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(sensor) = sensor {
            self.sensor.sensor = sensor;
        }
        if let Some(limit) = speed_limit {
            self.capture.speed_limit = limit;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        self.normalized()
    }
}
