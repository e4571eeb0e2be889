use crate::prelude::{Direction, PeripheralError, PeripheralResult, SpeedUnit};
use chrono::{DateTime, Local};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DIRECTION_FILE: &str = "direction.txt";
pub const SPEED_FILE: &str = "speed.txt";
pub const SPEED_LIMIT_FILE: &str = "speedLimit.txt";
pub const CAPTURE_TIME_FILE: &str = "captureDateTime.txt";

/// Camera used for photographic evidence.
pub trait CameraDriver: Send + Sync {
    fn capture_image(&self) -> PeripheralResult<PathBuf>;
}

/// Durable storage for the values consumed by the report scripts.
pub trait EvidenceStore: Send + Sync {
    fn write_direction(&self, direction: Option<Direction>) -> PeripheralResult<()>;
    fn write_speed(&self, speed: f64, unit: SpeedUnit) -> PeripheralResult<()>;
    fn write_speed_limit(&self, limit: f64, unit: SpeedUnit) -> PeripheralResult<()>;
    fn write_capture_time(&self, at: DateTime<Local>) -> PeripheralResult<()>;
}

/// External post-processing and notification steps.
pub trait ReportHooks: Send + Sync {
    fn post_process(&self) -> PeripheralResult<()>;
    fn notify(&self) -> PeripheralResult<()>;
}

pub fn format_speed(speed: f64, unit: SpeedUnit) -> String {
    format!("{:.1} {}", speed, unit.label())
}

pub fn format_capture_time(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Writes each value as a one-line text file inside `dir`.
#[derive(Debug, Clone)]
pub struct FileEvidenceStore {
    dir: PathBuf,
}

impl FileEvidenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, name: &str, contents: &str) -> PeripheralResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(name), contents)?;
        Ok(())
    }
}

impl EvidenceStore for FileEvidenceStore {
    fn write_direction(&self, direction: Option<Direction>) -> PeripheralResult<()> {
        let token = direction.map_or("", Direction::token);
        info!("Write movement to file: {:?}", token);
        self.write(DIRECTION_FILE, token)
    }

    fn write_speed(&self, speed: f64, unit: SpeedUnit) -> PeripheralResult<()> {
        info!("Write max speed to file: {}", speed);
        self.write(SPEED_FILE, &format_speed(speed, unit))
    }

    fn write_speed_limit(&self, limit: f64, unit: SpeedUnit) -> PeripheralResult<()> {
        info!("Write speed limit to file: {}", limit);
        self.write(SPEED_LIMIT_FILE, &format_speed(limit, unit))
    }

    fn write_capture_time(&self, at: DateTime<Local>) -> PeripheralResult<()> {
        info!("Write capture date/time to file");
        self.write(CAPTURE_TIME_FILE, &format_capture_time(at))
    }
}

fn run_command(program: &str, args: &[String]) -> PeripheralResult<std::process::Output> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|err| PeripheralError::Hook {
            command: program.to_string(),
            reason: err.to_string(),
        })?;
    if !output.status.success() {
        return Err(PeripheralError::Hook {
            command: program.to_string(),
            reason: format!("exited with {}", output.status),
        });
    }
    Ok(output)
}

/// Camera triggered through an external command that prints the saved
/// image path as the last line of its output.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl CameraDriver for CommandCamera {
    fn capture_image(&self) -> PeripheralResult<PathBuf> {
        info!("Capture image");
        let output = run_command(&self.program, &self.args)
            .map_err(|err| PeripheralError::Camera(err.to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| PeripheralError::Camera("capture reported no file".into()))?;
        info!("Camera file path: {}", path);
        Ok(PathBuf::from(path))
    }
}

/// Runs the post-processing and notification scripts without arguments.
#[derive(Debug, Clone)]
pub struct ScriptHooks {
    post_process: String,
    notify: String,
}

impl ScriptHooks {
    pub fn new(post_process: impl Into<String>, notify: impl Into<String>) -> Self {
        Self {
            post_process: post_process.into(),
            notify: notify.into(),
        }
    }
}

impl Default for ScriptHooks {
    fn default() -> Self {
        Self::new("./postProcessing.sh", "./sendmail.sh")
    }
}

impl ReportHooks for ScriptHooks {
    fn post_process(&self) -> PeripheralResult<()> {
        info!("Start post-processing");
        run_command(&self.post_process, &[]).map(|_| ())
    }

    fn notify(&self) -> PeripheralResult<()> {
        info!("Send report");
        run_command(&self.notify, &[]).map(|_| ())
    }
}
