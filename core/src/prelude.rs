use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimate produced for one sweep frame.
///
/// `speed` is `None` when the frame carried no confident detection; the
/// distance is always defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Radial speed in m/s.
    pub speed: Option<f64>,
    /// Range to the strongest reflector in metres.
    pub distance: f64,
}

/// Motion direction relative to the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Approaching,
    Receding,
    Stationary,
    #[default]
    Unknown,
}

impl Direction {
    /// Single-character token consumed by the post-processing scripts.
    pub fn token(self) -> &'static str {
        match self {
            Direction::Approaching => "T",
            Direction::Receding => "A",
            Direction::Stationary | Direction::Unknown => "",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::Approaching => "approaching",
            Direction::Receding => "receding",
            Direction::Stationary => "stationary",
            Direction::Unknown => "",
        };
        f.write_str(label)
    }
}

/// Unit used for thresholds, limits and persisted reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    MetersPerSecond,
    #[default]
    KilometersPerHour,
    MilesPerHour,
}

impl SpeedUnit {
    pub fn label(self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::MilesPerHour => "mph",
        }
    }

    /// Factor converting m/s into this unit.
    pub fn scale(self) -> f64 {
        match self {
            SpeedUnit::MetersPerSecond => 1.0,
            SpeedUnit::KilometersPerHour => 3.6,
            SpeedUnit::MilesPerHour => 2.237,
        }
    }
}

/// Sensor client precondition or transport failure.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("can't setup session while streaming")]
    SessionWhileStreaming,
    #[error("session needs to be set up before starting stream")]
    SessionNotSetUp,
    #[error("already streaming")]
    AlreadyStreaming,
    #[error("must be streaming to get next")]
    NotStreaming,
    #[error("stream exhausted")]
    EndOfStream,
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Failure of a side-effect collaborator (camera, storage, scripts).
#[derive(thiserror::Error, Debug)]
pub enum PeripheralError {
    #[error("camera failure: {0}")]
    Camera(String),
    #[error("storage failure: {0}")]
    Storage(#[from] std::io::Error),
    #[error("hook `{command}` failed: {reason}")]
    Hook { command: String, reason: String },
}

/// Invalid construction parameters.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid estimator configuration: {0}")]
    Estimator(String),
    #[error("invalid capture configuration: {0}")]
    Capture(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
pub type PeripheralResult<T> = Result<T, PeripheralError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_tokens_match_report_format() {
        assert_eq!(Direction::Approaching.token(), "T");
        assert_eq!(Direction::Receding.token(), "A");
        assert_eq!(Direction::Unknown.token(), "");
        assert_eq!(Direction::Stationary.token(), "");
    }

    #[test]
    fn speed_unit_scales_from_meters_per_second() {
        assert_eq!(SpeedUnit::KilometersPerHour.scale(), 3.6);
        assert_eq!(SpeedUnit::MilesPerHour.label(), "mph");
    }
}
