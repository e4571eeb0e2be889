//! Speed estimation and capture-trigger core for the radarcat speed trap.
//!
//! Sparse radar sweeps are turned into speed and range estimates, tracked into
//! motion episodes, and over-limit episodes start a single-flight evidence
//! capture sequence.

pub mod capture;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod sensor;
pub mod telemetry;
pub mod tracking;

pub use pipeline::{FrameOutcome, FrameReport, SpeedTrap};
pub use prelude::{ClientError, ConfigError, Direction, Estimate, PeripheralError, SpeedUnit};
