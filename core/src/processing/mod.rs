pub mod config;
pub mod noise_floor;
pub mod speed;
pub mod welch;

pub use config::{EstimatorConfig, ProcessingConfig, HALF_WAVELENGTH};
pub use noise_floor::NoiseFloorTracker;
pub use speed::SpectralSpeedEstimator;
pub use welch::WelchEstimator;
