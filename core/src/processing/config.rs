use crate::math::StatsHelper;
use crate::prelude::ConfigError;
use crate::sensor::SessionInfo;
use serde::{Deserialize, Serialize};

/// Radar half wavelength in metres.
pub const HALF_WAVELENGTH: f64 = 2.445e-3;

/// Operator-facing processing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Speeds below this value (m/s) are treated as noise.
    pub min_speed: f64,
    pub fft_oversampling: usize,
    pub noise_est_bins: usize,
    /// Noise-floor smoothing time constant in seconds.
    pub noise_est_tc: f64,
    pub min_threshold: f64,
    pub dynamic_threshold: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_speed: 0.2,
            fft_oversampling: 2,
            noise_est_bins: 3,
            noise_est_tc: 1.0,
            min_threshold: 2.5,
            dynamic_threshold: 0.1,
        }
    }
}

/// Parameters fixed when the estimator is built.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    pub num_subsweeps: usize,
    pub num_depths: usize,
    pub segment_len: usize,
    pub fft_length: usize,
    pub noise_est_bins: usize,
    pub min_speed: f64,
    pub min_threshold: f64,
    pub dynamic_threshold: f64,
    pub noise_est_tc: f64,
    /// Estimates per second.
    pub update_rate: f64,
    pub half_wavelength: f64,
    /// Velocity (m/s) of each one-sided frequency bin.
    pub bin_velocities: Vec<f64>,
    /// Distance (m) of each depth bin.
    pub depths: Vec<f64>,
}

impl EstimatorConfig {
    pub fn from_session(
        session: &SessionInfo,
        num_subsweeps: usize,
        processing: &ProcessingConfig,
    ) -> Result<Self, ConfigError> {
        if num_subsweeps < 4 {
            return Err(ConfigError::Estimator(format!(
                "need at least 4 subsweeps, got {}",
                num_subsweeps
            )));
        }
        if processing.fft_oversampling == 0 {
            return Err(ConfigError::Estimator(
                "fft oversampling must be positive".into(),
            ));
        }
        if session.actual_subsweep_rate <= 0.0 {
            return Err(ConfigError::Estimator(format!(
                "subsweep rate must be positive, got {}",
                session.actual_subsweep_rate
            )));
        }

        let num_depths = session.data_length / num_subsweeps;
        if num_depths == 0 {
            return Err(ConfigError::Estimator(format!(
                "data length {} holds no depth bins for {} subsweeps",
                session.data_length, num_subsweeps
            )));
        }

        let segment_len = num_subsweeps / 2;
        let fft_length = segment_len * processing.fft_oversampling;
        let num_bins = fft_length / 2 + 1;
        if processing.noise_est_bins == 0 || processing.noise_est_bins + 1 >= num_bins {
            return Err(ConfigError::Estimator(format!(
                "noise window of {} bins does not fit {} frequency bins",
                processing.noise_est_bins, num_bins
            )));
        }

        let subsweep_rate = session.actual_subsweep_rate;
        let bin_velocities = (0..num_bins)
            .map(|bin| bin as f64 / fft_length as f64 * subsweep_rate * HALF_WAVELENGTH)
            .collect();
        let range_end = session.actual_range_start + session.actual_range_length;
        let depths = StatsHelper::linspace(session.actual_range_start, range_end, num_depths);

        Ok(Self {
            num_subsweeps,
            num_depths,
            segment_len,
            fft_length,
            noise_est_bins: processing.noise_est_bins,
            min_speed: processing.min_speed,
            min_threshold: processing.min_threshold,
            dynamic_threshold: processing.dynamic_threshold,
            noise_est_tc: processing.noise_est_tc,
            update_rate: subsweep_rate / num_subsweeps as f64,
            half_wavelength: HALF_WAVELENGTH,
            bin_velocities,
            depths,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.bin_velocities.len()
    }

    /// Velocity spacing between neighbouring frequency bins.
    pub fn bin_resolution(&self) -> f64 {
        self.bin_velocities.get(1).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionInfo {
        SessionInfo {
            actual_subsweep_rate: 6_000.0,
            actual_range_start: 2.1,
            actual_range_length: 0.9,
            data_length: 64 * 10,
        }
    }

    #[test]
    fn config_derives_lookup_tables_from_session() {
        let cfg = EstimatorConfig::from_session(&session(), 64, &ProcessingConfig::default())
            .unwrap();
        assert_eq!(cfg.segment_len, 32);
        assert_eq!(cfg.fft_length, 64);
        assert_eq!(cfg.num_bins(), 33);
        assert_eq!(cfg.depths.len(), 10);
        assert!((cfg.depths[9] - 3.0).abs() < 1e-12);
        assert!((cfg.update_rate - 93.75).abs() < 1e-12);
        let expected = 6_000.0 / 64.0 * HALF_WAVELENGTH;
        assert!((cfg.bin_resolution() - expected).abs() < 1e-12);
    }

    #[test]
    fn config_rejects_session_without_depths() {
        let mut info = session();
        info.data_length = 10;
        let err = EstimatorConfig::from_session(&info, 64, &ProcessingConfig::default());
        assert!(matches!(err, Err(ConfigError::Estimator(_))));
    }
}
