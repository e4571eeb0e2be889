use crate::math::{FftHelper, MatrixHelper, StatsHelper, Window};
use crate::prelude::Estimate;
use crate::processing::config::EstimatorConfig;
use crate::processing::noise_floor::NoiseFloorTracker;
use crate::processing::welch::WelchEstimator;
use crate::sensor::SweepFrame;
use log::debug;
use ndarray::Axis;

/// Turns sweep frames into speed and distance estimates.
///
/// Speed comes from the highest frequency bin whose normalized amplitude
/// spectral density clears an adaptive threshold; distance comes from the
/// strongest depth bin of the windowed spectrum.
pub struct SpectralSpeedEstimator {
    config: EstimatorConfig,
    welch: WelchEstimator,
    range_fft: FftHelper,
    noise_floor: NoiseFloorTracker,
    update_idx: u64,
    last_nasd: Vec<f64>,
}

impl SpectralSpeedEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        let welch = WelchEstimator::new(config.segment_len, config.fft_length);
        let range_fft = FftHelper::new(config.num_subsweeps);
        let noise_floor = NoiseFloorTracker::new(config.noise_est_tc, config.update_rate);
        Self {
            config,
            welch,
            range_fft,
            noise_floor,
            update_idx: 0,
            last_nasd: Vec::new(),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn noise_floor(&self) -> f64 {
        self.noise_floor.value()
    }

    pub fn update_index(&self) -> u64 {
        self.update_idx
    }

    /// Normalized amplitude spectral density of the last processed frame.
    pub fn spectrum(&self) -> &[f64] {
        &self.last_nasd
    }

    pub fn estimate(&mut self, frame: &SweepFrame) -> Estimate {
        let centered = MatrixHelper::zero_mean_columns(frame.view());

        let asd = self.amplitude_spectrum(&centered);
        let speed = self.detect_speed(&asd);
        let distance = self.strongest_depth(&centered);

        self.update_idx += 1;
        Estimate { speed, distance }
    }

    /// Column-wise PSD reduced by maximum across depths, then square-rooted.
    fn amplitude_spectrum(&mut self, centered: &ndarray::Array2<f64>) -> Vec<f64> {
        let mut psd = vec![0.0f64; self.welch.num_bins()];
        let mut column = Vec::with_capacity(centered.nrows());
        for lane in centered.axis_iter(Axis(1)) {
            column.clear();
            column.extend(lane.iter().copied());
            let column_psd = self.welch.psd(&column);
            for (acc, value) in psd.iter_mut().zip(column_psd) {
                *acc = acc.max(value);
            }
        }
        psd.into_iter().map(f64::sqrt).collect()
    }

    fn detect_speed(&mut self, asd: &[f64]) -> Option<f64> {
        let bins = asd.len();
        let noise_end = bins.saturating_sub(1);
        let noise_start = noise_end.saturating_sub(self.config.noise_est_bins);
        let inst_noise = StatsHelper::mean(&asd[noise_start..noise_end]);
        let floor = self.noise_floor.update(inst_noise, self.update_idx);

        if !(floor.is_finite() && floor > 0.0) {
            debug!("degenerate noise floor {} at update {}", floor, self.update_idx);
            self.last_nasd = vec![0.0; bins];
            return None;
        }

        let nasd: Vec<f64> = asd.iter().map(|value| value / floor).collect();
        let peak = StatsHelper::max(&nasd).unwrap_or(0.0);
        let threshold = self.config.min_threshold.max(peak * self.config.dynamic_threshold);
        let est_idx = nasd.iter().rposition(|&value| value > threshold);
        self.last_nasd = nasd;

        let velocity = match est_idx {
            Some(idx) if idx > 0 => self.config.bin_velocities.get(idx).copied(),
            _ => None,
        }?;

        debug!(
            "bin {:?} velocity {:.3} threshold {:.2} floor {:.4e}",
            est_idx, velocity, threshold, floor
        );

        if velocity < self.config.min_speed {
            return None;
        }
        Some(velocity)
    }

    fn strongest_depth(&mut self, centered: &ndarray::Array2<f64>) -> f64 {
        let window = Window::hann_symmetric(centered.nrows());
        let mut best: Option<(usize, f64)> = None;
        let mut column = Vec::with_capacity(centered.nrows());

        for (depth_idx, lane) in centered.axis_iter(Axis(1)).enumerate() {
            column.clear();
            column.extend(lane.iter().zip(&window).map(|(value, w)| value * w));
            let spectrum = self.range_fft.forward_real(&column);
            for magnitude in spectrum.iter().map(|bin| bin.norm()) {
                match best {
                    Some((_, current)) if magnitude <= current => {}
                    _ => best = Some((depth_idx, magnitude)),
                }
            }
        }

        let depth_idx = best.map_or(0, |(idx, _)| idx);
        self.config
            .depths
            .get(depth_idx)
            .or_else(|| self.config.depths.first())
            .copied()
            .unwrap_or(0.0)
    }
}
