//! Averaged-periodogram power spectral density.
//!
//! Segments overlap by half their length, are weighted with a periodic Hann
//! window and zero padded to the transform length. Output is one-sided and
//! density scaled for a unit sample rate.

use crate::math::{FftHelper, Window};

pub struct WelchEstimator {
    segment_len: usize,
    step: usize,
    window: Vec<f64>,
    scale: f64,
    fft: FftHelper,
    segment: Vec<f64>,
}

impl WelchEstimator {
    pub fn new(segment_len: usize, fft_length: usize) -> Self {
        let segment_len = segment_len.max(1);
        let overlap = segment_len / 2;
        let window = Window::hann_periodic(segment_len);
        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let scale = if window_power > 0.0 {
            1.0 / window_power
        } else {
            0.0
        };
        Self {
            segment_len,
            step: segment_len - overlap,
            window,
            scale,
            fft: FftHelper::new(fft_length.max(segment_len)),
            segment: vec![0.0; segment_len],
        }
    }

    pub fn num_bins(&self) -> usize {
        self.fft.onesided_len()
    }

    /// Number of averaged segments for a signal of `len` samples.
    pub fn num_segments(&self, len: usize) -> usize {
        if len < self.segment_len {
            1
        } else {
            (len - self.segment_len) / self.step + 1
        }
    }

    /// One-sided PSD of `signal`; length is `num_bins()`.
    pub fn psd(&mut self, signal: &[f64]) -> Vec<f64> {
        let bins = self.num_bins();
        let fft_len = self.fft.len();
        let segments = self.num_segments(signal.len());
        let mut accumulated = vec![0.0; bins];

        for segment_idx in 0..segments {
            let start = segment_idx * self.step;
            for (offset, slot) in self.segment.iter_mut().enumerate() {
                let sample = signal.get(start + offset).copied().unwrap_or(0.0);
                *slot = sample * self.window[offset];
            }
            let spectrum = self.fft.forward_real(&self.segment);
            for (acc, value) in accumulated.iter_mut().zip(spectrum) {
                *acc += value.norm_sqr();
            }
        }

        let norm = self.scale / segments as f64;
        for (bin, value) in accumulated.iter_mut().enumerate() {
            *value *= norm;
            let nyquist = fft_len % 2 == 0 && bin == bins - 1;
            if bin != 0 && !nyquist {
                *value *= 2.0;
            }
        }
        accumulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_count_follows_half_overlap() {
        let estimator = WelchEstimator::new(128, 256);
        assert_eq!(estimator.num_segments(256), 3);
        assert_eq!(estimator.num_bins(), 129);
    }

    #[test]
    fn psd_peaks_at_tone_frequency() {
        let n = 64;
        let mut estimator = WelchEstimator::new(n / 2, n);
        // bin 10 of a 64-point transform
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * 10.0 * i as f64 / n as f64).sin())
            .collect();
        let psd = estimator.psd(&signal);
        let peak = crate::math::StatsHelper::argmax(&psd);
        assert_eq!(peak, Some(10));
    }

    #[test]
    fn psd_of_silence_is_zero() {
        let mut estimator = WelchEstimator::new(16, 32);
        let psd = estimator.psd(&[0.0; 32]);
        assert!(psd.iter().all(|&v| v == 0.0));
    }
}
