use std::f64::consts::PI;

/// Hann window coefficients.
pub struct Window;

impl Window {
    /// Symmetric Hann window, endpoints at zero.
    pub fn hann_symmetric(len: usize) -> Vec<f64> {
        match len {
            0 => Vec::new(),
            1 => vec![1.0],
            _ => (0..len)
                .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / (len - 1) as f64).cos())
                .collect(),
        }
    }

    /// Periodic Hann window as used for spectral averaging.
    pub fn hann_periodic(len: usize) -> Vec<f64> {
        match len {
            0 => Vec::new(),
            1 => vec![1.0],
            _ => (0..len)
                .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / len as f64).cos())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_window_is_zero_at_both_ends() {
        let window = Window::hann_symmetric(5);
        assert!(window[0].abs() < 1e-12);
        assert!(window[4].abs() < 1e-12);
        assert!((window[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn periodic_window_peaks_at_half_length() {
        let window = Window::hann_periodic(4);
        assert!(window[0].abs() < 1e-12);
        assert!((window[2] - 1.0).abs() < 1e-12);
        assert!((window[1] - 0.5).abs() < 1e-12);
    }
}
