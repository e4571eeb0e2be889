/// Exponentially smoothed noise floor with warm-up correction.
#[derive(Debug, Clone)]
pub struct NoiseFloorTracker {
    static_sf: f64,
    value: f64,
}

impl NoiseFloorTracker {
    /// `time_constant` in seconds, `update_rate` in updates per second.
    pub fn new(time_constant: f64, update_rate: f64) -> Self {
        Self {
            static_sf: Self::smoothing_factor(time_constant, update_rate),
            value: 0.0,
        }
    }

    pub fn smoothing_factor(time_constant: f64, update_rate: f64) -> f64 {
        if time_constant <= 0.0 {
            return 0.0;
        }
        (-1.0 / (time_constant * update_rate)).exp()
    }

    /// Smoothing factor applied at `update_index`; early updates lean on the
    /// fresh observation.
    pub fn dynamic_factor(&self, update_index: u64) -> f64 {
        self.static_sf
            .min(1.0 - 1.0 / (1.0 + update_index as f64))
    }

    pub fn update(&mut self, instantaneous: f64, update_index: u64) -> f64 {
        let sf = self.dynamic_factor(update_index);
        self.value = sf * self.value + (1.0 - sf) * instantaneous;
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn static_factor(&self) -> f64 {
        self.static_sf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_takes_observation_verbatim() {
        let mut tracker = NoiseFloorTracker::new(1.0, 50.0);
        assert_eq!(tracker.dynamic_factor(0), 0.0);
        assert_eq!(tracker.update(3.5, 0), 3.5);
    }

    #[test]
    fn factor_approaches_static_value_for_late_updates() {
        let tracker = NoiseFloorTracker::new(1.0, 50.0);
        let expected = (-1.0f64 / 50.0).exp();
        assert!((tracker.static_factor() - expected).abs() < 1e-15);
        assert_eq!(tracker.dynamic_factor(1_000_000), expected);
        assert!(tracker.dynamic_factor(1) < expected);
    }

    #[test]
    fn non_positive_time_constant_disables_smoothing() {
        let mut tracker = NoiseFloorTracker::new(0.0, 50.0);
        tracker.update(1.0, 0);
        assert_eq!(tracker.update(7.0, 10), 7.0);
    }

    #[test]
    fn repeated_observation_converges() {
        let mut tracker = NoiseFloorTracker::new(1.0, 50.0);
        tracker.update(10.0, 0);
        for idx in 1..500 {
            tracker.update(2.0, idx);
        }
        assert!((tracker.value() - 2.0).abs() < 1e-3);
    }
}
