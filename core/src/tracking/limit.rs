/// Outcome of one speed observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmDecision {
    None,
    Arm,
}

/// Tracks the episode peak against the configured limit.
#[derive(Debug, Clone)]
pub struct SpeedLimitMonitor {
    limit: f64,
    peak: f64,
    armed: bool,
}

impl SpeedLimitMonitor {
    pub fn new(limit: f64) -> Self {
        Self {
            limit,
            peak: limit,
            armed: false,
        }
    }

    /// Raises the peak on a new maximum and arms at most once until reset.
    pub fn observe(&mut self, speed: f64) -> ArmDecision {
        if speed.is_nan() || speed <= self.peak {
            return ArmDecision::None;
        }
        self.peak = speed;
        if self.armed {
            return ArmDecision::None;
        }
        self.armed = true;
        ArmDecision::Arm
    }

    pub fn reset(&mut self) {
        self.peak = self.limit;
        self.armed = false;
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
