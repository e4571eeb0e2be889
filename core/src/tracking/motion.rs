use crate::prelude::{Direction, SpeedUnit};
use serde::{Deserialize, Serialize};

/// Episode thresholds, expressed in `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub unit: SpeedUnit,
    pub movement_threshold: f64,
    pub no_movement_threshold: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            unit: SpeedUnit::KilometersPerHour,
            movement_threshold: 0.2,
            no_movement_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPhase {
    NoTarget,
    Tracking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionEvent {
    Idle,
    Moving,
    EpisodeEnded,
}

/// Result of feeding one estimate to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionUpdate {
    /// Speed in display units.
    pub speed: Option<f64>,
    pub distance: f64,
    /// Direction classified on this frame, set only on `Moving`.
    pub direction: Option<Direction>,
    /// Direction latched for the episode on this frame.
    pub latched: Option<Direction>,
    pub event: MotionEvent,
}

/// Hysteresis state machine over successive estimates.
#[derive(Debug, Clone)]
pub struct MotionStateTracker {
    config: MotionConfig,
    phase: MotionPhase,
    last_speed: Option<f64>,
    last_distance: f64,
    current: Direction,
    direction_recorded: bool,
}

impl MotionStateTracker {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            phase: MotionPhase::NoTarget,
            last_speed: None,
            last_distance: 0.0,
            current: Direction::Unknown,
            direction_recorded: false,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    pub fn current_direction(&self) -> Direction {
        self.current
    }

    pub fn last_speed(&self) -> Option<f64> {
        self.last_speed
    }

    pub fn last_distance(&self) -> f64 {
        self.last_distance
    }

    pub fn direction_recorded(&self) -> bool {
        self.direction_recorded
    }

    /// Allows the next classification to latch again.
    pub fn clear_latch(&mut self) {
        self.direction_recorded = false;
    }

    /// `speed_mps` is converted to the configured unit before any comparison.
    pub fn update(&mut self, speed_mps: Option<f64>, distance: f64) -> MotionUpdate {
        let speed = speed_mps.map(|value| value * self.config.unit.scale());
        let mut update = MotionUpdate {
            speed,
            distance,
            direction: None,
            latched: None,
            event: MotionEvent::Idle,
        };

        // an undefined speed never crosses either threshold
        let Some(speed) = speed else {
            return update;
        };

        let was_tracking = self.phase == MotionPhase::Tracking;
        let changed = self.last_speed != Some(speed) || distance != self.last_distance;

        if speed > self.config.movement_threshold && changed {
            let direction = self.classify(distance);
            if !self.direction_recorded
                && matches!(direction, Direction::Approaching | Direction::Receding)
            {
                self.direction_recorded = true;
                update.latched = Some(direction);
            }
            self.current = direction;
            self.last_speed = Some(speed);
            self.last_distance = distance;
            self.phase = MotionPhase::Tracking;
            update.direction = Some(direction);
            update.event = MotionEvent::Moving;
        } else if speed < self.config.no_movement_threshold && self.last_speed != Some(0.0) {
            self.reset();
            if was_tracking {
                update.event = MotionEvent::EpisodeEnded;
            }
        }

        if !was_tracking && self.phase == MotionPhase::NoTarget {
            // reference for classifying the first moving frame
            self.last_distance = distance;
        }
        update
    }

    fn classify(&self, distance: f64) -> Direction {
        if self.last_distance == 0.0 {
            Direction::Unknown
        } else if distance > self.last_distance {
            Direction::Receding
        } else if distance < self.last_distance {
            Direction::Approaching
        } else {
            Direction::Stationary
        }
    }

    fn reset(&mut self) {
        self.phase = MotionPhase::NoTarget;
        self.last_speed = None;
        self.last_distance = 0.0;
        self.current = Direction::Unknown;
        self.direction_recorded = false;
    }
}
