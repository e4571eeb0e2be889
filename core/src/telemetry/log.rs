use crate::prelude::SpeedUnit;
use crate::tracking::{MotionEvent, MotionUpdate};
use log::info;

/// Operator-facing speed and episode lines.
pub struct LogManager {
    unit: SpeedUnit,
}

impl LogManager {
    pub fn new(unit: SpeedUnit) -> Self {
        Self { unit }
    }

    pub fn format_motion(&self, update: &MotionUpdate) -> Option<String> {
        match update.event {
            MotionEvent::Moving => {
                let speed = update.speed?;
                let direction = update.direction.map(|d| d.to_string()).unwrap_or_default();
                Some(format!(
                    "Speed: {:.1}{} in {:.1}m {}",
                    speed,
                    self.unit.label(),
                    update.distance,
                    direction
                ))
            }
            MotionEvent::EpisodeEnded => Some("No movement".to_string()),
            MotionEvent::Idle => None,
        }
    }

    pub fn record(&self, update: &MotionUpdate) {
        if let Some(line) = self.format_motion(update) {
            info!("{}", line.trim_end());
        }
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new(SpeedUnit::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Direction;

    #[test]
    fn moving_update_formats_speed_line() {
        let manager = LogManager::default();
        let update = MotionUpdate {
            speed: Some(12.34),
            distance: 2.56,
            direction: Some(Direction::Approaching),
            latched: None,
            event: MotionEvent::Moving,
        };
        assert_eq!(
            manager.format_motion(&update).unwrap(),
            "Speed: 12.3km/h in 2.6m approaching"
        );
    }

    #[test]
    fn idle_update_is_silent() {
        let manager = LogManager::default();
        let update = MotionUpdate {
            speed: None,
            distance: 2.0,
            direction: None,
            latched: None,
            event: MotionEvent::Idle,
        };
        assert!(manager.format_motion(&update).is_none());
    }
}
