use crate::prelude::Direction;
use crate::tracking::{ArmDecision, SpeedLimitMonitor};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lifecycle of the single capture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
    Locked,
}

/// Evidence sequence started by an over-limit detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureSession {
    pub id: u64,
    pub peak_speed: f64,
    pub direction: Option<Direction>,
    pub state: CaptureState,
    pub started_at: DateTime<Local>,
}

/// State shared by the polling loop and the deferred capture actions.
///
/// Every field is read and written under one mutex so that arming is a single
/// atomic check-and-set.
#[derive(Debug)]
pub struct EpisodeContext {
    monitor: SpeedLimitMonitor,
    locked: bool,
    direction: Option<Direction>,
    session: Option<CaptureSession>,
    next_session_id: u64,
}

impl EpisodeContext {
    pub fn new(speed_limit: f64) -> Self {
        Self {
            monitor: SpeedLimitMonitor::new(speed_limit),
            locked: false,
            direction: None,
            session: None,
            next_session_id: 1,
        }
    }

    /// Feeds `speed` to the monitor and opens a session if it arms while idle.
    pub fn observe(&mut self, speed: f64) -> Option<CaptureSession> {
        let decision = self.monitor.observe(speed);
        let peak = self.monitor.peak();
        if let Some(session) = self.session.as_mut() {
            session.peak_speed = peak;
            return None;
        }
        if decision != ArmDecision::Arm {
            return None;
        }

        let session = CaptureSession {
            id: self.next_session_id,
            peak_speed: peak,
            direction: self.direction,
            state: CaptureState::Capturing,
            started_at: Local::now(),
        };
        self.next_session_id += 1;
        self.session = Some(session.clone());
        Some(session)
    }

    pub fn record_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
        if let Some(session) = self.session.as_mut() {
            if session.state == CaptureState::Capturing {
                session.direction = Some(direction);
            }
        }
    }

    /// Locks the radar for session `id`, returning the direction to persist.
    pub fn lock(&mut self, id: u64) -> Option<Option<Direction>> {
        let session = self.session.as_mut().filter(|session| session.id == id)?;
        let latched = self.direction.take();
        self.locked = true;
        session.direction = latched.or(session.direction);
        session.state = CaptureState::Locked;
        Some(session.direction)
    }

    /// Peak and limit to report for session `id`.
    pub fn report_values(&self, id: u64) -> Option<(f64, f64)> {
        self.session
            .as_ref()
            .filter(|session| session.id == id)
            .map(|_| (self.monitor.peak(), self.monitor.limit()))
    }

    /// Ends session `id`, restoring the monitor and releasing the radar.
    pub fn finish(&mut self, id: u64) -> bool {
        if self.session.as_ref().map(|session| session.id) != Some(id) {
            return false;
        }
        self.clear();
        true
    }

    pub fn clear(&mut self) {
        self.session = None;
        self.monitor.reset();
        self.locked = false;
        self.direction = None;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn monitor(&self) -> &SpeedLimitMonitor {
        &self.monitor
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }
}

pub(crate) fn lock_context(context: &Mutex<EpisodeContext>) -> MutexGuard<'_, EpisodeContext> {
    context.lock().unwrap_or_else(PoisonError::into_inner)
}
