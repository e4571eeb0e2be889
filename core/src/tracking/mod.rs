pub mod limit;
pub mod motion;

pub use limit::{ArmDecision, SpeedLimitMonitor};
pub use motion::{MotionConfig, MotionEvent, MotionPhase, MotionStateTracker, MotionUpdate};
