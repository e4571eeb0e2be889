pub mod client;
pub mod frame;

pub use client::{ConnectInfo, FrameSource, SensorClient, Transport};
pub use frame::{FrameInfo, FrameRecord, SensorConfig, SessionInfo, SweepFrame};
