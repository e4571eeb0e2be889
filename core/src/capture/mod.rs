pub mod collaborators;
pub mod context;
pub mod orchestrator;

pub use collaborators::{
    CameraDriver, CommandCamera, EvidenceStore, FileEvidenceStore, ReportHooks, ScriptHooks,
};
pub use context::{CaptureSession, CaptureState, EpisodeContext};
pub use orchestrator::{CaptureConfig, CaptureOrchestrator, Collaborators};
