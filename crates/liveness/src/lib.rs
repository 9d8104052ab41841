//! Finger liveness detection.
//!
//! Frames stream in over a WebSocket, pass a skin presence gate, and are
//! scored by six independent signal extractors over a rolling window. The
//! scores are fused into a LIVE/SPOOF decision and spoofs are labelled with
//! an attack type. Each connected client gets its own session state machine.

pub mod capture;
pub mod classifier;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod fusion;
pub mod persist;
pub mod presence;
pub mod publisher;
pub mod queue;
pub mod result;
pub mod server;
pub mod session;
pub mod signals;
pub mod window;

pub use capture::{CaptureSource, StreamCapture};
pub use classifier::{AttackClassifier, AttackRule};
pub use command::Command;
pub use config::{
    ClassifierConfig, FusionConfig, FusionWeights, LivenessConfig, PersistConfig, PresenceConfig,
    ServerConfig, SessionConfig, SignalConfig,
};
pub use driver::SessionDriver;
pub use error::LivenessError;
pub use frame::{Frame, FrameIngest, FrameMeta, FramePayload, Plane};
pub use fusion::{FusionOutcome, ScoreFusion};
pub use persist::{ResultPersister, SavedArtifact};
pub use presence::PresenceGate;
pub use publisher::{ResultPacket, ServerMessage, SideMessage, StreamPublisher};
pub use queue::{EventQueue, SessionEvent};
pub use result::{AttackType, ConfidenceBand, Decision, DetectionResult, SessionState};
pub use server::LivenessServer;
pub use session::{
    CommandOutcome, FrameOutcome, QualityChange, SaveRequest, SessionMachine, SessionStats,
    TickReport,
};
pub use signals::{SignalExtractors, SignalScores};
pub use window::FrameWindow;
