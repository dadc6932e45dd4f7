//! Liveness-based face verification engine.
//!
//! Gates wallet withdrawals and face enrollment: in real time, and without a
//! backend round-trip per frame, verifies that a live human is present by
//! sequencing involuntary and voluntary physical challenges, while harvesting
//! an identity descriptor for later 1:1 comparison.
//!
//! ## Modules
//! - `modules::signal_extractor`: per-frame landmark geometry to scalar signals
//! - `modules::checks`: declarative liveness challenge definitions
//! - `modules::state_machine`: ordered check progression with hysteresis
//! - `modules::descriptor`: descriptor buffering and final averaging
//! - `pipeline::session`: tick loop, camera lifecycle, terminal states

pub mod config;
pub mod error;
pub mod modules;
pub mod pipeline;
pub mod utils;

pub use config::config::{ExtractorConfig, LivenessConfig, SessionConfig};
pub use error::{LivenessError, LivenessResult};
pub use modules::checks::{canonical_sequence, CheckDefinition, GoalKind, GoalSpec, SignalPredicate};
pub use modules::descriptor::DescriptorAggregator;
pub use modules::detector::{FrameDetector, FrameSource, VideoFrame};
pub use modules::signal_extractor::{GeometricSignals, SignalExtractor};
pub use modules::state_machine::{AdvanceOutcome, GoalSnapshot, LivenessStateMachine};
pub use pipeline::session::{
    CancelHandle, FaceHint, SessionController, SessionOutcome, SessionSnapshot, Verdict,
};
pub use utils::coordinate::{BoundingBox, Coordinate2D, FaceLandmarks, FrameDetection};
