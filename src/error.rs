//! Error taxonomy for the liveness engine.

use thiserror::Error;

/// Errors raised by the liveness verification engine.
///
/// Only session-terminal conditions cross the session controller boundary;
/// per-tick detection failures are absorbed and treated as no-face ticks.
#[derive(Error, Debug)]
pub enum LivenessError {
    #[error("face model failed to load: {0}")]
    ModelLoadFailure(String),

    #[error("camera access denied: {0}")]
    CameraDenied(String),

    #[error("camera failure: {0}")]
    Camera(String),

    #[error("frame detection failed: {0}")]
    DetectionFailed(String),

    #[error("no identity descriptor captured during session")]
    NoDescriptorAtCompletion,

    #[error("descriptor length mismatch: expected {expected}, got {actual}")]
    DescriptorLengthMismatch { expected: usize, actual: usize },

    #[error("session timed out after {0} ticks")]
    Timeout(u64),

    #[error("session cancelled")]
    Cancelled,
}

/// Result type for liveness engine operations.
pub type LivenessResult<T> = Result<T, LivenessError>;
