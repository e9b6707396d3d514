//! Engine error type.

/// Error type for cue engine operations.
///
/// Only `record` can fail; every other operation is total and treats
/// references to unknown cues or channels as no-ops.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
