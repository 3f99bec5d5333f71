//! Error types for upload intake.

use pressroom_core::SessionId;
use thiserror::Error;

/// Intake error type.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("chunk index {index} out of range (session expects {expected} chunks)")]
    InvalidChunkIndex { index: u32, expected: u32 },

    #[error("chunk {index} is empty")]
    EmptyChunk { index: u32 },

    #[error("upload incomplete: missing chunk indices {missing:?}")]
    IncompleteUpload { missing: Vec<u32> },

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session already merged: {0}")]
    AlreadyMerged(SessionId),

    #[error("session metadata corrupt: {0}")]
    SessionCorrupt(String),

    #[error("file failed verification: {reasons:?}")]
    VerificationFailed { reasons: Vec<String> },

    #[error(transparent)]
    Core(#[from] pressroom_core::Error),

    #[error(transparent)]
    Verify(#[from] pressroom_verify::VerifyError),

    #[error(transparent)]
    Vault(#[from] pressroom_vault::VaultError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for intake operations.
pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
