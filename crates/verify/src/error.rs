//! Error types for integrity verification.

use thiserror::Error;

/// Verification error type.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("media probe failed: {0}")]
    ProbeFailed(String),

    #[error("media probe timed out after {timeout_secs}s")]
    ProbeTimeout { timeout_secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for verification operations.
pub type VerifyResult<T> = std::result::Result<T, VerifyError>;
