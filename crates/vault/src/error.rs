//! Error types for the reference vault.

use thiserror::Error;

/// Vault error type.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("key material error: {0}")]
    KeyMaterial(String),

    #[error("reference too long: {len} chars even after fallback encoding (max {max})")]
    ReferenceTooLong { len: usize, max: usize },

    #[error("reference does not resolve to an existing file: {0}")]
    Unresolvable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for vault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;
