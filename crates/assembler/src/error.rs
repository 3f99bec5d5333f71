//! Assembler error types.

use thiserror::Error;

/// Errors raised while assembling a release package.
#[derive(Debug, Error)]
pub enum AssemblerError {
    /// The release manifest violates its contract.
    #[error(transparent)]
    Manifest(#[from] pressroom_core::Error),

    /// The assembly run was cancelled before archiving began.
    #[error("release assembly cancelled")]
    Cancelled,

    /// Disk or compression failure while building the container. Fatal to
    /// the release attempt; the working directory is still cleaned up.
    #[error("archive build failed: {0}")]
    ArchiveIo(String),

    #[error(transparent)]
    Vault(#[from] pressroom_vault::VaultError),

    #[error(transparent)]
    Verify(#[from] pressroom_verify::VerifyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AssemblerResult<T> = Result<T, AssemblerError>;
