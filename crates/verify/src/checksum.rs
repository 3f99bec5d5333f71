//! Streaming checksum computation.

use crate::error::VerifyResult;
use pressroom_core::Checksum;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Read buffer size for streaming checksum computation (64 KiB).
///
/// Source files run to hundreds of megabytes; the whole file is never held
/// in memory.
const READ_BUF_SIZE: usize = 64 * 1024;

/// Compute the checksum of a file by streaming it once.
pub async fn compute_checksum(path: &Path) -> VerifyResult<Checksum> {
    let mut file = File::open(path).await?;
    let mut hasher = Checksum::hasher();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Verify a file against an expected hex checksum.
///
/// An absent or empty expectation is a vacuous pass: no stored checksum
/// means there is nothing to check against. Comparison ignores case.
pub async fn verify_checksum(path: &Path, expected: Option<&str>) -> VerifyResult<bool> {
    let expected = match expected {
        Some(e) if !e.trim().is_empty() => e,
        _ => return Ok(true),
    };
    let actual = compute_checksum(path).await?;
    Ok(actual.matches_hex(expected))
}
