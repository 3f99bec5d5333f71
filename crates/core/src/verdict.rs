//! Verification results.

use serde::{Deserialize, Serialize};

/// The outcome of verifying a media file against recorded expectations.
///
/// Consumed immediately by the caller, never persisted. Both checks must
/// pass for the file to be considered valid: a checksum match with a wrong
/// duration (truncated file) and a duration match with a wrong checksum
/// (corrupted bytes) are both rejected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether the content checksum matched (or vacuously passed).
    pub checksum_valid: bool,
    /// Whether the duration matched. None means the check was not applicable.
    pub duration_valid: Option<bool>,
    /// Human-readable failure reasons, in check order. Never empty when
    /// the overall verdict is invalid.
    pub errors: Vec<String>,
}

impl VerificationResult {
    /// A fully passing result with no checks failed.
    pub fn passed() -> Self {
        Self {
            checksum_valid: true,
            duration_valid: None,
            errors: Vec::new(),
        }
    }

    /// Overall verdict: checksum must pass, and duration must pass when it
    /// was checked at all.
    pub fn overall_valid(&self) -> bool {
        self.checksum_valid && self.duration_valid.unwrap_or(true)
    }
}
