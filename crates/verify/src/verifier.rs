//! Composed media file verification.

use crate::checksum::compute_checksum;
use crate::error::{VerifyError, VerifyResult};
use crate::probe::DurationProbe;
use pressroom_core::VerificationResult;
use std::path::Path;
use std::sync::Arc;

/// Verifies files on disk against recorded expectations.
///
/// Policy is fail-closed: when both a checksum and a duration expectation
/// are recorded, both must pass. A checksum match with a wrong duration is
/// a truncated file; a duration match with a wrong checksum is corrupted
/// bytes. Neither ships.
#[derive(Clone)]
pub struct IntegrityVerifier {
    probe: Arc<dyn DurationProbe>,
}

impl IntegrityVerifier {
    /// Create a verifier using the given duration probe.
    pub fn new(probe: Arc<dyn DurationProbe>) -> Self {
        Self { probe }
    }

    /// Verify a file's duration against an expectation.
    ///
    /// Vacuously passes when no positive expectation is recorded. Probe
    /// errors propagate unfolded: a probe fault is a condition of the
    /// probe, not a verdict on the file, and the caller decides whether it
    /// is terminal or worth retrying.
    pub async fn verify_duration(
        &self,
        path: &Path,
        expected_seconds: Option<f64>,
        tolerance_seconds: f64,
    ) -> VerifyResult<(bool, Option<String>)> {
        let expected = match expected_seconds {
            Some(e) if e > 0.0 => e,
            _ => return Ok((true, None)),
        };

        let probed = self.probe.probe_seconds(path).await?;
        let delta = (probed - expected).abs();
        if delta <= tolerance_seconds {
            Ok((true, None))
        } else {
            Ok((
                false,
                Some(format!(
                    "duration mismatch: expected {expected:.1}s, probed {probed:.1}s \
                     (tolerance {tolerance_seconds:.1}s)"
                )),
            ))
        }
    }

    /// Verify a media file against its recorded checksum and duration.
    ///
    /// Never mutates the file. The returned result carries human-readable
    /// reasons for every failed check.
    #[tracing::instrument(skip(self, expected_checksum))]
    pub async fn verify_media_file(
        &self,
        path: &Path,
        expected_checksum: Option<&str>,
        expected_duration_seconds: Option<f64>,
        tolerance_seconds: f64,
    ) -> VerifyResult<VerificationResult> {
        let mut errors = Vec::new();

        let checksum_valid = match expected_checksum {
            Some(expected) if !expected.trim().is_empty() => {
                let actual = compute_checksum(path).await?;
                if actual.matches_hex(expected) {
                    true
                } else {
                    errors.push(format!(
                        "checksum mismatch: expected {}, got {}",
                        expected.trim().to_lowercase(),
                        actual.to_hex()
                    ));
                    false
                }
            }
            // No stored checksum means nothing to check against.
            _ => true,
        };

        let duration_valid = match expected_duration_seconds {
            Some(e) if e > 0.0 => {
                match self
                    .verify_duration(path, expected_duration_seconds, tolerance_seconds)
                    .await
                {
                    Ok((valid, reason)) => {
                        if let Some(reason) = reason {
                            errors.push(reason);
                        }
                        Some(valid)
                    }
                    // Probe faults fold into the verdict here: this
                    // composed check has no retry seam, and an unprobeable
                    // file cannot be shown to match.
                    Err(e @ (VerifyError::ProbeFailed(_) | VerifyError::ProbeTimeout { .. })) => {
                        errors.push(format!("duration probe failed: {e}"));
                        Some(false)
                    }
                    Err(e) => return Err(e),
                }
            }
            _ => None,
        };

        let result = VerificationResult {
            checksum_valid,
            duration_valid,
            errors,
        };

        if !result.overall_valid() {
            tracing::warn!(
                path = %path.display(),
                errors = ?result.errors,
                "media file failed verification"
            );
        }

        Ok(result)
    }
}
