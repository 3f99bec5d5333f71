//! Upload finalization: merge, verify, ingest.

use crate::error::{IntakeError, IntakeResult};
use crate::store::ChunkStore;
use pressroom_core::{MediaCategory, StoredMedia, VerificationResult};
use pressroom_vault::MediaStore;
use pressroom_verify::{compute_checksum, IntegrityVerifier};
use std::path::Path;
use time::OffsetDateTime;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Expectations recorded for an upload by the collaborator data store.
#[derive(Clone, Debug)]
pub struct MediaExpectations {
    /// Expected content checksum (hex, either case), if recorded.
    pub checksum: Option<String>,
    /// Expected duration in seconds, for audio/video only.
    pub duration_seconds: Option<f64>,
    /// Duration tolerance in seconds.
    pub tolerance_seconds: f64,
    /// Storage category for the verified file.
    pub category: MediaCategory,
}

/// Composes the intake flow: merge a complete session to a spool file,
/// verify it, and ingest it into the media store behind an opaque
/// reference.
pub struct MediaIntake {
    chunks: ChunkStore,
    verifier: IntegrityVerifier,
    media: MediaStore,
}

impl MediaIntake {
    /// Create the intake facade.
    pub fn new(chunks: ChunkStore, verifier: IntegrityVerifier, media: MediaStore) -> Self {
        Self {
            chunks,
            verifier,
            media,
        }
    }

    /// Access the chunk store for per-chunk operations.
    pub fn chunks(&self) -> &ChunkStore {
        &self.chunks
    }

    /// Access the media store for reference resolution.
    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Finalize a complete upload session.
    ///
    /// Merges the session into a spool file, verifies it against the
    /// recorded expectations, and on success moves it into the catalog.
    /// On verification failure the spool file is deleted and the failure
    /// reasons are returned; the session directory is already consumed by
    /// the merge either way. A duration-probe fault surfaces as
    /// [`IntakeError::Verify`] with the spool file kept on disk, so the
    /// caller can retry via [`Self::finalize_staged`] without a re-upload.
    #[tracing::instrument(skip(self, expectations), fields(session = %session_id))]
    pub async fn finalize_session(
        &self,
        session_id: &pressroom_core::SessionId,
        expectations: &MediaExpectations,
    ) -> IntakeResult<StoredMedia> {
        let session = self.chunks.load_session(session_id).await?;
        let spool = self.media.spool_path(session_id.as_str());

        let file = fs::File::create(&spool).await?;
        let mut writer = BufWriter::new(file);
        let flushed = match self.chunks.merge(session_id, &mut writer).await {
            Ok(_) => writer.shutdown().await.map_err(IntakeError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = flushed {
            let _ = fs::remove_file(&spool).await;
            return Err(e);
        }

        self.finalize_staged(&spool, &session.original_filename, expectations)
            .await
    }

    /// Verify a merged spool file and ingest it into the catalog.
    ///
    /// Checksum and duration mismatches are terminal: the staged file is
    /// deleted and the reasons come back as
    /// [`IntakeError::VerificationFailed`]. A probe fault is a condition
    /// of the probe, not the file: it propagates as
    /// [`IntakeError::Verify`] with the staged file left in place, and
    /// this method can be called again on the same path once the probe
    /// recovers.
    #[tracing::instrument(skip(self, expectations), fields(staged = %staged.display()))]
    pub async fn finalize_staged(
        &self,
        staged: &Path,
        original_filename: &str,
        expectations: &MediaExpectations,
    ) -> IntakeResult<StoredMedia> {
        let size_bytes = fs::metadata(staged).await?.len();

        // Hash once, then reuse the digest for both the verdict and the
        // catalog record.
        let checksum = compute_checksum(staged).await?;
        let mut errors = Vec::new();
        let checksum_valid = match expectations.checksum.as_deref() {
            Some(expected) if !expected.trim().is_empty() => {
                if checksum.matches_hex(expected) {
                    true
                } else {
                    errors.push(format!(
                        "checksum mismatch: expected {}, got {}",
                        expected.trim().to_lowercase(),
                        checksum.to_hex()
                    ));
                    false
                }
            }
            _ => true,
        };
        let duration_valid = match expectations.duration_seconds {
            Some(expected) if expected > 0.0 => {
                let (valid, reason) = self
                    .verifier
                    .verify_duration(staged, Some(expected), expectations.tolerance_seconds)
                    .await?;
                if let Some(reason) = reason {
                    errors.push(reason);
                }
                Some(valid)
            }
            _ => None,
        };

        let verdict = VerificationResult {
            checksum_valid,
            duration_valid,
            errors,
        };
        if !verdict.overall_valid() {
            let _ = fs::remove_file(staged).await;
            tracing::warn!(reasons = ?verdict.errors, "upload rejected at finalize");
            return Err(IntakeError::VerificationFailed {
                reasons: verdict.errors,
            });
        }

        let token = self
            .media
            .ingest(staged, expectations.category, original_filename)
            .await?;

        Ok(StoredMedia {
            opaque_reference: token,
            checksum,
            expected_duration_seconds: expectations.duration_seconds,
            size_bytes,
            category: expectations.category,
            stored_at: OffsetDateTime::now_utc(),
        })
    }
}
