//! Integration tests for the intake facade: merge, verify, ingest.

use async_trait::async_trait;
use pressroom_core::{Checksum, MediaCategory, SessionId, UploadSession};
use pressroom_intake::{
    ChunkStore, IntakeError, MediaExpectations, MediaIntake, MergeLedger, SystemClock,
};
use pressroom_vault::{KeyMaterial, MediaStore, ReferenceVault};
use pressroom_verify::{DurationProbe, IntegrityVerifier, VerifyError, VerifyResult};
use std::path::Path;
use std::sync::Arc;
use time::Duration;

struct FixedProbe(f64);

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn probe_seconds(&self, _path: &Path) -> VerifyResult<f64> {
        Ok(self.0)
    }
}

struct BrokenProbe;

#[async_trait]
impl DurationProbe for BrokenProbe {
    async fn probe_seconds(&self, _path: &Path) -> VerifyResult<f64> {
        Err(VerifyError::ProbeFailed("decoder crashed".to_string()))
    }
}

async fn intake_with_probe(dir: &tempfile::TempDir, probe: Arc<dyn DurationProbe>) -> MediaIntake {
    let ledger = Arc::new(MergeLedger::new(Duration::minutes(15), Arc::new(SystemClock)));
    let chunks = ChunkStore::new(dir.path().join("chunks"), ledger)
        .await
        .unwrap();
    let vault = ReferenceVault::new(KeyMaterial::from_secret("finalize-test-secret").unwrap());
    let media = MediaStore::new(dir.path().join("media"), vault)
        .await
        .unwrap();
    MediaIntake::new(chunks, IntegrityVerifier::new(probe), media)
}

async fn intake(dir: &tempfile::TempDir, probed_duration: f64) -> MediaIntake {
    intake_with_probe(dir, Arc::new(FixedProbe(probed_duration))).await
}

async fn upload(intake: &MediaIntake, parts: &[&[u8]]) -> SessionId {
    let session = UploadSession::new(
        SessionId::generate(),
        parts.len() as u32,
        "master.wav",
        Some(parts.iter().map(|p| p.len() as u64).sum()),
    )
    .unwrap();
    for (i, part) in parts.iter().enumerate() {
        intake
            .chunks()
            .put_chunk(&session, i as u32, part)
            .await
            .unwrap();
    }
    session.id
}

#[tokio::test]
async fn finalize_stores_verified_upload_behind_reference() {
    let dir = tempfile::tempdir().unwrap();
    let intake = intake(&dir, 180.5).await;
    let id = upload(&intake, &[b"front-", b"back"]).await;

    let expected = Checksum::compute(b"front-back").to_hex();
    let stored = intake
        .finalize_session(
            &id,
            &MediaExpectations {
                checksum: Some(expected),
                duration_seconds: Some(180.0),
                tolerance_seconds: 2.0,
                category: MediaCategory::Audio,
            },
        )
        .await
        .unwrap();

    assert_eq!(stored.size_bytes, 10);
    assert_eq!(stored.checksum, Checksum::compute(b"front-back"));
    assert!(ReferenceVault::is_wrapped(&stored.opaque_reference));

    let path = intake.media().resolve(&stored.opaque_reference).await.unwrap();
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"front-back");
}

#[tokio::test]
async fn finalize_rejects_checksum_mismatch_and_cleans_spool() {
    let dir = tempfile::tempdir().unwrap();
    let intake = intake(&dir, 180.0).await;
    let id = upload(&intake, &[b"corrupted bytes"]).await;

    let wrong = Checksum::compute(b"what was expected").to_hex();
    let err = intake
        .finalize_session(
            &id,
            &MediaExpectations {
                checksum: Some(wrong),
                duration_seconds: None,
                tolerance_seconds: 2.0,
                category: MediaCategory::Audio,
            },
        )
        .await
        .unwrap_err();

    match err {
        IntakeError::VerificationFailed { reasons } => {
            assert!(reasons.iter().any(|r| r.contains("checksum")));
        }
        other => panic!("expected VerificationFailed, got {other:?}"),
    }

    // Nothing left in the spool directory.
    let mut spool = tokio::fs::read_dir(dir.path().join("media").join("spool"))
        .await
        .unwrap();
    assert!(spool.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn finalize_without_expectations_is_vacuous_pass() {
    let dir = tempfile::tempdir().unwrap();
    let intake = intake(&dir, 1.0).await;
    let id = upload(&intake, &[b"anything at all"]).await;

    let stored = intake
        .finalize_session(
            &id,
            &MediaExpectations {
                checksum: None,
                duration_seconds: None,
                tolerance_seconds: 2.0,
                category: MediaCategory::Document,
            },
        )
        .await
        .unwrap();
    assert_eq!(stored.category, MediaCategory::Document);
}

#[tokio::test]
async fn probe_fault_keeps_spool_and_is_retryable_without_reupload() {
    let dir = tempfile::tempdir().unwrap();
    let intake = intake_with_probe(&dir, Arc::new(BrokenProbe)).await;
    let id = upload(&intake, &[b"audio bytes"]).await;

    let expectations = MediaExpectations {
        checksum: None,
        duration_seconds: Some(180.0),
        tolerance_seconds: 2.0,
        category: MediaCategory::Audio,
    };
    let err = intake.finalize_session(&id, &expectations).await.unwrap_err();
    assert!(matches!(
        err,
        IntakeError::Verify(VerifyError::ProbeFailed(_))
    ));

    // The merged file survives the fault. The session directory is already
    // consumed, so a healthy probe must be able to finish from the spool.
    let mut spool_dir = tokio::fs::read_dir(dir.path().join("media").join("spool"))
        .await
        .unwrap();
    let staged = spool_dir.next_entry().await.unwrap().unwrap().path();
    assert!(spool_dir.next_entry().await.unwrap().is_none());

    let recovered = intake_with_probe(&dir, Arc::new(FixedProbe(180.5))).await;
    let stored = recovered
        .finalize_staged(&staged, "master.wav", &expectations)
        .await
        .unwrap();
    assert_eq!(stored.size_bytes, 11);

    let path = recovered
        .media()
        .resolve(&stored.opaque_reference)
        .await
        .unwrap();
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"audio bytes");
}

#[tokio::test]
async fn failed_merge_leaves_no_spool_behind() {
    let dir = tempfile::tempdir().unwrap();
    let intake = intake(&dir, 180.0).await;

    // Two chunks expected, only one sent.
    let session = UploadSession::new(SessionId::generate(), 2, "master.wav", None).unwrap();
    intake
        .chunks()
        .put_chunk(&session, 0, b"half")
        .await
        .unwrap();

    let err = intake
        .finalize_session(
            &session.id,
            &MediaExpectations {
                checksum: None,
                duration_seconds: None,
                tolerance_seconds: 2.0,
                category: MediaCategory::Audio,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::IncompleteUpload { .. }));

    let mut spool = tokio::fs::read_dir(dir.path().join("media").join("spool"))
        .await
        .unwrap();
    assert!(spool.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn finalize_rejects_out_of_tolerance_duration() {
    let dir = tempfile::tempdir().unwrap();
    let intake = intake(&dir, 184.0).await;
    let id = upload(&intake, &[b"audio"]).await;

    let err = intake
        .finalize_session(
            &id,
            &MediaExpectations {
                checksum: None,
                duration_seconds: Some(180.0),
                tolerance_seconds: 2.0,
                category: MediaCategory::Audio,
            },
        )
        .await
        .unwrap_err();

    match err {
        IntakeError::VerificationFailed { reasons } => {
            assert!(reasons.iter().any(|r| r.contains("duration")));
            assert!(!reasons.iter().any(|r| r.contains("checksum")));
        }
        other => panic!("expected VerificationFailed, got {other:?}"),
    }
}
