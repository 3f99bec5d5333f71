//! Integration tests for composed media verification.

use async_trait::async_trait;
use pressroom_core::Checksum;
use pressroom_verify::error::{VerifyError, VerifyResult};
use pressroom_verify::{DurationProbe, IntegrityVerifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Probe that reports a fixed duration for every file.
struct FixedProbe(f64);

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn probe_seconds(&self, _path: &Path) -> VerifyResult<f64> {
        Ok(self.0)
    }
}

/// Probe that always fails.
struct BrokenProbe;

#[async_trait]
impl DurationProbe for BrokenProbe {
    async fn probe_seconds(&self, _path: &Path) -> VerifyResult<f64> {
        Err(VerifyError::ProbeFailed("no decodable stream".to_string()))
    }
}

async fn write_file(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    tokio::fs::write(&path, data).await.unwrap();
    path
}

#[tokio::test]
async fn no_expectations_is_overall_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "a.wav", b"audio bytes").await;
    let verifier = IntegrityVerifier::new(Arc::new(FixedProbe(100.0)));

    let result = verifier
        .verify_media_file(&path, None, None, 2.0)
        .await
        .unwrap();

    assert!(result.overall_valid());
    assert!(result.checksum_valid);
    assert_eq!(result.duration_valid, None);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn matching_checksum_and_duration_within_tolerance() {
    let dir = tempfile::tempdir().unwrap();
    let data = b"master take";
    let path = write_file(&dir, "a.wav", data).await;
    let expected = Checksum::compute(data).to_hex();
    // Probed 181.4s against expected 180s with 2s tolerance: passes.
    let verifier = IntegrityVerifier::new(Arc::new(FixedProbe(181.4)));

    let result = verifier
        .verify_media_file(&path, Some(&expected), Some(180.0), 2.0)
        .await
        .unwrap();

    assert!(result.overall_valid());
    assert_eq!(result.duration_valid, Some(true));
}

#[tokio::test]
async fn duration_out_of_tolerance_fails_with_duration_error_only() {
    let dir = tempfile::tempdir().unwrap();
    let data = b"master take";
    let path = write_file(&dir, "a.wav", data).await;
    let expected = Checksum::compute(data).to_hex();
    // Probed 184s against expected 180s with 2s tolerance: fails.
    let verifier = IntegrityVerifier::new(Arc::new(FixedProbe(184.0)));

    let result = verifier
        .verify_media_file(&path, Some(&expected), Some(180.0), 2.0)
        .await
        .unwrap();

    assert!(!result.overall_valid());
    assert!(result.checksum_valid);
    assert_eq!(result.duration_valid, Some(false));
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("duration"));
    assert!(!result.errors[0].contains("checksum"));
}

#[tokio::test]
async fn wrong_checksum_fails_even_with_matching_duration() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "a.wav", b"actual bytes").await;
    let wrong = Checksum::compute(b"different bytes").to_hex();
    let verifier = IntegrityVerifier::new(Arc::new(FixedProbe(180.0)));

    let result = verifier
        .verify_media_file(&path, Some(&wrong), Some(180.0), 2.0)
        .await
        .unwrap();

    assert!(!result.overall_valid());
    assert!(!result.checksum_valid);
    assert_eq!(result.duration_valid, Some(true));
    assert!(result.errors.iter().any(|e| e.contains("checksum")));
}

#[tokio::test]
async fn probe_failure_fails_duration_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "a.wav", b"bytes").await;
    let verifier = IntegrityVerifier::new(Arc::new(BrokenProbe));

    let result = verifier
        .verify_media_file(&path, None, Some(120.0), 2.0)
        .await
        .unwrap();

    assert!(!result.overall_valid());
    assert_eq!(result.duration_valid, Some(false));
    assert!(result.errors.iter().any(|e| e.contains("probe")));
}

#[tokio::test]
async fn verify_duration_surfaces_probe_errors_unfolded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "a.wav", b"bytes").await;
    let verifier = IntegrityVerifier::new(Arc::new(BrokenProbe));

    let err = verifier
        .verify_duration(&path, Some(120.0), 2.0)
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::ProbeFailed(_)));
}

#[tokio::test]
async fn non_positive_expected_duration_is_vacuous() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "a.wav", b"bytes").await;
    let verifier = IntegrityVerifier::new(Arc::new(BrokenProbe));

    for expected in [Some(0.0), Some(-3.0), None] {
        let result = verifier
            .verify_media_file(&path, None, expected, 2.0)
            .await
            .unwrap();
        assert!(result.overall_valid());
        assert_eq!(result.duration_valid, None);
    }
}
