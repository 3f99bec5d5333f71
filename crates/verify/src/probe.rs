//! Media duration probing.
//!
//! Duration is obtained from an external probing collaborator, not decoded
//! in-process. The probe runs behind a trait so the verifier can be tested
//! without media files or an ffprobe binary.

use crate::error::{VerifyError, VerifyResult};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// A collaborator that can report the duration of a media file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Probe the duration of the file at `path`, in seconds.
    ///
    /// Fails with [`VerifyError::ProbeFailed`] if the collaborator errors
    /// or the file has no decodable audio/video stream.
    async fn probe_seconds(&self, path: &Path) -> VerifyResult<f64>;
}

/// Duration probe backed by an `ffprobe`-compatible binary.
///
/// The subprocess runs under a hard timeout; a hung probe is reported as
/// failed rather than allowed to stall a release.
pub struct FfprobeProbe {
    binary: String,
    timeout: Duration,
}

impl FfprobeProbe {
    /// Create a probe using the given binary and timeout.
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DurationProbe for FfprobeProbe {
    #[tracing::instrument(skip(self), fields(binary = %self.binary))]
    async fn probe_seconds(&self, path: &Path) -> VerifyResult<f64> {
        let run = Command::new(&self.binary)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result.map_err(|e| {
                VerifyError::ProbeFailed(format!("failed to run {}: {e}", self.binary))
            })?,
            Err(_) => {
                tracing::warn!(path = %path.display(), "media probe timed out");
                return Err(VerifyError::ProbeTimeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VerifyError::ProbeFailed(format!(
                "probe exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = stdout.trim();
        // "N/A" means the container has no decodable stream duration.
        text.parse::<f64>().map_err(|_| {
            VerifyError::ProbeFailed(format!("probe returned non-numeric duration: {text:?}"))
        })
    }
}
