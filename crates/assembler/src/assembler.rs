//! Release assembly pipeline.
//!
//! One assembly run walks a fixed stage sequence: planning, per-track
//! processing, album-level processing, sidecar generation, archiving.
//! Failure at any stage discards the working directory and the caller
//! receives either a complete archive or an explicit error, never a
//! truncated container. Success schedules deletion of the working
//! directory after a grace delay so in-flight reads of the just-produced
//! container never race the delete.

use crate::album;
use crate::archive;
use crate::error::{AssemblerError, AssemblerResult};
use crate::plan::ReleasePlan;
use crate::sheet;
use crate::tracks::{self, NewArtistDossier, TrackContext, TrackOutcome};
use pressroom_core::{AssemblerConfig, ReleaseManifest};
use pressroom_vault::MediaStore;
use pressroom_verify::IntegrityVerifier;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Content type of the delivery container.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Stages of one assembly run, in order. `Delivered` and `Failed` are
/// terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Planning,
    PerTrackProcessing,
    AlbumLevelProcessing,
    ManifestGeneration,
    Archiving,
    Delivered,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Planning => "planning",
            Stage::PerTrackProcessing => "per-track-processing",
            Stage::AlbumLevelProcessing => "album-level-processing",
            Stage::ManifestGeneration => "manifest-generation",
            Stage::Archiving => "archiving",
            Stage::Delivered => "delivered",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The assembled delivery container, ready to stream to the caller.
#[derive(Debug)]
pub struct DeliveryArchive {
    /// On-disk location inside the working directory. Readable until the
    /// cleanup grace delay expires.
    pub archive_path: PathBuf,
    /// Cache-busting filename with the generation timestamp embedded.
    pub working_filename: String,
    /// Clean user-facing filename for the same bytes.
    pub delivered_filename: String,
    /// Container size in bytes.
    pub size_bytes: u64,
    /// Always a generic compressed-archive content type.
    pub content_type: &'static str,
    /// Per-track outcomes in track-number order.
    pub tracks: Vec<TrackOutcome>,
}

/// Builds delivery archives for approved releases.
pub struct ReleaseAssembler {
    media: Arc<MediaStore>,
    verifier: IntegrityVerifier,
    config: AssemblerConfig,
    duration_tolerance_seconds: f64,
}

impl ReleaseAssembler {
    pub fn new(
        media: Arc<MediaStore>,
        verifier: IntegrityVerifier,
        config: AssemblerConfig,
        duration_tolerance_seconds: f64,
    ) -> Self {
        Self {
            media,
            verifier,
            config,
            duration_tolerance_seconds,
        }
    }

    /// Assemble one release package.
    ///
    /// The working directory is fresh per invocation and never reused, so
    /// no file from one release can leak into another. Cancellation is
    /// honored between stages up to the start of archiving; once archiving
    /// begins the run completes, and cleanup is still guaranteed either
    /// way.
    #[tracing::instrument(skip_all, fields(release = %manifest.title))]
    pub async fn assemble(
        &self,
        manifest: &ReleaseManifest,
        cancel: &CancellationToken,
    ) -> AssemblerResult<DeliveryArchive> {
        tracing::info!(stage = %Stage::Planning, "assembly started");
        let plan = ReleasePlan::from_manifest(manifest)?;
        let working_dir = self.config.work_root.join(Uuid::new_v4().to_string());
        let package_dir = working_dir.join(&plan.folder_name);
        fs::create_dir_all(&package_dir).await?;

        match self
            .run(manifest, &plan, &working_dir, &package_dir, cancel)
            .await
        {
            Ok(delivery) => {
                tracing::info!(
                    stage = %Stage::Delivered,
                    bytes = delivery.size_bytes,
                    filename = %delivery.delivered_filename,
                    "assembly delivered"
                );
                self.schedule_cleanup(working_dir);
                Ok(delivery)
            }
            Err(e) => {
                tracing::warn!(stage = %Stage::Failed, error = %e, "assembly failed");
                if let Err(cleanup) = fs::remove_dir_all(&working_dir).await {
                    tracing::warn!(error = %cleanup, "working directory cleanup failed");
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        manifest: &ReleaseManifest,
        plan: &ReleasePlan,
        working_dir: &Path,
        package_dir: &Path,
        cancel: &CancellationToken,
    ) -> AssemblerResult<DeliveryArchive> {
        self.checkpoint(cancel)?;

        tracing::info!(
            stage = %Stage::PerTrackProcessing,
            tracks = manifest.tracks.len(),
            "processing tracks"
        );
        let dossier = NewArtistDossier::new(package_dir.join(tracks::NEW_ARTIST_DIR));
        if plan.has_new_artists {
            fs::create_dir_all(dossier.root()).await?;
        }
        let ctx = TrackContext {
            media: &self.media,
            verifier: &self.verifier,
            tolerance_seconds: self.duration_tolerance_seconds,
            package_dir,
            dossier: &dossier,
        };
        // Tracks share no mutable state and run concurrently; outcomes are
        // buffered and reordered by track number, never completion order.
        let mut outcomes: Vec<TrackOutcome> = futures::future::try_join_all(
            manifest
                .ordered_tracks()
                .into_iter()
                .map(|track| tracks::process_track(&ctx, track)),
        )
        .await?;
        outcomes.sort_by_key(|o| o.track_number);
        for outcome in &outcomes {
            if let Some(reason) = &outcome.diagnostic {
                tracing::warn!(track = outcome.track_number, reason = %reason, "track audio omitted");
            }
        }
        self.checkpoint(cancel)?;

        tracing::info!(stage = %Stage::AlbumLevelProcessing, "processing album assets");
        album::assemble_album_assets(&self.media, manifest, plan, package_dir).await?;
        self.checkpoint(cancel)?;

        tracing::info!(stage = %Stage::ManifestGeneration, "writing sidecar");
        sheet::write_sidecar(package_dir, manifest).await?;
        // Last cancellation point; archiving runs to completion once begun.
        self.checkpoint(cancel)?;

        tracing::info!(stage = %Stage::Archiving, "building container");
        let delivered_filename = format!("{}.zip", plan.folder_name);
        let working_filename = format!(
            "{} - {}.zip",
            plan.folder_name,
            OffsetDateTime::now_utc().unix_timestamp()
        );
        let archive_path = working_dir.join(&working_filename);
        let size_bytes = archive::build_archive(working_dir, package_dir, &archive_path).await?;

        Ok(DeliveryArchive {
            archive_path,
            working_filename,
            delivered_filename,
            size_bytes,
            content_type: ARCHIVE_CONTENT_TYPE,
            tracks: outcomes,
        })
    }

    fn checkpoint(&self, cancel: &CancellationToken) -> AssemblerResult<()> {
        if cancel.is_cancelled() {
            Err(AssemblerError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn schedule_cleanup(&self, working_dir: PathBuf) {
        let grace = Duration::from_secs(self.config.cleanup_grace_secs);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            match fs::remove_dir_all(&working_dir).await {
                Ok(()) => {
                    tracing::debug!(dir = %working_dir.display(), "working directory removed")
                }
                Err(e) => {
                    tracing::warn!(dir = %working_dir.display(), error = %e, "deferred cleanup failed")
                }
            }
        });
    }
}
