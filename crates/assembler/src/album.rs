//! Album-level package assembly.
//!
//! Cover art, the album authorization document, approved dynamic covers,
//! and the description/blurb text files. Missing optional assets are
//! omissions, reflected by absent files and folders, never errors.

use crate::error::AssemblerResult;
use crate::plan::{sanitize_component, ReleasePlan};
use crate::tracks::{copy_resolved, with_source_extension, AUTHORIZATIONS_DIR};
use pressroom_core::ReleaseManifest;
use pressroom_vault::{MediaStore, VaultError};
use std::path::Path;
use tokio::fs;

/// Cover art filename stem; the stored file contributes its extension.
pub const COVER_STEM: &str = "cover";
/// Dynamic-cover area at the package root.
pub const DYNAMIC_COVER_DIR: &str = "dynamic-covers";
/// Album description text file.
pub const DESCRIPTION_FILENAME: &str = "description.txt";
/// External display blurb text file.
pub const BLURB_FILENAME: &str = "display-blurb.txt";

/// Assemble everything that belongs to the album rather than to one track.
pub async fn assemble_album_assets(
    media: &MediaStore,
    manifest: &ReleaseManifest,
    plan: &ReleasePlan,
    package_dir: &Path,
) -> AssemblerResult<()> {
    copy_resolved(media, &manifest.cover_image_reference, package_dir, COVER_STEM).await?;

    if let Some(reference) = &manifest.album_authorization_reference {
        // Same rule as per-track documents: the subfolder exists only when
        // the document resolves.
        match media.resolve(reference).await {
            Ok(source) => {
                let dir = package_dir.join(AUTHORIZATIONS_DIR);
                fs::create_dir_all(&dir).await?;
                let dest = dir.join(with_source_extension("album-authorization", &source));
                fs::copy(&source, &dest).await?;
            }
            Err(VaultError::Unresolvable(_)) => {
                tracing::warn!("album authorization did not resolve, omitted");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if plan.has_dynamic_covers {
        stage_dynamic_covers(media, manifest, package_dir).await?;
    }

    if !manifest.description.trim().is_empty() {
        fs::write(
            package_dir.join(DESCRIPTION_FILENAME),
            manifest.description.as_bytes(),
        )
        .await?;
    }
    if !manifest.display_blurb.trim().is_empty() {
        fs::write(
            package_dir.join(BLURB_FILENAME),
            manifest.display_blurb.as_bytes(),
        )
        .await?;
    }
    Ok(())
}

/// Copy deliverable dynamic covers, one subfolder per platform with the
/// square and portrait variants as siblings. Rejected and pending entries
/// never ship.
async fn stage_dynamic_covers(
    media: &MediaStore,
    manifest: &ReleaseManifest,
    package_dir: &Path,
) -> AssemblerResult<()> {
    let root = package_dir.join(DYNAMIC_COVER_DIR);
    fs::create_dir_all(&root).await?;

    let mut shipped = 0usize;
    for entry in manifest.deliverable_dynamic_covers() {
        let square = match media.resolve(&entry.square_reference).await {
            Ok(path) => path,
            Err(VaultError::Unresolvable(_)) => {
                tracing::warn!(platform = %entry.platform, "dynamic cover did not resolve, omitted");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let platform_dir = root.join(sanitize_component(&entry.platform));
        fs::create_dir_all(&platform_dir).await?;
        let dest = platform_dir.join(with_source_extension("square", &square));
        fs::copy(&square, &dest).await?;
        if let Some(reference) = &entry.portrait_reference {
            copy_resolved(media, reference, &platform_dir, "portrait").await?;
        }
        shipped += 1;
    }

    // Every entry failed to resolve: do not leave an empty folder behind.
    if shipped == 0 {
        fs::remove_dir(&root).await?;
    }
    Ok(())
}
