//! Per-track package assembly.
//!
//! Each track gets its own folder named by zero-padded number, performers,
//! and title. A track whose audio fails re-verification still ships its
//! lyrics, authorization documents, and artist info; a diagnostic text file
//! stands in for the audio so the omission is visible inside the package.

use crate::error::AssemblerResult;
use crate::plan::sanitize_component;
use pressroom_core::{ArtistCredit, TrackEntry};
use pressroom_vault::{MediaStore, VaultError};
use pressroom_verify::IntegrityVerifier;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Stands in for the master audio when verification fails.
pub const AUDIO_DIAGNOSTIC_FILENAME: &str = "_AUDIO_MISSING.txt";
/// Per-track artist information file.
pub const ARTIST_INFO_FILENAME: &str = "artists.txt";
/// Per-track (and album-level) authorization subfolder.
pub const AUTHORIZATIONS_DIR: &str = "authorizations";
/// Shared new-artist dossier area at the package root.
pub const NEW_ARTIST_DIR: &str = "new-artists";

/// Shared state handed to every concurrent track task.
pub struct TrackContext<'a> {
    pub media: &'a MediaStore,
    pub verifier: &'a IntegrityVerifier,
    pub tolerance_seconds: f64,
    pub package_dir: &'a Path,
    pub dossier: &'a NewArtistDossier,
}

/// What one track task produced, buffered and reordered by the caller.
#[derive(Clone, Debug)]
pub struct TrackOutcome {
    pub track_number: u32,
    /// Folder name under the package root.
    pub folder: String,
    /// Whether the verified master audio made it into the folder.
    pub audio_included: bool,
    /// Why the audio was omitted, when it was.
    pub diagnostic: Option<String>,
}

/// The new-artist dossier area, shared across concurrent track tasks.
///
/// The registry lock is held across directory creation, so two tracks that
/// share a new performer never race the create and never write the dossier
/// twice.
pub struct NewArtistDossier {
    root: PathBuf,
    written: Mutex<BTreeSet<String>>,
}

impl NewArtistDossier {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            written: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one new artist's dossier entry: a bio text file and, when the
    /// reference resolves, the avatar image. First writer for a name wins.
    pub async fn record(&self, media: &MediaStore, artist: &ArtistCredit) -> AssemblerResult<()> {
        let name = artist.display_name().to_string();
        let mut written = self.written.lock().await;
        if !written.insert(name.clone()) {
            return Ok(());
        }

        let dir = self.root.join(sanitize_component(&name));
        fs::create_dir_all(&dir).await?;

        let mut bio = format!("{name}\n");
        if let Some(legal) = &artist.legal_name {
            bio.push_str(&format!("Legal name: {legal}\n"));
        }
        bio.push('\n');
        match &artist.bio {
            Some(text) if !text.trim().is_empty() => bio.push_str(text),
            _ => bio.push_str("No biography provided."),
        }
        bio.push('\n');
        fs::write(dir.join("bio.txt"), bio).await?;

        if let Some(reference) = &artist.avatar_reference {
            copy_resolved(media, reference, &dir, "avatar").await?;
        }
        Ok(())
    }
}

/// Assemble one track's folder.
#[tracing::instrument(skip_all, fields(track = track.track_number))]
pub async fn process_track(
    ctx: &TrackContext<'_>,
    track: &TrackEntry,
) -> AssemblerResult<TrackOutcome> {
    let folder = format!(
        "{:02} - {} - {}",
        track.track_number,
        sanitize_component(&track.performer_names()),
        sanitize_component(&track.title)
    );
    let dir = ctx.package_dir.join(&folder);
    fs::create_dir_all(&dir).await?;

    let (audio_included, diagnostic) = stage_audio(ctx, track, &dir).await?;

    // Instrumental tracks carry no lyrics by definition.
    if !track.is_instrumental {
        if let Some(reference) = &track.lyrics_reference {
            copy_resolved(ctx.media, reference, &dir, "lyrics").await?;
        }
        if let Some(reference) = &track.translated_lyrics_reference {
            copy_resolved(ctx.media, reference, &dir, "lyrics-translated").await?;
        }
    }

    stage_authorizations(ctx, track, &dir).await?;
    fs::write(dir.join(ARTIST_INFO_FILENAME), render_artist_info(&track.artists)).await?;

    for artist in track.artists.iter().filter(|a| a.is_new_artist) {
        ctx.dossier.record(ctx.media, artist).await?;
    }

    Ok(TrackOutcome {
        track_number: track.track_number,
        folder,
        audio_included,
        diagnostic,
    })
}

/// Resolve, re-verify, and copy the master audio, or write the diagnostic
/// stand-in. A file verified at upload time may have been altered or gone
/// missing by release time, so the verdict is taken fresh here.
async fn stage_audio(
    ctx: &TrackContext<'_>,
    track: &TrackEntry,
    dir: &Path,
) -> AssemblerResult<(bool, Option<String>)> {
    let source = match ctx.media.resolve(&track.audio_reference).await {
        Ok(path) => path,
        Err(VaultError::Unresolvable(_)) => {
            let reason = "audio reference did not resolve to a stored file".to_string();
            write_audio_diagnostic(dir, track, std::slice::from_ref(&reason)).await?;
            return Ok((false, Some(reason)));
        }
        Err(e) => return Err(e.into()),
    };

    let verdict = match ctx
        .verifier
        .verify_media_file(
            &source,
            track.expected_checksum.as_deref(),
            track.expected_duration_seconds,
            ctx.tolerance_seconds,
        )
        .await
    {
        Ok(verdict) => verdict,
        Err(e) => {
            let reason = format!("verification could not run: {e}");
            write_audio_diagnostic(dir, track, std::slice::from_ref(&reason)).await?;
            return Ok((false, Some(reason)));
        }
    };
    if !verdict.overall_valid() {
        write_audio_diagnostic(dir, track, &verdict.errors).await?;
        return Ok((false, Some(verdict.errors.join("; "))));
    }

    let stem = format!(
        "{:02} - {}",
        track.track_number,
        sanitize_component(&track.title)
    );
    let dest = dir.join(with_source_extension(&stem, &source));
    fs::copy(&source, &dest).await?;
    Ok((true, None))
}

/// Per-artist authorization documents go into a subfolder that exists only
/// when at least one document resolves.
async fn stage_authorizations(
    ctx: &TrackContext<'_>,
    track: &TrackEntry,
    dir: &Path,
) -> AssemblerResult<()> {
    let mut resolved = Vec::new();
    for artist in &track.artists {
        let Some(reference) = &artist.authorization_reference else {
            continue;
        };
        match ctx.media.resolve(reference).await {
            Ok(path) => resolved.push((artist.display_name().to_string(), path)),
            Err(VaultError::Unresolvable(_)) => {
                tracing::warn!(artist = %artist.display_name(), "authorization did not resolve, omitted");
            }
            Err(e) => return Err(e.into()),
        }
    }
    if resolved.is_empty() {
        return Ok(());
    }

    let auth_dir = dir.join(AUTHORIZATIONS_DIR);
    fs::create_dir_all(&auth_dir).await?;
    for (name, source) in resolved {
        let dest = auth_dir.join(with_source_extension(&sanitize_component(&name), &source));
        fs::copy(&source, &dest).await?;
    }
    Ok(())
}

async fn write_audio_diagnostic(
    dir: &Path,
    track: &TrackEntry,
    reasons: &[String],
) -> AssemblerResult<()> {
    let mut text = format!(
        "The master audio for \"{}\" was not included in this package.\n\n",
        track.title
    );
    for reason in reasons {
        text.push_str(&format!("- {reason}\n"));
    }
    text.push_str("\nRe-upload the audio and regenerate the package.\n");
    fs::write(dir.join(AUDIO_DIAGNOSTIC_FILENAME), text).await?;
    Ok(())
}

fn render_artist_info(artists: &[ArtistCredit]) -> String {
    let mut out = String::new();
    for artist in artists {
        out.push_str(artist.display_name());
        out.push('\n');
        if let Some(legal) = &artist.legal_name {
            out.push_str(&format!("Legal name: {legal}\n"));
        }
        for (platform, url) in artist.effective_links() {
            out.push_str(&format!("{platform}: {url}\n"));
        }
        out.push('\n');
    }
    out
}

/// Resolve a reference and copy it into `dir` under `stem`, keeping the
/// source file's extension. An unresolvable reference is an omission, not
/// an error.
pub(crate) async fn copy_resolved(
    media: &MediaStore,
    reference: &str,
    dir: &Path,
    stem: &str,
) -> AssemblerResult<Option<PathBuf>> {
    let source = match media.resolve(reference).await {
        Ok(path) => path,
        Err(VaultError::Unresolvable(_)) => {
            tracing::warn!(stem, "reference did not resolve, asset omitted");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let dest = dir.join(with_source_extension(stem, &source));
    fs::copy(&source, &dest).await?;
    Ok(Some(dest))
}

pub(crate) fn with_source_extension(stem: &str, source: &Path) -> String {
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{}", ext.to_lowercase()),
        None => stem.to_string(),
    }
}
