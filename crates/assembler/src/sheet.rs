//! Tabular manifest sidecar.
//!
//! One header row plus one row per track, in track-number order. The sheet
//! is a business-reporting artifact consumed by humans; nothing in the
//! pipeline reparses it.

use crate::error::AssemblerResult;
use pressroom_core::ReleaseManifest;
use std::path::Path;
use tokio::fs;

/// Sidecar filename inside the package directory.
pub const SIDECAR_FILENAME: &str = "release-manifest.csv";

// Fixed placeholders; the actual figures live in the distribution
// contracts, not in this system.
const ROYALTY_SHARE_PLACEHOLDER: &str = "100%";
const RIGHTS_HOLDER_PLACEHOLDER: &str = "As per contract";
const TERRITORY_PLACEHOLDER: &str = "Worldwide";

const HEADER: &str = "No.,Release Type,Album,Track,Language,Genre,Performers,Words,Music,\
                      Royalty Share,Rights Holder,Territory";

/// Render the sidecar as CSV text.
pub fn render_sidecar(manifest: &ReleaseManifest) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for track in manifest.ordered_tracks() {
        let row = [
            track.track_number.to_string(),
            manifest.release_type.clone(),
            manifest.title.clone(),
            track.title.clone(),
            track.language.clone(),
            track.genre.clone(),
            track.performer_names(),
            track.words_by.join("; "),
            track.music_by.join("; "),
            ROYALTY_SHARE_PLACEHOLDER.to_string(),
            RIGHTS_HOLDER_PLACEHOLDER.to_string(),
            TERRITORY_PLACEHOLDER.to_string(),
        ];
        let row: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Write the sidecar into the package directory.
pub async fn write_sidecar(package_dir: &Path, manifest: &ReleaseManifest) -> AssemblerResult<()> {
    fs::write(package_dir.join(SIDECAR_FILENAME), render_sidecar(manifest)).await?;
    Ok(())
}

fn escape_field(value: &str) -> String {
    if value
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n' | '\r'))
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
