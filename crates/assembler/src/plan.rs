//! Up-front release planning.
//!
//! Everything that used to be inferred from directory side effects is
//! computed here, once, from the manifest alone. Directory creation
//! downstream is a consequence of these booleans, never the signal.

use crate::error::AssemblerResult;
use pressroom_core::ReleaseManifest;

/// The plan for one assembly run, fixed before any file is touched.
#[derive(Clone, Debug)]
pub struct ReleasePlan {
    /// Canonical top-level folder name: release date plus sanitized title.
    pub folder_name: String,
    /// Whether any performer across the release is flagged as new. The
    /// new-artist dossier area exists iff this is true.
    pub has_new_artists: bool,
    /// Whether any dynamic-cover entry is in a deliverable state.
    pub has_dynamic_covers: bool,
}

impl ReleasePlan {
    /// Validate the manifest and compute the plan.
    pub fn from_manifest(manifest: &ReleaseManifest) -> AssemblerResult<Self> {
        manifest.validate()?;
        Ok(Self {
            folder_name: format!(
                "{} - {}",
                manifest.release_date,
                sanitize_component(&manifest.title)
            ),
            has_new_artists: manifest.has_new_artists(),
            has_dynamic_covers: !manifest.deliverable_dynamic_covers().is_empty(),
        })
    }
}

/// Make a string safe for use as a single path component.
///
/// Path separators and characters rejected by common filesystems become
/// underscores; control characters are dropped. Titles are operator input,
/// so an empty result gets a stand-in rather than an empty component.
pub fn sanitize_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    let trimmed = out.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
