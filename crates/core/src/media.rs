//! Stored media records and on-disk category layout.

use crate::checksum::Checksum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use time::OffsetDateTime;

/// Storage category for verified media files.
///
/// Each category maps to its own directory under the media root; files of
/// different kinds never share a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaCategory {
    /// Track audio (wav/flac/mp4 masters).
    Audio,
    /// Cover art and avatars.
    Image,
    /// Lyrics, authorizations and other documents.
    Document,
    /// Per-platform animated cover videos.
    DynamicCover,
}

impl MediaCategory {
    /// Directory name for this category under the media root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Image => "images",
            Self::Document => "documents",
            Self::DynamicCover => "dynamic-covers",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Generate a unique storage filename: unix timestamp, short random suffix,
/// and the original file's extension (if any).
pub fn unique_filename(original_name: &str) -> String {
    let ts = OffsetDateTime::now_utc().unix_timestamp();
    let suffix: u32 = rand::thread_rng().gen();
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    format!("{ts}_{suffix:08x}{ext}")
}

/// A file that has passed verification and is now part of the catalog.
///
/// Immutable once created: replacing content produces a new record and a new
/// opaque reference, never in-place mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredMedia {
    /// Opaque reference token. Never exposes the real storage path.
    pub opaque_reference: String,
    /// Content checksum at verification time.
    pub checksum: Checksum,
    /// Expected duration in seconds, for audio/video only.
    pub expected_duration_seconds: Option<f64>,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Storage category.
    pub category: MediaCategory,
    /// When the file was verified and stored.
    #[serde(with = "time::serde::rfc3339")]
    pub stored_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_dir_names() {
        assert_eq!(MediaCategory::Audio.dir_name(), "audio");
        assert_eq!(MediaCategory::DynamicCover.dir_name(), "dynamic-covers");
    }

    #[test]
    fn test_unique_filename_keeps_extension() {
        let name = unique_filename("Master Take.WAV");
        assert!(name.ends_with(".wav"));
        assert!(!name.contains(' '));
    }

    #[test]
    fn test_unique_filename_no_extension() {
        let name = unique_filename("README");
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_unique_filenames_differ() {
        let a = unique_filename("x.mp3");
        let b = unique_filename("x.mp3");
        assert_ne!(a, b);
    }
}
