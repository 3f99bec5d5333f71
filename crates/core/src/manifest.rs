//! The release manifest contract.
//!
//! A release manifest is the approved, frozen description of everything one
//! release package must contain. It is supplied by the collaborator data
//! store; its shape is a hard contract but the pipeline never owns or
//! mutates it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

/// Review state of a dynamic-cover request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Submitted,
    Approved,
    Rejected,
}

impl ApprovalState {
    /// Whether an asset in this state may ship in a delivery archive.
    /// Rejected or still-pending requests must never appear in the package.
    pub fn is_deliverable(&self) -> bool {
        matches!(self, Self::Approved | Self::Submitted)
    }
}

/// The authoritative identity an artist record may point at.
///
/// When present, the package substitutes this identity's name and links for
/// the credit's own when writing artist info.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    /// Authoritative display name.
    pub name: String,
    /// Platform name -> profile URL. BTreeMap keeps emission order stable.
    #[serde(default)]
    pub platform_links: BTreeMap<String, String>,
}

/// One performer credit on a track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtistCredit {
    /// Display name.
    pub name: String,
    /// Legal name, when recorded.
    pub legal_name: Option<String>,
    /// Whether this performer is flagged as a new artist for this release.
    #[serde(default)]
    pub is_new_artist: bool,
    /// Platform name -> profile URL.
    #[serde(default)]
    pub platform_links: BTreeMap<String, String>,
    /// Authoritative identity this record defers to, if any.
    pub canonical: Option<CanonicalIdentity>,
    /// Per-artist authorization document reference.
    pub authorization_reference: Option<String>,
    /// Short biography, used for the new-artist dossier.
    pub bio: Option<String>,
    /// Avatar image reference, used for the new-artist dossier.
    pub avatar_reference: Option<String>,
}

impl ArtistCredit {
    /// The name to show in package output, after canonical substitution.
    pub fn display_name(&self) -> &str {
        self.canonical
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(&self.name)
    }

    /// The platform links to show, after canonical substitution.
    pub fn effective_links(&self) -> &BTreeMap<String, String> {
        self.canonical
            .as_ref()
            .map(|c| &c.platform_links)
            .unwrap_or(&self.platform_links)
    }
}

/// One track entry in a release manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackEntry {
    /// 1-based position in the release. Folder and sidecar order follow
    /// this number, never processing order.
    pub track_number: u32,
    /// Track title.
    pub title: String,
    /// Opaque reference to the verified master audio.
    pub audio_reference: String,
    /// Performer credits, in billing order.
    pub artists: Vec<ArtistCredit>,
    /// Whether the track has no lyrics at all.
    #[serde(default)]
    pub is_instrumental: bool,
    /// Lyrics document reference, for non-instrumental tracks.
    pub lyrics_reference: Option<String>,
    /// Translated lyrics document reference.
    pub translated_lyrics_reference: Option<String>,
    /// Expected checksum of the master audio (lowercase or uppercase hex).
    pub expected_checksum: Option<String>,
    /// Expected audio duration in seconds.
    pub expected_duration_seconds: Option<f64>,
    /// Track language, for the manifest sidecar.
    pub language: String,
    /// Genre, for the manifest sidecar.
    pub genre: String,
    /// Credited real names for the words.
    #[serde(default)]
    pub words_by: Vec<String>,
    /// Credited real names for the music.
    #[serde(default)]
    pub music_by: Vec<String>,
}

impl TrackEntry {
    /// Performer display names joined for folder names and sidecar rows.
    pub fn performer_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A per-platform dynamic-cover entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DynamicCoverEntry {
    /// Distribution platform name.
    pub platform: String,
    /// Square (1:1) video reference.
    pub square_reference: String,
    /// Portrait (3:4) video reference, when submitted.
    pub portrait_reference: Option<String>,
    /// Review state. Only approved or submitted entries ship.
    pub state: ApprovalState,
}

/// The approved, frozen description of one release package.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Album title.
    pub title: String,
    /// Release date.
    pub release_date: Date,
    /// Release type, for the manifest sidecar (e.g. "Album", "Single", "EP").
    pub release_type: String,
    /// Cover art reference.
    pub cover_image_reference: String,
    /// Album-level authorization document reference.
    pub album_authorization_reference: Option<String>,
    /// Dynamic-cover entries across all platforms and states; the assembler
    /// filters to deliverable states.
    #[serde(default)]
    pub dynamic_covers: Vec<DynamicCoverEntry>,
    /// Album description, written as plain text into the package.
    #[serde(default)]
    pub description: String,
    /// External display blurb, written as plain text into the package.
    #[serde(default)]
    pub display_blurb: String,
    /// Track entries. Order in this list is not trusted; consumers sort by
    /// `track_number`.
    pub tracks: Vec<TrackEntry>,
}

impl ReleaseManifest {
    /// Tracks sorted by track number.
    pub fn ordered_tracks(&self) -> Vec<&TrackEntry> {
        let mut tracks: Vec<&TrackEntry> = self.tracks.iter().collect();
        tracks.sort_by_key(|t| t.track_number);
        tracks
    }

    /// Whether any performer across the whole release is a new artist.
    pub fn has_new_artists(&self) -> bool {
        self.tracks
            .iter()
            .flat_map(|t| t.artists.iter())
            .any(|a| a.is_new_artist)
    }

    /// Dynamic-cover entries that may ship, in platform order.
    pub fn deliverable_dynamic_covers(&self) -> Vec<&DynamicCoverEntry> {
        self.dynamic_covers
            .iter()
            .filter(|e| e.state.is_deliverable())
            .collect()
    }

    /// Validate the hard parts of the contract: non-empty title, at least
    /// one track, unique track numbers.
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::Error::InvalidManifest(
                "album title cannot be empty".to_string(),
            ));
        }
        if self.tracks.is_empty() {
            return Err(crate::Error::InvalidManifest(
                "release must contain at least one track".to_string(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for track in &self.tracks {
            if track.track_number == 0 {
                return Err(crate::Error::InvalidManifest(format!(
                    "track \"{}\" has track number 0 (numbering is 1-based)",
                    track.title
                )));
            }
            if !seen.insert(track.track_number) {
                return Err(crate::Error::InvalidManifest(format!(
                    "duplicate track number {}",
                    track.track_number
                )));
            }
            if track.artists.is_empty() {
                return Err(crate::Error::InvalidManifest(format!(
                    "track {} has no performer credits",
                    track.track_number
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn credit(name: &str) -> ArtistCredit {
        ArtistCredit {
            name: name.to_string(),
            legal_name: None,
            is_new_artist: false,
            platform_links: BTreeMap::new(),
            canonical: None,
            authorization_reference: None,
            bio: None,
            avatar_reference: None,
        }
    }

    fn track(number: u32, title: &str) -> TrackEntry {
        TrackEntry {
            track_number: number,
            title: title.to_string(),
            audio_reference: format!("ref-{number}"),
            artists: vec![credit("Performer")],
            is_instrumental: false,
            lyrics_reference: None,
            translated_lyrics_reference: None,
            expected_checksum: None,
            expected_duration_seconds: None,
            language: "en".to_string(),
            genre: "Pop".to_string(),
            words_by: vec![],
            music_by: vec![],
        }
    }

    fn manifest(tracks: Vec<TrackEntry>) -> ReleaseManifest {
        ReleaseManifest {
            title: "Test Album".to_string(),
            release_date: date!(2026 - 03 - 01),
            release_type: "Album".to_string(),
            cover_image_reference: "cover-ref".to_string(),
            album_authorization_reference: None,
            dynamic_covers: vec![],
            description: String::new(),
            display_blurb: String::new(),
            tracks,
        }
    }

    #[test]
    fn test_ordered_tracks_sorts_by_number() {
        let m = manifest(vec![track(3, "c"), track(1, "a"), track(2, "b")]);
        let order: Vec<u32> = m.ordered_tracks().iter().map(|t| t.track_number).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_track_numbers_rejected() {
        let m = manifest(vec![track(1, "a"), track(1, "b")]);
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_canonical_substitution() {
        let mut c = credit("alias-handle");
        c.canonical = Some(CanonicalIdentity {
            name: "Real Artist".to_string(),
            platform_links: BTreeMap::from([(
                "spotify".to_string(),
                "https://example.com/real".to_string(),
            )]),
        });
        assert_eq!(c.display_name(), "Real Artist");
        assert!(c.effective_links().contains_key("spotify"));
    }

    #[test]
    fn test_deliverable_dynamic_covers_filters_states() {
        let mut m = manifest(vec![track(1, "a")]);
        for (platform, state) in [
            ("apple", ApprovalState::Approved),
            ("spotify", ApprovalState::Submitted),
            ("tidal", ApprovalState::Rejected),
            ("deezer", ApprovalState::Pending),
        ] {
            m.dynamic_covers.push(DynamicCoverEntry {
                platform: platform.to_string(),
                square_reference: format!("{platform}-square"),
                portrait_reference: None,
                state,
            });
        }
        let shipped: Vec<&str> = m
            .deliverable_dynamic_covers()
            .iter()
            .map(|e| e.platform.as_str())
            .collect();
        assert_eq!(shipped, vec!["apple", "spotify"]);
    }

    #[test]
    fn test_has_new_artists() {
        let mut t = track(1, "a");
        assert!(!manifest(vec![t.clone()]).has_new_artists());
        t.artists[0].is_new_artist = true;
        assert!(manifest(vec![t]).has_new_artists());
    }
}
