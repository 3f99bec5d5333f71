//! Release package assembly for the Pressroom media pipeline.
//!
//! Given an approved release manifest, this crate resolves every asset
//! through the reference vault, re-verifies audio files, lays everything
//! out under a fixed directory convention, emits a tabular manifest
//! sidecar, and compresses the whole package into one delivery archive.
//! The package contains every asset the release is entitled to, and
//! nothing it is not.

pub mod album;
pub mod archive;
pub mod assembler;
pub mod error;
pub mod plan;
pub mod sheet;
pub mod tracks;

pub use assembler::{DeliveryArchive, ReleaseAssembler, ARCHIVE_CONTENT_TYPE};
pub use error::{AssemblerError, AssemblerResult};
pub use plan::ReleasePlan;
pub use tracks::TrackOutcome;
