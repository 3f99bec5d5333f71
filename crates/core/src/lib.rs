//! Core domain types and shared logic for the Pressroom media pipeline.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content checksums and incremental hashing
//! - Upload session lifecycle
//! - Stored media records and category layout
//! - Verification results
//! - The release manifest contract
//! - Configuration types

pub mod checksum;
pub mod config;
pub mod error;
pub mod manifest;
pub mod media;
pub mod session;
pub mod verdict;

pub use checksum::{Checksum, ChecksumHasher};
pub use config::{
    AppConfig, AssemblerConfig, IntakeConfig, KeyMaterialConfig, VaultConfig, VerifyConfig,
};
pub use error::{Error, Result};
pub use manifest::{
    ApprovalState, ArtistCredit, CanonicalIdentity, DynamicCoverEntry, ReleaseManifest, TrackEntry,
};
pub use media::{MediaCategory, StoredMedia};
pub use session::{SessionId, UploadSession};
pub use verdict::VerificationResult;

/// Default duration tolerance when verifying media files: 2 seconds.
pub const DEFAULT_DURATION_TOLERANCE_SECS: f64 = 2.0;

/// Maximum opaque reference length. Legacy storage columns cap references at
/// 191 characters, so any encoding that would exceed this must fall back to
/// a shorter reversible form instead of truncating.
pub const MAX_REFERENCE_LEN: usize = 191;
