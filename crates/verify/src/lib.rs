//! Integrity verification for the Pressroom media pipeline.
//!
//! This crate decides whether a file on disk matches recorded expectations,
//! without ever mutating the file:
//! - Bounded-memory streaming checksum computation
//! - Media duration probing through an external collaborator
//! - Fail-closed composition of both checks into a [`VerificationResult`]

pub mod checksum;
pub mod error;
pub mod probe;
pub mod verifier;

pub use checksum::{compute_checksum, verify_checksum};
pub use error::{VerifyError, VerifyResult};
pub use probe::{DurationProbe, FfprobeProbe};
pub use verifier::IntegrityVerifier;

pub use pressroom_core::VerificationResult;
