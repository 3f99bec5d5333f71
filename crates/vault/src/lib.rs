//! Opaque reference vault and media store for Pressroom.
//!
//! This crate provides:
//! - Reference tokens that hide real storage paths from every caller,
//!   with backward-compatible decoding of all historical token formats
//! - The category-scoped media store that exclusively owns real paths
//!
//! Tokens of every generation coexist in storage indefinitely, so decoding
//! classifies a token's format by structural shape before touching it; no
//! version field was ever recorded.

pub mod error;
pub mod format;
pub mod keys;
pub mod store;
pub mod vault;

pub use error::{VaultError, VaultResult};
pub use format::TokenFormat;
pub use keys::KeyMaterial;
pub use store::MediaStore;
pub use vault::ReferenceVault;
