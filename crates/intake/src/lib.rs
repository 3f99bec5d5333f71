//! Chunked upload intake for the Pressroom media pipeline.
//!
//! This crate accepts large files over unreliable connections:
//! - Session-scoped storage for out-of-order chunk writes
//! - Ordered merge into one byte stream once every chunk is present
//! - A TTL-bounded merge ledger that disambiguates "already merged" from
//!   "never existed" on repeated merge calls
//! - The finalize facade composing merge, verification, and vault ingest

pub mod error;
pub mod finalize;
pub mod ledger;
pub mod store;

pub use error::{IntakeError, IntakeResult};
pub use finalize::{MediaExpectations, MediaIntake};
pub use ledger::{Clock, MergeLedger, SystemClock};
pub use store::ChunkStore;
