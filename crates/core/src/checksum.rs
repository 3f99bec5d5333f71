//! Content checksum types and utilities.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 content checksum represented as 32 bytes.
///
/// Checksums compare case-insensitively when parsed from hex: stored
/// expectations produced by older tooling may be uppercase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Create a new Checksum from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Compute the checksum of in-memory data.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create an incremental hasher for streaming computation.
    pub fn hasher() -> ChecksumHasher {
        ChecksumHasher(Sha256::new())
    }

    /// Parse from a hex string, accepting either case.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        if s.len() != 64 {
            return Err(crate::Error::InvalidChecksum(format!(
                "expected 64 hex chars, got {}",
                s.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hex_str = std::str::from_utf8(chunk)
                .map_err(|e| crate::Error::InvalidChecksum(e.to_string()))?;
            bytes[i] = u8::from_str_radix(hex_str, 16)
                .map_err(|e| crate::Error::InvalidChecksum(e.to_string()))?;
        }
        Ok(Self(bytes))
    }

    /// Encode as lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Compare against a hex expectation, ignoring case.
    ///
    /// Returns false for malformed expectations rather than erroring: a
    /// corrupt stored expectation must read as a mismatch, never a pass.
    pub fn matches_hex(&self, expected: &str) -> bool {
        match Self::from_hex(expected.trim()) {
            Ok(parsed) => parsed == *self,
            Err(_) => false,
        }
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Incremental SHA-256 hasher for streaming checksum computation.
pub struct ChecksumHasher(Sha256);

impl ChecksumHasher {
    /// Update the hasher with data.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Finalize and return the checksum.
    pub fn finalize(self) -> Checksum {
        Checksum(self.0.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_hex_roundtrip() {
        let checksum = Checksum::compute(b"hello world");
        let hex = checksum.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, hex.to_lowercase());
        let parsed = Checksum::from_hex(&hex).unwrap();
        assert_eq!(checksum, parsed);
    }

    #[test]
    fn test_checksum_case_insensitive_match() {
        let checksum = Checksum::compute(b"data");
        let upper = checksum.to_hex().to_uppercase();
        assert!(checksum.matches_hex(&upper));
        assert!(checksum.matches_hex(&checksum.to_hex()));
    }

    #[test]
    fn test_checksum_malformed_expectation_is_mismatch() {
        let checksum = Checksum::compute(b"data");
        assert!(!checksum.matches_hex("not-hex"));
        assert!(!checksum.matches_hex("abc123"));
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let mut hasher = Checksum::hasher();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(hasher.finalize(), Checksum::compute(b"hello world"));
    }
}
