//! Upload session types and lifecycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use time::OffsetDateTime;

/// Unique identifier for a resumable upload session.
///
/// Session ids become on-disk directory names, so the accepted alphabet is
/// restricted to characters that are safe as a single path component.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Parse from a string, validating format.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Err(crate::Error::InvalidSessionId(
                "session id cannot be empty".to_string(),
            ));
        }
        if s.len() > 128 {
            return Err(crate::Error::InvalidSessionId(format!(
                "session id too long: {} chars (max 128)",
                s.len()
            )));
        }
        for c in s.chars() {
            if !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.') {
                return Err(crate::Error::InvalidSessionId(format!(
                    "invalid character in session id: {c}"
                )));
            }
        }
        // "." and ".." are legal by character class but unsafe as directories.
        if s.chars().all(|c| c == '.') {
            return Err(crate::Error::InvalidSessionId(
                "session id cannot be only dots".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Generate a new random session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata for one resumable upload session.
///
/// Persisted as a JSON sidecar inside the session directory so resumable
/// uploads survive process restarts. `original_filename` and
/// `declared_byte_size` are advisory (client-supplied), never authoritative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadSession {
    /// Unique session identifier.
    pub id: SessionId,
    /// Number of chunks the client will send, fixed at session start.
    pub expected_chunk_count: u32,
    /// Filename as reported by the client.
    pub original_filename: String,
    /// Total byte size as reported by the client.
    pub declared_byte_size: Option<u64>,
    /// When the session was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UploadSession {
    /// Create a new upload session.
    pub fn new(
        id: SessionId,
        expected_chunk_count: u32,
        original_filename: impl Into<String>,
        declared_byte_size: Option<u64>,
    ) -> crate::Result<Self> {
        if expected_chunk_count == 0 {
            return Err(crate::Error::InvalidSessionId(format!(
                "session {id} must expect at least one chunk"
            )));
        }
        Ok(Self {
            id,
            expected_chunk_count,
            original_filename: original_filename.into(),
            declared_byte_size,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    /// Compute the missing chunk indices given the set received so far.
    pub fn missing_indices(&self, received: &BTreeSet<u32>) -> Vec<u32> {
        (0..self.expected_chunk_count)
            .filter(|i| !received.contains(i))
            .collect()
    }

    /// Check whether every expected index has been received.
    pub fn is_complete(&self, received: &BTreeSet<u32>) -> bool {
        self.missing_indices(received).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_accepts_safe_chars() {
        for s in ["abc-123", "A_B.C", "550e8400-e29b-41d4-a716-446655440000"] {
            assert!(SessionId::parse(s).is_ok(), "should accept {s}");
        }
    }

    #[test]
    fn test_session_id_rejects_unsafe() {
        for s in ["", "a/b", "..", "a b", "x\0y", &"a".repeat(129)] {
            assert!(SessionId::parse(s).is_err(), "should reject {s:?}");
        }
    }

    #[test]
    fn test_missing_indices() {
        let session = UploadSession::new(SessionId::generate(), 4, "a.wav", None).unwrap();
        let mut received = BTreeSet::new();
        received.insert(0);
        received.insert(2);
        assert_eq!(session.missing_indices(&received), vec![1, 3]);
        assert!(!session.is_complete(&received));

        received.insert(1);
        received.insert(3);
        assert!(session.is_complete(&received));
    }

    #[test]
    fn test_zero_chunks_rejected() {
        assert!(UploadSession::new(SessionId::generate(), 0, "a.wav", None).is_err());
    }
}
