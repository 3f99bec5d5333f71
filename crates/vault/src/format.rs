//! Token format classification.
//!
//! Four generations of reference tokens coexist in storage. None of them
//! recorded a version field, so classification goes by structural shape:
//! prefix markers, character classes, and fixed-width separators.

/// Marker prefix for the length-bounded fallback encoding.
pub const FALLBACK_PREFIX: char = '~';

/// Length of the base64url-encoded nonce segment in modern tokens
/// (12 nonce bytes encode to exactly 16 chars without padding).
pub const MODERN_NONCE_LEN: usize = 16;

/// The structural format of a stored reference value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenFormat {
    /// AES-GCM encoding: `<16 base64url chars> "." <base64url payload>`.
    Modern,
    /// Keyed-XOR fallback used when the modern token would overflow the
    /// storage column: `~<base64url payload>`.
    LengthBoundedFallback,
    /// Oldest keyed format: even-length uppercase hex, one byte per path
    /// character.
    LegacyFixedWidth,
    /// An ordinary, unencoded path. Unwrapping is the identity function.
    Plain,
}

fn is_base64url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_base64url(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_base64url_char)
}

impl TokenFormat {
    /// Classify a stored value by structural shape.
    ///
    /// Ordinary paths contain separators; wrapped tokens by construction do
    /// not, so anything holding `/` or `\` is immediately plain. Values
    /// matching no known shape are also treated as plain: returning the
    /// input unchanged is cheaper than breaking access to an old file.
    pub fn classify(value: &str) -> Self {
        if value.is_empty() || value.contains('/') || value.contains('\\') {
            return Self::Plain;
        }

        if let Some(body) = value.strip_prefix(FALLBACK_PREFIX) {
            if is_base64url(body) {
                return Self::LengthBoundedFallback;
            }
            return Self::Plain;
        }

        if let Some((nonce, payload)) = value.split_once('.') {
            if nonce.len() == MODERN_NONCE_LEN
                && is_base64url(nonce)
                && is_base64url(payload)
                && !payload.contains('.')
            {
                return Self::Modern;
            }
            return Self::Plain;
        }

        if value.len() >= 2
            && value.len() % 2 == 0
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        {
            return Self::LegacyFixedWidth;
        }

        Self::Plain
    }

    /// Best-effort check for whether a value is a wrapped reference.
    ///
    /// Never classifies a value containing a path separator as wrapped.
    pub fn is_wrapped(value: &str) -> bool {
        Self::classify(value) != Self::Plain
    }
}
