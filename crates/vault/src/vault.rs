//! Reference wrapping and unwrapping.

use crate::error::{VaultError, VaultResult};
use crate::format::{TokenFormat, FALLBACK_PREFIX};
use crate::keys::KeyMaterial;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pressroom_core::MAX_REFERENCE_LEN;
use sha2::{Digest, Sha256};

/// Domain separator for deterministic nonce derivation.
const NONCE_DOMAIN: &[u8] = b"pressroom-nonce-v1";
/// Domain separator for the fallback keystream.
const FALLBACK_DOMAIN: &[u8] = b"pressroom-fallback-v1";

/// Turns real storage paths into opaque reference tokens and back.
///
/// `unwrap` accepts tokens from every historical generation; `wrap` only
/// ever produces the modern encoding (or its length-bounded fallback when
/// the column cap would be exceeded).
#[derive(Clone)]
pub struct ReferenceVault {
    keys: KeyMaterial,
}

impl ReferenceVault {
    /// Create a vault over the given key material.
    pub fn new(keys: KeyMaterial) -> Self {
        Self { keys }
    }

    /// Wrap a real path into an opaque token.
    ///
    /// The nonce derives from the key and the path, so wrapping is
    /// deterministic for a given key material. If the cipher output would
    /// exceed the storage column cap the keyed-XOR fallback is used
    /// instead; truncation would be silently corrupting and never happens.
    pub fn wrap(&self, path: &str) -> VaultResult<String> {
        let nonce_bytes = self.derive_nonce(path);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.keys.cipher_key()));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), path.as_bytes())
            .map_err(|_| VaultError::KeyMaterial("encryption failed".to_string()))?;

        let token = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(nonce_bytes),
            URL_SAFE_NO_PAD.encode(&ciphertext)
        );
        if token.len() <= MAX_REFERENCE_LEN {
            return Ok(token);
        }

        let fallback = format!(
            "{}{}",
            FALLBACK_PREFIX,
            URL_SAFE_NO_PAD.encode(self.fallback_keystream_xor(path.as_bytes()))
        );
        if fallback.len() > MAX_REFERENCE_LEN {
            return Err(VaultError::ReferenceTooLong {
                len: fallback.len(),
                max: MAX_REFERENCE_LEN,
            });
        }
        tracing::debug!(
            token_len = token.len(),
            fallback_len = fallback.len(),
            "cipher token over column cap, using fallback encoding"
        );
        Ok(fallback)
    }

    /// Unwrap a token back to the real path.
    ///
    /// Classifies the format first, then decodes per variant. Unrecognized
    /// or undecodable values are returned unchanged rather than erroring:
    /// breaking access to old files costs more than occasionally failing to
    /// decode. Callers needing a hard guarantee check
    /// [`TokenFormat::is_wrapped`] first.
    pub fn unwrap(&self, value: &str) -> String {
        match TokenFormat::classify(value) {
            TokenFormat::Plain => value.to_string(),
            TokenFormat::Modern => self.unwrap_modern(value).unwrap_or_else(|| value.to_string()),
            TokenFormat::LengthBoundedFallback => self
                .unwrap_fallback(value)
                .unwrap_or_else(|| value.to_string()),
            TokenFormat::LegacyFixedWidth => self
                .unwrap_legacy(value)
                .unwrap_or_else(|| value.to_string()),
        }
    }

    /// Best-effort classifier for whether a stored value is wrapped.
    pub fn is_wrapped(value: &str) -> bool {
        TokenFormat::is_wrapped(value)
    }

    fn derive_nonce(&self, path: &str) -> [u8; 12] {
        let mut hasher = Sha256::new();
        hasher.update(NONCE_DOMAIN);
        hasher.update(self.keys.cipher_key());
        hasher.update(path.as_bytes());
        let digest = hasher.finalize();
        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(&digest[..12]);
        nonce
    }

    fn unwrap_modern(&self, token: &str) -> Option<String> {
        let (nonce_part, payload_part) = token.split_once('.')?;
        let nonce_bytes = URL_SAFE_NO_PAD.decode(nonce_part).ok()?;
        let ciphertext = URL_SAFE_NO_PAD.decode(payload_part).ok()?;
        if nonce_bytes.len() != 12 {
            return None;
        }
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.keys.cipher_key()));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .ok()?;
        String::from_utf8(plaintext).ok()
    }

    fn unwrap_fallback(&self, token: &str) -> Option<String> {
        let body = token.strip_prefix(FALLBACK_PREFIX)?;
        let masked = URL_SAFE_NO_PAD.decode(body).ok()?;
        let plain = self.fallback_keystream_xor(&masked);
        String::from_utf8(plain).ok()
    }

    /// XOR with a SHA-256 counter keystream. Involution: applying it twice
    /// restores the input.
    fn fallback_keystream_xor(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        for (block_index, block) in data.chunks(32).enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(FALLBACK_DOMAIN);
            hasher.update(self.keys.legacy_key());
            hasher.update((block_index as u32).to_be_bytes());
            let keystream = hasher.finalize();
            out.extend(block.iter().zip(keystream.iter()).map(|(b, k)| b ^ k));
        }
        out
    }

    fn unwrap_legacy(&self, token: &str) -> Option<String> {
        let mut bytes = Vec::with_capacity(token.len() / 2);
        for pair in token.as_bytes().chunks(2) {
            let hex = std::str::from_utf8(pair).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
        }
        let key = self.keys.legacy_key();
        let plain: Vec<u8> = bytes
            .iter()
            .enumerate()
            .map(|(i, b)| b ^ key[i % key.len()])
            .collect();
        String::from_utf8(plain).ok()
    }

}

impl std::fmt::Debug for ReferenceVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceVault").finish_non_exhaustive()
    }
}
