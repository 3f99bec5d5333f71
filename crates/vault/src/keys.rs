//! Vault key material.

use crate::error::{VaultError, VaultResult};
use pressroom_core::config::KeyMaterialConfig;
use sha2::{Digest, Sha256};

/// Domain separator for the cipher key derivation.
const CIPHER_KEY_DOMAIN: &[u8] = b"pressroom-cipher-key-v1";
/// Domain separator for the legacy keyed format.
const LEGACY_KEY_DOMAIN: &[u8] = b"pressroom-legacy-key-v1";

/// Process-wide vault key material.
///
/// Loaded once at startup and read-only afterwards. Both keys derive from a
/// single operator secret through domain-separated SHA-256, so rotating the
/// secret rotates every encoding at once.
#[derive(Clone)]
pub struct KeyMaterial {
    cipher_key: [u8; 32],
    legacy_key: [u8; 32],
}

impl KeyMaterial {
    /// Derive key material from a raw secret.
    pub fn from_secret(secret: &str) -> VaultResult<Self> {
        let secret = secret.trim();
        if secret.len() < 8 {
            return Err(VaultError::KeyMaterial(format!(
                "secret too short: {} chars (min 8)",
                secret.len()
            )));
        }
        Ok(Self {
            cipher_key: derive(CIPHER_KEY_DOMAIN, secret.as_bytes()),
            legacy_key: derive(LEGACY_KEY_DOMAIN, secret.as_bytes()),
        })
    }

    /// Load key material from configuration.
    pub async fn load(config: &KeyMaterialConfig) -> VaultResult<Self> {
        let secret = match config {
            KeyMaterialConfig::File { path } => {
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    VaultError::KeyMaterial(format!(
                        "failed to read key file {}: {e}",
                        path.display()
                    ))
                })?
            }
            KeyMaterialConfig::Env { var } => std::env::var(var)
                .map_err(|_| VaultError::KeyMaterial(format!("env var not set: {var}")))?,
            KeyMaterialConfig::Value { secret } => secret.clone(),
        };
        Self::from_secret(&secret)
    }

    /// The AES-256 key for the modern encoding.
    pub fn cipher_key(&self) -> &[u8; 32] {
        &self.cipher_key
    }

    /// The key for the legacy fixed-width and fallback encodings.
    pub fn legacy_key(&self) -> &[u8; 32] {
        &self.legacy_key
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}

fn derive(domain: &[u8], secret: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(secret);
    hasher.finalize().into()
}
