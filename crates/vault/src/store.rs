//! Category-scoped media store.
//!
//! Verified media lives under one directory per category. Real paths are
//! owned exclusively by this crate: callers hand files in and get opaque
//! references back, and resolve references only through the vault.

use crate::error::{VaultError, VaultResult};
use crate::vault::ReferenceVault;
use pressroom_core::media::unique_filename;
use pressroom_core::MediaCategory;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem store for verified media files.
pub struct MediaStore {
    root: PathBuf,
    vault: ReferenceVault,
}

impl MediaStore {
    /// Create a media store rooted at `root`, creating category directories
    /// as needed.
    pub async fn new(root: impl AsRef<Path>, vault: ReferenceVault) -> VaultResult<Self> {
        let root = root.as_ref().to_path_buf();
        for category in [
            MediaCategory::Audio,
            MediaCategory::Image,
            MediaCategory::Document,
            MediaCategory::DynamicCover,
        ] {
            fs::create_dir_all(root.join(category.dir_name())).await?;
        }
        fs::create_dir_all(root.join("spool")).await?;
        Ok(Self { root, vault })
    }

    /// The vault used to mint and resolve references.
    pub fn vault(&self) -> &ReferenceVault {
        &self.vault
    }

    /// A fresh spool path for staging a file before ingestion.
    pub fn spool_path(&self, session_hint: &str) -> PathBuf {
        self.root
            .join("spool")
            .join(unique_filename(&format!("{session_hint}.part")))
    }

    /// Move a verified file into its category directory and mint an opaque
    /// reference for it.
    ///
    /// The stored filename embeds a timestamp and random suffix; the
    /// original name only contributes its extension. Returns the token;
    /// the real path never leaves this crate.
    #[tracing::instrument(skip(self))]
    pub async fn ingest(
        &self,
        staged: &Path,
        category: MediaCategory,
        original_name: &str,
    ) -> VaultResult<String> {
        let filename = unique_filename(original_name);
        let dest = self.root.join(category.dir_name()).join(&filename);

        // Same filesystem in the common case; fall back to copy+remove when
        // the spool lives on another device.
        match fs::rename(staged, &dest).await {
            Ok(()) => {}
            Err(_) => {
                fs::copy(staged, &dest).await?;
                fs::remove_file(staged).await?;
            }
        }

        let real_path = dest.to_string_lossy().into_owned();
        let token = self.vault.wrap(&real_path)?;
        tracing::info!(category = %category, token_len = token.len(), "media file ingested");
        Ok(token)
    }

    /// Resolve an opaque reference to a readable path.
    ///
    /// Fails with [`VaultError::Unresolvable`] when the token does not
    /// decode to an existing file.
    pub async fn resolve(&self, reference: &str) -> VaultResult<PathBuf> {
        let path = PathBuf::from(self.vault.unwrap(reference));
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(VaultError::Unresolvable(reference.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyMaterial;

    async fn store(dir: &tempfile::TempDir) -> MediaStore {
        let vault = ReferenceVault::new(KeyMaterial::from_secret("unit-test-secret").unwrap());
        MediaStore::new(dir.path().join("media"), vault).await.unwrap()
    }

    #[tokio::test]
    async fn ingest_moves_file_and_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let staged = store.spool_path("upload-1");
        fs::write(&staged, b"audio bytes").await.unwrap();

        let token = store
            .ingest(&staged, MediaCategory::Audio, "Master Take.wav")
            .await
            .unwrap();
        assert!(ReferenceVault::is_wrapped(&token));
        assert!(!fs::try_exists(&staged).await.unwrap());

        let resolved = store.resolve(&token).await.unwrap();
        assert!(resolved.starts_with(dir.path().join("media").join("audio")));
        assert_eq!(fs::read(&resolved).await.unwrap(), b"audio bytes");
        assert!(resolved.extension().is_some_and(|e| e == "wav"));
    }

    #[tokio::test]
    async fn resolve_unknown_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let vault = store.vault().clone();
        let token = vault.wrap("/nowhere/file.wav").unwrap();
        match store.resolve(&token).await {
            Err(VaultError::Unresolvable(_)) => {}
            other => panic!("expected Unresolvable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn categories_do_not_mix() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let staged = store.spool_path("upload-2");
        fs::write(&staged, b"pdf bytes").await.unwrap();
        let token = store
            .ingest(&staged, MediaCategory::Document, "authorization.pdf")
            .await
            .unwrap();

        let resolved = store.resolve(&token).await.unwrap();
        assert!(resolved.starts_with(dir.path().join("media").join("documents")));
    }
}
