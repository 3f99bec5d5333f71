//! Session-scoped chunk storage.
//!
//! Each upload session owns one directory under the chunk root for its
//! lifetime. Chunks arrive in any order and may be re-sent; merge streams
//! them back in index order and consumes the session. Callers serialize
//! operations per session; the store itself takes no per-session locks.

use crate::error::{IntakeError, IntakeResult};
use crate::ledger::MergeLedger;
use pressroom_core::{SessionId, UploadSession};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Session metadata sidecar filename.
const SESSION_META_FILE: &str = "session.json";

/// Durable, session-scoped storage for in-flight upload fragments.
pub struct ChunkStore {
    root: PathBuf,
    ledger: Arc<MergeLedger>,
}

impl ChunkStore {
    /// Create a chunk store rooted at `root`.
    pub async fn new(root: impl AsRef<Path>, ledger: Arc<MergeLedger>) -> IntakeResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root, ledger })
    }

    fn session_dir(&self, id: &SessionId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn chunk_path(&self, id: &SessionId, index: u32) -> PathBuf {
        self.session_dir(id).join(format!("{index:06}.chunk"))
    }

    /// Write one chunk. Creates the session directory (and its metadata
    /// sidecar) lazily on the first chunk; re-sending an index replaces the
    /// previous bytes, so client retries are always safe.
    #[tracing::instrument(skip(self, session, bytes), fields(session = %session.id, index))]
    pub async fn put_chunk(
        &self,
        session: &UploadSession,
        index: u32,
        bytes: &[u8],
    ) -> IntakeResult<()> {
        if index >= session.expected_chunk_count {
            return Err(IntakeError::InvalidChunkIndex {
                index,
                expected: session.expected_chunk_count,
            });
        }
        if bytes.is_empty() {
            return Err(IntakeError::EmptyChunk { index });
        }

        let dir = self.session_dir(&session.id);
        if !fs::try_exists(&dir).await? {
            fs::create_dir_all(&dir).await?;
            let meta = serde_json::to_vec_pretty(session)
                .map_err(|e| IntakeError::SessionCorrupt(e.to_string()))?;
            fs::write(dir.join(SESSION_META_FILE), meta).await?;
        }

        // Write to a temp name then rename, so a torn write never leaves a
        // half-chunk behind under the final name.
        let final_path = self.chunk_path(&session.id, index);
        let temp_path = final_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &final_path).await?;

        tracing::debug!(bytes = bytes.len(), "chunk written");
        Ok(())
    }

    /// Load the persisted session metadata.
    pub async fn load_session(&self, id: &SessionId) -> IntakeResult<UploadSession> {
        let path = self.session_dir(id).join(SESSION_META_FILE);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.not_found(id));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data).map_err(|e| IntakeError::SessionCorrupt(e.to_string()))
    }

    /// The set of chunk indices present on disk for a session.
    pub async fn received_indices(&self, id: &SessionId) -> IntakeResult<BTreeSet<u32>> {
        let dir = self.session_dir(id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.not_found(id));
            }
            Err(e) => return Err(e.into()),
        };

        let mut indices = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".chunk") {
                if let Ok(index) = stem.parse::<u32>() {
                    indices.insert(index);
                }
            }
        }
        Ok(indices)
    }

    /// Whether every expected chunk index has been written.
    pub async fn is_complete(&self, id: &SessionId) -> IntakeResult<bool> {
        let session = self.load_session(id).await?;
        let received = self.received_indices(id).await?;
        Ok(session.is_complete(&received))
    }

    /// Stream all chunks in index order into `writer`, then delete the
    /// session directory as one cleanup step.
    ///
    /// Fails with [`IntakeError::IncompleteUpload`] while chunks are
    /// missing. After a successful merge the session is consumed: a repeat
    /// call reports [`IntakeError::AlreadyMerged`] while the ledger
    /// tombstone lives, and [`IntakeError::SessionNotFound`] otherwise.
    /// Returns the number of bytes written.
    #[tracing::instrument(skip(self, writer), fields(session = %id))]
    pub async fn merge<W>(&self, id: &SessionId, writer: &mut W) -> IntakeResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let session = self.load_session(id).await?;
        let received = self.received_indices(id).await?;
        let missing = session.missing_indices(&received);
        if !missing.is_empty() {
            return Err(IntakeError::IncompleteUpload { missing });
        }

        let mut total: u64 = 0;
        for index in 0..session.expected_chunk_count {
            let mut chunk = fs::File::open(self.chunk_path(id, index)).await?;
            total += tokio::io::copy(&mut chunk, writer).await?;
        }
        writer.flush().await?;

        fs::remove_dir_all(self.session_dir(id)).await?;
        self.ledger.record(id);

        tracing::info!(
            chunks = session.expected_chunk_count,
            bytes = total,
            "session merged and consumed"
        );
        Ok(total)
    }

    /// Delete a session's directory and all chunk files, regardless of
    /// completeness. Used for explicit cancellation and for reclaiming
    /// orphaned sessions past the retention window.
    #[tracing::instrument(skip(self), fields(session = %id))]
    pub async fn abandon(&self, id: &SessionId) -> IntakeResult<()> {
        let dir = self.session_dir(id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!("session abandoned");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(self.not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Sessions whose directories have not been touched within the
    /// retention window. The retention sweep itself is an external
    /// scheduler; this only enumerates candidates for it.
    pub async fn stale_sessions(
        &self,
        retention: std::time::Duration,
    ) -> IntakeResult<Vec<SessionId>> {
        let now = SystemTime::now();
        let mut stale = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Ok(modified) = entry.metadata().await?.modified() else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age > retention {
                let name = entry.file_name();
                if let Some(name) = name.to_str() {
                    if let Ok(id) = SessionId::parse(name) {
                        stale.push(id);
                    }
                }
            }
        }
        Ok(stale)
    }

    fn not_found(&self, id: &SessionId) -> IntakeError {
        if self.ledger.was_merged(id) {
            IntakeError::AlreadyMerged(id.clone())
        } else {
            IntakeError::SessionNotFound(id.clone())
        }
    }
}
