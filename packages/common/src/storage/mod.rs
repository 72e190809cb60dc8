mod error;
mod hash;

pub mod filesystem;

use async_trait::async_trait;

pub use error::StorageError;
pub use hash::ContentHash;

/// Result of publishing a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    pub hash: ContentHash,
    /// Whether this call made the blob visible, as opposed to
    /// finding the content already published.
    pub newly_stored: bool,
}

/// A blob written to a private staging location, not yet visible at
/// its content-addressed path.
#[derive(Debug, Clone)]
pub struct StagedBlob {
    pub hash: ContentHash,
    /// Store-specific handle for the staging location.
    pub token: String,
}

/// Content-addressed blob storage.
///
/// Blobs are identified solely by the SHA-256 hash of their content.
/// Writes are two-phase: `stage` keeps the bytes private to the
/// writer, `publish` makes them visible at the content-addressed
/// path. Published content may be referenced from anywhere, so a
/// writer that aborts must only `discard` its own staged blobs and
/// must never remove a published path it did not exclusively own.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write bytes to a private staging location.
    async fn stage(&self, data: &[u8]) -> Result<StagedBlob, StorageError>;

    /// Move a staged blob to its content-addressed path. Idempotent:
    /// publishing content that already exists drops the staging copy
    /// and reports `newly_stored: false`.
    async fn publish(&self, staged: &StagedBlob) -> Result<PutOutcome, StorageError>;

    /// Remove a staged blob that will not be published. A blob that
    /// is already gone is not an error.
    async fn discard(&self, staged: &StagedBlob) -> Result<(), StorageError>;

    /// Retrieve all bytes for a published blob by its content hash.
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError>;

    /// Check whether a published blob exists.
    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Delete a published blob by its content hash. For offline
    /// garbage collection only; returns `true` if the blob existed.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Stage and immediately publish in one step.
    async fn put(&self, data: &[u8]) -> Result<PutOutcome, StorageError> {
        let staged = self.stage(data).await?;
        self.publish(&staged).await
    }
}
