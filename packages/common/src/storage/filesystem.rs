use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::hash::ContentHash;
use super::{BlobStore, PutOutcome, StagedBlob};

/// Filesystem-backed content-addressed blob store.
///
/// Published blobs live in a Git-style sharded layout:
/// `{root}/{first 2 hex chars}/{remaining 62 hex chars}`.
///
/// Staged blobs live under `{root}/.tmp/{uuid}` and become visible
/// only through the rename in `publish`, so a crash mid-write never
/// leaves a torn blob at a content-addressed path and an aborting
/// writer can discard its staging without touching published
/// content.
pub struct FilesystemBlobStore {
    root: PathBuf,
    max_blob_size: u64,
}

impl FilesystemBlobStore {
    pub async fn open(root: PathBuf, max_blob_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self {
            root,
            max_blob_size,
        })
    }

    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.root.join(hash.shard_prefix()).join(hash.shard_suffix())
    }

    fn staging_path(&self, token: &str) -> PathBuf {
        self.root.join(".tmp").join(token)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn stage(&self, data: &[u8]) -> Result<StagedBlob, StorageError> {
        if data.len() as u64 > self.max_blob_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_blob_size,
            });
        }

        let hash = ContentHash::of(data);
        let token = uuid::Uuid::new_v4().to_string();
        let staging_path = self.staging_path(&token);

        if let Err(e) = fs::write(&staging_path, data).await {
            let _ = fs::remove_file(&staging_path).await;
            return Err(e.into());
        }

        Ok(StagedBlob { hash, token })
    }

    async fn publish(&self, staged: &StagedBlob) -> Result<PutOutcome, StorageError> {
        let blob_path = self.blob_path(&staged.hash);
        let staging_path = self.staging_path(&staged.token);

        if fs::try_exists(&blob_path).await? {
            let _ = fs::remove_file(&staging_path).await;
            return Ok(PutOutcome {
                hash: staged.hash,
                newly_stored: false,
            });
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&staging_path, &blob_path).await {
            let _ = fs::remove_file(&staging_path).await;
            return Err(e.into());
        }

        Ok(PutOutcome {
            hash: staged.hash,
            newly_stored: true,
        })
    }

    async fn discard(&self, staged: &StagedBlob) -> Result<(), StorageError> {
        match fs::remove_file(self.staging_path(&staged.token)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.blob_path(hash)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(hash)).await?)
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        match fs::remove_file(self.blob_path(hash)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
