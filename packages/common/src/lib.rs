pub mod storage;

pub use storage::{BlobStore, ContentHash, PutOutcome, StagedBlob, StorageError};
