use common::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

/// Fatal import failures.
///
/// Every abort maps to exactly one of these kinds so callers can
/// tell corrupt input, hostile input, oversized input and internal
/// failures apart. There is no partial-success outcome: any of
/// these means zero collections, zero file records and zero audit
/// events for the attempted import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The source is not a readable ZIP container, or an entry's
    /// compressed stream is corrupt.
    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    /// An entry name would resolve outside the collection root.
    /// Carries the offending name for audit purposes only; it is
    /// never used for filesystem access.
    #[error("unsafe path in archive entry: {0:?}")]
    UnsafePath(String),

    /// Entry count or cumulative uncompressed bytes exceeded a
    /// configured ceiling, or an entry lied about its own size.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The blob store or the database failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ImportError {
    /// Machine-readable kind tag, mirrored into HTTP error bodies
    /// and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedArchive(_) => "MALFORMED_ARCHIVE",
            Self::UnsafePath(_) => "UNSAFE_PATH",
            Self::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }
}

impl From<StorageError> for ImportError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<DbErr> for ImportError {
    fn from(err: DbErr) -> Self {
        Self::Storage(err.to_string())
    }
}
