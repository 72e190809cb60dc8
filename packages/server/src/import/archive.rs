use std::io::{Read, Seek};

use zip::ZipArchive;

use super::error::ImportError;

/// Metadata for one archive entry, readable without extraction.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    /// Raw in-archive name, untrusted until sanitized.
    pub name: String,
    pub compressed_size: u64,
    /// Declared uncompressed size. Untrusted; extraction is capped
    /// and the actual size re-checked against it.
    pub uncompressed_size: u64,
}

/// Lazy reader over a ZIP container.
///
/// Enumerating entry metadata never decompresses anything; reading
/// an entry's bytes is an explicit, separately capped step so the
/// quota guard can reject an entry before extraction.
pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Open a byte source as a ZIP container.
    pub fn open(source: R) -> Result<Self, ImportError> {
        let archive = ZipArchive::new(source)
            .map_err(|e| ImportError::MalformedArchive(format!("invalid ZIP container: {e}")))?;
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    pub fn entry_meta(&mut self, index: usize) -> Result<EntryMeta, ImportError> {
        let entry = self.archive.by_index(index).map_err(|e| {
            ImportError::MalformedArchive(format!("cannot read entry {index}: {e}"))
        })?;

        Ok(EntryMeta {
            name: entry.name().to_string(),
            compressed_size: entry.compressed_size(),
            uncompressed_size: entry.size(),
        })
    }

    /// Extract an entry's bytes, reading at most `cap + 1` bytes.
    ///
    /// The extra byte lets the caller detect an entry that produces
    /// more than it declared without ever buffering the excess.
    pub fn read_entry(&mut self, index: usize, cap: u64) -> Result<Vec<u8>, ImportError> {
        let entry = self.archive.by_index(index).map_err(|e| {
            ImportError::MalformedArchive(format!("cannot read entry {index}: {e}"))
        })?;
        let name = entry.name().to_string();

        let mut buf = Vec::new();
        entry
            .take(cap.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| {
                ImportError::MalformedArchive(format!("failed to extract {name:?}: {e}"))
            })?;

        Ok(buf)
    }
}
