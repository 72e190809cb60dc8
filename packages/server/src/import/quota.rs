use serde::Deserialize;

use super::error::ImportError;

/// Configured ceilings for a single import.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportLimits {
    /// Maximum number of stored entries per archive.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Maximum cumulative uncompressed bytes per archive.
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,
}

fn default_max_entries() -> u64 {
    5000
}

fn default_max_total_bytes() -> u64 {
    1_000_000_000
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_total_bytes: default_max_total_bytes(),
        }
    }
}

/// Running zip-bomb accounting for one import.
///
/// Declared sizes are untrusted: an entry is admitted on its
/// declared size before extraction, then re-checked against the
/// bytes actually produced. Totals only ever grow; a breach aborts
/// the whole import.
pub struct QuotaGuard {
    max_entries: u64,
    max_total_bytes: u64,
    entries: u64,
    total_bytes: u64,
}

impl QuotaGuard {
    pub fn new(limits: &ImportLimits) -> Self {
        Self {
            max_entries: limits.max_entries,
            max_total_bytes: limits.max_total_bytes,
            entries: 0,
            total_bytes: 0,
        }
    }

    /// Check an entry before extraction, using its declared
    /// uncompressed size. Counts the entry on success.
    pub fn admit(&mut self, declared_size: u64) -> Result<(), ImportError> {
        if self.entries + 1 > self.max_entries {
            return Err(ImportError::QuotaExceeded(format!(
                "archive exceeds the {} entry limit",
                self.max_entries
            )));
        }

        let projected = self.total_bytes.saturating_add(declared_size);
        if projected > self.max_total_bytes {
            return Err(ImportError::QuotaExceeded(format!(
                "declared uncompressed size reaches {projected} bytes, limit is {} bytes",
                self.max_total_bytes
            )));
        }

        self.entries += 1;
        Ok(())
    }

    /// Account the bytes actually extracted for the entry admitted
    /// last. An entry that produces more than it declared is lying
    /// and trips the guard even below the byte ceiling.
    pub fn record_extracted(
        &mut self,
        declared_size: u64,
        actual_size: u64,
    ) -> Result<(), ImportError> {
        if actual_size > declared_size {
            return Err(ImportError::QuotaExceeded(format!(
                "entry extracted to {actual_size} bytes but declared {declared_size}"
            )));
        }

        self.total_bytes = self.total_bytes.saturating_add(actual_size);
        if self.total_bytes > self.max_total_bytes {
            return Err(ImportError::QuotaExceeded(format!(
                "extraction exceeded the {} byte limit",
                self.max_total_bytes
            )));
        }

        Ok(())
    }
}
