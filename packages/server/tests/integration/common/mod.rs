use std::io::{Cursor, Write};
use std::sync::Arc;

use common::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use server::import::{ImportError, ImportLimits, ImportOutcome};

/// Recipient used when the owner is not an email address.
pub const DEFAULT_RECIPIENT: &str = "admin@example.com";

/// A test database plus blob store.
///
/// Uses an in-memory sqlite database (single connection, so every
/// query sees the same memory) and a tempdir-backed blob store.
pub struct TestVault {
    pub db: DatabaseConnection,
    pub store: Arc<dyn BlobStore>,
    _dir: tempfile::TempDir,
}

impl TestVault {
    pub async fn setup() -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);

        let db = Database::connect(opt).await.expect("connect sqlite");
        db.get_schema_registry("server::entity::*")
            .sync(&db)
            .await
            .expect("sync schema");
        server::seed::ensure_indexes(&db).await.expect("ensure indexes");

        let dir = tempfile::tempdir().expect("tempdir");
        let store = FilesystemBlobStore::open(dir.path().join("blobs"), 1_000_000_000)
            .await
            .expect("open blob store");

        Self {
            db,
            store: Arc::new(store),
            _dir: dir,
        }
    }

    /// Run an import with default limits.
    pub async fn import(
        &self,
        archive_name: &str,
        zip_data: Vec<u8>,
        owner: Option<&str>,
    ) -> Result<ImportOutcome, ImportError> {
        self.import_with_limits(archive_name, zip_data, owner, &ImportLimits::default())
            .await
    }

    pub async fn import_with_limits(
        &self,
        archive_name: &str,
        zip_data: Vec<u8>,
        owner: Option<&str>,
        limits: &ImportLimits,
    ) -> Result<ImportOutcome, ImportError> {
        server::import::import_archive(
            &self.db,
            &*self.store,
            Cursor::new(zip_data),
            archive_name,
            owner,
            DEFAULT_RECIPIENT,
            limits,
        )
        .await
    }
}

/// Build a ZIP archive in memory with given file entries.
pub fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).expect("zip start_file");
        writer.write_all(content).expect("zip write_all");
    }
    writer.finish().expect("zip finish").into_inner()
}

/// Build a ZIP archive that also contains explicit directory entries.
pub fn build_zip_with_dirs(dirs: &[&str], files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for dir in dirs {
        writer.add_directory(*dir, options).expect("zip add_directory");
    }
    for (name, content) in files {
        writer.start_file(*name, options).expect("zip start_file");
        writer.write_all(content).expect("zip write_all");
    }
    writer.finish().expect("zip finish").into_inner()
}
