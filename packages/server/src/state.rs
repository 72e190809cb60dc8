use std::sync::Arc;

use common::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::database::init_db;
use crate::seed;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Connect the database and open the blob store from config.
    /// Shared by the server binary and the CLI.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = init_db(&config.database.url).await?;
        seed::ensure_indexes(&db).await?;

        let blob_store =
            FilesystemBlobStore::open(config.storage.root.clone().into(), config.storage.max_blob_size)
                .await?;

        Ok(Self {
            db,
            blob_store: Arc::new(blob_store),
            config: Arc::new(config),
        })
    }
}
