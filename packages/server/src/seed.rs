use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::vault_file;

/// Create ad-hoc indexes schema sync does not cover.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Per-collection digest uniqueness: a second entry with an
    // identical digest is counted as a duplicate, never inserted.
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_vault_file_collection_hash")
        .table(vault_file::Entity)
        .col(vault_file::Column::CollectionId)
        .col(vault_file::Column::ContentHash)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_vault_file_collection_hash exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_vault_file_collection_hash: {}", e);
        }
    }

    Ok(())
}
