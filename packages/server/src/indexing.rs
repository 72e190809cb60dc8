//! Semantic-indexing hook for document content.
//!
//! Placeholder for the future retrieval pipeline: walk a committed
//! collection's documents, extract text and push embeddings to a
//! vector index. Until that lands this only counts what it would
//! enqueue.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::debug;

use crate::entity::vault_file;
use crate::import::FileKind;

/// Queue every document in the collection for indexing. No-op
/// beyond logging; invoked best-effort after a commit.
pub async fn enqueue_collection_documents(
    db: &DatabaseConnection,
    collection_id: i32,
) -> Result<(), DbErr> {
    let documents = vault_file::Entity::find()
        .filter(vault_file::Column::CollectionId.eq(collection_id))
        .filter(vault_file::Column::FileType.eq(FileKind::Document.as_str()))
        .count(db)
        .await?;

    if documents > 0 {
        debug!(collection_id, documents, "documents eligible for indexing");
    }

    Ok(())
}
