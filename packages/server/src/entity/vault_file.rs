use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vault_file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub collection_id: i32,

    #[sea_orm(belongs_to, from = "collection_id", to = "id")]
    pub collection: HasOne<super::collection::Entity>,

    /// SHA-256 content digest (64-char hex). Unique within a
    /// collection; the blob store keys content by this value.
    pub content_hash: String,

    /// Classification tag: "model", "document" or "other".
    pub file_type: String,

    /// Entry name as it appeared inside the archive.
    pub original_name: String,

    pub size_bytes: i64,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
