use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collection")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// URL-safe identifier derived from the name at creation, never
    /// mutated afterwards.
    #[sea_orm(unique)]
    pub slug: String,

    /// Origin tag, e.g. "archive_import".
    pub source: String,

    /// Principal that requested the import, if any.
    pub created_by: Option<String>,

    #[sea_orm(has_many)]
    pub files: HasMany<super::vault_file::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
