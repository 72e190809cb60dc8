use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit log. Rows are never updated or deleted by the
/// importer.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Acting principal; NULL for anonymous or system actions.
    pub actor: Option<String>,

    pub action: String,

    /// Structured payload: counts, source path, collection slug.
    pub metadata: Json,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
