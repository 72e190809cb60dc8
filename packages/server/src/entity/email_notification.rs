use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outbound notification queue. The importer only inserts; a
/// separate dispatcher flips `is_sent` once delivered.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_notification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub to_email: String,
    pub subject: String,
    pub body: String,

    /// One of "administrative", "file_updates", "user_actions".
    pub classification: String,

    pub is_sent: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
