use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{collection, vault_file};
use crate::import::ImportOutcome;

/// JSON body for importing a server-side archive path.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ImportPathRequest {
    /// Path to a ZIP file readable by the server.
    #[schema(example = "/srv/uploads/benchy_pack.zip")]
    pub zip_path: String,
    /// Optional owning principal recorded on the collection.
    pub owner: Option<String>,
}

/// Result of a committed import.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportResponse {
    #[schema(example = "benchy-pack")]
    pub collection_slug: String,
    #[schema(example = "benchy pack")]
    pub collection_name: String,
    pub created_files: u64,
    pub skipped_duplicates: u64,
    /// Bytes of stored (non-duplicate) content.
    pub total_bytes: u64,
    /// Non-fatal post-commit problems, e.g. a failed audit append.
    pub warnings: Vec<String>,
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            collection_slug: outcome.collection_slug,
            collection_name: outcome.collection_name,
            created_files: outcome.created_files,
            skipped_duplicates: outcome.skipped_duplicates,
            total_bytes: outcome.total_bytes,
            warnings: outcome.warnings,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CollectionResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub source: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<collection::Model> for CollectionResponse {
    fn from(model: collection::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            source: model.source,
            created_by: model.created_by,
            created_at: model.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct CollectionListQuery {
    /// 1-based page number (default 1).
    pub page: Option<u64>,
    /// Page size, 1-100 (default 20).
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CollectionListResponse {
    pub data: Vec<CollectionResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VaultFileResponse {
    pub id: i32,
    pub original_name: String,
    /// One of "model", "document", "other".
    #[schema(example = "model")]
    pub file_type: String,
    /// SHA-256 content digest (64-char hex).
    pub content_hash: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<vault_file::Model> for VaultFileResponse {
    fn from(model: vault_file::Model) -> Self {
        Self {
            id: model.id,
            original_name: model.original_name,
            file_type: model.file_type,
            content_hash: model.content_hash,
            size_bytes: model.size_bytes,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VaultFileListResponse {
    pub files: Vec<VaultFileResponse>,
    pub total: u64,
}
