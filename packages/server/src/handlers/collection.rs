use std::io::Cursor;

use axum::Json;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use sea_orm::{ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::instrument;

use crate::entity::{collection, vault_file};
use crate::error::{AppError, ErrorBody};
use crate::import;
use crate::models::collection::*;
use crate::state::AppState;

/// Body limit layer for the archive import route (128MB).
pub fn import_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(128 * 1024 * 1024)
}

#[utoipa::path(
    post,
    path = "/import",
    tag = "Collections",
    operation_id = "importArchive",
    summary = "Import a ZIP archive as a new collection",
    description = "Validates an untrusted ZIP archive and commits it as a new collection. \
        Accepts either multipart form data (`file` field with the archive, optional `owner` \
        text field) or a JSON body naming a server-side path. Every run creates a new \
        collection; duplicate content within the archive is skipped, not stored twice. \
        A hostile or oversized archive aborts the whole import with nothing committed.",
    request_body(content_type = "multipart/form-data", description = "ZIP archive upload"),
    responses(
        (status = 201, description = "Archive imported", body = ImportResponse),
        (status = 400, description = "Malformed archive or unsafe entry path (MALFORMED_ARCHIVE, UNSAFE_PATH, VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Entry or byte ceiling exceeded (QUOTA_EXCEEDED)", body = ErrorBody),
        (status = 500, description = "Storage failure during commit (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request))]
pub async fn import_archive(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let (archive_name, bytes, owner) = if content_type.starts_with("multipart/form-data") {
        read_multipart_upload(request).await?
    } else {
        read_server_path(request).await?
    };

    let outcome = import::import_archive(
        &state.db,
        &*state.blob_store,
        Cursor::new(bytes),
        &archive_name,
        owner.as_deref(),
        &state.config.notify.default_recipient,
        &state.config.import,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ImportResponse::from(outcome))))
}

/// Pull the archive bytes and optional owner out of a multipart
/// upload.
async fn read_multipart_upload(
    request: Request,
) -> Result<(String, Vec<u8>, Option<String>), AppError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;

    let mut archive: Option<(String, Vec<u8>)> = None;
    let mut owner: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .unwrap_or("archive.zip")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                archive = Some((filename, data.to_vec()));
            }
            Some("owner") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read owner: {e}")))?;
                if !text.trim().is_empty() {
                    owner = Some(text.trim().to_string());
                }
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let (filename, bytes) =
        archive.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    Ok((filename, bytes, owner))
}

/// Load the archive named by a JSON `{ zip_path, owner? }` body.
async fn read_server_path(
    request: Request,
) -> Result<(String, Vec<u8>, Option<String>), AppError> {
    let Json(payload) = Json::<ImportPathRequest>::from_request(request, &())
        .await
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))?;

    let bytes = tokio::fs::read(&payload.zip_path)
        .await
        .map_err(|e| AppError::Validation(format!("File not found: {}: {e}", payload.zip_path)))?;

    let archive_name = std::path::Path::new(&payload.zip_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("archive.zip")
        .to_string();

    Ok((archive_name, bytes, payload.owner))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Collections",
    operation_id = "listCollections",
    summary = "List collections with pagination",
    params(CollectionListQuery),
    responses(
        (status = 200, description = "List of collections", body = CollectionListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_collections(
    State(state): State<AppState>,
    Query(query): Query<CollectionListQuery>,
) -> Result<Json<CollectionListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let select = collection::Entity::find();

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .order_by(collection::Column::CreatedAt, Order::Desc)
        .paginate(&state.db, per_page)
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(CollectionResponse::from)
        .collect();

    Ok(Json(CollectionListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Collections",
    operation_id = "getCollection",
    summary = "Get a collection by slug",
    params(("slug" = String, Path, description = "Collection slug")),
    responses(
        (status = 200, description = "Collection details", body = CollectionResponse),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CollectionResponse>, AppError> {
    let model = find_collection(&state.db, &slug).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{slug}/files",
    tag = "Collections",
    operation_id = "listCollectionFiles",
    summary = "List the files of a collection",
    params(("slug" = String, Path, description = "Collection slug")),
    responses(
        (status = 200, description = "File list", body = VaultFileListResponse),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn list_collection_files(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<VaultFileListResponse>, AppError> {
    let model = find_collection(&state.db, &slug).await?;

    let files: Vec<VaultFileResponse> = vault_file::Entity::find()
        .filter(vault_file::Column::CollectionId.eq(model.id))
        .order_by(vault_file::Column::CreatedAt, Order::Desc)
        .all(&state.db)
        .await?
        .into_iter()
        .map(VaultFileResponse::from)
        .collect();

    let total = files.len() as u64;
    Ok(Json(VaultFileListResponse { files, total }))
}

async fn find_collection(
    db: &sea_orm::DatabaseConnection,
    slug: &str,
) -> Result<collection::Model, AppError> {
    collection::Entity::find()
        .filter(collection::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".into()))
}
