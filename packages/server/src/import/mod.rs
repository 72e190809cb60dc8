//! Archive-to-collection importer.
//!
//! Drives one untrusted ZIP through validation (path sanitization,
//! quota accounting, classification, deduplication) and commits the
//! result as one collection plus its file records in a single
//! database transaction. There is no partial-success outcome: a
//! validation failure discards everything the attempt staged, and a
//! commit failure rolls the records back. Published blob content is
//! shared between collections and is never removed on abort.

mod archive;
mod classify;
mod error;
mod quota;
mod sanitize;

use std::collections::HashSet;
use std::io::{Read, Seek};

use chrono::Utc;
use common::{BlobStore, ContentHash, StagedBlob};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use tracing::{info, warn};

use crate::entity::{audit_event, collection, email_notification, vault_file};
use crate::indexing;
use crate::utils::slug::{collection_name_from_archive, slugify};

pub use archive::{ArchiveReader, EntryMeta};
pub use classify::FileKind;
pub use error::ImportError;
pub use quota::{ImportLimits, QuotaGuard};
pub use sanitize::{is_directory_marker, sanitize_entry_name};

/// Audit action tag written for every successful import.
const AUDIT_ACTION: &str = "archive_import";

/// Origin tag stored on collections created by the importer.
const COLLECTION_SOURCE: &str = "archive_import";

/// Attempts at allocating a free slug before giving up. Each retry
/// re-reads the taken slugs in a fresh transaction.
const SLUG_ATTEMPTS: usize = 4;

/// Result of a committed import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub collection_slug: String,
    pub collection_name: String,
    pub created_files: u64,
    pub skipped_duplicates: u64,
    /// Bytes of stored (non-duplicate) content.
    pub total_bytes: u64,
    /// Non-fatal problems after the commit, e.g. a failed audit
    /// append. The import itself succeeded.
    pub warnings: Vec<String>,
}

/// A validated entry staged in the blob store, awaiting publication
/// and commit.
struct StagedFile {
    original_name: String,
    kind: FileKind,
    size_bytes: u64,
    blob: StagedBlob,
}

/// Import an archive as a new collection.
///
/// `archive_name` is the submitted filename; it determines the
/// collection's display name and slug. Re-running the same archive
/// always creates a new collection with a uniquified slug, and
/// deduplication applies only within the collection being built.
///
/// On success exactly one audit event and one notification are
/// appended outside the transaction; failures there surface as
/// warnings on the outcome, never as errors.
pub async fn import_archive<R: Read + Seek>(
    db: &DatabaseConnection,
    store: &dyn BlobStore,
    source: R,
    archive_name: &str,
    owner: Option<&str>,
    default_recipient: &str,
    limits: &ImportLimits,
) -> Result<ImportOutcome, ImportError> {
    let mut reader = ArchiveReader::open(source)?;
    let mut guard = QuotaGuard::new(limits);

    let mut staged: Vec<StagedFile> = Vec::new();
    let mut skipped_duplicates: u64 = 0;

    let staging = stage_entries(
        &mut reader,
        store,
        &mut guard,
        &mut staged,
        &mut skipped_duplicates,
    )
    .await;

    if let Err(e) = staging {
        discard_staged(store, &staged).await;
        return Err(e);
    }

    // Publication comes before the transaction so committed rows
    // always find their content. A commit failure leaves published
    // blobs in place: they are content-addressed and a concurrent
    // import may already reference them.
    publish_staged(store, &staged).await?;

    let name = collection_name_from_archive(archive_name);
    let slug_base = slugify(&name);

    let model = commit_collection(db, &name, &slug_base, owner, &staged).await?;

    let created_files = staged.len() as u64;
    let total_bytes: u64 = staged.iter().map(|f| f.size_bytes).sum();

    info!(
        slug = %model.slug,
        created_files,
        skipped_duplicates,
        total_bytes,
        "committed archive import"
    );

    let mut outcome = ImportOutcome {
        collection_slug: model.slug.clone(),
        collection_name: model.name.clone(),
        created_files,
        skipped_duplicates,
        total_bytes,
        warnings: Vec::new(),
    };

    append_side_effects(
        db,
        &model,
        archive_name,
        owner,
        default_recipient,
        &mut outcome,
    )
    .await;

    Ok(outcome)
}

/// Validate and stage every entry, writing blobs to the store's
/// private staging area as it goes.
///
/// Entries are processed in archive order: dedup picks the first
/// occurrence of a digest and quota totals only grow. `staged` is
/// filled incrementally so the caller can discard everything the
/// attempt staged before a failure.
async fn stage_entries<R: Read + Seek>(
    reader: &mut ArchiveReader<R>,
    store: &dyn BlobStore,
    guard: &mut QuotaGuard,
    staged: &mut Vec<StagedFile>,
    skipped_duplicates: &mut u64,
) -> Result<(), ImportError> {
    let mut seen: HashSet<ContentHash> = HashSet::new();

    for index in 0..reader.len() {
        let meta = reader.entry_meta(index)?;

        if is_directory_marker(&meta.name, meta.uncompressed_size) {
            continue;
        }

        let sanitized = sanitize_entry_name(&meta.name)?;
        guard.admit(meta.uncompressed_size)?;

        let data = reader.read_entry(index, meta.uncompressed_size)?;
        guard.record_extracted(meta.uncompressed_size, data.len() as u64)?;

        let hash = ContentHash::of(&data);
        if !seen.insert(hash) {
            *skipped_duplicates += 1;
            continue;
        }

        let blob = store.stage(&data).await?;
        staged.push(StagedFile {
            original_name: sanitized.clone(),
            kind: FileKind::from_name(&sanitized),
            size_bytes: data.len() as u64,
            blob,
        });
    }

    Ok(())
}

/// Publish every staged blob to its content-addressed path. On a
/// mid-way failure the not-yet-published remainder is discarded;
/// already published blobs stay, as published content is never
/// removed.
async fn publish_staged(
    store: &dyn BlobStore,
    staged: &[StagedFile],
) -> Result<(), ImportError> {
    for (index, file) in staged.iter().enumerate() {
        if let Err(e) = store.publish(&file.blob).await {
            discard_staged(store, &staged[index..]).await;
            return Err(e.into());
        }
    }
    Ok(())
}

/// Best-effort removal of staged blobs that will not be published.
async fn discard_staged(store: &dyn BlobStore, staged: &[StagedFile]) {
    for file in staged {
        if let Err(e) = store.discard(&file.blob).await {
            warn!(
                hash = %file.blob.hash,
                "failed to discard staged blob while aborting import: {e}"
            );
        }
    }
}

/// Insert the collection and all staged file rows in one
/// transaction. Readers see either nothing or the complete set.
///
/// Slug allocation is check-then-insert, so a concurrent import of
/// the same archive name can win the base slug between the check and
/// the insert. That surfaces as a unique-constraint violation and is
/// retried in a fresh transaction, which then sees the winner's slug
/// as taken.
async fn commit_collection(
    db: &DatabaseConnection,
    name: &str,
    slug_base: &str,
    owner: Option<&str>,
    staged: &[StagedFile],
) -> Result<collection::Model, ImportError> {
    let mut attempts = 0;
    loop {
        match try_commit(db, name, slug_base, owner, staged).await {
            Err(e) if is_unique_violation(&e) && attempts + 1 < SLUG_ATTEMPTS => {
                attempts += 1;
                warn!(slug_base, attempts, "slug taken concurrently, retrying");
            }
            Err(e) => return Err(e.into()),
            Ok(model) => return Ok(model),
        }
    }
}

async fn try_commit(
    db: &DatabaseConnection,
    name: &str,
    slug_base: &str,
    owner: Option<&str>,
    staged: &[StagedFile],
) -> Result<collection::Model, DbErr> {
    let txn = db.begin().await?;

    let slug = unique_slug(&txn, slug_base).await?;
    let now = Utc::now();

    let model = collection::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slug),
        source: Set(COLLECTION_SOURCE.to_string()),
        created_by: Set(owner.map(str::to_string)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for file in staged {
        vault_file::ActiveModel {
            collection_id: Set(model.id),
            content_hash: Set(file.blob.hash.to_hex()),
            file_type: Set(file.kind.as_str().to_string()),
            original_name: Set(file.original_name.clone()),
            size_bytes: Set(file.size_bytes as i64),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(model)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Find the first free slug: the base, then `{base}-2`, `{base}-3`, …
/// Collections are never merged by name; a rerun of the same archive
/// gets a fresh slug.
async fn unique_slug(txn: &DatabaseTransaction, base: &str) -> Result<String, DbErr> {
    let mut candidate = base.to_string();
    let mut n: u32 = 2;

    while collection::Entity::find()
        .filter(collection::Column::Slug.eq(&candidate))
        .one(txn)
        .await?
        .is_some()
    {
        candidate = format!("{base}-{n}");
        n += 1;
    }

    Ok(candidate)
}

/// Append the audit event and queue the notification for a
/// committed import. Both are outside the transaction and
/// best-effort: failures become warnings on the outcome.
async fn append_side_effects(
    db: &DatabaseConnection,
    model: &collection::Model,
    archive_name: &str,
    owner: Option<&str>,
    default_recipient: &str,
    outcome: &mut ImportOutcome,
) {
    let now = Utc::now();

    let audit = audit_event::ActiveModel {
        actor: Set(owner.map(str::to_string)),
        action: Set(AUDIT_ACTION.to_string()),
        metadata: Set(serde_json::json!({
            "collection": model.slug,
            "archive": archive_name,
            "created_files": outcome.created_files,
            "skipped_duplicates": outcome.skipped_duplicates,
            "total_bytes": outcome.total_bytes,
        })),
        created_at: Set(now),
        ..Default::default()
    };
    if let Err(e) = audit.insert(db).await {
        warn!("audit append failed after commit: {e}");
        outcome.warnings.push(format!("audit event not recorded: {e}"));
    }

    // The owner principal doubles as the recipient when it is an
    // email address; anonymous imports notify the configured default.
    let recipient = match owner {
        Some(principal) if principal.contains('@') => principal.to_string(),
        _ => default_recipient.to_string(),
    };

    let notification = email_notification::ActiveModel {
        to_email: Set(recipient),
        subject: Set(format!("Imported collection: {}", model.name)),
        body: Set(format!(
            "Collection '{}' has been imported.\n\
             {} files imported, {} skipped as duplicates.\n\
             Total size: {} bytes",
            model.name, outcome.created_files, outcome.skipped_duplicates, outcome.total_bytes
        )),
        classification: Set("user_actions".to_string()),
        is_sent: Set(false),
        created_at: Set(now),
        ..Default::default()
    };
    if let Err(e) = notification.insert(db).await {
        warn!("notification enqueue failed after commit: {e}");
        outcome.warnings.push(format!("notification not queued: {e}"));
    }

    if let Err(e) = indexing::enqueue_collection_documents(db, model.id).await {
        warn!("document indexing enqueue failed: {e}");
        outcome.warnings.push(format!("document indexing not queued: {e}"));
    }
}
