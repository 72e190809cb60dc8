use chrono::Utc;
use common::ContentHash;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};

use server::entity::{audit_event, collection, email_notification, vault_file};
use server::import::{ImportError, ImportLimits};

use crate::common::{DEFAULT_RECIPIENT, TestVault, build_zip, build_zip_with_dirs};

async fn collection_count(vault: &TestVault) -> u64 {
    collection::Entity::find().count(&vault.db).await.unwrap()
}

async fn file_count(vault: &TestVault) -> u64 {
    vault_file::Entity::find().count(&vault.db).await.unwrap()
}

async fn audit_count(vault: &TestVault) -> u64 {
    audit_event::Entity::find().count(&vault.db).await.unwrap()
}

mod successful_imports {
    use super::*;

    #[tokio::test]
    async fn mixed_archive_with_one_duplicate() {
        let vault = TestVault::setup().await;

        let stl = vec![0xA5u8; 2_000_000];
        let pdf = vec![0x42u8; 1_000_000];
        let txt = vec![0x33u8; 500_000];
        let zip = build_zip(&[
            ("benchy.stl", stl.as_slice()),
            ("manual.pdf", pdf.as_slice()),
            ("notes.txt", txt.as_slice()),
            // Same bytes as benchy.stl under a different name.
            ("copy_of_benchy.stl", stl.as_slice()),
        ]);

        let outcome = vault.import("print_pack.zip", zip, None).await.unwrap();

        assert_eq!(outcome.created_files, 3);
        assert_eq!(outcome.skipped_duplicates, 1);
        assert_eq!(outcome.total_bytes, 3_500_000);
        assert_eq!(outcome.collection_name, "print pack");
        assert_eq!(outcome.collection_slug, "print-pack");
        assert!(outcome.warnings.is_empty());

        assert_eq!(collection_count(&vault).await, 1);
        assert_eq!(file_count(&vault).await, 3);

        // One of each kind.
        for (kind, expected) in [("model", 1u64), ("document", 1), ("other", 1)] {
            let count = vault_file::Entity::find()
                .filter(vault_file::Column::FileType.eq(kind))
                .count(&vault.db)
                .await
                .unwrap();
            assert_eq!(count, expected, "file_type {kind}");
        }

        // Stored content is retrievable by the recorded digest.
        let hash: ContentHash = vault_file::Entity::find()
            .filter(vault_file::Column::OriginalName.eq("benchy.stl"))
            .one(&vault.db)
            .await
            .unwrap()
            .unwrap()
            .content_hash
            .parse()
            .unwrap();
        assert_eq!(vault.store.get(&hash).await.unwrap(), stl);
    }

    #[tokio::test]
    async fn appends_audit_event_and_notification() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[("part.stl", b"solid part")]);

        vault
            .import("parts.zip", zip, Some("maker@example.com"))
            .await
            .unwrap();

        let events = audit_event::Entity::find().all(&vault.db).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "archive_import");
        assert_eq!(events[0].actor.as_deref(), Some("maker@example.com"));
        assert_eq!(events[0].metadata["collection"], "parts");
        assert_eq!(events[0].metadata["created_files"], 1);

        let mails = email_notification::Entity::find().all(&vault.db).await.unwrap();
        assert_eq!(mails.len(), 1);
        // Email-shaped owners are notified directly.
        assert_eq!(mails[0].to_email, "maker@example.com");
        assert_eq!(mails[0].subject, "Imported collection: parts");
        assert_eq!(mails[0].classification, "user_actions");
        assert!(!mails[0].is_sent);
    }

    #[tokio::test]
    async fn anonymous_import_notifies_the_default_recipient() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[("a.txt", b"content")]);

        vault.import("anon.zip", zip, None).await.unwrap();

        let mails = email_notification::Entity::find().all(&vault.db).await.unwrap();
        assert_eq!(mails[0].to_email, DEFAULT_RECIPIENT);

        let events = audit_event::Entity::find().all(&vault.db).await.unwrap();
        assert_eq!(events[0].actor, None);
    }

    #[tokio::test]
    async fn empty_archive_creates_an_empty_collection() {
        let vault = TestVault::setup().await;

        let outcome = vault.import("empty.zip", build_zip(&[]), None).await.unwrap();

        assert_eq!(outcome.created_files, 0);
        assert_eq!(outcome.skipped_duplicates, 0);
        assert_eq!(outcome.total_bytes, 0);
        assert_eq!(collection_count(&vault).await, 1);
        assert_eq!(file_count(&vault).await, 0);
    }

    #[tokio::test]
    async fn directory_markers_are_skipped_not_stored() {
        let vault = TestVault::setup().await;
        let zip = build_zip_with_dirs(
            &["models", "models/arms"],
            &[("models/arms/left.stl", b"solid left")],
        );

        let outcome = vault.import("robot.zip", zip, None).await.unwrap();

        assert_eq!(outcome.created_files, 1);
        let file = vault_file::Entity::find().one(&vault.db).await.unwrap().unwrap();
        assert_eq!(file.original_name, "models/arms/left.stl");
    }

    #[tokio::test]
    async fn collection_name_comes_from_the_archive_filename() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[("f.txt", b"x")]);

        let outcome = vault
            .import("Test_Collection_Name.zip", zip, None)
            .await
            .unwrap();

        assert_eq!(outcome.collection_name, "Test Collection Name");
        assert_eq!(outcome.collection_slug, "test-collection-name");
    }
}

mod deduplication {
    use super::*;

    #[tokio::test]
    async fn identical_content_is_stored_once_per_import() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[
            ("first.txt", b"same content".as_slice()),
            ("second.txt", b"same content".as_slice()),
        ]);

        let outcome = vault.import("dupes.zip", zip, None).await.unwrap();

        assert_eq!(outcome.created_files, 1);
        assert_eq!(outcome.skipped_duplicates, 1);
        assert_eq!(file_count(&vault).await, 1);

        // The first occurrence wins.
        let file = vault_file::Entity::find().one(&vault.db).await.unwrap().unwrap();
        assert_eq!(file.original_name, "first.txt");
    }

    #[tokio::test]
    async fn dedup_never_spans_import_invocations() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[("part.stl", b"identical bytes")]);

        let first = vault.import("pack.zip", zip.clone(), None).await.unwrap();
        let second = vault.import("pack.zip", zip, None).await.unwrap();

        // A rerun creates a fresh collection with a uniquified slug,
        // and its file is a full asset record, not a duplicate.
        assert_eq!(first.collection_slug, "pack");
        assert_eq!(second.collection_slug, "pack-2");
        assert_eq!(second.created_files, 1);
        assert_eq!(second.skipped_duplicates, 0);

        assert_eq!(collection_count(&vault).await, 2);
        assert_eq!(file_count(&vault).await, 2);

        let hashes: Vec<String> = vault_file::Entity::find()
            .all(&vault.db)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.content_hash)
            .collect();
        assert_eq!(hashes[0], hashes[1]);
    }
}

mod hostile_archives {
    use super::*;

    #[tokio::test]
    async fn garbage_bytes_are_a_malformed_archive() {
        let vault = TestVault::setup().await;

        let err = vault
            .import("junk.zip", b"this is not a zip".to_vec(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::MalformedArchive(_)));
        assert_eq!(collection_count(&vault).await, 0);
        assert_eq!(audit_count(&vault).await, 0);
    }

    #[tokio::test]
    async fn traversal_entry_aborts_the_whole_import() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[
            ("good.txt", b"staged before the attack".as_slice()),
            ("../outside.txt", b"escape attempt".as_slice()),
        ]);

        let err = vault.import("evil.zip", zip, None).await.unwrap_err();

        let ImportError::UnsafePath(name) = &err else {
            panic!("expected UnsafePath, got {err:?}");
        };
        assert_eq!(name, "../outside.txt");

        // Nothing visible, and the blob staged for the good entry
        // was discarded without ever being published.
        assert_eq!(collection_count(&vault).await, 0);
        assert_eq!(file_count(&vault).await, 0);
        assert_eq!(audit_count(&vault).await, 0);
        let staged_hash = ContentHash::of(b"staged before the attack");
        assert!(!vault.store.exists(&staged_hash).await.unwrap());
    }

    #[tokio::test]
    async fn absolute_path_entry_is_rejected() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[("/etc/passwd", b"root:x:0:0".as_slice())]);

        let err = vault.import("abs.zip", zip, None).await.unwrap_err();
        assert!(matches!(err, ImportError::UnsafePath(_)));
        assert_eq!(collection_count(&vault).await, 0);
    }
}

mod quotas {
    use super::*;

    fn limits(max_entries: u64, max_total_bytes: u64) -> ImportLimits {
        ImportLimits {
            max_entries,
            max_total_bytes,
        }
    }

    #[tokio::test]
    async fn entry_ceiling_aborts_with_nothing_committed() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[
            ("1.txt", b"a".as_slice()),
            ("2.txt", b"b".as_slice()),
            ("3.txt", b"c".as_slice()),
        ]);

        let err = vault
            .import_with_limits("many.zip", zip, None, &limits(2, 1_000_000))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::QuotaExceeded(_)));
        assert_eq!(collection_count(&vault).await, 0);
        assert_eq!(file_count(&vault).await, 0);
    }

    #[tokio::test]
    async fn byte_ceiling_aborts_before_extraction() {
        let vault = TestVault::setup().await;
        let big = vec![0x58u8; 200];
        let zip = build_zip(&[("large_file.txt", big.as_slice())]);

        let err = vault
            .import_with_limits("big.zip", zip, None, &limits(100, 100))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::QuotaExceeded(_)));
        assert_eq!(collection_count(&vault).await, 0);
        // Rejected on the declared size, so nothing reached the store.
        assert!(!vault.store.exists(&ContentHash::of(&big)).await.unwrap());
    }

    #[tokio::test]
    async fn cumulative_bytes_trip_mid_archive() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[
            ("a.txt", vec![0x61u8; 60].as_slice()),
            ("b.txt", vec![0x62u8; 60].as_slice()),
        ]);

        let err = vault
            .import_with_limits("two.zip", zip, None, &limits(100, 100))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::QuotaExceeded(_)));
        // The first entry was already staged; the abort discarded it.
        assert_eq!(collection_count(&vault).await, 0);
        let first_hash = ContentHash::of(&[0x61u8; 60]);
        assert!(!vault.store.exists(&first_hash).await.unwrap());
    }

    #[tokio::test]
    async fn archive_within_limits_still_imports() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[("ok.txt", vec![0x6Fu8; 99].as_slice())]);

        let outcome = vault
            .import_with_limits("fits.zip", zip, None, &limits(1, 99))
            .await
            .unwrap();
        assert_eq!(outcome.created_files, 1);
    }
}

mod interference {
    use super::*;

    #[tokio::test]
    async fn failed_import_preserves_content_shared_with_other_collections() {
        let vault = TestVault::setup().await;
        let shared = b"solid shared part".to_vec();

        vault
            .import("first.zip", build_zip(&[("part.stl", shared.as_slice())]), None)
            .await
            .unwrap();
        let hash = ContentHash::of(&shared);
        assert!(vault.store.exists(&hash).await.unwrap());

        // A second import stages the same bytes, then aborts on a
        // hostile entry further into the archive.
        let zip = build_zip(&[
            ("part.stl", shared.as_slice()),
            ("../evil.txt", b"escape attempt".as_slice()),
        ]);
        let err = vault.import("second.zip", zip, None).await.unwrap_err();
        assert!(matches!(err, ImportError::UnsafePath(_)));

        // The first collection's content survived the abort.
        assert_eq!(vault.store.get(&hash).await.unwrap(), shared);
        assert_eq!(collection_count(&vault).await, 1);
        assert_eq!(file_count(&vault).await, 1);
    }

    #[tokio::test]
    async fn concurrent_same_name_imports_both_commit() {
        let vault = TestVault::setup().await;
        let zip_a = build_zip(&[("a.stl", b"solid a".as_slice())]);
        let zip_b = build_zip(&[("b.stl", b"solid b".as_slice())]);

        let (first, second) = tokio::join!(
            vault.import("pack.zip", zip_a, None),
            vault.import("pack.zip", zip_b, None),
        );

        let first = first.unwrap();
        let second = second.unwrap();

        let mut slugs = [first.collection_slug, second.collection_slug];
        slugs.sort();
        assert_eq!(slugs, ["pack", "pack-2"]);
        assert_eq!(collection_count(&vault).await, 2);
    }
}

mod commit_and_side_effects {
    use super::*;

    #[tokio::test]
    async fn side_effect_failure_is_a_warning_not_an_error() {
        let vault = TestVault::setup().await;
        vault
            .db
            .execute_unprepared("DROP TABLE audit_event")
            .await
            .unwrap();

        let zip = build_zip(&[("part.stl", b"solid part")]);
        let outcome = vault.import("pack.zip", zip, None).await.unwrap();

        // The import committed despite the failed audit append.
        assert!(outcome.warnings.iter().any(|w| w.contains("audit")));
        assert_eq!(outcome.created_files, 1);
        assert_eq!(collection_count(&vault).await, 1);
        assert_eq!(file_count(&vault).await, 1);

        // The notification queue was unaffected.
        let mails = email_notification::Entity::find().all(&vault.db).await.unwrap();
        assert_eq!(mails.len(), 1);
    }

    #[tokio::test]
    async fn commit_failure_leaves_no_visible_records() {
        let vault = TestVault::setup().await;
        vault
            .db
            .execute_unprepared("DROP TABLE vault_file")
            .await
            .unwrap();

        let data = b"solid doomed".to_vec();
        let err = vault
            .import("doomed.zip", build_zip(&[("a.stl", data.as_slice())]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Storage(_)));
        assert_eq!(collection_count(&vault).await, 0);
        assert_eq!(audit_count(&vault).await, 0);

        // Published content stays; it is content-addressed and a
        // concurrent import may already reference it.
        assert!(vault.store.exists(&ContentHash::of(&data)).await.unwrap());
    }

    #[tokio::test]
    async fn database_rejects_duplicate_digests_within_a_collection() {
        let vault = TestVault::setup().await;
        let zip = build_zip(&[("a.stl", b"solid a")]);
        vault.import("pack.zip", zip, None).await.unwrap();

        let existing = vault_file::Entity::find().one(&vault.db).await.unwrap().unwrap();
        let duplicate = vault_file::ActiveModel {
            collection_id: Set(existing.collection_id),
            content_hash: Set(existing.content_hash.clone()),
            file_type: Set(existing.file_type.clone()),
            original_name: Set("copy.stl".to_string()),
            size_bytes: Set(existing.size_bytes),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        assert!(duplicate.insert(&vault.db).await.is_err());
    }
}
