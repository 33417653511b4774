//! Document CRUD and version lineage tests.

mod common;

use bytes::Bytes;
use uuid::Uuid;

use common::{TestApp, upload};
use docvault_core::error::ErrorKind;
use docvault_core::types::pagination::PageRequest;
use docvault_database::store::DocumentStore;
use docvault_service::document::{CreateDocumentRequest, UpdateDocumentRequest};

#[tokio::test]
async fn test_create_document_with_tags() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let ctx = app.ctx(&alice);

    let doc = app.create_document(&ctx, "Handbook", &["draft", "v1"], "hello").await;

    assert_eq!(doc.version, 1);
    assert_eq!(doc.owner_id, alice.id);
    assert!(doc.file_path.starts_with(&format!("documents/{}/", alice.id)));

    let v1 = app
        .documents
        .get_version(&ctx, doc.id, 1)
        .await
        .unwrap()
        .expect("version 1 should exist");
    assert_eq!(v1.file_path, doc.file_path);
    assert!(v1.changes.is_none());

    let tags = app.documents.tags(&ctx, doc.id).await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["draft", "v1"]);

    let content = app.documents.content(&ctx, doc.id).await.unwrap();
    assert_eq!(content, Bytes::from("hello"));
}

#[tokio::test]
async fn test_create_rejects_empty_title() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let ctx = app.ctx(&alice);

    let err = app
        .documents
        .create(
            &ctx,
            CreateDocumentRequest {
                title: "   ".to_string(),
                description: None,
                tags: vec![],
                file: upload("file.txt", "hello"),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_partial_update_leaves_omitted_fields() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let ctx = app.ctx(&alice);

    let doc = app
        .documents
        .create(
            &ctx,
            CreateDocumentRequest {
                title: "Original".to_string(),
                description: Some("first draft".to_string()),
                tags: vec!["draft".to_string()],
                file: upload("file.txt", "hello"),
            },
        )
        .await
        .unwrap();

    let updated = app
        .documents
        .update(
            &ctx,
            doc.id,
            UpdateDocumentRequest {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.description.as_deref(), Some("first draft"));
    assert_eq!(updated.version, 1);
    assert_eq!(updated.file_path, doc.file_path);

    // Tag set is untouched when omitted.
    let tags = app.documents.tags(&ctx, doc.id).await.unwrap();
    assert_eq!(tags.len(), 1);
}

#[tokio::test]
async fn test_tag_only_update_clears_tags_without_touching_version() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let ctx = app.ctx(&alice);

    let doc = app.create_document(&ctx, "Handbook", &["draft", "v1"], "hello").await;

    let updated = app
        .documents
        .update(
            &ctx,
            doc.id,
            UpdateDocumentRequest {
                tags: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(app.documents.tags(&ctx, doc.id).await.unwrap().is_empty());
    assert_eq!(updated.version, 1);
    assert_eq!(updated.file_path, doc.file_path);
}

#[tokio::test]
async fn test_update_with_file_bumps_version() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let ctx = app.ctx(&alice);

    let doc = app.create_document(&ctx, "Handbook", &[], "hello").await;

    let updated = app
        .documents
        .update(
            &ctx,
            doc.id,
            UpdateDocumentRequest {
                file: Some(upload("file-v2.txt", "hello again")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.version, 2);
    assert_ne!(updated.file_path, doc.file_path);

    let v2 = app
        .documents
        .get_version(&ctx, doc.id, 2)
        .await
        .unwrap()
        .expect("version 2 should exist");
    assert_eq!(v2.file_path, updated.file_path);

    // The prior snapshot is untouched and still points at the old blob.
    let v1 = app
        .documents
        .get_version(&ctx, doc.id, 1)
        .await
        .unwrap()
        .expect("version 1 should exist");
    assert_eq!(v1.file_path, doc.file_path);

    let versions = app.documents.list_versions(&ctx, doc.id).await.unwrap();
    let numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![2, 1]);
}

#[tokio::test]
async fn test_shared_tags_reuse_the_same_row() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let ctx = app.ctx(&alice);

    let first = app.create_document(&ctx, "First", &["shared"], "a").await;
    let second = app.create_document(&ctx, "Second", &["shared"], "b").await;

    let first_tags = app.documents.tags(&ctx, first.id).await.unwrap();
    let second_tags = app.documents.tags(&ctx, second.id).await.unwrap();
    assert_eq!(first_tags[0].id, second_tags[0].id);
}

#[tokio::test]
async fn test_get_version_absent_is_none() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let ctx = app.ctx(&alice);

    let doc = app.create_document(&ctx, "Handbook", &[], "hello").await;

    assert!(
        app.documents
            .get_version(&ctx, doc.id, 99)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        app.documents
            .get_version(&ctx, Uuid::new_v4(), 1)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_list_scoped_by_owner() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let alice_ctx = app.ctx(&alice);
    let bob_ctx = app.ctx(&bob);

    app.create_document(&alice_ctx, "Alice doc", &[], "a").await;
    app.create_document(&bob_ctx, "Bob doc", &[], "b").await;

    let all = app
        .documents
        .list(&alice_ctx, None, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.total_items, 2);

    let mine = app
        .documents
        .list(&alice_ctx, Some(alice.id), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(mine.total_items, 1);
    assert_eq!(mine.items[0].title, "Alice doc");
}

#[tokio::test]
async fn test_delete_cascades_children() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let ctx = app.ctx(&alice);

    let doc = app.create_document(&ctx, "Handbook", &["draft"], "hello").await;
    app.documents.delete(&ctx, doc.id).await.unwrap();

    let err = app.documents.get(&ctx, doc.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(app.store.list_versions(doc.id).await.unwrap().is_empty());

    // Deleting again reports not found.
    let err = app.documents.delete(&ctx, doc.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
