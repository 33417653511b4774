//! Shared test helpers for engine integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;

use docvault_core::config::StorageConfig;
use docvault_database::store::DocumentStore;
use docvault_database::MemoryDocumentStore;
use docvault_entity::document::Document;
use docvault_entity::user::{NewUser, User};
use docvault_service::document::{CreateDocumentRequest, FileUpload};
use docvault_service::{ActivityService, CheckoutService, DocumentService, RequestContext};
use docvault_storage::LocalContentStore;

/// Test application context wiring the engine over the in-memory store and
/// a throwaway local content store.
pub struct TestApp {
    /// Direct store handle for row-level assertions.
    pub store: Arc<MemoryDocumentStore>,
    /// Document CRUD service.
    pub documents: DocumentService,
    /// Checkout/checkin service.
    pub checkouts: CheckoutService,
    /// Activity log service.
    pub activities: ActivityService,
    /// Keeps the content root alive for the test's duration.
    _content_dir: TempDir,
}

impl TestApp {
    /// Create a new test application.
    pub async fn new() -> Self {
        let content_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let content = Arc::new(
            LocalContentStore::new(content_dir.path().to_str().unwrap())
                .await
                .expect("Failed to init content store"),
        );

        let store = Arc::new(MemoryDocumentStore::new());
        let store_dyn: Arc<dyn DocumentStore> = store.clone();
        let config = StorageConfig::default();

        let documents = DocumentService::new(Arc::clone(&store_dyn), content.clone(), config.clone());
        let checkouts = CheckoutService::new(Arc::clone(&store_dyn), content.clone(), config);
        let activities = ActivityService::new(Arc::clone(&store_dyn));

        Self {
            store,
            documents,
            checkouts,
            activities,
            _content_dir: content_dir,
        }
    }

    /// Create a test user.
    pub async fn create_user(&self, username: &str) -> User {
        self.store
            .insert_user(&NewUser {
                username: username.to_string(),
                email: format!("{username}@test.com"),
                full_name: Some(format!("{username} Test")),
                is_superuser: false,
            })
            .await
            .expect("Failed to create test user")
    }

    /// Build a request context for a user.
    pub fn ctx(&self, user: &User) -> RequestContext {
        RequestContext::new(user.id, user.is_superuser)
    }

    /// Create a document with the given title, tags, and content.
    pub async fn create_document(
        &self,
        ctx: &RequestContext,
        title: &str,
        tags: &[&str],
        content: &str,
    ) -> Document {
        self.documents
            .create(
                ctx,
                CreateDocumentRequest {
                    title: title.to_string(),
                    description: None,
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                    file: upload("file.txt", content),
                },
            )
            .await
            .expect("Failed to create test document")
    }
}

/// Build a file upload body.
pub fn upload(file_name: &str, content: &str) -> FileUpload {
    FileUpload {
        file_name: file_name.to_string(),
        data: Bytes::from(content.to_string()),
        mime_type: Some("text/plain".to_string()),
    }
}
