//! In-memory implementation of [`DocumentStore`].
//!
//! Backs the engine test suite and single-process embedding without a
//! running PostgreSQL instance. Every operation takes the state lock for
//! its whole duration, which gives the same per-operation atomicity the
//! PostgreSQL implementation gets from transactions; the checkout map's
//! entry occupancy stands in for the uniqueness constraint.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::pagination::{PageRequest, PageResponse};
use docvault_entity::document::{
    ActivityKind, ActivityView, Document, DocumentActivity, DocumentCheckout, DocumentPatch,
    DocumentVersion, NewDocument, NewVersionContent,
};
use docvault_entity::tag::Tag;
use docvault_entity::user::{NewUser, User};

use crate::store::DocumentStore;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    documents: HashMap<Uuid, Document>,
    /// Versions per document, in creation order (ascending version_number).
    versions: HashMap<Uuid, Vec<DocumentVersion>>,
    /// Tags by name.
    tags: HashMap<String, Tag>,
    /// Tag associations per document, in attach order.
    document_tags: HashMap<Uuid, Vec<Uuid>>,
    /// At most one entry per document; entry occupancy is the lock.
    checkouts: HashMap<Uuid, DocumentCheckout>,
    /// Activity entries per document, in append order.
    activities: HashMap<Uuid, Vec<DocumentActivity>>,
}

impl State {
    fn resolve_tag(&mut self, name: &str) -> Uuid {
        if let Some(tag) = self.tags.get(name) {
            return tag.id;
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        let id = tag.id;
        self.tags.insert(name.to_string(), tag);
        id
    }

    fn replace_tags(&mut self, document_id: Uuid, names: &[String]) {
        let mut ids = Vec::new();
        for name in names {
            let id = self.resolve_tag(name);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.document_tags.insert(document_id, ids);
    }

    fn push_version(
        &mut self,
        document_id: Uuid,
        version_number: i32,
        file_path: &str,
        changes: Option<String>,
    ) {
        self.versions
            .entry(document_id)
            .or_default()
            .push(DocumentVersion {
                id: Uuid::new_v4(),
                document_id,
                version_number,
                file_path: file_path.to_string(),
                changes,
                created_at: Utc::now(),
            });
    }

    fn push_activity(&mut self, document_id: Uuid, user_id: Uuid, kind: ActivityKind, details: &str) {
        self.activities
            .entry(document_id)
            .or_default()
            .push(DocumentActivity {
                id: Uuid::new_v4(),
                document_id,
                user_id,
                kind,
                activity_time: Utc::now(),
                details: Some(details.to_string()),
            });
    }
}

/// Document store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: RwLock<State>,
}

impl MemoryDocumentStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == user.username) {
            return Err(AppError::conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict("Email address is already registered"));
        }

        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_active: true,
            is_superuser: user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn update_user(&self, user: &User) -> AppResult<User> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Err(AppError::not_found(format!("User {} not found", user.id)));
        }
        let mut row = user.clone();
        row.updated_at = Utc::now();
        state.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_document(&self, doc: &NewDocument) -> AppResult<Document> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&doc.owner_id) {
            return Err(AppError::not_found(format!(
                "User {} not found",
                doc.owner_id
            )));
        }

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            file_path: doc.file_path.clone(),
            mime_type: doc.mime_type.clone(),
            owner_id: doc.owner_id,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        state.documents.insert(document.id, document.clone());
        state.push_version(document.id, 1, &doc.file_path, None);
        state.replace_tags(document.id, &doc.tags);

        Ok(document)
    }

    async fn find_document(&self, id: Uuid) -> AppResult<Option<Document>> {
        Ok(self.state.read().await.documents.get(&id).cloned())
    }

    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> AppResult<Document> {
        let mut state = self.state.write().await;

        let mut document = state
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;

        if let Some(title) = &patch.title {
            document.title = title.clone();
        }
        if let Some(description) = &patch.description {
            document.description = Some(description.clone());
        }
        if let Some(content) = &patch.content {
            document.version += 1;
            document.file_path = content.file_path.clone();
            document.mime_type = content.mime_type.clone();
        }
        document.updated_at = Utc::now();

        if let Some(content) = &patch.content {
            state.push_version(
                id,
                document.version,
                &content.file_path,
                content.changes.clone(),
            );
        }
        if let Some(tags) = &patch.tags {
            state.replace_tags(id, tags);
        }
        state.documents.insert(id, document.clone());

        Ok(document)
    }

    async fn delete_document(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        state.activities.remove(&id);
        state.checkouts.remove(&id);
        state.document_tags.remove(&id);
        state.versions.remove(&id);
        Ok(state.documents.remove(&id).is_some())
    }

    async fn list_documents(
        &self,
        owner_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Document>> {
        let state = self.state.read().await;

        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|d| owner_id.is_none_or(|owner| d.owner_id == owner))
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = documents.len() as u64;
        let items = documents
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn find_version(
        &self,
        document_id: Uuid,
        version_number: i32,
    ) -> AppResult<Option<DocumentVersion>> {
        Ok(self
            .state
            .read()
            .await
            .versions
            .get(&document_id)
            .and_then(|versions| {
                versions
                    .iter()
                    .find(|v| v.version_number == version_number)
                    .cloned()
            }))
    }

    async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<DocumentVersion>> {
        let state = self.state.read().await;
        let mut versions = state.versions.get(&document_id).cloned().unwrap_or_default();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn document_tags(&self, document_id: Uuid) -> AppResult<Vec<Tag>> {
        let state = self.state.read().await;
        let ids = state.document_tags.get(&document_id).cloned().unwrap_or_default();
        let mut tags: Vec<Tag> = state
            .tags
            .values()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn find_checkout(&self, document_id: Uuid) -> AppResult<Option<DocumentCheckout>> {
        Ok(self.state.read().await.checkouts.get(&document_id).cloned())
    }

    async fn create_checkout(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        comments: &str,
    ) -> AppResult<DocumentCheckout> {
        let mut state = self.state.write().await;

        if !state.documents.contains_key(&document_id) {
            return Err(AppError::not_found(format!(
                "Document {document_id} not found"
            )));
        }
        if state.checkouts.contains_key(&document_id) {
            return Err(AppError::conflict(
                "Document is already checked out by another user",
            ));
        }

        let checkout = DocumentCheckout {
            id: Uuid::new_v4(),
            document_id,
            user_id,
            checkout_time: Utc::now(),
            comments: Some(comments.to_string()),
        };
        state.checkouts.insert(document_id, checkout.clone());
        state.push_activity(document_id, user_id, ActivityKind::Checkout, comments);

        Ok(checkout)
    }

    async fn release_checkout(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        comments: &str,
        content: Option<&NewVersionContent>,
    ) -> AppResult<Document> {
        let mut state = self.state.write().await;

        let holder = state
            .checkouts
            .get(&document_id)
            .map(|c| c.user_id)
            .ok_or_else(|| AppError::conflict("Document is not checked out"))?;
        if holder != user_id {
            return Err(AppError::conflict(
                "Document is checked out by another user",
            ));
        }

        let mut document = state
            .documents
            .get(&document_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;

        if let Some(content) = content {
            document.version += 1;
            document.file_path = content.file_path.clone();
            document.mime_type = content.mime_type.clone();
            document.updated_at = Utc::now();
            state.push_version(
                document_id,
                document.version,
                &content.file_path,
                content.changes.clone(),
            );
            state.documents.insert(document_id, document.clone());
        }

        state.checkouts.remove(&document_id);
        state.push_activity(document_id, user_id, ActivityKind::Checkin, comments);

        Ok(document)
    }

    async fn list_activities(&self, document_id: Uuid) -> AppResult<Vec<ActivityView>> {
        let state = self.state.read().await;
        let entries = state.activities.get(&document_id).cloned().unwrap_or_default();

        // Append order is creation order; reversing yields newest-first even
        // when two entries share a timestamp.
        entries
            .into_iter()
            .rev()
            .map(|a| {
                let user = state
                    .users
                    .get(&a.user_id)
                    .ok_or_else(|| AppError::internal(format!("User {} not found", a.user_id)))?;
                Ok(ActivityView {
                    id: a.id,
                    kind: a.kind,
                    activity_time: a.activity_time,
                    details: a.details,
                    user_id: user.id,
                    username: user.username.clone(),
                    full_name: user.full_name.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryDocumentStore, username: &str) -> User {
        store
            .insert_user(&NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                full_name: None,
                is_superuser: false,
            })
            .await
            .unwrap()
    }

    async fn seed_document(store: &MemoryDocumentStore, owner: &User) -> Document {
        store
            .insert_document(&NewDocument {
                title: "Report".to_string(),
                description: None,
                file_path: "documents/report.pdf".to_string(),
                mime_type: Some("application/pdf".to_string()),
                owner_id: owner.id,
                tags: vec![],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_checkout_rejected() {
        let store = MemoryDocumentStore::new();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let doc = seed_document(&store, &alice).await;

        store.create_checkout(doc.id, alice.id, "editing").await.unwrap();
        let err = store
            .create_checkout(doc.id, bob.id, "me too")
            .await
            .unwrap_err();
        assert_eq!(err.kind, docvault_core::error::ErrorKind::Conflict);

        // The original lock is untouched.
        let lock = store.find_checkout(doc.id).await.unwrap().unwrap();
        assert_eq!(lock.user_id, alice.id);
    }

    #[tokio::test]
    async fn test_release_with_content_bumps_version() {
        let store = MemoryDocumentStore::new();
        let alice = seed_user(&store, "alice").await;
        let doc = seed_document(&store, &alice).await;

        store.create_checkout(doc.id, alice.id, "editing").await.unwrap();
        let updated = store
            .release_checkout(
                doc.id,
                alice.id,
                "fixed typos",
                Some(&NewVersionContent {
                    file_path: "documents/report-v2.pdf".to_string(),
                    mime_type: Some("application/pdf".to_string()),
                    changes: Some("fixed typos".to_string()),
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.version, 2);
        let v2 = store.find_version(doc.id, 2).await.unwrap().unwrap();
        assert_eq!(v2.changes.as_deref(), Some("fixed typos"));
        assert!(store.find_checkout(doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tag_resolution_reuses_existing() {
        let store = MemoryDocumentStore::new();
        let alice = seed_user(&store, "alice").await;

        let first = store
            .insert_document(&NewDocument {
                title: "A".to_string(),
                description: None,
                file_path: "a.txt".to_string(),
                mime_type: None,
                owner_id: alice.id,
                tags: vec!["draft".to_string()],
            })
            .await
            .unwrap();
        let second = store
            .insert_document(&NewDocument {
                title: "B".to_string(),
                description: None,
                file_path: "b.txt".to_string(),
                mime_type: None,
                owner_id: alice.id,
                tags: vec!["draft".to_string()],
            })
            .await
            .unwrap();

        let first_tags = store.document_tags(first.id).await.unwrap();
        let second_tags = store.document_tags(second.id).await.unwrap();
        assert_eq!(first_tags.len(), 1);
        assert_eq!(first_tags[0].id, second_tags[0].id);
    }

    #[tokio::test]
    async fn test_delete_document_removes_children() {
        let store = MemoryDocumentStore::new();
        let alice = seed_user(&store, "alice").await;
        let doc = seed_document(&store, &alice).await;
        store.create_checkout(doc.id, alice.id, "editing").await.unwrap();

        assert!(store.delete_document(doc.id).await.unwrap());
        assert!(store.find_document(doc.id).await.unwrap().is_none());
        assert!(store.find_checkout(doc.id).await.unwrap().is_none());
        assert!(store.list_versions(doc.id).await.unwrap().is_empty());
        assert!(store.list_activities(doc.id).await.unwrap().is_empty());
    }
}
