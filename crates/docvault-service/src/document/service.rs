//! Core document CRUD and version lineage operations.
//!
//! Content blobs are always written to the content store *before* any rows
//! are committed. A failed blob write therefore surfaces as a storage error
//! with no document or version record left behind; a failed row commit
//! leaves at worst an unreferenced blob, which is accepted.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use docvault_core::config::StorageConfig;
use docvault_core::error::AppError;
use docvault_core::traits::content::ContentStore;
use docvault_core::types::pagination::{PageRequest, PageResponse};
use docvault_database::store::DocumentStore;
use docvault_entity::document::{
    Document, DocumentPatch, DocumentVersion, NewDocument, NewVersionContent,
};
use docvault_entity::tag::Tag;
use docvault_storage::paths::document_blob_path;

use crate::context::RequestContext;

/// An uploaded file body.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Client-supplied file name.
    pub file_name: String,
    /// File content bytes.
    pub data: Bytes,
    /// MIME type, if the client declared one.
    pub mime_type: Option<String>,
}

/// Data for creating a new document.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    /// Document title.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Tag names to attach (created if absent).
    pub tags: Vec<String>,
    /// The initial content.
    pub file: FileUpload,
}

/// Data for a partial document update.
///
/// `None` fields are left untouched. A present `tags` vector fully replaces
/// the tag set (empty clears it); a present `file` mints a new version.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement tag set.
    pub tags: Option<Vec<String>>,
    /// New content.
    pub file: Option<FileUpload>,
}

/// Handles document CRUD and version lookups.
#[derive(Clone)]
pub struct DocumentService {
    /// Document store.
    store: Arc<dyn DocumentStore>,
    /// Content store.
    content: Arc<dyn ContentStore>,
    /// Storage configuration.
    config: StorageConfig,
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService").finish()
    }
}

impl DocumentService {
    /// Creates a new document service.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        content: Arc<dyn ContentStore>,
        config: StorageConfig,
    ) -> Self {
        Self {
            store,
            content,
            config,
        }
    }

    /// Creates a document: writes the content blob, then commits the
    /// document row, its version-1 snapshot, and its resolved tags as one
    /// unit.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateDocumentRequest,
    ) -> Result<Document, AppError> {
        validate_title(&req.title)?;
        validate_tag_names(&req.tags)?;
        self.validate_upload(&req.file)?;

        let file_path = document_blob_path(ctx.actor_id, &req.file.file_name);
        self.content.write(&file_path, req.file.data).await?;

        let document = self
            .store
            .insert_document(&NewDocument {
                title: req.title,
                description: req.description,
                file_path,
                mime_type: req.file.mime_type,
                owner_id: ctx.actor_id,
                tags: req.tags,
            })
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            document_id = %document.id,
            "Document created"
        );

        Ok(document)
    }

    /// Applies a partial update. A new file bumps the version by exactly 1
    /// and records a matching version snapshot in the same unit as the
    /// field updates.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
        req: UpdateDocumentRequest,
    ) -> Result<Document, AppError> {
        let document = self.get(ctx, document_id).await?;

        if let Some(title) = &req.title {
            validate_title(title)?;
        }
        if let Some(tags) = &req.tags {
            validate_tag_names(tags)?;
        }

        let content = match req.file {
            Some(file) => {
                self.validate_upload(&file)?;
                let file_path = document_blob_path(document.owner_id, &file.file_name);
                self.content.write(&file_path, file.data).await?;
                Some(NewVersionContent {
                    file_path,
                    mime_type: file.mime_type,
                    changes: None,
                })
            }
            None => None,
        };

        let updated = self
            .store
            .update_document(
                document_id,
                &DocumentPatch {
                    title: req.title,
                    description: req.description,
                    tags: req.tags,
                    content,
                },
            )
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            document_id = %document_id,
            version = updated.version,
            "Document updated"
        );

        Ok(updated)
    }

    /// Deletes a document and all of its child records. Content blobs are
    /// left in the store; reclaiming them is out of scope.
    pub async fn delete(&self, ctx: &RequestContext, document_id: Uuid) -> Result<(), AppError> {
        self.get(ctx, document_id).await?;
        self.store.delete_document(document_id).await?;

        info!(
            actor_id = %ctx.actor_id,
            document_id = %document_id,
            "Document deleted"
        );

        Ok(())
    }

    /// Gets a single document.
    pub async fn get(
        &self,
        _ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Document, AppError> {
        self.store
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("Document not found"))
    }

    /// Reads the current content of a document.
    pub async fn content(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Bytes, AppError> {
        let document = self.get(ctx, document_id).await?;
        self.content.read_bytes(&document.file_path).await
    }

    /// Point lookup of one version. An absent document or version number is
    /// `None`, never an error.
    pub async fn get_version(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
        version_number: i32,
    ) -> Result<Option<DocumentVersion>, AppError> {
        debug!(
            actor_id = %ctx.actor_id,
            document_id = %document_id,
            version_number,
            "Version lookup"
        );
        self.store.find_version(document_id, version_number).await
    }

    /// Lists all versions of a document, newest first.
    pub async fn list_versions(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Vec<DocumentVersion>, AppError> {
        self.get(ctx, document_id).await?;
        self.store.list_versions(document_id).await
    }

    /// Lists documents, optionally scoped to one owner. Authorization-based
    /// scoping is composed by the caller via `owner_id`.
    pub async fn list(
        &self,
        _ctx: &RequestContext,
        owner_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<PageResponse<Document>, AppError> {
        self.store.list_documents(owner_id, page).await
    }

    /// The document's current tag set.
    pub async fn tags(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Vec<Tag>, AppError> {
        self.get(ctx, document_id).await?;
        self.store.document_tags(document_id).await
    }

    fn validate_upload(&self, file: &FileUpload) -> Result<(), AppError> {
        if file.file_name.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }
        if file.data.len() as u64 > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }
        Ok(())
    }
}

/// Reject empty or whitespace-only titles.
fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation("Title cannot be empty"));
    }
    Ok(())
}

/// Reject empty tag names.
fn validate_tag_names(tags: &[String]) -> Result<(), AppError> {
    if tags.iter().any(|t| t.trim().is_empty()) {
        return Err(AppError::validation("Tag names cannot be empty"));
    }
    Ok(())
}
