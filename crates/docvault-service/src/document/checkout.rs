//! The exclusive checkout/checkin protocol.
//!
//! Per-document state is derived from the presence of a checkout row:
//! `FREE` (no row) or `LOCKED(user)` (a row referencing that user). The
//! service re-reads current state on every call and never caches it; the
//! store's uniqueness constraint closes the remaining window where two
//! concurrent checkouts both observe `FREE`.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use docvault_core::config::StorageConfig;
use docvault_core::error::AppError;
use docvault_core::traits::content::ContentStore;
use docvault_database::store::DocumentStore;
use docvault_entity::document::{Document, NewVersionContent};
use docvault_storage::paths::document_blob_path;

use crate::context::RequestContext;
use crate::document::service::FileUpload;

/// Drives the checkout/checkin state machine.
#[derive(Clone)]
pub struct CheckoutService {
    /// Document store.
    store: Arc<dyn DocumentStore>,
    /// Content store.
    content: Arc<dyn ContentStore>,
    /// Storage configuration.
    config: StorageConfig,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService").finish()
    }
}

impl CheckoutService {
    /// Creates a new checkout service.
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

    /// Checks out a document for exclusive editing.
    ///
    /// Re-checkout by the current holder is an idempotent no-op: the lock
    /// timestamp is not refreshed and no second activity entry is recorded.
    pub async fn checkout(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
        comments: &str,
    ) -> Result<Document, AppError> {
        let document = self
            .store
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("Document not found"))?;

        match self.store.find_checkout(document_id).await? {
            Some(checkout) if checkout.held_by(ctx.actor_id) => {
                return Ok(document);
            }
            Some(_) => {
                return Err(AppError::conflict(
                    "Document is already checked out by another user",
                ));
            }
            None => {}
        }

        // A racer can still slip in between the read above and this insert;
        // the store's uniqueness constraint rejects the loser.
        self.store
            .create_checkout(document_id, ctx.actor_id, comments)
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            document_id = %document_id,
            "Document checked out"
        );

        Ok(document)
    }

    /// Checks in a document, releasing the lock.
    ///
    /// Only the lock holder may check in. When a file is supplied, the
    /// version bump, the new version snapshot (carrying the comments as its
    /// change description), the lock release, and the activity entry commit
    /// as one unit — if any part fails, the lock stays in place.
    pub async fn checkin(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
        comments: &str,
        file: Option<FileUpload>,
    ) -> Result<Document, AppError> {
        let document = self
            .store
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("Document not found"))?;

        match self.store.find_checkout(document_id).await? {
            None => {
                return Err(AppError::conflict("Document is not checked out"));
            }
            Some(checkout) if !checkout.held_by(ctx.actor_id) => {
                return Err(AppError::conflict(
                    "Document is checked out by another user",
                ));
            }
            Some(_) => {}
        }

        let content = match file {
            Some(file) => {
                if file.file_name.trim().is_empty() {
                    return Err(AppError::validation("File name cannot be empty"));
                }
                if file.data.len() as u64 > self.config.max_upload_size_bytes {
                    return Err(AppError::validation(format!(
                        "File exceeds maximum upload size of {} bytes",
                        self.config.max_upload_size_bytes
                    )));
                }
                let file_path = document_blob_path(document.owner_id, &file.file_name);
                self.content.write(&file_path, file.data).await?;
                Some(NewVersionContent {
                    file_path,
                    mime_type: file.mime_type,
                    changes: Some(comments.to_string()),
                })
            }
            None => None,
        };

        let document = self
            .store
            .release_checkout(document_id, ctx.actor_id, comments, content.as_ref())
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            document_id = %document_id,
            version = document.version,
            "Document checked in"
        );

        Ok(document)
    }
}
