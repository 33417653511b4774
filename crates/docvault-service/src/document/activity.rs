//! Activity log retrieval.

use std::sync::Arc;

use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_database::store::DocumentStore;
use docvault_entity::document::ActivityView;

use crate::context::RequestContext;

/// Read side of the append-only activity log.
///
/// Entries are written inside the checkout/checkin transactions; this
/// service only lists them, newest first, with the actor's display
/// identity resolved at read time.
#[derive(Clone)]
pub struct ActivityService {
    /// Document store.
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for ActivityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityService").finish()
    }
}

impl ActivityService {
    /// Creates a new activity service.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Lists a document's activity entries, newest first.
    pub async fn list(
        &self,
        _ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Vec<ActivityView>, AppError> {
        self.store
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("Document not found"))?;

        self.store.list_activities(document_id).await
    }
}
