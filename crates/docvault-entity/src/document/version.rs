//! Document version entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable historical snapshot of a document's content.
///
/// Created once (at document creation and at each content-changing update
/// or checkin), never mutated, and deleted only when the parent document is
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentVersion {
    /// Unique version identifier.
    pub id: Uuid,
    /// The document this version belongs to.
    pub document_id: Uuid,
    /// Sequential version number, unique per document, starting at 1.
    pub version_number: i32,
    /// Path to this version's content in the content store.
    pub file_path: String,
    /// Free-text change description (checkin comments).
    pub changes: Option<String>,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
}

/// Content for a new version snapshot, handed to the persistence layer
/// after the blob has been written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVersionContent {
    /// Path of the newly written content.
    pub file_path: String,
    /// MIME type of the new content.
    pub mime_type: Option<String>,
    /// Change description carried onto the version row.
    pub changes: Option<String>,
}
