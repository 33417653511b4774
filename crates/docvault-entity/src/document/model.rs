//! Document entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::version::NewVersionContent;

/// A managed document in DocVault.
///
/// The row is the *current* state of a logical file; immutable historical
/// snapshots live in `document_versions`. `version` always equals the
/// version_number of the most recently created snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique document identifier.
    pub id: Uuid,
    /// Document title.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Path of the current content in the content store.
    pub file_path: String,
    /// MIME type of the current content.
    pub mime_type: Option<String>,
    /// The document owner.
    pub owner_id: Uuid,
    /// Current version number. Starts at 1, increments by exactly 1 on each
    /// content-changing update or checkin.
    pub version: i32,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
    /// When the document was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new document record.
///
/// The content blob must already be written at `file_path` before this is
/// handed to the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    /// Document title.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Path of the initial content in the content store.
    pub file_path: String,
    /// MIME type of the initial content.
    pub mime_type: Option<String>,
    /// The document owner.
    pub owner_id: Uuid,
    /// Tag names to attach (resolved create-if-absent).
    pub tags: Vec<String>,
}

/// A partial update to a document.
///
/// `None` fields are left untouched. `tags` replaces the full tag set when
/// present (an empty vector clears all tags). `content` carries a new
/// content snapshot and bumps the version by exactly 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement tag set.
    pub tags: Option<Vec<String>>,
    /// New content snapshot.
    pub content: Option<NewVersionContent>,
}

impl DocumentPatch {
    /// Whether the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.content.is_none()
    }
}
