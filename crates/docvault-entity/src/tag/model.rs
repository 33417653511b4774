//! Tag entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A shared, reusable label attached to documents many-to-many.
///
/// Names are unique and case-sensitive. Tags are created lazily by name
/// resolution and never deleted by document operations; orphaned tags are
/// accepted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Unique tag identifier.
    pub id: Uuid,
    /// Unique, case-sensitive tag name.
    pub name: String,
}
