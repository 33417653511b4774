//! Document checkout entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An exclusive editing lock on a document.
///
/// At most one row exists per document (database-enforced uniqueness on
/// `document_id`). The row's presence *is* the locked state; its absence
/// means the document is free to check out.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentCheckout {
    /// Unique checkout identifier.
    pub id: Uuid,
    /// The locked document.
    pub document_id: Uuid,
    /// The user holding the lock.
    pub user_id: Uuid,
    /// When the lock was acquired.
    pub checkout_time: DateTime<Utc>,
    /// Free-text comments supplied at checkout.
    pub comments: Option<String>,
}

impl DocumentCheckout {
    /// Whether the lock is held by the given user.
    pub fn held_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
