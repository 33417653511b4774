//! Request context carrying the resolved calling identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current request.
///
/// The access-control gate in front of the engine authenticates the caller
/// and resolves their authorization level; services receive the result and
/// trust it. Every operation knows *who* is acting without re-deciding
/// *whether* they may.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub actor_id: Uuid,
    /// Whether the caller holds elevated (superuser) privileges.
    pub is_elevated: bool,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(actor_id: Uuid, is_elevated: bool) -> Self {
        Self {
            actor_id,
            is_elevated,
            request_time: Utc::now(),
        }
    }
}
