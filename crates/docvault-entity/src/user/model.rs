//! User entity model.
//!
//! Authentication (token issuance, password verification) lives outside
//! this system; the user row exists for ownership references and activity
//! log display identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user referenced by documents and activity entries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Human-readable full name.
    pub full_name: Option<String>,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account has elevated privileges.
    pub is_superuser: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Full name (optional).
    pub full_name: Option<String>,
    /// Whether the account has elevated privileges.
    #[serde(default)]
    pub is_superuser: bool,
}
