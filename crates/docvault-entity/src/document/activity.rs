//! Document activity log entities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kind of action recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A user acquired the exclusive editing lock.
    Checkout,
    /// A user released the lock, optionally minting a new version.
    Checkin,
}

impl ActivityKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::Checkin => "checkin",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checkout" => Ok(Self::Checkout),
            "checkin" => Ok(Self::Checkin),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid activity kind: '{s}'. Expected one of: checkout, checkin"
            ))),
        }
    }
}

/// An immutable, append-only activity log entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentActivity {
    /// Unique activity entry identifier.
    pub id: Uuid,
    /// The document acted upon.
    pub document_id: Uuid,
    /// The acting user.
    pub user_id: Uuid,
    /// The kind of action.
    pub kind: ActivityKind,
    /// When the action occurred.
    pub activity_time: DateTime<Utc>,
    /// Free-text details (checkout/checkin comments).
    pub details: Option<String>,
}

/// An activity entry denormalized with the actor's display identity.
///
/// The user columns are resolved by join at read time, so a later profile
/// change retroactively changes how historical entries display.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityView {
    /// Unique activity entry identifier.
    pub id: Uuid,
    /// The kind of action.
    pub kind: ActivityKind,
    /// When the action occurred.
    pub activity_time: DateTime<Utc>,
    /// Free-text details.
    pub details: Option<String>,
    /// The acting user's ID.
    pub user_id: Uuid,
    /// The acting user's login name.
    pub username: String,
    /// The acting user's full name.
    pub full_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "checkout".parse::<ActivityKind>().unwrap(),
            ActivityKind::Checkout
        );
        assert_eq!(
            "CHECKIN".parse::<ActivityKind>().unwrap(),
            ActivityKind::Checkin
        );
        assert!("merge".parse::<ActivityKind>().is_err());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ActivityKind::Checkout.to_string(), "checkout");
        assert_eq!(ActivityKind::Checkin.to_string(), "checkin");
    }
}
