//! Document domain entities.

pub mod activity;
pub mod checkout;
pub mod model;
pub mod version;

pub use activity::{ActivityKind, ActivityView, DocumentActivity};
pub use checkout::DocumentCheckout;
pub use model::{Document, DocumentPatch, NewDocument};
pub use version::{DocumentVersion, NewVersionContent};
