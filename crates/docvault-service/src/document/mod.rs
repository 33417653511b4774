//! Document services.

pub mod activity;
pub mod checkout;
pub mod service;

pub use activity::ActivityService;
pub use checkout::CheckoutService;
pub use service::{CreateDocumentRequest, DocumentService, FileUpload, UpdateDocumentRequest};
