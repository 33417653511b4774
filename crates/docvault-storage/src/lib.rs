//! # docvault-storage
//!
//! Content store implementations for DocVault. The [`ContentStore`] trait
//! itself lives in `docvault-core`; this crate provides the local
//! filesystem provider and the blob path convention.

pub mod local;
pub mod paths;

pub use docvault_core::traits::content::ContentStore;
pub use local::LocalContentStore;
