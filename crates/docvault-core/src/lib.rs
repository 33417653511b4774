//! # docvault-core
//!
//! Core crate for DocVault. Contains the content-store trait, configuration
//! schemas, pagination types, the logging bootstrap, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other DocVault crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
