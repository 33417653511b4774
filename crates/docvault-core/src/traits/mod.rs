//! Core trait definitions shared across DocVault crates.

pub mod content;

pub use content::ContentStore;
