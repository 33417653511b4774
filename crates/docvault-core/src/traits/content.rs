//! Content store trait for durable document byte storage.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for document content backends.
///
/// The content store is addressed purely by path; path construction
/// (owner-scoped directories) is the caller's convention, not the store's.
/// The [`ContentStore`] trait is defined here in `docvault-core` and
/// implemented in `docvault-storage`.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write bytes to the given path, replacing any existing content.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Read the complete content at the given path.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Check whether content exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;
}
