//! # docvault-database
//!
//! The persistence layer for DocVault: PostgreSQL connection management,
//! the [`DocumentStore`] trait describing every atomic persistence
//! operation, and its two implementations — [`postgres::PgDocumentStore`]
//! backed by sqlx transactions, and [`memory::MemoryDocumentStore`] for
//! tests and single-process embedding.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use store::DocumentStore;
