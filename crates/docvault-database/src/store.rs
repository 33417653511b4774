//! The persistence seam for the versioning and checkout engine.

use async_trait::async_trait;
use uuid::Uuid;

use docvault_core::result::AppResult;
use docvault_core::types::pagination::{PageRequest, PageResponse};
use docvault_entity::document::{
    ActivityView, Document, DocumentCheckout, DocumentPatch, DocumentVersion, NewDocument,
    NewVersionContent,
};
use docvault_entity::tag::Tag;
use docvault_entity::user::{NewUser, User};

/// Transactional storage for the document entity model.
///
/// Every method is one atomic unit: either all of its row mutations become
/// visible together or none do. Compound operations (document insert with
/// its initial version and tags, checkout acquisition with its activity
/// entry, checkin release with an optional version mint) are therefore
/// expressed as single trait methods rather than composed by callers.
///
/// Two invariants are the implementation's responsibility, not the
/// caller's:
///
/// - at most one [`DocumentCheckout`] row per document, enforced as a hard
///   uniqueness constraint so that two concurrent acquisitions cannot both
///   succeed;
/// - tag resolution by name is an atomic insert-or-fetch, so concurrent
///   creations with overlapping new tag names cannot mint duplicates.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    // ── Users ────────────────────────────────────────────────────

    /// Insert a new user.
    async fn insert_user(&self, user: &NewUser) -> AppResult<User>;

    /// Find a user by primary key.
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Update an existing user's profile.
    async fn update_user(&self, user: &User) -> AppResult<User>;

    // ── Documents ────────────────────────────────────────────────

    /// Insert a document together with its initial version row
    /// (version_number = 1) and its resolved tag set.
    async fn insert_document(&self, doc: &NewDocument) -> AppResult<Document>;

    /// Find a document by primary key.
    async fn find_document(&self, id: Uuid) -> AppResult<Option<Document>>;

    /// Apply a partial update. When the patch carries new content, the
    /// document version is incremented by exactly 1 and a matching version
    /// row is inserted in the same unit. When the patch carries a tag set,
    /// it fully replaces the existing associations.
    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> AppResult<Document>;

    /// Delete a document and all of its child rows (versions, checkout,
    /// activity entries, tag associations). Returns `true` if a row was
    /// deleted. Tags themselves are left in place.
    async fn delete_document(&self, id: Uuid) -> AppResult<bool>;

    /// List documents, optionally scoped to an owner, newest first.
    async fn list_documents(
        &self,
        owner_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Document>>;

    // ── Versions ─────────────────────────────────────────────────

    /// Point lookup of one version of a document.
    async fn find_version(
        &self,
        document_id: Uuid,
        version_number: i32,
    ) -> AppResult<Option<DocumentVersion>>;

    /// List all versions of a document, highest version_number first.
    async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<DocumentVersion>>;

    // ── Tags ─────────────────────────────────────────────────────

    /// The document's current tag set, ordered by name.
    async fn document_tags(&self, document_id: Uuid) -> AppResult<Vec<Tag>>;

    // ── Checkout protocol ────────────────────────────────────────

    /// Find the current checkout lock on a document, if any.
    async fn find_checkout(&self, document_id: Uuid) -> AppResult<Option<DocumentCheckout>>;

    /// Attempt to acquire the exclusive lock. On success the checkout row
    /// and its `checkout` activity entry are committed together. If another
    /// lock already exists — including one inserted by a concurrent racer —
    /// the attempt fails with a conflict error and commits nothing.
    async fn create_checkout(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        comments: &str,
    ) -> AppResult<DocumentCheckout>;

    /// Release the lock held by `user_id`. When `content` is supplied, the
    /// document version is incremented, a version row carrying the checkin
    /// comments is inserted, and the document's file location and MIME type
    /// are updated — all in the same unit as the lock deletion and the
    /// `checkin` activity entry. A failure anywhere leaves the lock in
    /// place. Fails with a conflict error if the lock is absent or held by
    /// a different user.
    async fn release_checkout(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        comments: &str,
        content: Option<&NewVersionContent>,
    ) -> AppResult<Document>;

    // ── Activity log ─────────────────────────────────────────────

    /// List a document's activity entries, newest first, each denormalized
    /// with the actor's current display identity.
    async fn list_activities(&self, document_id: Uuid) -> AppResult<Vec<ActivityView>>;
}
