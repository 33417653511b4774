//! PostgreSQL implementation of [`DocumentStore`].
//!
//! Every compound operation runs inside a single sqlx transaction; an error
//! anywhere drops the transaction and rolls back all of its row mutations.
//! The checkout uniqueness invariant is the `document_checkouts_document_id_key`
//! constraint, and tag resolution is an `ON CONFLICT` upsert, so neither
//! depends on check-then-act at the application level.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::pagination::{PageRequest, PageResponse};
use docvault_entity::document::{
    ActivityKind, ActivityView, Document, DocumentCheckout, DocumentPatch, DocumentVersion,
    NewDocument, NewVersionContent,
};
use docvault_entity::tag::Tag;
use docvault_entity::user::{NewUser, User};

use crate::store::DocumentStore;

/// Document store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a tag name to its row, inserting it if absent.
    ///
    /// The `DO UPDATE` arm is a no-op rewrite of the name; it exists so the
    /// statement returns the existing row instead of nothing when the tag
    /// is already present.
    async fn upsert_tag(conn: &mut PgConnection, name: &str) -> AppResult<Tag> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING *",
        )
        .bind(name)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve tag", e))
    }

    /// Replace a document's tag associations with the given name set.
    async fn replace_tags(
        conn: &mut PgConnection,
        document_id: Uuid,
        names: &[String],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM document_tags WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear document tags", e)
            })?;

        for name in names {
            let tag = Self::upsert_tag(&mut *conn, name).await?;
            sqlx::query(
                "INSERT INTO document_tags (document_id, tag_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(document_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to attach tag", e)
            })?;
        }

        Ok(())
    }

    /// Insert a version row for a document.
    async fn insert_version(
        conn: &mut PgConnection,
        document_id: Uuid,
        version_number: i32,
        file_path: &str,
        changes: Option<&str>,
    ) -> AppResult<DocumentVersion> {
        sqlx::query_as::<_, DocumentVersion>(
            "INSERT INTO document_versions (document_id, version_number, file_path, changes) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(document_id)
        .bind(version_number)
        .bind(file_path)
        .bind(changes)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create document version", e)
        })
    }

    /// Append an activity log entry.
    async fn insert_activity(
        conn: &mut PgConnection,
        document_id: Uuid,
        user_id: Uuid,
        kind: ActivityKind,
        details: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO document_activities (document_id, user_id, kind, details) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(document_id)
        .bind(user_id)
        .bind(kind)
        .bind(details)
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record activity", e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, full_name, is_superuser) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("users_username_key") =>
            {
                AppError::conflict(format!("Username '{}' is already taken", user.username))
            }
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
                AppError::conflict("Email address is already registered")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    async fn update_user(&self, user: &User) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET username = $2, email = $3, full_name = $4, is_active = $5, \
             is_superuser = $6, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update user", e))?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", user.id)))
    }

    async fn insert_document(&self, doc: &NewDocument) -> AppResult<Document> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let document = sqlx::query_as::<_, Document>(
            "INSERT INTO documents (title, description, file_path, mime_type, owner_id, version) \
             VALUES ($1, $2, $3, $4, $5, 1) RETURNING *",
        )
        .bind(&doc.title)
        .bind(&doc.description)
        .bind(&doc.file_path)
        .bind(&doc.mime_type)
        .bind(doc.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create document", e))?;

        Self::insert_version(&mut tx, document.id, 1, &doc.file_path, None).await?;
        Self::replace_tags(&mut tx, document.id, &doc.tags).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;

        Ok(document)
    }

    async fn find_document(&self, id: Uuid) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))
    }

    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> AppResult<Document> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let current = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load document", e))?
        .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;

        let title = patch.title.as_deref().unwrap_or(&current.title);
        let description = patch
            .description
            .as_deref()
            .or(current.description.as_deref());
        let (version, file_path, mime_type) = match &patch.content {
            Some(content) => (
                current.version + 1,
                content.file_path.as_str(),
                content.mime_type.as_deref(),
            ),
            None => (
                current.version,
                current.file_path.as_str(),
                current.mime_type.as_deref(),
            ),
        };

        let document = sqlx::query_as::<_, Document>(
            "UPDATE documents SET title = $2, description = $3, file_path = $4, mime_type = $5, \
             version = $6, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(file_path)
        .bind(mime_type)
        .bind(version)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update document", e))?;

        if let Some(content) = &patch.content {
            Self::insert_version(
                &mut tx,
                id,
                document.version,
                &content.file_path,
                content.changes.as_deref(),
            )
            .await?;
        }

        if let Some(tags) = &patch.tags {
            Self::replace_tags(&mut tx, id, tags).await?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;

        Ok(document)
    }

    async fn delete_document(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        for sql in [
            "DELETE FROM document_activities WHERE document_id = $1",
            "DELETE FROM document_checkouts WHERE document_id = $1",
            "DELETE FROM document_tags WHERE document_id = $1",
            "DELETE FROM document_versions WHERE document_id = $1",
        ] {
            sqlx::query(sql).bind(id).execute(&mut *tx).await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete document children", e)
            })?;
        }

        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete document", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_documents(
        &self,
        owner_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Document>> {
        let (total, documents) = if let Some(owner) = owner_id {
            let total: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE owner_id = $1")
                    .bind(owner)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to count documents", e)
                    })?;

            let documents = sqlx::query_as::<_, Document>(
                "SELECT * FROM documents WHERE owner_id = $1 \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(owner)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list documents", e)
            })?;

            (total, documents)
        } else {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count documents", e)
                })?;

            let documents = sqlx::query_as::<_, Document>(
                "SELECT * FROM documents ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list documents", e)
            })?;

            (total, documents)
        };

        Ok(PageResponse::new(
            documents,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn find_version(
        &self,
        document_id: Uuid,
        version_number: i32,
    ) -> AppResult<Option<DocumentVersion>> {
        sqlx::query_as::<_, DocumentVersion>(
            "SELECT * FROM document_versions WHERE document_id = $1 AND version_number = $2",
        )
        .bind(document_id)
        .bind(version_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find document version", e)
        })
    }

    async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<DocumentVersion>> {
        sqlx::query_as::<_, DocumentVersion>(
            "SELECT * FROM document_versions WHERE document_id = $1 ORDER BY version_number DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list document versions", e)
        })
    }

    async fn document_tags(&self, document_id: Uuid) -> AppResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.* FROM tags t \
             JOIN document_tags dt ON dt.tag_id = t.id \
             WHERE dt.document_id = $1 ORDER BY t.name ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list document tags", e))
    }

    async fn find_checkout(&self, document_id: Uuid) -> AppResult<Option<DocumentCheckout>> {
        sqlx::query_as::<_, DocumentCheckout>(
            "SELECT * FROM document_checkouts WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find checkout", e))
    }

    async fn create_checkout(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        comments: &str,
    ) -> AppResult<DocumentCheckout> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // DO NOTHING turns a lost race on the uniqueness constraint into an
        // empty result instead of an aborted transaction.
        let checkout = sqlx::query_as::<_, DocumentCheckout>(
            "INSERT INTO document_checkouts (document_id, user_id, comments) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (document_id) DO NOTHING \
             RETURNING *",
        )
        .bind(document_id)
        .bind(user_id)
        .bind(comments)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create checkout", e))?
        .ok_or_else(|| {
            AppError::conflict("Document is already checked out by another user")
        })?;

        Self::insert_activity(&mut tx, document_id, user_id, ActivityKind::Checkout, comments)
            .await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;

        Ok(checkout)
    }

    async fn release_checkout(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        comments: &str,
        content: Option<&NewVersionContent>,
    ) -> AppResult<Document> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let checkout = sqlx::query_as::<_, DocumentCheckout>(
            "SELECT * FROM document_checkouts WHERE document_id = $1 FOR UPDATE",
        )
        .bind(document_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load checkout", e))?
        .ok_or_else(|| AppError::conflict("Document is not checked out"))?;

        if checkout.user_id != user_id {
            return Err(AppError::conflict(
                "Document is checked out by another user",
            ));
        }

        let document = if let Some(content) = content {
            let document = sqlx::query_as::<_, Document>(
                "UPDATE documents SET version = version + 1, file_path = $2, mime_type = $3, \
                 updated_at = NOW() \
                 WHERE id = $1 RETURNING *",
            )
            .bind(document_id)
            .bind(&content.file_path)
            .bind(&content.mime_type)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update document", e)
            })?
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;

            Self::insert_version(
                &mut tx,
                document_id,
                document.version,
                &content.file_path,
                content.changes.as_deref(),
            )
            .await?;

            document
        } else {
            sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
                .bind(document_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to load document", e)
                })?
                .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?
        };

        sqlx::query("DELETE FROM document_checkouts WHERE id = $1")
            .bind(checkout.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to release checkout", e)
            })?;

        Self::insert_activity(&mut tx, document_id, user_id, ActivityKind::Checkin, comments)
            .await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;

        Ok(document)
    }

    async fn list_activities(&self, document_id: Uuid) -> AppResult<Vec<ActivityView>> {
        sqlx::query_as::<_, ActivityView>(
            "SELECT a.id, a.kind, a.activity_time, a.details, \
                    u.id AS user_id, u.username, u.full_name \
             FROM document_activities a \
             JOIN users u ON u.id = a.user_id \
             WHERE a.document_id = $1 \
             ORDER BY a.activity_time DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list activities", e))
    }
}
