use async_trait::async_trait;
use sqlx::Row;
use tracing::warn;

use super::types::{decode_vector, encode_vector, l2_distance, ChunkMatch, ChunkStore};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::document::{Document, NewDocument};

/// Chunk store backed by the relational database. Vectors are stored as
/// JSON-encoded text per (chunk, slot); nearest-neighbor queries do an exact
/// client-side L2 scan over the candidate rows, which is adequate for the
/// corpus sizes this system targets.
pub struct PgChunkStore {
    db: Database,
}

impl PgChunkStore {
    pub fn new(db: Database) -> Self {
        PgChunkStore { db }
    }

    fn map_fk_violation(e: sqlx::Error, document_id: i32) -> AppError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("23503") {
                return AppError::NotFound(format!("Document with id {} not found", document_id));
            }
        }
        AppError::Database(e)
    }

    fn map_unique_violation(e: sqlx::Error, stored_name: &str) -> AppError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::BadRequest(format!(
                    "A document named '{}' already exists in this collection",
                    stored_name
                ));
            }
        }
        AppError::Database(e)
    }
}

#[async_trait]
impl ChunkStore for PgChunkStore {
    async fn insert_chunk(
        &self,
        document_id: i32,
        text: &str,
        vector: &[f32],
        slot: &str,
    ) -> AppResult<i32> {
        let mut tx = self.db.pool.begin().await?;

        let chunk_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO chunks (document_id, chunk_text, text_length)
            VALUES ($1, $2, $3)
            RETURNING chunk_id
            "#,
        )
        .bind(document_id)
        .bind(text)
        .bind(text.len() as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_fk_violation(e, document_id))?;

        sqlx::query(
            r#"
            INSERT INTO chunk_embeddings (chunk_id, slot, vector)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(chunk_id)
        .bind(slot)
        .bind(encode_vector(vector))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(chunk_id)
    }

    async fn insert_document_with_chunks(
        &self,
        document: &NewDocument,
        chunks: &[(String, Vec<f32>)],
        slot: &str,
    ) -> AppResult<Document> {
        let mut tx = self.db.pool.begin().await?;

        let doc: Document = sqlx::query_as(
            r#"
            INSERT INTO documents (collection_id, title, stored_name, storage_uri, uploaded_by, chunk_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING document_id, collection_id, title, stored_name, storage_uri, uploaded_by, chunk_count, created_at
            "#,
        )
        .bind(document.collection_id)
        .bind(&document.title)
        .bind(&document.stored_name)
        .bind(&document.storage_uri)
        .bind(&document.uploaded_by)
        .bind(chunks.len() as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_unique_violation(e, &document.stored_name))?;

        for (text, vector) in chunks {
            let chunk_id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO chunks (document_id, chunk_text, text_length)
                VALUES ($1, $2, $3)
                RETURNING chunk_id
                "#,
            )
            .bind(doc.document_id)
            .bind(text)
            .bind(text.len() as i32)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO chunk_embeddings (chunk_id, slot, vector)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(chunk_id)
            .bind(slot)
            .bind(encode_vector(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(doc)
    }

    async fn query_nearest(
        &self,
        vector: &[f32],
        slot: &str,
        top_n: usize,
        collection: Option<&str>,
    ) -> AppResult<Vec<ChunkMatch>> {
        let rows = if let Some(collection_name) = collection {
            sqlx::query(
                r#"
                SELECT c.chunk_id, c.document_id, c.chunk_text, e.vector, col.name AS collection_name
                FROM chunks c
                JOIN chunk_embeddings e ON e.chunk_id = c.chunk_id AND e.slot = $1
                JOIN documents d ON d.document_id = c.document_id
                JOIN collections col ON col.collection_id = d.collection_id
                WHERE col.name = $2
                ORDER BY c.chunk_id
                "#,
            )
            .bind(slot)
            .bind(collection_name)
            .fetch_all(&self.db.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT c.chunk_id, c.document_id, c.chunk_text, e.vector, NULL AS collection_name
                FROM chunks c
                JOIN chunk_embeddings e ON e.chunk_id = c.chunk_id AND e.slot = $1
                JOIN documents d ON d.document_id = c.document_id
                ORDER BY c.chunk_id
                "#,
            )
            .bind(slot)
            .fetch_all(&self.db.pool)
            .await?
        };

        let mut matches: Vec<ChunkMatch> = Vec::with_capacity(rows.len());
        for row in rows {
            let chunk_id: i32 = row.try_get("chunk_id")?;
            let raw_vector: String = row.try_get("vector")?;
            let stored = match decode_vector(&raw_vector) {
                Some(v) if v.len() == vector.len() => v,
                _ => {
                    // A malformed candidate must not fail the whole search
                    warn!("Skipping chunk {} with malformed stored vector", chunk_id);
                    continue;
                }
            };

            let distance = l2_distance(vector, &stored);
            matches.push(ChunkMatch {
                chunk_id,
                document_id: row.try_get("document_id")?,
                text: row.try_get("chunk_text")?,
                vector: stored,
                collection_name: row.try_get("collection_name")?,
                distance,
            });
        }

        // Stable sort keeps natural row order for equal distances
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_n);

        Ok(matches)
    }

    async fn delete_document_chunks(&self, document_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM chunks WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.db.pool)
            .await?;

        Ok(())
    }
}
