use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::chunk::Chunk;
use crate::models::document::Document;

pub struct DocumentService<'a> {
    db: &'a Database,
}

impl<'a> DocumentService<'a> {
    pub fn new(db: &'a Database) -> Self {
        DocumentService { db }
    }

    pub async fn get_document_by_id(&self, document_id: i32) -> AppResult<Option<Document>> {
        let result = sqlx::query_as::<_, Document>(
            r#"
            SELECT document_id, collection_id, title, stored_name, storage_uri,
                   uploaded_by, chunk_count, created_at
            FROM documents
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_all_documents(&self) -> AppResult<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT document_id, collection_id, title, stored_name, storage_uri,
                   uploaded_by, chunk_count, created_at
            FROM documents
            ORDER BY document_id
            "#,
        )
        .fetch_all(&self.db.pool)
        .await?;

        Ok(documents)
    }

    pub async fn get_documents_by_collection(
        &self,
        collection_id: i32,
    ) -> AppResult<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT document_id, collection_id, title, stored_name, storage_uri,
                   uploaded_by, chunk_count, created_at
            FROM documents
            WHERE collection_id = $1
            ORDER BY document_id
            "#,
        )
        .bind(collection_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(documents)
    }

    /// Duplicate check on the normalized filename within one collection.
    pub async fn find_by_stored_name(
        &self,
        collection_id: i32,
        stored_name: &str,
    ) -> AppResult<Option<Document>> {
        let result = sqlx::query_as::<_, Document>(
            r#"
            SELECT document_id, collection_id, title, stored_name, storage_uri,
                   uploaded_by, chunk_count, created_at
            FROM documents
            WHERE collection_id = $1 AND stored_name = $2
            "#,
        )
        .bind(collection_id)
        .bind(stored_name)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_chunks_by_document(&self, document_id: i32) -> AppResult<Vec<Chunk>> {
        let chunks = sqlx::query_as::<_, Chunk>(
            r#"
            SELECT chunk_id, document_id, chunk_text, text_length, created_at
            FROM chunks
            WHERE document_id = $1
            ORDER BY chunk_id
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(chunks)
    }

    /// Deletes the document row; chunks and embeddings cascade.
    pub async fn delete_document(&self, document_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Document not found".to_string()));
        }

        Ok(())
    }
}
