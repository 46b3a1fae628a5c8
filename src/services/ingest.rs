use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::collection::Collection;
use crate::models::document::{DocumentResponse, NewDocument};
use crate::retrieval::chunking::chunk_words;
use crate::retrieval::embeddings::EmbeddingProvider;
use crate::retrieval::extract::{extract_text, SUPPORTED_EXTENSIONS};
use crate::retrieval::vector::ChunkStore;
use crate::services::storage::BucketStorage;
use crate::utils::text::{file_extension, normalize_filename};

/// Upload pipeline: store the raw bytes, extract text, chunk it, embed every
/// chunk, then persist document + chunks + vectors in one transaction.
pub struct IngestionService {
    store: Arc<dyn ChunkStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    storage: Arc<dyn BucketStorage>,
    max_upload_size: usize,
    max_chunk_words: usize,
    slot: String,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        storage: Arc<dyn BucketStorage>,
        max_upload_size: usize,
        max_chunk_words: usize,
        slot: String,
    ) -> Self {
        IngestionService {
            store,
            embeddings,
            storage,
            max_upload_size,
            max_chunk_words,
            slot,
        }
    }

    pub async fn ingest(
        &self,
        collection: &Collection,
        filename: &str,
        title: &str,
        bytes: &[u8],
        uploaded_by: &str,
    ) -> AppResult<DocumentResponse> {
        let started = Instant::now();

        if bytes.len() > self.max_upload_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {} byte upload limit",
                self.max_upload_size
            )));
        }

        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title must not be empty".to_string()));
        }
        // Column limit on documents.title
        if title.chars().count() > 100 {
            return Err(AppError::BadRequest(
                "Title must be 100 characters or fewer".to_string(),
            ));
        }

        let extension = file_extension(filename)
            .ok_or_else(|| AppError::BadRequest("File has no extension".to_string()))?;
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unsupported file extension: {}",
                extension
            )));
        }

        let stored_name = normalize_filename(filename);
        let bucket = collection.bucket_name();
        self.storage.put_object(&bucket, &stored_name, bytes).await?;
        let storage_uri = format!("/{}/{}", bucket, stored_name);

        let text = match extract_text(bytes, &extension) {
            Ok(text) => text,
            Err(e) => {
                self.discard_object(&bucket, &stored_name).await;
                return Err(AppError::BadRequest(format!("Could not extract text: {}", e)));
            }
        };

        let chunks = chunk_words(&text, self.max_chunk_words);
        let vectors = match self.embeddings.embed(chunks.clone()).await {
            Ok(vectors) => vectors,
            Err(e) => {
                self.discard_object(&bucket, &stored_name).await;
                return Err(e.into());
            }
        };
        let pairs: Vec<(String, Vec<f32>)> = chunks.into_iter().zip(vectors).collect();

        let new_document = NewDocument {
            collection_id: collection.collection_id,
            title: title.to_string(),
            stored_name,
            storage_uri,
            uploaded_by: uploaded_by.to_string(),
        };

        let document = match self
            .store
            .insert_document_with_chunks(&new_document, &pairs, &self.slot)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                self.discard_object(&bucket, &new_document.stored_name).await;
                return Err(e);
            }
        };

        let elapsed = started.elapsed();
        info!(
            document_id = document.document_id,
            collection = %collection.name,
            chunks = document.chunk_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Document ingested"
        );

        let mut response = DocumentResponse::from_document(document, collection.name.clone());
        response.execution_time = Some(format!("{:.3}s", elapsed.as_secs_f64()));
        Ok(response)
    }

    /// Best-effort cleanup of the stored raw file when the pipeline fails
    /// after the upload step.
    async fn discard_object(&self, bucket: &str, object: &str) {
        if let Err(e) = self.storage.remove_object(bucket, object).await {
            warn!(bucket, object, "Failed to clean up stored object: {}", e);
        }
    }
}
