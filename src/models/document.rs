use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub document_id: i32,
    pub collection_id: i32,
    pub title: String,
    /// Normalized upload filename, unique within its collection.
    pub stored_name: String,
    /// Locator of the raw bytes in blob storage (`/{bucket}/{object}`).
    pub storage_uri: String,
    pub uploaded_by: String,
    pub chunk_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields of a document row staged before the transactional persist.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub collection_id: i32,
    pub title: String,
    pub stored_name: String,
    pub storage_uri: String,
    pub uploaded_by: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document_id: i32,
    pub collection_id: i32,
    pub collection_name: String,
    pub title: String,
    pub stored_name: String,
    pub storage_uri: String,
    pub uploaded_by: String,
    pub number_of_chunks: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<String>,
}

impl DocumentResponse {
    pub fn from_document(doc: Document, collection_name: String) -> Self {
        DocumentResponse {
            document_id: doc.document_id,
            collection_id: doc.collection_id,
            collection_name,
            title: doc.title,
            stored_name: doc.stored_name,
            storage_uri: doc.storage_uri,
            uploaded_by: doc.uploaded_by,
            number_of_chunks: doc.chunk_count,
            created_at: doc.created_at,
            execution_time: None,
        }
    }
}
