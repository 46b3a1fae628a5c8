use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Chunk {
    pub chunk_id: i32,
    pub document_id: i32,
    pub chunk_text: String,
    pub text_length: i32,
    pub created_at: DateTime<Utc>,
}
