use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub collection_id: i32,
    pub user_id: i32,
    /// Normalized name (lowercase, spaces and underscores replaced with `-`).
    pub name: String,
    pub description: Option<String>,
    /// Best-effort record of the blob-store bucket side channel, not
    /// transactional with this row.
    pub bucket_state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// Bucket name for this collection in blob storage.
    pub fn bucket_name(&self) -> String {
        crate::utils::text::bucket_name(self.collection_id, &self.name)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCollectionRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}
