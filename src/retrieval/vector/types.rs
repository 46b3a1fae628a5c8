use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::document::{Document, NewDocument};

/// One candidate returned by a nearest-neighbor query, ordered by ascending
/// L2 distance to the query vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMatch {
    pub chunk_id: i32,
    pub document_id: i32,
    pub text: String,
    pub vector: Vec<f32>,
    pub collection_name: Option<String>,
    pub distance: f32,
}

/// Persistence and similarity queries over chunk rows and their per-slot
/// embedding vectors.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Appends one chunk row with its vector for the given slot. Fails when
    /// the parent document does not exist.
    async fn insert_chunk(
        &self,
        document_id: i32,
        text: &str,
        vector: &[f32],
        slot: &str,
    ) -> AppResult<i32>;

    /// Persists a document together with all of its chunk+vector pairs in a
    /// single transaction. On any failure nothing is persisted; on success
    /// the document's chunk count equals the number of pairs.
    async fn insert_document_with_chunks(
        &self,
        document: &NewDocument,
        chunks: &[(String, Vec<f32>)],
        slot: &str,
    ) -> AppResult<Document>;

    /// Returns up to `top_n` chunks ordered by ascending exact L2 distance
    /// between the stored vector for `slot` and `vector`, optionally
    /// restricted to documents of the named collection (exact match).
    /// Candidates with malformed stored vectors are skipped.
    async fn query_nearest(
        &self,
        vector: &[f32],
        slot: &str,
        top_n: usize,
        collection: Option<&str>,
    ) -> AppResult<Vec<ChunkMatch>>;

    /// Removes all chunk rows (and their embeddings) of a document.
    async fn delete_document_chunks(&self, document_id: i32) -> AppResult<()>;
}

/// Exact Euclidean distance. Vectors of unequal length compare over the
/// shared prefix; callers are expected to have validated dimensionality.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

pub fn encode_vector(vector: &[f32]) -> String {
    serde_json::to_string(vector).unwrap_or_else(|_| "[]".to_string())
}

pub fn decode_vector(raw: &str) -> Option<Vec<f32>> {
    serde_json::from_str(raw).ok()
}
