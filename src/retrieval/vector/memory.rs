//! In-memory [`ChunkStore`] used by orchestrator tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use super::types::{l2_distance, ChunkMatch, ChunkStore};
use crate::error::{AppError, AppResult};
use crate::models::document::{Document, NewDocument};

#[derive(Default)]
struct State {
    next_document_id: i32,
    next_chunk_id: i32,
    documents: Vec<Document>,
    /// (chunk_id, document_id, text, slot -> vector)
    chunks: Vec<(i32, i32, String, HashMap<String, Vec<f32>>)>,
}

pub struct MemChunkStore {
    /// collection_id -> collection name, fixed at construction.
    collections: HashMap<i32, String>,
    state: Mutex<State>,
}

impl MemChunkStore {
    pub fn new(collections: HashMap<i32, String>) -> Self {
        MemChunkStore {
            collections,
            state: Mutex::new(State {
                next_document_id: 1,
                next_chunk_id: 1,
                ..Default::default()
            }),
        }
    }

    pub fn document_count(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.state.lock().unwrap().chunks.len()
    }
}

#[async_trait]
impl ChunkStore for MemChunkStore {
    async fn insert_chunk(
        &self,
        document_id: i32,
        text: &str,
        vector: &[f32],
        slot: &str,
    ) -> AppResult<i32> {
        let mut state = self.state.lock().unwrap();
        if !state.documents.iter().any(|d| d.document_id == document_id) {
            return Err(AppError::NotFound(format!(
                "Document with id {} not found",
                document_id
            )));
        }
        let chunk_id = state.next_chunk_id;
        state.next_chunk_id += 1;
        let mut vectors = HashMap::new();
        vectors.insert(slot.to_string(), vector.to_vec());
        state
            .chunks
            .push((chunk_id, document_id, text.to_string(), vectors));
        Ok(chunk_id)
    }

    async fn insert_document_with_chunks(
        &self,
        document: &NewDocument,
        chunks: &[(String, Vec<f32>)],
        slot: &str,
    ) -> AppResult<Document> {
        let mut state = self.state.lock().unwrap();
        if state.documents.iter().any(|d| {
            d.collection_id == document.collection_id && d.stored_name == document.stored_name
        }) {
            return Err(AppError::BadRequest(format!(
                "A document named '{}' already exists in this collection",
                document.stored_name
            )));
        }
        let document_id = state.next_document_id;
        state.next_document_id += 1;

        let doc = Document {
            document_id,
            collection_id: document.collection_id,
            title: document.title.clone(),
            stored_name: document.stored_name.clone(),
            storage_uri: document.storage_uri.clone(),
            uploaded_by: document.uploaded_by.clone(),
            chunk_count: chunks.len() as i32,
            created_at: Utc::now(),
        };
        state.documents.push(doc.clone());

        for (text, vector) in chunks {
            let chunk_id = state.next_chunk_id;
            state.next_chunk_id += 1;
            let mut vectors = HashMap::new();
            vectors.insert(slot.to_string(), vector.clone());
            state
                .chunks
                .push((chunk_id, document_id, text.clone(), vectors));
        }

        Ok(doc)
    }

    async fn query_nearest(
        &self,
        vector: &[f32],
        slot: &str,
        top_n: usize,
        collection: Option<&str>,
    ) -> AppResult<Vec<ChunkMatch>> {
        let state = self.state.lock().unwrap();

        let mut matches: Vec<ChunkMatch> = Vec::new();
        for (chunk_id, document_id, text, vectors) in &state.chunks {
            let Some(stored) = vectors.get(slot) else {
                continue;
            };
            if stored.len() != vector.len() {
                continue;
            }

            let doc = state
                .documents
                .iter()
                .find(|d| d.document_id == *document_id);
            let collection_name = doc.and_then(|d| self.collections.get(&d.collection_id).cloned());

            if let Some(filter) = collection {
                if collection_name.as_deref() != Some(filter) {
                    continue;
                }
            }

            matches.push(ChunkMatch {
                chunk_id: *chunk_id,
                document_id: *document_id,
                text: text.clone(),
                vector: stored.clone(),
                collection_name: collection.and(collection_name),
                distance: l2_distance(vector, stored),
            });
        }

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_n);

        Ok(matches)
    }

    async fn delete_document_chunks(&self, document_id: i32) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.chunks.retain(|(_, doc_id, _, _)| *doc_id != document_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_collection() -> MemChunkStore {
        let mut collections = HashMap::new();
        collections.insert(1, "alpha".to_string());
        collections.insert(2, "beta".to_string());
        MemChunkStore::new(collections)
    }

    fn new_doc(collection_id: i32, name: &str) -> NewDocument {
        NewDocument {
            collection_id,
            title: name.to_string(),
            stored_name: format!("{}.txt", name),
            storage_uri: format!("/bucket/{}.txt", name),
            uploaded_by: "tester".to_string(),
        }
    }

    #[tokio::test]
    async fn nearest_returns_ascending_distances() {
        let store = store_with_collection();
        let chunks: Vec<(String, Vec<f32>)> = (0..5)
            .map(|i| (format!("chunk {}", i), vec![i as f32, 0.0]))
            .collect();
        store
            .insert_document_with_chunks(&new_doc(1, "d"), &chunks, "default")
            .await
            .unwrap();

        let result = store
            .query_nearest(&[2.2, 0.0], "default", 2, None)
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result[0].distance <= result[1].distance);
        assert_eq!(result[0].text, "chunk 2");
    }

    #[tokio::test]
    async fn collection_filter_excludes_other_collections() {
        let store = store_with_collection();
        store
            .insert_document_with_chunks(
                &new_doc(1, "in-alpha"),
                &[("alpha chunk".to_string(), vec![0.0, 0.0])],
                "default",
            )
            .await
            .unwrap();
        store
            .insert_document_with_chunks(
                &new_doc(2, "in-beta"),
                &[("beta chunk".to_string(), vec![0.0, 0.0])],
                "default",
            )
            .await
            .unwrap();

        let result = store
            .query_nearest(&[0.0, 0.0], "default", 10, Some("beta"))
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "beta chunk");
        assert_eq!(result[0].collection_name.as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn insert_chunk_requires_existing_document() {
        let store = store_with_collection();
        let err = store
            .insert_chunk(99, "orphan", &[0.0], "default")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
