use std::sync::Arc;

use crate::error::AppResult;
use crate::models::search::{SearchRequest, SearchResponse};
use crate::retrieval::embeddings::EmbeddingProvider;
use crate::retrieval::ranker::SimilarityRanker;
use crate::retrieval::vector::ChunkStore;

/// Query pipeline: embed the query once, fetch the nearest chunks by exact
/// L2 distance, then derive similarity metrics while packaging the response.
pub struct SearchService {
    store: Arc<dyn ChunkStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    ranker: SimilarityRanker,
    slot: String,
}

impl SearchService {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        ranker: SimilarityRanker,
        slot: String,
    ) -> Self {
        SearchService {
            store,
            embeddings,
            ranker,
            slot,
        }
    }

    pub async fn search(&self, request: &SearchRequest) -> AppResult<SearchResponse> {
        let mut vectors = self.embeddings.embed(vec![request.query.clone()]).await?;
        let query_vector = vectors.pop().unwrap_or_default();

        let filter = request.collection_filter();
        let matches = self
            .store
            .query_nearest(&query_vector, &self.slot, request.top_n, filter)
            .await?;

        Ok(self.ranker.rank(
            &query_vector,
            matches,
            self.embeddings.model_name(),
            self.embeddings.model_version(),
            "search",
            filter.is_some(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::models::document::NewDocument;
    use crate::retrieval::embeddings::testing::FakeEmbeddings;
    use crate::retrieval::ranker::TracingObserver;
    use crate::retrieval::vector::memory::MemChunkStore;

    async fn seeded_service() -> SearchService {
        let embeddings = Arc::new(FakeEmbeddings { dimension: 32 });
        let store = Arc::new(MemChunkStore::new(HashMap::from([
            (1, "animals".to_string()),
            (2, "cooking".to_string()),
        ])));

        let corpus: [(i32, &str, &[&str]); 2] = [
            (1, "animals", &["the quick brown fox", "a sleepy grey cat"]),
            (2, "cooking", &["soup with leeks and cream"]),
        ];
        for (collection_id, name, texts) in corpus {
            let chunks: Vec<(String, Vec<f32>)> = {
                let mut pairs = Vec::new();
                for t in texts {
                    pairs.push((t.to_string(), embeddings.embed_one(t)));
                }
                pairs
            };
            store
                .insert_document_with_chunks(
                    &NewDocument {
                        collection_id,
                        title: name.to_string(),
                        stored_name: format!("{}.txt", name),
                        storage_uri: format!("/bucket/{}.txt", name),
                        uploaded_by: "tester".to_string(),
                    },
                    &chunks,
                    "default",
                )
                .await
                .unwrap();
        }

        SearchService::new(
            store,
            embeddings,
            SimilarityRanker::new(Arc::new(TracingObserver)),
            "default".to_string(),
        )
    }

    #[tokio::test]
    async fn closest_chunk_comes_first() {
        let svc = seeded_service().await;
        let response = svc
            .search(&SearchRequest {
                query: "the quick brown fox".to_string(),
                collection: None,
                top_n: 3,
            })
            .await
            .unwrap();

        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[0].chunk_text, "the quick brown fox");
        assert_eq!(response.results[0].distance, 0.0);
        assert!(response.results[0].distance <= response.results[1].distance);
        assert!(response.results[1].distance <= response.results[2].distance);
    }

    #[tokio::test]
    async fn top_n_caps_the_result_count() {
        let svc = seeded_service().await;
        let response = svc
            .search(&SearchRequest {
                query: "fox".to_string(),
                collection: None,
                top_n: 1,
            })
            .await
            .unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn collection_filter_restricts_candidates() {
        let svc = seeded_service().await;
        let response = svc
            .search(&SearchRequest {
                query: "the quick brown fox".to_string(),
                collection: Some("cooking".to_string()),
                top_n: 5,
            })
            .await
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].chunk_text, "soup with leeks and cream");
        assert_eq!(response.results[0].collection.as_deref(), Some("cooking"));
    }

    #[tokio::test]
    async fn ingested_document_is_searchable() {
        use crate::models::collection::Collection;
        use crate::services::ingest::IngestionService;
        use crate::services::storage::{BucketStorage, FsBucketStorage};
        use chrono::Utc;

        let dir = tempfile::tempdir().unwrap();
        let embeddings = Arc::new(FakeEmbeddings { dimension: 32 });
        let store = Arc::new(MemChunkStore::new(HashMap::from([(1, "notes".to_string())])));
        let col = Collection {
            collection_id: 1,
            user_id: 1,
            name: "notes".to_string(),
            description: None,
            bucket_state: Some("created".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let storage = FsBucketStorage::new(dir.path());
        storage.ensure_bucket(&col.bucket_name()).await.unwrap();

        let ingestion = IngestionService::new(
            store.clone(),
            embeddings.clone(),
            Arc::new(FsBucketStorage::new(dir.path())),
            1024 * 1024,
            4,
            "default".to_string(),
        );
        let body = "the quick brown fox jumps over the lazy dog while a sleepy grey cat naps";
        let document = ingestion
            .ingest(&col, "field notes.txt", "Field notes", body.as_bytes(), "alice")
            .await
            .unwrap();
        assert_eq!(document.number_of_chunks, 4);

        let svc = SearchService::new(
            store,
            embeddings,
            SimilarityRanker::new(Arc::new(TracingObserver)),
            "default".to_string(),
        );
        let response = svc
            .search(&SearchRequest {
                query: "the quick brown fox".to_string(),
                collection: None,
                top_n: 2,
            })
            .await
            .unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].chunk_text, "the quick brown fox");
        assert_eq!(response.results[0].distance, 0.0);
        assert_eq!(response.results[0].document_id, document.document_id);
    }

    #[tokio::test]
    async fn sentinel_filter_searches_everything() {
        let svc = seeded_service().await;
        let response = svc
            .search(&SearchRequest {
                query: "fox".to_string(),
                collection: Some("string".to_string()),
                top_n: 10,
            })
            .await
            .unwrap();
        assert_eq!(response.results.len(), 3);
    }
}
