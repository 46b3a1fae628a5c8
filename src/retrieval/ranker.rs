use std::sync::Arc;

use super::vector::ChunkMatch;
use crate::models::search::{RankedChunk, SearchResponse};

/// Cosine similarity as a normalized dot product. Returns 0.0 when either
/// vector has zero magnitude (the similarity is undefined there; this is the
/// documented fallback).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Arithmetic mean of per-candidate cosine similarities. 0.0 for an empty
/// candidate set.
pub fn mean_cosine_similarity(query: &[f32], candidates: &[Vec<f32>]) -> f32 {
    if candidates.is_empty() {
        return 0.0;
    }
    let sum: f32 = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .sum();
    sum / candidates.len() as f32
}

/// Aggregate similarity metrics for one search, reported for observability.
#[derive(Debug, Clone)]
pub struct SimilarityReport {
    pub model_name: String,
    pub model_version: String,
    pub source: String,
    pub collection_filtered: bool,
    pub mean_cosine_similarity: f32,
    pub cosine_similarities: Vec<f32>,
}

/// Sink for similarity metrics. Reporting is best-effort: implementations
/// must not propagate failures into the search path.
pub trait SimilarityObserver: Send + Sync {
    fn record(&self, report: &SimilarityReport);
}

/// Default observer, emitting metrics through the tracing pipeline.
pub struct TracingObserver;

impl SimilarityObserver for TracingObserver {
    fn record(&self, report: &SimilarityReport) {
        tracing::info!(
            model_name = %report.model_name,
            model_version = %report.model_version,
            source = %report.source,
            collection_filtered = report.collection_filtered,
            mean_cos_similarity = report.mean_cosine_similarity,
            "similarity metrics"
        );
        for (i, sim) in report.cosine_similarities.iter().enumerate() {
            tracing::debug!("cos_similarity_top_{} = {}", i + 1, sim);
        }
    }
}

/// Packages ranked candidates into a response and derives cosine-similarity
/// statistics. The candidate order (ascending L2 distance from the store) is
/// preserved; cosine similarity is never used for ranking.
pub struct SimilarityRanker {
    observer: Arc<dyn SimilarityObserver>,
}

impl SimilarityRanker {
    pub fn new(observer: Arc<dyn SimilarityObserver>) -> Self {
        SimilarityRanker { observer }
    }

    pub fn rank(
        &self,
        query_vector: &[f32],
        matches: Vec<ChunkMatch>,
        model_name: &str,
        model_version: &str,
        source: &str,
        collection_filtered: bool,
    ) -> SearchResponse {
        let cosine_similarities: Vec<f32> = matches
            .iter()
            .map(|m| cosine_similarity(query_vector, &m.vector))
            .collect();
        let candidate_vectors: Vec<Vec<f32>> = matches.iter().map(|m| m.vector.clone()).collect();
        let mean = mean_cosine_similarity(query_vector, &candidate_vectors);

        self.observer.record(&SimilarityReport {
            model_name: model_name.to_string(),
            model_version: model_version.to_string(),
            source: source.to_string(),
            collection_filtered,
            mean_cosine_similarity: mean,
            cosine_similarities,
        });

        let results = matches
            .into_iter()
            .map(|m| RankedChunk {
                chunk_id: m.chunk_id,
                document_id: m.document_id,
                chunk_text: m.text,
                distance: m.distance,
                collection: m.collection_name,
            })
            .collect();

        SearchResponse { results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![2.0, 4.0, 6.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_falls_back_to_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn mean_similarity_is_averaged() {
        let query = vec![1.0, 0.0];
        let candidates = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!((mean_cosine_similarity(&query, &candidates) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn mean_similarity_of_empty_set_is_zero() {
        assert_eq!(mean_cosine_similarity(&[1.0], &[]), 0.0);
    }

    struct RecordingObserver {
        reports: Mutex<Vec<SimilarityReport>>,
    }

    impl SimilarityObserver for RecordingObserver {
        fn record(&self, report: &SimilarityReport) {
            self.reports.lock().unwrap().push(report.clone());
        }
    }

    fn matches() -> Vec<ChunkMatch> {
        vec![
            ChunkMatch {
                chunk_id: 1,
                document_id: 1,
                text: "closest".to_string(),
                vector: vec![1.0, 0.0],
                collection_name: None,
                distance: 0.1,
            },
            ChunkMatch {
                chunk_id: 2,
                document_id: 1,
                text: "farther".to_string(),
                vector: vec![0.0, 1.0],
                collection_name: None,
                distance: 0.9,
            },
        ]
    }

    #[test]
    fn rank_preserves_store_order_and_reports_metrics() {
        let observer = Arc::new(RecordingObserver {
            reports: Mutex::new(Vec::new()),
        });
        let ranker = SimilarityRanker::new(observer.clone());

        let response = ranker.rank(&[1.0, 0.0], matches(), "model", "1", "test", false);

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].chunk_id, 1);
        assert_eq!(response.results[1].chunk_id, 2);
        assert!(response.results[0].distance < response.results[1].distance);

        let reports = observer.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].cosine_similarities.len(), 2);
        assert!((reports[0].mean_cosine_similarity - 0.5).abs() < 1e-6);
    }
}
