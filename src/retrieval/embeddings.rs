use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Model returned vector of dimension {got}, expected {expected}")]
    BadDimension { got: usize, expected: usize },
}

impl From<EmbeddingError> for crate::error::AppError {
    fn from(err: EmbeddingError) -> Self {
        crate::error::AppError::EmbeddingUnavailable(err.to_string())
    }
}

/// Gateway to the external embedding model. Implementations must be
/// deterministic for a fixed model version and must never hand back a
/// substitute vector on failure.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per input text, in input order.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Fixed dimensionality of every vector this provider produces.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;

    fn model_version(&self) -> &str {
        "1"
    }
}

/// OpenAI-compatible embedding provider (any endpoint speaking the
/// `/embeddings` API, selected via `OPENAI_API_BASE`).
pub struct OpenAIEmbeddings {
    client: Client<OpenAIConfig>,
    model: String,
    dimension: usize,
    max_retries: usize,
    /// Semaphore to limit concurrent requests
    semaphore: Arc<Semaphore>,
}

impl OpenAIEmbeddings {
    pub fn from_config(config: &Config) -> Result<Self, EmbeddingError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| EmbeddingError::ConfigError("OPENAI_API_KEY not set".to_string()))?;

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = &config.openai_api_base {
            openai_config = openai_config.with_api_base(base.clone());
        }

        info!(
            "Initialized embedding gateway: model={}, dimension={}, max_concurrent={}",
            config.embedding_model, config.embedding_dimension, config.embedding_max_concurrent
        );

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.embedding_model.clone(),
            dimension: config.embedding_dimension,
            max_retries: config.embedding_max_retries,
            semaphore: Arc::new(Semaphore::new(config.embedding_max_concurrent)),
        })
    }

    async fn request_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("Semaphore closed: {}", e)))?;

        debug!("Embedding batch of {} texts", texts.len());

        let request = CreateEmbeddingRequest {
            model: self.model.clone(),
            input: EmbeddingInput::StringArray(texts),
            encoding_format: None,
            user: None,
            dimensions: None,
        };

        let mut attempt = 0;
        loop {
            match self.client.embeddings().create(request.clone()).await {
                Ok(response) => {
                    let mut vectors = Vec::with_capacity(response.data.len());
                    for embedding_data in response.data {
                        let vector = embedding_data.embedding;
                        if vector.len() != self.dimension {
                            return Err(EmbeddingError::BadDimension {
                                got: vector.len(),
                                expected: self.dimension,
                            });
                        }
                        vectors.push(vector);
                    }
                    return Ok(vectors);
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Embedding request failed (attempt {}/{}): {}",
                        attempt, self.max_retries, e
                    );
                    tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
                }
                Err(e) => {
                    return Err(EmbeddingError::Unavailable(format!(
                        "Embedding API error: {}",
                        e
                    )))
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Batched to stay under API request limits; semantics are identical
        // to embedding one chunk at a time.
        let batch_size = 50;
        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            let vectors = self.request_batch(batch.to_vec()).await?;
            all_embeddings.extend(vectors);
        }

        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Deterministic embedder for tests: hashes each word into a fixed-size
    /// bag-of-words vector so that similar texts land close together.
    pub struct FakeEmbeddings {
        pub dimension: usize,
    }

    impl FakeEmbeddings {
        pub fn embed_one(&self, text: &str) -> Vec<f32> {
            let mut v = vec![0.0f32; self.dimension];
            for word in text.split_whitespace() {
                let mut h: usize = 5381;
                for b in word.bytes() {
                    h = h.wrapping_mul(33) ^ b as usize;
                }
                v[h % self.dimension] += 1.0;
            }
            v
        }
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for FakeEmbeddings {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| self.embed_one(t)).collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "fake-embeddings"
        }

        fn model_version(&self) -> &str {
            "test"
        }
    }

    #[tokio::test]
    async fn fake_embeddings_are_deterministic() {
        let fake = FakeEmbeddings { dimension: 16 };
        let a = fake.embed(vec!["hello world".to_string()]).await.unwrap();
        let b = fake.embed(vec!["hello world".to_string()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 16);
    }
}
