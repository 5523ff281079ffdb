use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;

use super::EmbeddingError;
use crate::config::EmbeddingConfig;

pub type Embedding = Vec<f32>;

/// External text embedding model
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;
}

/// OpenAI-compatible embeddings endpoint
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: u32,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(&config.base_url)
            .with_api_key(&config.api_key);

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            dimensions: config.dimensions,
        }
    }
}

/// Scale to unit length; a zero vector is returned unchanged
pub fn l2_normalize(mut vector: Embedding) -> Embedding {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
    vector
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        tracing::debug!("[OpenAiEmbedder::embed] {} chars with {}", text.chars().count(), self.model);

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text.to_string())
            .dimensions(self.dimensions)
            .build()
            .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".into()))?;

        if embedding.len() != self.dimensions as usize {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        Ok(l2_normalize(embedding))
    }
}
