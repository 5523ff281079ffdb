use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::EmbeddingError;
use crate::config::VectorConfig;

/// One vector with its metadata snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Value,
}

/// External managed vector index
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, record: VectorRecord) -> Result<(), EmbeddingError>;

    /// Remove a vector; deleting an absent id is not an error
    async fn delete(&self, id: &str) -> Result<(), EmbeddingError>;
}

/// REST vector index (`POST /upsert`, `POST /delete`, bearer token)
pub struct HttpVectorIndex {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpVectorIndex {
    pub fn new(config: &VectorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<(), EmbeddingError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::VectorIndex(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::VectorIndex(format!("{} returned {}: {}", path, status, detail)));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn upsert(&self, record: VectorRecord) -> Result<(), EmbeddingError> {
        self.post("upsert", json!([record])).await
    }

    async fn delete(&self, id: &str) -> Result<(), EmbeddingError> {
        self.post("delete", json!([id])).await
    }
}

/// In-process vector index for tests and dry runs
#[derive(Default)]
pub struct MemoryVectorIndex {
    records: Mutex<HashMap<String, VectorRecord>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<VectorRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, record: VectorRecord) -> Result<(), EmbeddingError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), EmbeddingError> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).remove(id);
        Ok(())
    }
}
