use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// One stored item: attribute name to JSON value
pub type Item = Map<String, Value>;

/// Errors from a key-value store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// What a scan or query returns per item
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Select {
    #[default]
    AllAttributes,
    Attributes(Vec<String>),
    Count,
}

/// A single page of results; `last_key` is set when more pages follow
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub count: usize,
    pub last_key: Option<Item>,
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub table: String,
    pub select: Select,
    pub start_key: Option<Item>,
}

/// Equality query on a partition key, optionally through a secondary index
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    pub key_attribute: String,
    pub key_value: Value,
    pub select: Select,
    pub start_key: Option<Item>,
}

/// Managed key-value table operations used by the repositories
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, StoreError>;

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError>;

    /// Sparse update: each entry is SET, a `null` value REMOVEs the attribute.
    /// Returns the item as it is after the update.
    async fn update_item(&self, table: &str, key: Item, changes: Item) -> Result<Item, StoreError>;

    async fn delete_item(&self, table: &str, key: Item) -> Result<(), StoreError>;

    async fn scan(&self, request: &ScanRequest) -> Result<Page, StoreError>;

    async fn query(&self, request: &QueryRequest) -> Result<Page, StoreError>;
}

/// Build a single-attribute key
pub fn key_of(attribute: &str, value: impl Into<Value>) -> Item {
    let mut key = Item::new();
    key.insert(attribute.to_string(), value.into());
    key
}
