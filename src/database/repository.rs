use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::database::store::{Item, KeyValueStore, Page, QueryRequest, ScanRequest, Select, StoreError};

/// Typed access to one table. Every multi-page read walks `last_key` sequentially.
pub struct Repository<T> {
    table_name: String,
    store: Arc<dyn KeyValueStore>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            table_name: self.table_name.clone(),
            store: self.store.clone(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(table_name: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            table_name: table_name.into(),
            store,
            _phantom: std::marker::PhantomData,
        }
    }

    fn logged(&self, operation: &str, err: StoreError) -> StoreError {
        tracing::error!("{} on table {} failed: {}", operation, self.table_name, err);
        err
    }

    fn decode<R: DeserializeOwned>(&self, item: Item) -> Result<R, StoreError> {
        serde_json::from_value(Value::Object(item)).map_err(|e| self.logged("decode", e.into()))
    }

    pub async fn select_one(&self, key: Item) -> Result<Option<T>, StoreError> {
        let item = self
            .store
            .get_item(&self.table_name, key)
            .await
            .map_err(|e| self.logged("get", e))?;
        item.map(|i| self.decode(i)).transpose()
    }

    /// Full scan across all pages
    pub async fn select_all(&self) -> Result<Vec<T>, StoreError> {
        self.scan_pages(Select::AllAttributes).await
    }

    /// Full scan returning only the named attributes, decoded as `P`
    pub async fn select_projected<P: DeserializeOwned>(&self, attributes: &[&str]) -> Result<Vec<P>, StoreError> {
        let select = Select::Attributes(attributes.iter().map(|a| a.to_string()).collect());
        self.scan_pages(select).await
    }

    async fn scan_pages<R: DeserializeOwned>(&self, select: Select) -> Result<Vec<R>, StoreError> {
        let mut request = ScanRequest {
            table: self.table_name.clone(),
            select,
            start_key: None,
        };
        let mut rows = Vec::new();
        loop {
            let page = self.store.scan(&request).await.map_err(|e| self.logged("scan", e))?;
            for item in page.items {
                rows.push(self.decode(item)?);
            }
            match page.last_key {
                Some(key) => request.start_key = Some(key),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Equality query on a partition (or index) key across all pages
    pub async fn query_all(&self, index: Option<&str>, attribute: &str, value: &str) -> Result<Vec<T>, StoreError> {
        let mut rows = Vec::new();
        let mut request = self.query_request(index, attribute, value, Select::AllAttributes);
        loop {
            let page = self.query_page(&request).await?;
            for item in page.items {
                rows.push(self.decode(item)?);
            }
            match page.last_key {
                Some(key) => request.start_key = Some(key),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Count of matching items across all pages
    pub async fn count(&self, index: Option<&str>, attribute: &str, value: &str) -> Result<usize, StoreError> {
        let mut total = 0;
        let mut request = self.query_request(index, attribute, value, Select::Count);
        loop {
            let page = self.query_page(&request).await?;
            total += page.count;
            match page.last_key {
                Some(key) => request.start_key = Some(key),
                None => break,
            }
        }
        Ok(total)
    }

    fn query_request(&self, index: Option<&str>, attribute: &str, value: &str, select: Select) -> QueryRequest {
        QueryRequest {
            table: self.table_name.clone(),
            index: index.map(str::to_string),
            key_attribute: attribute.to_string(),
            key_value: Value::String(value.to_string()),
            select,
            start_key: None,
        }
    }

    async fn query_page(&self, request: &QueryRequest) -> Result<Page, StoreError> {
        self.store.query(request).await.map_err(|e| self.logged("query", e))
    }

    pub async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let item = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            _ => return Err(StoreError::InvalidItem("record must serialize to an object".into())),
        };
        self.store
            .put_item(&self.table_name, item)
            .await
            .map_err(|e| self.logged("put", e))
    }

    /// Sparse field-by-field update; returns the record after the write
    pub async fn update(&self, key: Item, changes: Item) -> Result<T, StoreError> {
        let item = self
            .store
            .update_item(&self.table_name, key, changes)
            .await
            .map_err(|e| self.logged("update", e))?;
        self.decode(item)
    }

    pub async fn delete(&self, key: Item) -> Result<(), StoreError> {
        self.store
            .delete_item(&self.table_name, key)
            .await
            .map_err(|e| self.logged("delete", e))
    }
}
