use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::store::{Item, KeyValueStore, Page, QueryRequest, ScanRequest, Select, StoreError};

/// Key schema of one in-memory table
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl TableSchema {
    pub fn hash(partition_key: &str) -> Self {
        Self {
            partition_key: partition_key.to_string(),
            sort_key: None,
        }
    }

    pub fn composite(partition_key: &str, sort_key: &str) -> Self {
        Self {
            partition_key: partition_key.to_string(),
            sort_key: Some(sort_key.to_string()),
        }
    }
}

#[derive(Default)]
struct Table {
    schema: Option<TableSchema>,
    // Ordered by encoded key so pagination is deterministic
    rows: BTreeMap<String, Item>,
}

/// In-process key-value store with the same paging contract as the managed table.
/// Used for local development and tests.
pub struct MemoryStore {
    page_size: usize,
    tables: Mutex<HashMap<String, Table>>,
    // index name -> attribute the index is keyed on
    indexes: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            tables: Mutex::new(HashMap::new()),
            indexes: Mutex::new(HashMap::new()),
        }
    }

    pub fn create_table(&self, name: &str, schema: TableSchema) {
        let mut tables = self.lock_tables();
        tables.entry(name.to_string()).or_default().schema = Some(schema);
    }

    pub fn create_index(&self, index: &str, attribute: &str) {
        self.indexes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(index.to_string(), attribute.to_string());
    }

    /// Number of items currently held in a table
    pub fn len(&self, table: &str) -> usize {
        self.lock_tables().get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, HashMap<String, Table>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn schema_for(table: &Table, name: &str) -> Result<TableSchema, StoreError> {
        table
            .schema
            .clone()
            .ok_or_else(|| StoreError::Backend(format!("table {} has no key schema", name)))
    }

    fn row_key(schema: &TableSchema, item: &Item) -> Result<String, StoreError> {
        let part = item
            .get(&schema.partition_key)
            .ok_or_else(|| StoreError::InvalidItem(format!("missing key attribute {}", schema.partition_key)))?;
        let mut encoded = scalar_key(part);
        if let Some(sort) = &schema.sort_key {
            let sort_value = item
                .get(sort)
                .ok_or_else(|| StoreError::InvalidItem(format!("missing key attribute {}", sort)))?;
            encoded.push('\u{1f}');
            encoded.push_str(&scalar_key(sort_value));
        }
        Ok(encoded)
    }

    /// Index key attributes must not hold an empty string
    fn check_index_keys(&self, item: &Item) -> Result<(), StoreError> {
        let indexes = self.indexes.lock().unwrap_or_else(|e| e.into_inner());
        for (index, attribute) in indexes.iter() {
            if let Some(Value::String(s)) = item.get(attribute) {
                if s.is_empty() {
                    return Err(StoreError::InvalidItem(format!(
                        "index key attribute {} of {} must not be empty",
                        attribute, index
                    )));
                }
            }
        }
        Ok(())
    }

    fn key_item(schema: &TableSchema, item: &Item) -> Item {
        let mut key = Item::new();
        for attr in std::iter::once(&schema.partition_key).chain(schema.sort_key.iter()) {
            if let Some(v) = item.get(attr) {
                key.insert(attr.clone(), v.clone());
            }
        }
        key
    }

    /// Take one page from matching rows, starting after `start_key`
    fn page(
        &self,
        schema: &TableSchema,
        rows: Vec<(&String, &Item)>,
        select: &Select,
        start_key: Option<&Item>,
    ) -> Result<Page, StoreError> {
        let start = match start_key {
            Some(key) => Some(Self::row_key(schema, key)?),
            None => None,
        };

        let remaining: Vec<(&String, &Item)> = rows
            .into_iter()
            .filter(|(k, _)| start.as_ref().map_or(true, |s| k.as_str() > s.as_str()))
            .collect();

        let more = remaining.len() > self.page_size;
        let taken: Vec<&Item> = remaining.iter().take(self.page_size).map(|(_, item)| *item).collect();
        let last_key = match (more, taken.last()) {
            (true, Some(last)) => Some(Self::key_item(schema, last)),
            _ => None,
        };

        let items = match select {
            Select::AllAttributes => taken.iter().map(|item| (*item).clone()).collect(),
            Select::Attributes(attrs) => taken
                .iter()
                .map(|item| {
                    attrs
                        .iter()
                        .filter_map(|a| item.get(a).map(|v| (a.clone(), v.clone())))
                        .collect()
                })
                .collect(),
            Select::Count => Vec::new(),
        };

        Ok(Page {
            items,
            count: taken.len(),
            last_key,
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn scalar_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_key(n.as_f64().unwrap_or_default()),
        other => other.to_string(),
    }
}

/// Fixed-width hex of the float bits, arranged so byte order is numeric order
fn number_key(n: f64) -> String {
    let bits = n.to_bits();
    let ordered = if bits >> 63 == 1 { !bits } else { bits | (1 << 63) };
    format!("{:016x}", ordered)
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, StoreError> {
        let tables = self.lock_tables();
        let Some(t) = tables.get(table) else {
            return Ok(None);
        };
        let schema = Self::schema_for(t, table)?;
        let encoded = Self::row_key(&schema, &key)?;
        Ok(t.rows.get(&encoded).cloned())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let mut tables = self.lock_tables();
        let t = tables.entry(table.to_string()).or_default();
        let schema = Self::schema_for(t, table)?;
        let encoded = Self::row_key(&schema, &item)?;
        self.check_index_keys(&item)?;
        t.rows.insert(encoded, item);
        Ok(())
    }

    async fn update_item(&self, table: &str, key: Item, changes: Item) -> Result<Item, StoreError> {
        let mut tables = self.lock_tables();
        let t = tables.entry(table.to_string()).or_default();
        let schema = Self::schema_for(t, table)?;
        let encoded = Self::row_key(&schema, &key)?;

        // Like the managed table, an update on a missing key creates the item
        let mut row = t.rows.get(&encoded).cloned().unwrap_or_else(|| key.clone());
        for (field, value) in changes {
            if value.is_null() {
                row.remove(&field);
            } else {
                row.insert(field, value);
            }
        }
        self.check_index_keys(&row)?;
        t.rows.insert(encoded, row.clone());
        Ok(row)
    }

    async fn delete_item(&self, table: &str, key: Item) -> Result<(), StoreError> {
        let mut tables = self.lock_tables();
        if let Some(t) = tables.get_mut(table) {
            let schema = Self::schema_for(t, table)?;
            let encoded = Self::row_key(&schema, &key)?;
            t.rows.remove(&encoded);
        }
        Ok(())
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Page, StoreError> {
        let tables = self.lock_tables();
        let Some(t) = tables.get(&request.table) else {
            return Ok(Page::default());
        };
        let schema = Self::schema_for(t, &request.table)?;
        let rows: Vec<(&String, &Item)> = t.rows.iter().collect();
        self.page(&schema, rows, &request.select, request.start_key.as_ref())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Page, StoreError> {
        if let Some(index) = &request.index {
            let indexed = self.indexes.lock().unwrap_or_else(|e| e.into_inner()).get(index).cloned();
            if indexed.as_deref() != Some(request.key_attribute.as_str()) {
                return Err(StoreError::Backend(format!(
                    "index {} is not keyed on {}",
                    index, request.key_attribute
                )));
            }
        }

        let tables = self.lock_tables();
        let Some(t) = tables.get(&request.table) else {
            return Ok(Page::default());
        };
        let schema = Self::schema_for(t, &request.table)?;
        let rows: Vec<(&String, &Item)> = t
            .rows
            .iter()
            .filter(|(_, item)| item.get(&request.key_attribute) == Some(&request.key_value))
            .collect();
        self.page(&schema, rows, &request.select, request.start_key.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::key_of;
    use serde_json::json;

    fn item(v: Value) -> Item {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn scan_pages_until_exhausted() {
        let store = MemoryStore::with_page_size(2);
        store.create_table("t", TableSchema::hash("id"));
        for i in 0..5 {
            store.put_item("t", item(json!({"id": format!("m{}", i)}))).await.unwrap();
        }

        let mut request = ScanRequest {
            table: "t".into(),
            select: Select::AllAttributes,
            start_key: None,
        };
        let mut pages = 0;
        let mut seen = 0;
        loop {
            let page = store.scan(&request).await.unwrap();
            pages += 1;
            seen += page.items.len();
            match page.last_key {
                Some(k) => request.start_key = Some(k),
                None => break,
            }
        }
        assert_eq!(pages, 3);
        assert_eq!(seen, 5);
    }

    #[tokio::test]
    async fn update_sets_and_removes() {
        let store = MemoryStore::new();
        store.create_table("t", TableSchema::hash("id"));
        store
            .put_item("t", item(json!({"id": "a", "title": "Sir", "hp": 3})))
            .await
            .unwrap();

        let updated = store
            .update_item("t", key_of("id", "a"), item(json!({"name": "Aldric", "hp": null})))
            .await
            .unwrap();
        assert_eq!(updated["title"], "Sir");
        assert_eq!(updated["name"], "Aldric");
        assert!(updated.get("hp").is_none());
    }

    #[tokio::test]
    async fn composite_keys_order_by_sort_key() {
        let store = MemoryStore::new();
        store.create_table("s", TableSchema::composite("member_id", "report_id"));
        for r in ["r3", "r1", "r2"] {
            store
                .put_item("s", item(json!({"member_id": "m1", "report_id": r})))
                .await
                .unwrap();
        }
        store
            .put_item("s", item(json!({"member_id": "m2", "report_id": "r9"})))
            .await
            .unwrap();

        let page = store
            .query(&QueryRequest {
                table: "s".into(),
                index: None,
                key_attribute: "member_id".into(),
                key_value: json!("m1"),
                select: Select::AllAttributes,
                start_key: None,
            })
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|i| i["report_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[tokio::test]
    async fn numeric_sort_keys_order_numerically() {
        let store = MemoryStore::with_page_size(2);
        store.create_table("s", TableSchema::composite("member_id", "seq"));
        for seq in [json!(10), json!(-3), json!(2.5), json!(-0.5), json!(1), json!(-12)] {
            store
                .put_item("s", item(json!({"member_id": "m1", "seq": seq})))
                .await
                .unwrap();
        }

        let mut request = QueryRequest {
            table: "s".into(),
            index: None,
            key_attribute: "member_id".into(),
            key_value: json!("m1"),
            select: Select::AllAttributes,
            start_key: None,
        };
        let mut seqs = Vec::new();
        loop {
            let page = store.query(&request).await.unwrap();
            seqs.extend(page.items.iter().map(|i| i["seq"].as_f64().unwrap()));
            match page.last_key {
                Some(k) => request.start_key = Some(k),
                None => break,
            }
        }
        assert_eq!(seqs, vec![-12.0, -3.0, -0.5, 1.0, 2.5, 10.0]);
    }

    #[tokio::test]
    async fn empty_index_key_is_rejected() {
        let store = MemoryStore::new();
        store.create_table("t", TableSchema::hash("id"));
        store.create_index("owner-index", "owner");

        let err = store
            .put_item("t", item(json!({"id": "a", "owner": ""})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidItem(_)));
        assert!(store.is_empty("t"));

        store
            .put_item("t", item(json!({"id": "a", "owner": "alice"})))
            .await
            .unwrap();
        let err = store
            .update_item("t", key_of("id", "a"), item(json!({"owner": ""})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidItem(_)));

        let cleared = store
            .update_item("t", key_of("id", "a"), item(json!({"owner": null})))
            .await
            .unwrap();
        assert!(cleared.get("owner").is_none());
    }
}
