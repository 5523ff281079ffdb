use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, Select as DynamoSelect};
use aws_sdk_dynamodb::Client;
use base64::Engine;
use serde_json::{Number, Value};

use super::store::{Item, KeyValueStore, Page, QueryRequest, ScanRequest, Select, StoreError};

type AttributeMap = HashMap<String, AttributeValue>;

/// Key-value store backed by DynamoDB
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

fn backend_error<E: std::error::Error>(operation: &str, table: &str, err: E) -> StoreError {
    let message = DisplayErrorContext(&err).to_string();
    tracing::error!("DynamoDB {} on {} failed: {}", operation, table, message);
    StoreError::Backend(message)
}

/// JSON value to DynamoDB attribute
pub fn to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => AttributeValue::L(items.into_iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(to_attribute_map(map)),
    }
}

pub fn to_attribute_map(item: Item) -> AttributeMap {
    item.into_iter().map(|(k, v)| (k, to_attribute(v))).collect()
}

fn parse_number(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// DynamoDB attribute to JSON value
pub fn from_attribute(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.iter().map(from_attribute).collect()),
        AttributeValue::M(map) => Value::Object(from_attribute_map(map)),
        AttributeValue::Ss(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(items.iter().map(|n| parse_number(n)).collect()),
        AttributeValue::B(blob) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(blob.as_ref()))
        }
        _ => Value::Null,
    }
}

pub fn from_attribute_map(map: &AttributeMap) -> Item {
    map.iter().map(|(k, v)| (k.clone(), from_attribute(v))).collect()
}

/// Placeholder names for a projection, e.g. "#p0, #p1"
fn projection(attrs: &[String]) -> (String, HashMap<String, String>) {
    let names: HashMap<String, String> = attrs
        .iter()
        .enumerate()
        .map(|(i, a)| (format!("#p{}", i), a.clone()))
        .collect();
    let expr = (0..attrs.len()).map(|i| format!("#p{}", i)).collect::<Vec<_>>().join(", ");
    (expr, names)
}

/// Build "SET #f0 = :v0 REMOVE #f1" with its placeholder maps
fn update_expression(changes: Item) -> (String, HashMap<String, String>, AttributeMap) {
    let mut sets = Vec::new();
    let mut removes = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (i, (field, value)) in changes.into_iter().enumerate() {
        let name = format!("#f{}", i);
        names.insert(name.clone(), field);
        if value.is_null() {
            removes.push(name);
        } else {
            let placeholder = format!(":v{}", i);
            sets.push(format!("{} = {}", name, placeholder));
            values.insert(placeholder, to_attribute(value));
        }
    }

    let mut clauses = Vec::new();
    if !sets.is_empty() {
        clauses.push(format!("SET {}", sets.join(", ")));
    }
    if !removes.is_empty() {
        clauses.push(format!("REMOVE {}", removes.join(", ")));
    }
    (clauses.join(" "), names, values)
}

fn into_page(items: &[AttributeMap], count: i32, last_key: Option<&AttributeMap>) -> Page {
    Page {
        items: items.iter().map(from_attribute_map).collect(),
        count: count.max(0) as usize,
        last_key: last_key.filter(|k| !k.is_empty()).map(from_attribute_map),
    }
}

#[async_trait]
impl KeyValueStore for DynamoStore {
    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, StoreError> {
        let out = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(to_attribute_map(key)))
            .send()
            .await
            .map_err(|e| backend_error("GetItem", table, e))?;
        Ok(out.item().map(from_attribute_map))
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_attribute_map(item)))
            .send()
            .await
            .map_err(|e| backend_error("PutItem", table, e))?;
        Ok(())
    }

    async fn update_item(&self, table: &str, key: Item, changes: Item) -> Result<Item, StoreError> {
        if changes.is_empty() {
            return self
                .get_item(table, key)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("item in {}", table)));
        }

        let (expression, names, values) = update_expression(changes);
        let out = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(to_attribute_map(key)))
            .update_expression(expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(if values.is_empty() { None } else { Some(values) })
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| backend_error("UpdateItem", table, e))?;

        out.attributes()
            .map(from_attribute_map)
            .ok_or_else(|| StoreError::Backend(format!("UpdateItem on {} returned no attributes", table)))
    }

    async fn delete_item(&self, table: &str, key: Item) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(to_attribute_map(key)))
            .send()
            .await
            .map_err(|e| backend_error("DeleteItem", table, e))?;
        Ok(())
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Page, StoreError> {
        let mut builder = self
            .client
            .scan()
            .table_name(&request.table)
            .set_exclusive_start_key(request.start_key.clone().map(to_attribute_map));

        builder = match &request.select {
            Select::AllAttributes => builder,
            Select::Attributes(attrs) => {
                let (expr, names) = projection(attrs);
                builder
                    .projection_expression(expr)
                    .set_expression_attribute_names(Some(names))
            }
            Select::Count => builder.select(DynamoSelect::Count),
        };

        let out = builder
            .send()
            .await
            .map_err(|e| backend_error("Scan", &request.table, e))?;
        Ok(into_page(out.items(), out.count(), out.last_evaluated_key()))
    }

    async fn query(&self, request: &QueryRequest) -> Result<Page, StoreError> {
        let mut names = HashMap::from([("#k".to_string(), request.key_attribute.clone())]);
        let mut builder = self
            .client
            .query()
            .table_name(&request.table)
            .set_index_name(request.index.clone())
            .key_condition_expression("#k = :k")
            .expression_attribute_values(":k", to_attribute(request.key_value.clone()))
            .set_exclusive_start_key(request.start_key.clone().map(to_attribute_map));

        builder = match &request.select {
            Select::AllAttributes => builder,
            Select::Attributes(attrs) => {
                let (expr, projected) = projection(attrs);
                names.extend(projected);
                builder.projection_expression(expr)
            }
            Select::Count => builder.select(DynamoSelect::Count),
        };

        let out = builder
            .set_expression_attribute_names(Some(names))
            .send()
            .await
            .map_err(|e| backend_error("Query", &request.table, e))?;
        Ok(into_page(out.items(), out.count(), out.last_evaluated_key()))
    }
}
