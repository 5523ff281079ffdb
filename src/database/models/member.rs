use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Attributes returned by the roster listing
pub const SUMMARY_ATTRIBUTES: [&str; 6] = ["id", "name", "born", "died", "image", "groups"];

/// A roster member (player character)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pseudonym: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub biography: String,
    /// Key of the owner index; absent rather than empty
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub religion: String,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub born: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub died: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub hp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub races: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub colour_hex: Option<String>,
    #[serde(default)]
    pub caster_colour: Option<String>,
    #[serde(default)]
    pub tower_id: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub deleted: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn is_deleted(&self) -> bool {
        self.deleted != 0
    }
}

/// Projection used by the full listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub born: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub died: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Sanitized create input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMember {
    pub name: String,
    pub pseudonym: String,
    pub title: String,
    pub biography: String,
    pub owner: Option<String>,
    pub religion: String,
    pub born: Option<i64>,
    pub died: Option<i64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub hp: Option<i64>,
    pub level: Option<i64>,
    pub classes: Vec<String>,
    pub races: Vec<String>,
    pub groups: Vec<String>,
    pub colour_hex: Option<String>,
    pub caster_colour: Option<String>,
    pub tower_id: Option<String>,
    pub deleted: u8,
}

impl NewMember {
    pub fn into_member(self, id: String, image: Option<String>, now: DateTime<Utc>) -> Member {
        Member {
            id,
            name: self.name,
            pseudonym: self.pseudonym,
            title: self.title,
            biography: self.biography,
            owner: self.owner,
            religion: self.religion,
            born: self.born,
            died: self.died,
            height: self.height,
            weight: self.weight,
            hp: self.hp,
            level: self.level,
            classes: self.classes,
            races: self.races,
            groups: self.groups,
            colour_hex: self.colour_hex,
            caster_colour: self.caster_colour,
            tower_id: self.tower_id,
            deleted: self.deleted,
            image,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Sanitized update input. Outer `None` means "not provided"; for nullable
/// fields an inner `None` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pseudonym: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub born: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub died: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub races: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour_hex: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caster_colour: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tower_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MemberPatch {
    /// Only the fields that were provided, as attribute assignments
    pub fn changes(&self) -> serde_json::Result<serde_json::Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes().map(|c| c.is_empty()).unwrap_or(true)
    }
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from).map(|n| n as i64))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from))
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn flag<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value.as_ref().and_then(number_from) {
        Some(n) if n != 0.0 => 1,
        _ => 0,
    })
}
