use serde_json::{Map, Value};

use crate::database::models::{MemberPatch, NewMember};

const DEFAULT_HP: i64 = 1;
const DEFAULT_LEVEL: i64 = 1;
const DEFAULT_WEIGHT: f64 = 0.0;

/// JavaScript-style truthiness of an untyped input value
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn nullable_text(value: &Value) -> Option<String> {
    Some(text(value)).filter(|s| !s.is_empty())
}

/// Numeric value only when the input is present and truthy, so a provided
/// `0` counts as absent and falls back to the create default.
fn truthy_number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).filter(|v| truthy(v)).and_then(parse_number)
}

fn str_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).map(text).unwrap_or_default()
}

fn as_object(input: &Value) -> Map<String, Value> {
    input.as_object().cloned().unwrap_or_default()
}

/// Coerce a create payload, applying defaults for omitted fields
pub fn sanitize_create(input: &Value) -> NewMember {
    let obj = as_object(input);

    NewMember {
        name: str_field(&obj, "name"),
        pseudonym: str_field(&obj, "pseudonym"),
        title: str_field(&obj, "title"),
        biography: str_field(&obj, "biography"),
        owner: obj.get("owner").and_then(nullable_text),
        religion: str_field(&obj, "religion"),
        born: truthy_number(&obj, "born").map(|n| n as i64),
        died: truthy_number(&obj, "died").map(|n| n as i64),
        height: truthy_number(&obj, "height"),
        weight: Some(truthy_number(&obj, "weight").unwrap_or(DEFAULT_WEIGHT)),
        hp: Some(truthy_number(&obj, "hp").map(|n| n as i64).unwrap_or(DEFAULT_HP)),
        level: Some(truthy_number(&obj, "level").map(|n| n as i64).unwrap_or(DEFAULT_LEVEL)),
        classes: obj.get("classes").map(string_list).unwrap_or_default(),
        races: obj.get("races").map(string_list).unwrap_or_default(),
        groups: obj.get("groups").map(string_list).unwrap_or_default(),
        colour_hex: obj.get("colour_hex").and_then(nullable_text),
        caster_colour: obj.get("caster_colour").and_then(nullable_text),
        tower_id: obj.get("tower_id").and_then(nullable_text),
        deleted: u8::from(obj.get("deleted").map_or(false, truthy)),
    }
}

/// Present numeric field: `null` clears it, a number (including 0) sets it,
/// anything unparseable leaves the stored value alone.
fn patch_number(obj: &Map<String, Value>, key: &str) -> Option<Option<f64>> {
    match obj.get(key)? {
        Value::Null => Some(None),
        other => parse_number(other).map(Some),
    }
}

fn patch_int(obj: &Map<String, Value>, key: &str) -> Option<Option<i64>> {
    patch_number(obj, key).map(|n| n.map(|f| f as i64))
}

/// Coerce an update payload; only keys present in the input are carried
pub fn sanitize_update(input: &Value) -> MemberPatch {
    let obj = as_object(input);

    MemberPatch {
        name: obj.get("name").map(text),
        pseudonym: obj.get("pseudonym").map(text),
        title: obj.get("title").map(text),
        biography: obj.get("biography").map(text),
        owner: obj.get("owner").map(nullable_text),
        religion: obj.get("religion").map(text),
        born: patch_int(&obj, "born"),
        died: patch_int(&obj, "died"),
        height: patch_number(&obj, "height"),
        weight: patch_number(&obj, "weight"),
        hp: patch_int(&obj, "hp"),
        level: patch_int(&obj, "level"),
        classes: obj.get("classes").map(string_list),
        races: obj.get("races").map(string_list),
        groups: obj.get("groups").map(string_list),
        colour_hex: obj.get("colour_hex").map(nullable_text),
        caster_colour: obj.get("caster_colour").map(nullable_text),
        tower_id: obj.get("tower_id").map(nullable_text),
        deleted: obj.get("deleted").map(|v| u8::from(truthy(v))),
        image: None,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_applies_defaults() {
        let m = sanitize_create(&json!({"name": "  Aldric ", "level": 5}));
        assert_eq!(m.name, "Aldric");
        assert_eq!(m.level, Some(5));
        assert_eq!(m.hp, Some(1));
        assert_eq!(m.weight, Some(0.0));
        assert_eq!(m.born, None);
        assert!(m.classes.is_empty());
        assert_eq!(m.colour_hex, None);
        assert_eq!(m.deleted, 0);
    }

    #[test]
    fn create_treats_zero_as_absent() {
        // Known quirk: an explicit 0 is falsy and is replaced by the default
        let m = sanitize_create(&json!({"name": "A", "hp": 0, "level": 0, "born": 0}));
        assert_eq!(m.hp, Some(1));
        assert_eq!(m.level, Some(1));
        assert_eq!(m.born, None);
    }

    #[test]
    fn create_parses_numeric_strings() {
        let m = sanitize_create(&json!({"name": "A", "hp": "12", "height": "1.75", "level": "x"}));
        assert_eq!(m.hp, Some(12));
        assert_eq!(m.height, Some(1.75));
        assert_eq!(m.level, Some(1));
    }

    #[test]
    fn non_array_lists_become_empty() {
        let m = sanitize_create(&json!({"name": "A", "classes": "c1", "races": [" r1 ", 7, null]}));
        assert!(m.classes.is_empty());
        assert_eq!(m.races, vec!["r1", "7"]);
    }

    #[test]
    fn update_carries_only_present_fields() {
        let patch = sanitize_update(&json!({"name": "Aldric"}));
        let changes = patch.changes().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["name"], "Aldric");
    }

    #[test]
    fn update_keeps_explicit_zero_and_null() {
        let patch = sanitize_update(&json!({"hp": 0, "died": null, "tower_id": null}));
        assert_eq!(patch.hp, Some(Some(0)));
        assert_eq!(patch.died, Some(None));
        assert_eq!(patch.tower_id, Some(None));
    }

    #[test]
    fn blank_owner_is_absent_on_create_and_cleared_on_update() {
        assert_eq!(sanitize_create(&json!({"name": "A", "owner": "  "})).owner, None);
        assert_eq!(sanitize_create(&json!({"name": "A", "owner": "alice"})).owner.as_deref(), Some("alice"));
        assert_eq!(sanitize_update(&json!({"owner": ""})).owner, Some(None));
        assert_eq!(sanitize_update(&json!({"owner": "bob"})).owner, Some(Some("bob".to_string())));
    }

    #[test]
    fn update_of_non_object_is_empty() {
        assert!(sanitize_update(&json!("nonsense")).is_empty());
        assert!(sanitize_update(&json!({})).is_empty());
    }
}
