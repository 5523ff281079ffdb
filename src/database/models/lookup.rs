use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only reference record (class, race, group, aura)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LookupEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// Resolve ids to display names by exact id match, keeping the raw id when
/// the reference is stale.
pub fn resolve_names(ids: &[String], table: &[LookupEntity]) -> Vec<String> {
    ids.iter()
        .map(|id| {
            table
                .iter()
                .find(|entity| &entity.id == id)
                .map(|entity| entity.name.clone())
                .unwrap_or_else(|| id.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_fall_back_to_raw_id() {
        let classes = vec![LookupEntity::new("c1", "Wizard")];
        let names = resolve_names(&["c1".to_string(), "c9".to_string()], &classes);
        assert_eq!(names, vec!["Wizard", "c9"]);
    }
}
