use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Externally produced activity record, keyed by (member_id, report_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub member_id: String,
    pub report_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
