use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata attached to a resource right after it is uploaded or replaced.
///
/// Only `title` and `description` come from the caller; the other fields are
/// the fixed defaults for a main CSV file resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub description: String,
    pub filetype: String,
    /// Always sent, as `null` when unset.
    pub schema: Option<Value>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResourceMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            filetype: "file".to_string(),
            schema: None,
            title: title.into(),
            kind: "main".to_string(),
        }
    }
}

/// Reads the resource id out of an upload/replace response.
///
/// The endpoint answers with the created resource object; some deployments
/// wrap it in a one-element list.
pub(crate) fn resource_id(response: &Value) -> Option<&str> {
    match response {
        Value::Object(map) => map.get("id").and_then(Value::as_str),
        Value::Array(items) => items.first().and_then(resource_id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_serialize_with_null_schema() {
        let meta = ResourceMetadata::new("report.csv", "Monthly report");
        assert_eq!(
            serde_json::to_value(&meta).unwrap(),
            json!({
                "description": "Monthly report",
                "filetype": "file",
                "schema": null,
                "title": "report.csv",
                "type": "main"
            })
        );
    }

    #[test]
    fn finds_id_in_object_or_list() {
        assert_eq!(resource_id(&json!({"id": "r1", "title": "x"})), Some("r1"));
        assert_eq!(resource_id(&json!([{"id": "r2"}])), Some("r2"));
        assert_eq!(resource_id(&json!({"id": 3})), None);
        assert_eq!(resource_id(&json!([])), None);
        assert_eq!(resource_id(&Value::Null), None);
    }
}
