use serde::Serialize;
use serde_json::{Map, Value};

use crate::severity::Severity;

/// A fully enriched log call, ready to be serialized into the line payload.
///
/// Only `origin`, `attributes` (as `properties`) and `extra` make it into
/// the JSON envelope; `tag` travels as the line's progname and `severity`
/// drives filtering and formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub origin: Option<String>,
    #[serde(rename = "properties")]
    pub attributes: Map<String, Value>,
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub tag: String,
    #[serde(skip)]
    pub severity: Severity,
}

impl LogRecord {
    /// Render the `{"origin", "properties", "extra"}` envelope.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_keeps_field_order_and_skips_tag() {
        let mut attributes = Map::new();
        attributes.insert("user_id".into(), json!(42));
        attributes.insert("distinct_id".into(), json!(42));
        let mut extra = Map::new();
        extra.insert("msg".into(), json!("login"));

        let record = LogRecord {
            origin: Some("api".into()),
            attributes,
            extra,
            tag: "api_login".into(),
            severity: Severity::Info,
        };

        assert_eq!(
            record.to_json(),
            r#"{"origin":"api","properties":{"user_id":42,"distinct_id":42},"extra":{"msg":"login"}}"#
        );
    }

    #[test]
    fn missing_origin_serializes_as_null() {
        let record = LogRecord {
            origin: None,
            attributes: Map::new(),
            extra: Map::new(),
            tag: "boot".into(),
            severity: Severity::Debug,
        };
        assert_eq!(record.to_json(), r#"{"origin":null,"properties":{},"extra":{}}"#);
    }
}
