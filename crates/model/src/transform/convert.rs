use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a conversion rule does to its field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConvertKind {
    /// Fill the field when it is missing or null.
    Default { value: serde_json::Value },
    /// Null the field out.
    Clear,
    Replace { from: String, to: String },
    Upper,
    Lower,
    Trim,
    Prepend { value: String },
    Append { value: String },
    ToString,
    ToInt,
    ToFloat,
    ToBool,
    /// Render a date/timestamp (or a parseable string) with a chrono format.
    DateFormat { format: String },
    /// Rename enumerated values; unknown values are left as they are.
    MapValues { values: BTreeMap<String, String> },
    /// Assign a fresh v4 UUID.
    Uuid,
    /// Assign the current UTC time.
    Timestamp,
}

/// A declarative value conversion applied to one target field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRule {
    /// Target field the rule applies to.
    pub name: String,
    #[serde(flatten)]
    pub kind: ConvertKind,
    /// Value used when the conversion fails. Absent means drop the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub fail_fast: bool,
}

impl ConvertRule {
    pub fn new(name: impl Into<String>, kind: ConvertKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            fail_fast: false,
        }
    }

    pub fn or_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    pub fn default_value(&self) -> Option<Value> {
        self.default.clone().map(Value::from_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_json_is_flat() {
        let rule: ConvertRule = serde_json::from_str(
            r#"{"name":"status","kind":"map_values","values":{"1":"active"},"failFast":true}"#,
        )
        .unwrap();
        assert!(rule.fail_fast);
        match rule.kind {
            ConvertKind::MapValues { values } => assert_eq!(values["1"], "active"),
            other => panic!("unexpected kind {other:?}"),
        }

        let rule: ConvertRule = serde_json::from_str(r#"{"name":"email","kind":"lower"}"#).unwrap();
        assert_eq!(rule.kind, ConvertKind::Lower);
        assert_eq!(rule.default_value(), None);
    }
}
