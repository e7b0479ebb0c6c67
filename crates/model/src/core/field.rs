use serde::{Deserialize, Serialize};

/// A column as seen by a connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub pk: bool,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            pk: false,
        }
    }

    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            pk: true,
            ..Self::new(name)
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

/// Table description returned by `describe_table`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetaInfo {
    pub table: String,
    pub columns: Vec<Field>,
}

impl MetaInfo {
    pub fn primary_keys(&self) -> impl Iterator<Item = &Field> {
        self.columns.iter().filter(|c| c.pk)
    }
}
