// ABOUTME: Exported row representation with typed column values
// ABOUTME: Each column carries its live value and its schema-declared initial value

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

/// Dynamically typed column value
///
/// Binary payloads are carried as raw bytes and serialized as base64 text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    /// Decimal kept as text to avoid precision loss
    Numeric(String),
    Boolean(bool),
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
    Timestamp(String),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One column of an exported row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowColumn {
    pub name: String,
    pub value: Value,
    /// Value the schema declares for a freshly created record
    #[serde(default)]
    initial_value: Value,
}

impl RowColumn {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            initial_value: Value::Null,
        }
    }

    pub fn with_initial_value(mut self, initial_value: Value) -> Self {
        self.initial_value = initial_value;
        self
    }

    pub fn initial_value(&self) -> &Value {
        &self.initial_value
    }
}

/// An ordered list of columns making up one exported record
///
/// Column order is whatever the reader produced; lookups scan by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: Vec<RowColumn>,
}

impl Row {
    pub fn new(columns: Vec<RowColumn>) -> Self {
        Self { columns }
    }

    /// Position of the first column named `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&RowColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RowColumn> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Drop every column whose name is in `excluded`, keeping order
    pub fn without_columns(mut self, excluded: &BTreeSet<String>) -> Self {
        if !excluded.is_empty() {
            self.columns.retain(|c| !excluded.contains(&c.name));
        }
        self
    }
}

mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
