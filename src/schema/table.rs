// ABOUTME: Table, unique index, and reference definitions
// ABOUTME: Describes the exportable shape of one database table

use crate::error::Result;
use crate::overrides::RowTransform;
use crate::schema::Row;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reserved name for unique indexes asserted by an override rather than the schema.
pub const VIRTUAL_INDEX_NAME: &str = "virtual_main_unique_index";

/// A unique index, real or virtual, over an ordered list of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueIndex {
    pub name: String,
    pub columns: Vec<String>,
}

impl UniqueIndex {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.name == VIRTUAL_INDEX_NAME
    }
}

/// One outgoing foreign-key edge
///
/// `column_mapping` maps a column of the owning table to the matching column
/// of `table_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub table_name: String,
    pub column_mapping: BTreeMap<String, String>,
}

impl Reference {
    pub fn new<I, K, V>(table_name: impl Into<String>, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            column_mapping: mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Exportable shape of one database table
///
/// Built by introspection, corrected once by
/// [`apply_overrides`](crate::overrides::apply_overrides), then read by the
/// dependency-graph builder and the row exporter for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Sequence generating primary-key values. `None` keeps whatever
    /// introspection found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_sequence: Option<String>,
    #[serde(default)]
    pub unique_indexes: BTreeMap<String, UniqueIndex>,
    /// Identity key used to match incoming rows against the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_unique_index_name: Option<String>,
    #[serde(default)]
    pub unexport_columns: BTreeSet<String>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_mod_callback: Option<RowTransform>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            pk_sequence: None,
            unique_indexes: BTreeMap::new(),
            main_unique_index_name: None,
            unexport_columns: BTreeSet::new(),
            references: Vec::new(),
            row_mod_callback: None,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unique_index(mut self, index: UniqueIndex) -> Self {
        self.unique_indexes.insert(index.name.clone(), index);
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// The unique index currently designated as identity key, if any
    pub fn main_unique_index(&self) -> Option<&UniqueIndex> {
        self.main_unique_index_name
            .as_deref()
            .and_then(|name| self.unique_indexes.get(name))
    }

    /// True when the identity key is asserted by an override, not the schema
    pub fn has_virtual_identity_key(&self) -> bool {
        self.main_unique_index().is_some_and(UniqueIndex::is_virtual)
    }

    /// Columns handed to serialization, in table order
    pub fn exported_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !self.unexport_columns.contains(c.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Prepare one row for serialization
    ///
    /// Runs the installed row transform (if any) and then drops every column
    /// listed in `unexport_columns`.
    ///
    /// # Errors
    ///
    /// Propagates the transform's error when the row lacks a column the
    /// transform needs.
    pub fn export_row(&self, row: Row) -> Result<Row> {
        let row = match &self.row_mod_callback {
            Some(transform) => transform.apply(row, self)?,
            None => row,
        };
        Ok(row.without_columns(&self.unexport_columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RowColumn, Value};

    fn image_table() -> Table {
        Table::new("suseimageinfo")
            .with_columns(["id", "name", "log", "build_action_id"])
            .with_unique_index(UniqueIndex::new("suse_imginfo_id_pk", ["id"]))
    }

    #[test]
    fn test_exported_columns_skip_unexported() {
        let mut table = image_table();
        table.unexport_columns.insert("log".to_string());
        table.unexport_columns.insert("build_action_id".to_string());

        assert_eq!(table.exported_columns(), vec!["id", "name"]);
    }

    #[test]
    fn test_export_row_drops_unexported_columns() {
        let mut table = image_table();
        table.unexport_columns.insert("log".to_string());

        let row = Row::new(vec![
            RowColumn::new("id", Value::Integer(7)),
            RowColumn::new("log", Value::Text("/var/log/build.log".to_string())),
            RowColumn::new("name", Value::Text("sles15".to_string())),
        ]);

        let exported = table.export_row(row).unwrap();
        assert_eq!(exported.column_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_main_unique_index_lookup() {
        let mut table = image_table();
        assert!(table.main_unique_index().is_none());

        table.main_unique_index_name = Some("suse_imginfo_id_pk".to_string());
        assert_eq!(table.main_unique_index().unwrap().columns, vec!["id"]);
        assert!(!table.has_virtual_identity_key());
    }

    #[test]
    fn test_table_json_defaults() {
        let table: Table = serde_json::from_str(r#"{"name": "rhnchecksum"}"#).unwrap();
        assert_eq!(table, Table::new("rhnchecksum"));
    }
}
