// ABOUTME: Override rule describing the corrections applied to one table
// ABOUTME: Sequence, identity key, unexported columns, reference rewrite, row transform

use crate::overrides::{is_surrogate_key, select_main_unique_index, RowTransform};
use crate::schema::{Reference, Table, UniqueIndex, VIRTUAL_INDEX_NAME};
use std::collections::{BTreeMap, BTreeSet};

/// How an override designates the identity key of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKey {
    /// Assert that these columns are jointly unique and use them as identity key
    Virtual(Vec<String>),
    /// Use this existing real index as identity key
    Pinned(String),
}

/// Append columns to a real unique index of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExtension {
    pub index: String,
    pub columns: Vec<String>,
}

/// Replace edges to a non-portable table with one edge to a portable one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRewrite {
    pub from_table: String,
    pub to_table: String,
    pub column_mapping: BTreeMap<String, String>,
}

impl ReferenceRewrite {
    pub fn replacement(&self) -> Reference {
        Reference {
            table_name: self.to_table.clone(),
            column_mapping: self.column_mapping.clone(),
        }
    }

    /// Rewrite a reference list
    ///
    /// The first edge to `from_table` is replaced in place; further edges to
    /// it are dropped, as is the replacement if an identical edge already
    /// exists. Every other edge passes through in order.
    pub fn apply(&self, references: Vec<Reference>) -> Vec<Reference> {
        if !references.iter().any(|r| r.table_name == self.from_table) {
            return references;
        }

        let replacement = self.replacement();
        let mut emitted = references.contains(&replacement);
        let mut rewritten = Vec::with_capacity(references.len());
        for reference in references {
            if reference.table_name != self.from_table {
                rewritten.push(reference);
            } else if !emitted {
                rewritten.push(replacement.clone());
                emitted = true;
            }
        }
        rewritten
    }
}

/// Corrections for one table
///
/// Each effect is optional and applied at most once. Every effect re-sets its
/// target field instead of appending to it, so applying a rule twice gives
/// the same table as applying it once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideRule {
    pub pk_sequence: Option<String>,
    pub identity_key: Option<IdentityKey>,
    pub unexport_columns: Option<BTreeSet<String>>,
    pub index_extensions: Vec<IndexExtension>,
    pub reference_rewrite: Option<ReferenceRewrite>,
    pub row_transform: Option<RowTransform>,
}

impl OverrideRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence(mut self, name: &str) -> Self {
        self.pk_sequence = Some(name.to_string());
        self
    }

    pub fn virtual_index(mut self, columns: &[&str]) -> Self {
        self.identity_key = Some(IdentityKey::Virtual(to_strings(columns)));
        self
    }

    pub fn pinned_index(mut self, index: &str) -> Self {
        self.identity_key = Some(IdentityKey::Pinned(index.to_string()));
        self
    }

    pub fn unexport(mut self, columns: &[&str]) -> Self {
        self.unexport_columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn extend_index(mut self, index: &str, columns: &[&str]) -> Self {
        self.index_extensions.push(IndexExtension {
            index: index.to_string(),
            columns: to_strings(columns),
        });
        self
    }

    pub fn retarget(
        mut self,
        from_table: &str,
        to_table: &str,
        mapping: &[(&str, &str)],
    ) -> Self {
        self.reference_rewrite = Some(ReferenceRewrite {
            from_table: from_table.to_string(),
            to_table: to_table.to_string(),
            column_mapping: mapping
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self
    }

    pub fn transform(mut self, transform: RowTransform) -> Self {
        self.row_transform = Some(transform);
        self
    }

    /// Apply every effect of this rule to `table`
    pub fn apply(&self, mut table: Table) -> Table {
        if let Some(sequence) = &self.pk_sequence {
            table.pk_sequence = Some(sequence.clone());
        }

        for extension in &self.index_extensions {
            match table.unique_indexes.get_mut(&extension.index) {
                Some(index) => {
                    for column in &extension.columns {
                        if !index.columns.contains(column) {
                            index.columns.push(column.clone());
                        }
                    }
                }
                None => tracing::warn!(
                    "Table '{}' has no unique index '{}' to extend",
                    table.name,
                    extension.index
                ),
            }
        }

        match &self.identity_key {
            Some(IdentityKey::Virtual(columns)) => {
                table.unique_indexes.insert(
                    VIRTUAL_INDEX_NAME.to_string(),
                    UniqueIndex::new(VIRTUAL_INDEX_NAME, columns.iter().cloned()),
                );
                table.main_unique_index_name = Some(VIRTUAL_INDEX_NAME.to_string());
            }
            Some(IdentityKey::Pinned(index)) => {
                let current_is_valid = table
                    .main_unique_index_name
                    .as_ref()
                    .and_then(|name| table.unique_indexes.get(name))
                    .is_some_and(|current| !is_surrogate_key(current));
                if table.unique_indexes.contains_key(index) {
                    table.main_unique_index_name = Some(index.clone());
                } else if current_is_valid {
                    tracing::warn!(
                        "Table '{}' has no unique index '{}', keeping {:?} as identity key",
                        table.name,
                        index,
                        table.main_unique_index_name
                    );
                } else {
                    let fallback = select_main_unique_index(&table);
                    tracing::warn!(
                        "Table '{}' has no unique index '{}', using {:?} as identity key",
                        table.name,
                        index,
                        fallback
                    );
                    table.main_unique_index_name = fallback;
                }
            }
            None => {}
        }

        if let Some(columns) = &self.unexport_columns {
            table.unexport_columns = columns.clone();
        }

        if let Some(rewrite) = &self.reference_rewrite {
            let references = std::mem::take(&mut table.references);
            table.references = rewrite.apply(references);
        }

        if let Some(transform) = self.row_transform {
            table.row_mod_callback = Some(transform);
        }

        table
    }

    /// Every table column this rule reads or writes
    pub fn referenced_columns(&self) -> BTreeSet<&str> {
        let mut columns = BTreeSet::new();
        if let Some(IdentityKey::Virtual(index_columns)) = &self.identity_key {
            columns.extend(index_columns.iter().map(String::as_str));
        }
        if let Some(unexported) = &self.unexport_columns {
            columns.extend(unexported.iter().map(String::as_str));
        }
        for extension in &self.index_extensions {
            columns.extend(extension.columns.iter().map(String::as_str));
        }
        if let Some(rewrite) = &self.reference_rewrite {
            columns.extend(rewrite.column_mapping.keys().map(String::as_str));
        }
        if let Some(transform) = &self.row_transform {
            columns.extend(transform.required_columns().iter().copied());
        }
        columns
    }

    /// Short human-readable list of the effects, for listings
    pub fn describe(&self) -> Vec<String> {
        let mut effects = Vec::new();
        if let Some(sequence) = &self.pk_sequence {
            effects.push(format!("sequence {}", sequence));
        }
        match &self.identity_key {
            Some(IdentityKey::Virtual(columns)) => {
                effects.push(format!("virtual index ({})", columns.join(", ")))
            }
            Some(IdentityKey::Pinned(index)) => effects.push(format!("identity key {}", index)),
            None => {}
        }
        for extension in &self.index_extensions {
            effects.push(format!(
                "extend {} with ({})",
                extension.index,
                extension.columns.join(", ")
            ));
        }
        if let Some(columns) = &self.unexport_columns {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            effects.push(format!("unexport ({})", columns.join(", ")));
        }
        if let Some(rewrite) = &self.reference_rewrite {
            effects.push(format!(
                "reference {} -> {}",
                rewrite.from_table, rewrite.to_table
            ));
        }
        if let Some(transform) = &self.row_transform {
            effects.push(format!("row transform {}", transform.name()));
        }
        effects
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
