// ABOUTME: Table override layer applied between introspection and export
// ABOUTME: Exports the registry, rules, row transforms, and the application entry point

pub mod config;
pub mod registry;
pub mod rule;
pub mod transform;

pub use config::OverridesConfig;
pub use registry::Registry;
pub use rule::{IdentityKey, IndexExtension, OverrideRule, ReferenceRewrite};
pub use transform::{
    reset_column_to_initial, reset_severity, rewrite_image_pillar_urls, RowTransform,
    IMAGE_URL_PLACEHOLDER,
};

use crate::error::{OverrideError, Result};
use crate::schema::{Table, UniqueIndex};
use std::collections::BTreeSet;

/// Correct a freshly introspected table with the built-in override rules
///
/// Must run once per table, after introspection and before the table reaches
/// the dependency-graph builder or the exporter. Running it again is harmless:
/// the result is the same table.
///
/// # Examples
///
/// ```
/// # use table_quirks::overrides::apply_overrides;
/// # use table_quirks::schema::{Table, VIRTUAL_INDEX_NAME};
/// let table = apply_overrides(Table::new("rhnconfigfiletype").with_columns(["id", "label"]));
/// assert_eq!(table.main_unique_index_name.as_deref(), Some(VIRTUAL_INDEX_NAME));
///
/// let untouched = Table::new("rhnserver");
/// assert_eq!(apply_overrides(untouched.clone()), untouched);
/// ```
pub fn apply_overrides(table: Table) -> Table {
    apply_overrides_with(Registry::builtin(), table)
}

/// Correct a table with the rules of `registry`
pub fn apply_overrides_with(registry: &Registry, table: Table) -> Table {
    registry.apply(table)
}

/// Deterministically pick an identity key among the table's unique indexes
///
/// Surrogate keys are never candidates. Among the rest, picks the index with
/// the fewest columns; ties are broken by index name in lexicographic order,
/// so the choice is stable across runs.
pub fn select_main_unique_index(table: &Table) -> Option<String> {
    table
        .unique_indexes
        .values()
        .filter(|index| !is_surrogate_key(index))
        .min_by(|a, b| {
            a.columns
                .len()
                .cmp(&b.columns.len())
                .then_with(|| a.name.cmp(&b.name))
        })
        .map(|index| index.name.clone())
}

/// True for a single-column primary key or `id` index
///
/// Such keys are generated per server and mean nothing on another instance.
pub fn is_surrogate_key(index: &UniqueIndex) -> bool {
    match index.columns.as_slice() {
        [column] => column == "id" || index.name.ends_with("_pk"),
        _ => false,
    }
}

/// Check that every column named by the table's rule exists in the table
///
/// Rules are written against a known schema; this catches a rule that
/// drifted from the live one before any row is exported.
///
/// # Errors
///
/// Returns [`OverrideError::RuleColumnMismatch`] listing every unknown column.
pub fn verify_rule_columns(registry: &Registry, table: &Table) -> Result<()> {
    let Some(rule) = registry.get(&table.name) else {
        return Ok(());
    };

    let missing: Vec<String> = rule
        .referenced_columns()
        .into_iter()
        .filter(|column| !table.has_column(column))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(OverrideError::RuleColumnMismatch {
            table: table.name.clone(),
            missing,
        })
    }
}

/// Check that every reference of every table points inside the model
///
/// # Errors
///
/// Returns [`OverrideError::DanglingReference`] for the first edge whose
/// target table is not in `tables`.
pub fn verify_reference_targets(tables: &[Table]) -> Result<()> {
    let known: BTreeSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    for table in tables {
        for reference in &table.references {
            if !known.contains(reference.table_name.as_str()) {
                return Err(OverrideError::DanglingReference {
                    table: table.name.clone(),
                    target: reference.table_name.clone(),
                });
            }
        }
    }
    Ok(())
}
