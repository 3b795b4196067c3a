// ABOUTME: Rules command listing every registered override
// ABOUTME: Prints one line per table with a summary of its effects

use crate::commands::load_registry;
use anyhow::Result;
use std::path::Path;

/// List the registered override rules
///
/// Returns the rendered listing, one `table: effect; effect` line per rule in
/// table name order.
pub fn rules(config_path: Option<&Path>) -> Result<String> {
    let registry = load_registry(config_path)?;

    let listing = registry
        .iter()
        .map(|(table, rule)| format!("{}: {}", table, rule.describe().join("; ")))
        .collect::<Vec<_>>()
        .join("\n");

    tracing::info!("{} tables have override rules", registry.len());
    Ok(listing)
}
