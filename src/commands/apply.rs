// ABOUTME: Apply command correcting an introspected table model
// ABOUTME: Reads tables as JSON, applies overrides, and writes the corrected model

use crate::commands::{load_model, load_registry};
use crate::overrides::apply_overrides_with;
use crate::schema::Table;
use crate::utils::{sanitize_identifier, sha256_hex};
use anyhow::{Context, Result};
use std::path::Path;

/// Apply override rules to every table of a model file
///
/// Writes the corrected model as pretty-printed JSON to `output_path`, or
/// stdout when no path is given. The output is deterministic, so the returned
/// SHA-256 digest can be compared across runs.
///
/// # Errors
///
/// This function will return an error if:
/// - The model file cannot be read or is not a JSON array of tables
/// - The override configuration cannot be loaded
/// - The output file cannot be written
pub fn apply(
    input_path: &Path,
    output_path: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<String> {
    let registry = load_registry(config_path)?;
    let tables = load_model(input_path)?;

    let mut corrected = 0;
    let tables: Vec<Table> = tables
        .into_iter()
        .map(|table| {
            if registry.contains(&table.name) {
                corrected += 1;
                tracing::debug!("Correcting {}", sanitize_identifier(&table.name));
            }
            apply_overrides_with(&registry, table)
        })
        .collect();

    let mut rendered =
        serde_json::to_string_pretty(&tables).context("Failed to serialize corrected model")?;
    rendered.push('\n');

    match output_path {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("Failed to write corrected model to {}", path.display()))?,
        None => print!("{}", rendered),
    }

    let digest = sha256_hex(rendered.as_bytes());
    tracing::info!(
        "✓ Applied overrides to {} of {} tables (sha256 {})",
        corrected,
        tables.len(),
        digest
    );
    Ok(digest)
}
