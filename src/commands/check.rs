// ABOUTME: Check command validating override rules against a table model
// ABOUTME: Reports rule columns missing from the schema and dangling references

use crate::commands::{load_model, load_registry};
use crate::overrides::{apply_overrides_with, verify_reference_targets, verify_rule_columns};
use anyhow::{bail, Result};
use std::path::Path;

/// Check that the override rules fit the introspected model
///
/// Every problem is logged; the command fails if at least one was found.
///
/// # Errors
///
/// This function will return an error if:
/// - The model or configuration cannot be loaded
/// - A rule names a column the corresponding table does not have
/// - A corrected reference points to a table absent from the model
pub fn check(input_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let registry = load_registry(config_path)?;
    let tables = load_model(input_path)?;

    let mut problems = 0;
    for table in &tables {
        if let Err(e) = verify_rule_columns(&registry, table) {
            tracing::error!("{}", e);
            problems += 1;
        }
    }

    let corrected: Vec<_> = tables
        .into_iter()
        .map(|table| apply_overrides_with(&registry, table))
        .collect();
    if let Err(e) = verify_reference_targets(&corrected) {
        tracing::error!("{}", e);
        problems += 1;
    }

    if problems > 0 {
        bail!("Override check found {} problem(s)", problems);
    }

    tracing::info!("✓ Override rules match {} tables", corrected.len());
    Ok(())
}
