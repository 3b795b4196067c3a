// ABOUTME: Command implementations for the table-quirks CLI
// ABOUTME: Exports rules, apply, and check commands plus shared model loading

pub mod apply;
pub mod check;
pub mod rules;

pub use apply::apply;
pub use check::check;
pub use rules::rules;

use crate::overrides::Registry;
use crate::schema::Table;
use anyhow::{Context, Result};
use std::path::Path;

/// Built-in registry, extended by the override file at `config_path` if given
pub fn load_registry(config_path: Option<&Path>) -> Result<Registry> {
    match config_path {
        Some(path) => {
            tracing::info!("Loading override configuration from {}", path.display());
            Registry::from_config_file(path)
                .with_context(|| format!("Failed to load overrides from {}", path.display()))
        }
        None => Ok(Registry::builtin().clone()),
    }
}

/// Read a JSON array of introspected tables
pub fn load_model(path: &Path) -> Result<Vec<Table>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read table model {}", path.display()))?;
    let tables: Vec<Table> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse table model {}", path.display()))?;
    tracing::debug!("Loaded {} tables from {}", tables.len(), path.display());
    Ok(tables)
}
