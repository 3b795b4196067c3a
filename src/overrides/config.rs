// ABOUTME: TOML configuration for site-specific override rules
// ABOUTME: Parses [tables.<name>] sections into registry rules

use crate::error::{OverrideError, Result};
use crate::overrides::{OverrideRule, RowTransform};
use crate::utils::validate_table_name;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Override configuration file
///
/// ```toml
/// [tables.suseimageinfo]
/// virtual_index = ["name", "version", "org_id"]
/// unexport_columns = ["log"]
///
/// [tables.suseimageprofile.reference_rewrite]
/// from_table = "rhnregtoken"
/// to_table = "rhnactivationkey"
/// column_mapping = { token_id = "reg_token_id" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverridesConfig {
    #[serde(default)]
    pub tables: BTreeMap<String, TableOverrideConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableOverrideConfig {
    pub pk_sequence: Option<String>,
    pub virtual_index: Option<Vec<String>>,
    pub main_unique_index: Option<String>,
    pub unexport_columns: Option<Vec<String>>,
    #[serde(default)]
    pub index_extensions: Vec<IndexExtensionConfig>,
    pub reference_rewrite: Option<ReferenceRewriteConfig>,
    pub row_transform: Option<RowTransform>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexExtensionConfig {
    pub index: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceRewriteConfig {
    pub from_table: String,
    pub to_table: String,
    pub column_mapping: BTreeMap<String, String>,
}

impl OverridesConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OverrideError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents).map_err(|e| e.in_config(path.display()))
    }

    /// Parse and validate configuration text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| OverrideError::config(e.to_string()))?;
        for name in config.tables.keys() {
            check_table_name(name)?;
        }
        Ok(config)
    }
}

impl TableOverrideConfig {
    /// Convert the entry into a rule, rejecting contradictory or empty settings
    pub fn into_rule(self) -> Result<OverrideRule> {
        let mut rule = OverrideRule::new();

        if let Some(sequence) = self.pk_sequence {
            if sequence.trim().is_empty() {
                return Err(OverrideError::config("pk_sequence cannot be empty"));
            }
            rule = rule.sequence(&sequence);
        }

        match (self.virtual_index, self.main_unique_index) {
            (Some(_), Some(_)) => {
                return Err(OverrideError::config(
                    "virtual_index and main_unique_index are mutually exclusive",
                ))
            }
            (Some(columns), None) => {
                if columns.is_empty() {
                    return Err(OverrideError::config("virtual_index needs at least one column"));
                }
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                rule = rule.virtual_index(&columns);
            }
            (None, Some(index)) => rule = rule.pinned_index(&index),
            (None, None) => {}
        }

        if let Some(columns) = self.unexport_columns {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            rule = rule.unexport(&columns);
        }

        for extension in self.index_extensions {
            let columns: Vec<&str> = extension.columns.iter().map(String::as_str).collect();
            rule = rule.extend_index(&extension.index, &columns);
        }

        if let Some(rewrite) = self.reference_rewrite {
            if rewrite.column_mapping.is_empty() {
                return Err(OverrideError::config(
                    "reference_rewrite.column_mapping cannot be empty",
                ));
            }
            check_table_name(&rewrite.from_table)?;
            check_table_name(&rewrite.to_table)?;
            let mapping: Vec<(&str, &str)> = rewrite
                .column_mapping
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            rule = rule.retarget(&rewrite.from_table, &rewrite.to_table, &mapping);
        }

        if let Some(transform) = self.row_transform {
            rule = rule.transform(transform);
        }

        Ok(rule)
    }
}

/// Reject a table name that could never match an introspected table
pub(crate) fn check_table_name(name: &str) -> Result<()> {
    validate_table_name(name).map_err(|e| OverrideError::config(e.to_string()))
}
