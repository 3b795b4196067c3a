// ABOUTME: Error type for the override layer
// ABOUTME: Covers rule/schema mismatches, row transform failures, and config problems

use thiserror::Error;

/// Errors raised by the override layer.
///
/// None of these are recoverable inside the layer itself. They surface rules
/// that disagree with the live schema or rows that lack the columns a
/// transform needs, so the caller can abort the run instead of exporting
/// wrong data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverrideError {
    /// A row transform could not find a column it operates on
    #[error("Table '{table}': row has no column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A row column holds a value of a type the transform cannot interpret
    #[error("Table '{table}': column '{column}' expected {expected} value")]
    UnexpectedValueType {
        table: String,
        column: String,
        expected: &'static str,
    },

    /// An override rule names columns the introspected table does not have
    #[error("Table '{table}': override rule names unknown columns: {}", .missing.join(", "))]
    RuleColumnMismatch { table: String, missing: Vec<String> },

    /// A reference points to a table that is not part of the model
    #[error("Table '{table}' references unknown table '{target}'")]
    DanglingReference { table: String, target: String },

    /// Override configuration could not be loaded or is invalid
    #[error("Invalid override configuration: {0}")]
    Config(String),
}

impl OverrideError {
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Prefix a configuration error with where it was found
    pub fn in_config(self, location: impl std::fmt::Display) -> Self {
        match self {
            Self::Config(message) => Self::Config(format!("{}: {}", location, message)),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, OverrideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message() {
        let err = OverrideError::missing_column("rhnerrata", "severity_id");
        assert_eq!(
            err.to_string(),
            "Table 'rhnerrata': row has no column 'severity_id'"
        );
    }

    #[test]
    fn test_rule_column_mismatch_lists_all_columns() {
        let err = OverrideError::RuleColumnMismatch {
            table: "rhnpackage".to_string(),
            missing: vec!["org_id".to_string(), "evr_id".to_string()],
        };
        assert!(err.to_string().contains("org_id, evr_id"));
    }

    #[test]
    fn test_in_config_prefixes_location() {
        let err =
            OverrideError::config("pk_sequence cannot be empty").in_config("table 'rhnerrata'");
        assert_eq!(
            err,
            OverrideError::Config("table 'rhnerrata': pk_sequence cannot be empty".to_string())
        );

        let other = OverrideError::missing_column("rhnerrata", "severity_id");
        assert_eq!(other.clone().in_config("overrides.toml"), other);
    }
}
