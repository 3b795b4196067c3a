// ABOUTME: Named row transforms applied just before a row is serialized
// ABOUTME: Resets instance-local values and rewrites host-specific URLs in payloads

use crate::error::{OverrideError, Result};
use crate::schema::{Row, Table, Value};
use lazy_static::lazy_static;
use regex::{bytes, NoExpand, Regex};
use serde::{Deserialize, Serialize};

/// Placeholder URL prefix substituted for host-specific image URLs
pub const IMAGE_URL_PLACEHOLDER: &str = "https://{SERVER_FQDN}/os-images/";

const IMAGE_URL_PATTERN: &str = r"https://[^/]+/os-images/";

lazy_static! {
    static ref IMAGE_URL_TEXT: Regex =
        Regex::new(IMAGE_URL_PATTERN).expect("image URL pattern is valid");
    static ref IMAGE_URL_BYTES: bytes::Regex =
        bytes::Regex::new(&format!("(?-u){}", IMAGE_URL_PATTERN))
            .expect("image URL pattern is valid");
}

/// A row transform installed on a table by an override rule
///
/// Transforms are pure: the result depends only on the row content, so
/// exporting unchanged source data twice yields identical rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowTransform {
    /// Replace `severity_id` with its initial value
    ResetSeverity,
    /// Make OS image URLs inside image pillars host-agnostic
    RewriteImagePillarUrls,
}

impl RowTransform {
    pub fn apply(&self, row: Row, table: &Table) -> Result<Row> {
        match self {
            RowTransform::ResetSeverity => reset_severity(row, table),
            RowTransform::RewriteImagePillarUrls => rewrite_image_pillar_urls(row, table),
        }
    }

    /// Columns the transform reads or writes
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            RowTransform::ResetSeverity => &["severity_id"],
            RowTransform::RewriteImagePillarUrls => &["category", "pillar"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RowTransform::ResetSeverity => "reset_severity",
            RowTransform::RewriteImagePillarUrls => "rewrite_image_pillar_urls",
        }
    }
}

/// Replace a column's value with its schema-declared initial value
///
/// # Errors
///
/// Returns [`OverrideError::MissingColumn`] if the row has no such column.
pub fn reset_column_to_initial(mut row: Row, table: &Table, column: &str) -> Result<Row> {
    let target = row
        .get_mut(column)
        .ok_or_else(|| OverrideError::missing_column(&table.name, column))?;
    target.value = target.initial_value().clone();
    Ok(row)
}

/// Drop the source-side severity classification of an erratum
pub fn reset_severity(row: Row, table: &Table) -> Result<Row> {
    reset_column_to_initial(row, table, "severity_id")
}

/// Rewrite `https://<host>/os-images/` URLs in image pillars
///
/// Only rows whose `category` starts with `Image` are touched. Every
/// occurrence in `pillar` is replaced with [`IMAGE_URL_PLACEHOLDER`]; the
/// rest of the payload is left byte-for-byte as it was.
///
/// # Errors
///
/// - [`OverrideError::MissingColumn`] when `category` is absent, or when an
///   image pillar row has no `pillar` column
/// - [`OverrideError::UnexpectedValueType`] when `category` is neither text
///   nor null, or `pillar` is neither binary, text, nor null
pub fn rewrite_image_pillar_urls(mut row: Row, table: &Table) -> Result<Row> {
    let category = row
        .get("category")
        .ok_or_else(|| OverrideError::missing_column(&table.name, "category"))?;

    let is_image_pillar = match &category.value {
        Value::Text(text) => text.starts_with("Image"),
        Value::Null => false,
        _ => {
            return Err(OverrideError::UnexpectedValueType {
                table: table.name.clone(),
                column: "category".to_string(),
                expected: "text",
            })
        }
    };
    if !is_image_pillar {
        return Ok(row);
    }
    tracing::trace!("Updating pillar URLs of {:?}", category.value);

    let pillar = row
        .get_mut("pillar")
        .ok_or_else(|| OverrideError::missing_column(&table.name, "pillar"))?;

    match &mut pillar.value {
        Value::Binary(content) => {
            let replacement = bytes::NoExpand(IMAGE_URL_PLACEHOLDER.as_bytes());
            let rewritten = IMAGE_URL_BYTES
                .replace_all(content.as_slice(), replacement)
                .into_owned();
            *content = rewritten;
        }
        Value::Text(content) => {
            let rewritten = IMAGE_URL_TEXT
                .replace_all(content.as_str(), NoExpand(IMAGE_URL_PLACEHOLDER))
                .into_owned();
            *content = rewritten;
        }
        Value::Null => {}
        _ => {
            return Err(OverrideError::UnexpectedValueType {
                table: table.name.clone(),
                column: "pillar".to_string(),
                expected: "binary or text",
            })
        }
    }

    Ok(row)
}
