// ABOUTME: Utility functions for validation and display
// ABOUTME: Provides table name validation, identifier sanitizing, and output digests

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};

/// Validate a table name used as an override key
///
/// Override keys are matched exactly against introspected names, which are
/// always lowercase. A key that could never match is almost certainly a typo,
/// so it is rejected up front.
///
/// # Errors
///
/// Returns an error if the name is:
/// - Empty or whitespace only
/// - Longer than 63 characters (PostgreSQL identifier limit)
/// - Contains anything but lowercase letters, digits, or `_`
/// - Starts with a digit
///
/// # Examples
///
/// ```
/// # use table_quirks::utils::validate_table_name;
/// assert!(validate_table_name("suseimageinfo").is_ok());
/// assert!(validate_table_name("SuseImageInfo").is_err());
/// assert!(validate_table_name("").is_err());
/// ```
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Table name cannot be empty");
    }

    if name.len() > 63 {
        bail!(
            "Table name '{}' exceeds the 63 character identifier limit",
            sanitize_identifier(name)
        );
    }

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        bail!(
            "Table name '{}' cannot start with a digit",
            sanitize_identifier(name)
        );
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        bail!(
            "Invalid table name '{}'.\n\
             Override keys must be lowercase identifiers (a-z, 0-9, _)",
            sanitize_identifier(name)
        );
    }

    Ok(())
}

/// Sanitize an identifier (table name, column name, etc.) for display
///
/// Removes control characters and limits length so names read from input
/// files cannot garble log output.
///
/// # Examples
///
/// ```
/// # use table_quirks::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}

/// Hex-encoded SHA-256 digest of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name_valid() {
        assert!(validate_table_name("rhnpackage").is_ok());
        assert!(validate_table_name("suse_image_file").is_ok());
        assert!(validate_table_name("table2").is_ok());
    }

    #[test]
    fn test_validate_table_name_invalid() {
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("   ").is_err());
        assert!(validate_table_name("RHNPACKAGE").is_err());
        assert!(validate_table_name("rhn.package").is_err());
        assert!(validate_table_name("2rhnpackage").is_err());
        assert!(validate_table_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("normal_table"), "normal_table");
        assert_eq!(sanitize_identifier("table\x00name"), "tablename");
        assert_eq!(sanitize_identifier("table\nname"), "tablename");

        let long_name = "a".repeat(200);
        assert_eq!(sanitize_identifier(&long_name).len(), 100);
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
