// ABOUTME: Registry mapping table names to their override rules
// ABOUTME: Holds the built-in rules and merges rules loaded from configuration

use crate::error::Result;
use crate::overrides::config::{check_table_name, OverridesConfig};
use crate::overrides::{OverrideRule, RowTransform};
use crate::schema::Table;
use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::path::Path;

lazy_static! {
    static ref BUILTIN: Registry = Registry::builtin_rules();
}

/// Map from exact table name to the one rule correcting that table
///
/// Lookup is by exact name only. A table without an entry is passed through
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    rules: BTreeMap<String, OverrideRule>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The process-wide registry of built-in rules
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// Built-in rules plus the rules of an override configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an entry
    /// is invalid.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = OverridesConfig::load(path)?;
        Self::builtin().clone().with_overrides(config)
    }

    /// Add the rules of `config`, replacing built-in entries of the same name
    ///
    /// Table names are checked again here since `config` may have been built
    /// in code rather than parsed.
    pub fn with_overrides(mut self, config: OverridesConfig) -> Result<Self> {
        for (table, entry) in config.tables {
            check_table_name(&table)?;
            let rule = entry
                .into_rule()
                .map_err(|e| e.in_config(format_args!("table '{}'", table)))?;
            if self.insert(&table, rule).is_some() {
                tracing::warn!("Configured override replaces built-in rule for '{}'", table);
            } else {
                tracing::debug!("Registered configured override for '{}'", table);
            }
        }
        Ok(self)
    }

    /// Register `rule` for `table`, returning the entry it replaced
    pub fn insert(&mut self, table: &str, rule: OverrideRule) -> Option<OverrideRule> {
        self.rules.insert(table.to_string(), rule)
    }

    pub fn get(&self, table: &str) -> Option<&OverrideRule> {
        self.rules.get(table)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.rules.contains_key(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the rule registered for `table.name`, if any
    pub fn apply(&self, table: Table) -> Table {
        match self.rules.get(&table.name) {
            Some(rule) => {
                tracing::debug!(
                    "Applying overrides to '{}': {}",
                    table.name,
                    rule.describe().join("; ")
                );
                rule.apply(table)
            }
            None => {
                tracing::trace!("No overrides for '{}'", table.name);
                table
            }
        }
    }

    fn builtin_rules() -> Self {
        let mut registry = Self::empty();
        let rules = [
            (
                "rhnchecksumtype",
                OverrideRule::new().sequence("rhn_checksum_id_seq"),
            ),
            ("rhnchecksum", OverrideRule::new().sequence("rhnchecksum_seq")),
            (
                "rhnpackagearch",
                OverrideRule::new().sequence("rhn_package_arch_id_seq"),
            ),
            (
                "rhnchannelarch",
                OverrideRule::new().sequence("rhn_channel_arch_id_seq"),
            ),
            // primary key constraint rhn_pn_id_pk
            (
                "rhnpackagename",
                OverrideRule::new().sequence("RHN_PKG_NAME_SEQ"),
            ),
            (
                "rhnpackagenevra",
                OverrideRule::new().sequence("rhn_pkgnevra_id_seq"),
            ),
            (
                "rhnpackagesource",
                OverrideRule::new().sequence("rhn_package_source_id_seq"),
            ),
            ("rhnpackagekey", OverrideRule::new().sequence("rhn_pkey_id_seq")),
            (
                "rhnpackageextratag",
                OverrideRule::new().virtual_index(&["package_id", "key_id"]),
            ),
            // type is local to the server: never exported, but part of both EVR keys
            (
                "rhnpackageevr",
                OverrideRule::new()
                    .sequence("rhn_pkg_evr_seq")
                    .unexport(&["type"])
                    .extend_index("rhn_pe_v_r_e_uq", &["type"])
                    .extend_index("rhn_pe_v_r_uq", &["type"]),
            ),
            (
                "rhnpackage",
                OverrideRule::new()
                    .sequence("RHN_PACKAGE_ID_SEQ")
                    .virtual_index(&[
                        "name_id",
                        "evr_id",
                        "package_arch_id",
                        "checksum_id",
                        "org_id",
                    ]),
            ),
            (
                "rhnpackagechangelogdata",
                OverrideRule::new()
                    .sequence("rhn_pkg_cld_id_seq")
                    .virtual_index(&["name", "text", "time"]),
            ),
            (
                "rhnpackagechangelogrec",
                OverrideRule::new().sequence("rhn_pkg_cl_id_seq"),
            ),
            // real unique indexes exist but are too complex to match on
            (
                "rhnpackagecapability",
                OverrideRule::new()
                    .sequence("RHN_PKG_CAPABILITY_ID_SEQ")
                    .virtual_index(&["name", "version"]),
            ),
            (
                "rhnconfigfiletype",
                OverrideRule::new().virtual_index(&["label"]),
            ),
            // revisions are not exported
            (
                "rhnconfigfile",
                OverrideRule::new().unexport(&["latest_config_revision_id"]),
            ),
            (
                "rhnconfigcontent",
                OverrideRule::new().virtual_index(&[
                    "contents",
                    "file_size",
                    "checksum_id",
                    "is_binary",
                    "delim_start",
                    "delim_end",
                    "created",
                ]),
            ),
            // actions, build host and log only mean something on the source server;
            // images are unique by id only, so match on the closest compound key
            (
                "suseimageinfo",
                OverrideRule::new()
                    .unexport(&[
                        "build_action_id",
                        "inspect_action_id",
                        "build_server_id",
                        "log",
                    ])
                    .virtual_index(&[
                        "name",
                        "version",
                        "image_type",
                        "image_arch_id",
                        "org_id",
                        "curr_revision_num",
                    ]),
            ),
            (
                "suseimageinfochannel",
                OverrideRule::new().virtual_index(&["channel_id", "image_info_id"]),
            ),
            // rhnregtoken has no portable identity; the activation key shares its id
            (
                "suseimageprofile",
                OverrideRule::new()
                    .sequence("suse_imgprof_prid_seq")
                    .retarget(
                        "rhnregtoken",
                        "rhnactivationkey",
                        &[("token_id", "reg_token_id")],
                    ),
            ),
            (
                "susekiwiprofile",
                OverrideRule::new().virtual_index(&["profile_id"]),
            ),
            (
                "susedockerfileprofile",
                OverrideRule::new().virtual_index(&["profile_id", "path"]),
            ),
            // two unique indexes of the same size; always match on the same one
            (
                "rhnerrata",
                OverrideRule::new()
                    .pinned_index("rhn_errata_adv_org_uq")
                    .transform(RowTransform::ResetSeverity),
            ),
            (
                "susesaltpillar",
                OverrideRule::new()
                    .virtual_index(&["server_id", "group_id", "org_id", "category"])
                    .transform(RowTransform::RewriteImagePillarUrls),
            ),
            (
                "suseimagefile",
                OverrideRule::new()
                    .sequence("suse_image_file_id_seq")
                    .virtual_index(&["image_info_id", "file"]),
            ),
        ];

        for (table, rule) in rules {
            registry.insert(table, rule);
        }
        registry
    }
}
