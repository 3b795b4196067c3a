// ABOUTME: Integration tests for the override layer
// ABOUTME: Checks the corrected tables and exported rows the downstream layers rely on

use pretty_assertions::assert_eq;
use table_quirks::overrides::{verify_rule_columns, IdentityKey, RowTransform};
use table_quirks::schema::{
    Reference, Row, RowColumn, Table, UniqueIndex, Value, VIRTUAL_INDEX_NAME,
};
use table_quirks::{apply_overrides, OverrideError, Registry};

/// A table shaped like introspection would return it for a registered name
fn introspected(name: &str) -> Table {
    let rule = Registry::builtin().get(name).unwrap();
    let mut columns = vec!["id".to_string()];
    columns.extend(rule.referenced_columns().into_iter().map(str::to_string));

    let mut table = Table::new(name)
        .with_columns(columns)
        .with_unique_index(UniqueIndex::new(format!("{}_id_pk", name), ["id"]));
    table.main_unique_index_name = Some(format!("{}_id_pk", name));
    table.pk_sequence = Some(format!("{}_id_seq", name));

    if let Some(IdentityKey::Pinned(index)) = &rule.identity_key {
        table = table.with_unique_index(UniqueIndex::new(index.clone(), ["advisory", "org_id"]));
    }
    for extension in &rule.index_extensions {
        table = table.with_unique_index(UniqueIndex::new(
            extension.index.clone(),
            ["version", "release"],
        ));
    }
    if let Some(rewrite) = &rule.reference_rewrite {
        table = table
            .with_reference(Reference::new("web_customer", [("org_id", "id")]))
            .with_reference(Reference::new(
                rewrite.from_table.clone(),
                rewrite.column_mapping.keys().map(|k| (k.clone(), "id".to_string())),
            ));
    }
    table
}

#[test]
fn test_every_rule_is_idempotent() {
    for name in Registry::builtin().table_names() {
        let once = apply_overrides(introspected(name));
        let twice = apply_overrides(once.clone());
        assert_eq!(once, twice, "overrides for '{}' are not idempotent", name);
    }
}

#[test]
fn test_virtual_index_becomes_identity_key() {
    for (name, rule) in Registry::builtin().iter() {
        let Some(IdentityKey::Virtual(columns)) = &rule.identity_key else {
            continue;
        };

        let table = apply_overrides(introspected(name));
        assert_eq!(table.main_unique_index_name.as_deref(), Some(VIRTUAL_INDEX_NAME));
        assert_eq!(&table.unique_indexes[VIRTUAL_INDEX_NAME].columns, columns);
        assert!(table.has_virtual_identity_key());
        // the real primary key stays available
        assert!(table.unique_indexes.contains_key(&format!("{}_id_pk", name)));
    }
}

#[test]
fn test_main_index_always_names_existing_index() {
    for name in Registry::builtin().table_names() {
        let table = apply_overrides(introspected(name));
        if let Some(main) = &table.main_unique_index_name {
            assert!(table.unique_indexes.contains_key(main), "table '{}'", name);
        }
    }
}

#[test]
fn test_errata_keeps_natural_key_when_pinned_index_is_absent() {
    let mut table = Table::new("rhnerrata")
        .with_columns(["id", "advisory_name", "org_id", "severity_id"])
        .with_unique_index(UniqueIndex::new("rhn_errata_id_pk", ["id"]))
        .with_unique_index(UniqueIndex::new(
            "rhn_errata_advname_org_uq",
            ["advisory_name", "org_id"],
        ));
    table.main_unique_index_name = Some("rhn_errata_advname_org_uq".to_string());

    let table = apply_overrides(table);
    assert_eq!(
        table.main_unique_index_name.as_deref(),
        Some("rhn_errata_advname_org_uq")
    );
    assert_eq!(table.row_mod_callback, Some(RowTransform::ResetSeverity));
}

#[test]
fn test_rules_match_their_own_fixture_columns() {
    for name in Registry::builtin().table_names() {
        assert!(verify_rule_columns(Registry::builtin(), &introspected(name)).is_ok());
    }
}

#[test]
fn test_unexported_columns_never_reach_serialization() {
    let mut checked = Vec::new();
    for (name, rule) in Registry::builtin().iter() {
        let Some(unexported) = &rule.unexport_columns else {
            continue;
        };

        let table = apply_overrides(introspected(name));
        let exported = table.exported_columns();
        for column in unexported {
            assert!(table.unexport_columns.contains(column), "table '{}'", name);
            assert!(!exported.contains(&column.as_str()), "table '{}'", name);
        }

        let row = Row::new(
            table
                .columns
                .iter()
                .map(|c| RowColumn::new(c.clone(), Value::Text(format!("{}-value", c))))
                .collect(),
        );
        let row = table.export_row(row).unwrap();
        assert_eq!(row.column_names(), exported, "table '{}'", name);
        for column in unexported {
            assert!(row.get(column).is_none(), "table '{}'", name);
        }
        checked.push(name);
    }

    assert_eq!(checked, vec!["rhnconfigfile", "rhnpackageevr", "suseimageinfo"]);
}

#[test]
fn test_package_evr_keeps_type_in_keys_but_not_in_rows() {
    let table = apply_overrides(introspected("rhnpackageevr"));

    assert_eq!(table.pk_sequence.as_deref(), Some("rhn_pkg_evr_seq"));
    assert!(table.unexport_columns.contains("type"));
    for index in ["rhn_pe_v_r_e_uq", "rhn_pe_v_r_uq"] {
        assert_eq!(
            table.unique_indexes[index].columns,
            vec!["version", "release", "type"]
        );
    }
}

#[test]
fn test_errata_severity_is_reset_on_export() {
    let table = apply_overrides(introspected("rhnerrata"));
    assert_eq!(table.main_unique_index_name.as_deref(), Some("rhn_errata_adv_org_uq"));
    assert_eq!(table.row_mod_callback, Some(RowTransform::ResetSeverity));

    let row = Row::new(vec![
        RowColumn::new("advisory", Value::Text("SUSE-SU-2024:0001-1".to_string())),
        RowColumn::new("id", Value::Integer(100)),
        RowColumn::new("severity_id", Value::Text("3".to_string()))
            .with_initial_value(Value::Null),
    ]);

    let row = table.export_row(row).unwrap();
    assert_eq!(row.get("severity_id").unwrap().value, Value::Null);
    assert_eq!(row.get("id").unwrap().value, Value::Integer(100));
}

#[test]
fn test_errata_export_fails_closed_without_severity() {
    let table = apply_overrides(introspected("rhnerrata"));
    let row = Row::new(vec![RowColumn::new("id", Value::Integer(100))]);

    assert_eq!(
        table.export_row(row).unwrap_err(),
        OverrideError::missing_column("rhnerrata", "severity_id")
    );
}

#[test]
fn test_image_pillar_urls_are_rewritten_on_export() {
    let table = apply_overrides(introspected("susesaltpillar"));
    let pillar = br#"{"images": {"foo": {"url": "https://old-host.example/os-images/foo.raw", "size": 10}}}"#;

    let row = Row::new(vec![
        RowColumn::new("category", Value::Text("Image-Something".to_string())),
        RowColumn::new("server_id", Value::Null),
        RowColumn::new("pillar", Value::Binary(pillar.to_vec())),
    ]);
    let row = table.export_row(row).unwrap();

    let expected = br#"{"images": {"foo": {"url": "https://{SERVER_FQDN}/os-images/foo.raw", "size": 10}}}"#;
    assert_eq!(row.get("pillar").unwrap().value, Value::Binary(expected.to_vec()));
}

#[test]
fn test_non_image_pillar_is_exported_unchanged() {
    let table = apply_overrides(introspected("susesaltpillar"));
    let row = Row::new(vec![
        RowColumn::new(
            "pillar",
            Value::Binary(b"https://old-host.example/os-images/foo.raw".to_vec()),
        ),
        RowColumn::new("category", Value::Text("Formula-image".to_string())),
    ]);

    assert_eq!(table.export_row(row.clone()).unwrap(), row);
}

#[test]
fn test_image_profile_references_activation_key() {
    let table = apply_overrides(introspected("suseimageprofile"));

    assert_eq!(table.pk_sequence.as_deref(), Some("suse_imgprof_prid_seq"));
    assert!(table.references.iter().all(|r| r.table_name != "rhnregtoken"));
    let retargeted: Vec<&Reference> = table
        .references
        .iter()
        .filter(|r| r.table_name == "rhnactivationkey")
        .collect();
    assert_eq!(
        retargeted,
        vec![&Reference::new("rhnactivationkey", [("token_id", "reg_token_id")])]
    );
    assert_eq!(table.references[0], Reference::new("web_customer", [("org_id", "id")]));
}

#[test]
fn test_unregistered_table_is_returned_unchanged() {
    let mut table = Table::new("rhnserver")
        .with_columns(["id", "org_id", "name"])
        .with_unique_index(UniqueIndex::new("rhn_server_id_pk", ["id"]))
        .with_reference(Reference::new("web_customer", [("org_id", "id")]));
    table.pk_sequence = Some("rhn_server_id_seq".to_string());
    table.main_unique_index_name = Some("rhn_server_id_pk".to_string());
    table.unexport_columns.insert("name".to_string());

    assert_eq!(apply_overrides(table.clone()), table);
}

#[test]
fn test_overrides_can_run_from_several_threads() {
    let handles: Vec<_> = ["rhnpackage", "suseimageinfo", "rhnerrata", "rhnserver"]
        .into_iter()
        .map(|name| {
            std::thread::spawn(move || {
                let table = if Registry::builtin().contains(name) {
                    introspected(name)
                } else {
                    Table::new(name)
                };
                (table.clone(), apply_overrides(table))
            })
        })
        .collect();

    for handle in handles {
        let (input, output) = handle.join().unwrap();
        assert_eq!(apply_overrides(input), output);
    }
}
