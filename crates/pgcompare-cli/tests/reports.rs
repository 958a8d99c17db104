//! Report rendering over in-memory snapshots.

use pgcompare_cli::commands::{dependents_report, diff_report, missing_report};
use pgcompare_cli::formatter::{JsonFormatter, TextFormatter};
use pgcompare_cli::{CliError, KindArg};
use pgcompare_core::catalog::{
    Column, Database, DatabaseBuilder, Function, Language, Namespace, Relation, Trigger, Type,
};
use pgcompare_core::ObjectKind;

/// `public.users` with a trigger calling `public.touch()`. `with_audit` adds
/// a second table.
fn schema(label: &str, with_audit: bool) -> Database {
    let mut builder = DatabaseBuilder::new(format!("dbname={}", label));
    let catalog = builder.add_namespace(Namespace::new("pg_catalog", "postgres"));
    let int4 = builder.add_type(Type::new(catalog, "int4", "postgres"));
    let trigger = builder.add_internal_type(Type::new(catalog, "trigger", "postgres"));
    let plpgsql = builder.add_language(Language::new("plpgsql", "postgres"), true);
    let public = builder.add_namespace(Namespace::new("public", "app"));

    let users = builder.add_relation(Relation::table(public, "users", "app"));
    builder.add_column(users, Column::new(1, "id", int4).not_null());
    let touch = builder.add_function(
        Function::new(public, "touch", "app", plpgsql, trigger)
            .with_source("BEGIN RETURN NEW; END"),
    );
    builder.add_trigger(
        users,
        Trigger::new("users_touch", touch, "CREATE TRIGGER users_touch ..."),
    );

    if with_audit {
        let audit = builder.add_relation(Relation::table(public, "audit", "app"));
        builder.add_column(audit, Column::new(1, "id", int4));
    }
    builder.finish().unwrap()
}

#[test]
fn test_diff_report_flags_differences() {
    let same = diff_report(&[schema("a", false), schema("b", false)], &TextFormatter).unwrap();
    assert!(!same.differences);

    let drift = diff_report(&[schema("a", false), schema("b", true)], &TextFormatter).unwrap();
    assert!(drift.differences);
    assert!(drift.output.contains("table audit"));
    assert!(drift.output.contains("present in: b"));
}

#[test]
fn test_missing_report_json() {
    let dbs = [schema("a", true), schema("b", false), schema("c", true)];
    let report = missing_report(&dbs, &JsonFormatter).unwrap();
    assert!(report.differences);

    let value: serde_json::Value = serde_json::from_str(&report.output).unwrap();
    assert_eq!(value["sources"], serde_json::json!(["a", "b", "c"]));
    assert_eq!(
        value["missing"],
        serde_json::json!([{
            "path": "public.audit",
            "kind": "table",
            "present": [true, false, true],
        }])
    );
}

#[test]
fn test_dependents_in_drop_order() {
    let db = schema("a", false);
    let report = dependents_report(&db, KindArg::Function, "public.touch", &JsonFormatter).unwrap();
    assert!(!report.differences);

    let value: serde_json::Value = serde_json::from_str(&report.output).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            { "kind": "trigger", "name": "public.users.users_touch" },
            { "kind": "function", "name": "public.touch()" },
        ])
    );
}

#[test]
fn test_dependents_errors() {
    let db = schema("a", false);

    let err = dependents_report(&db, KindArg::Table, "users", &TextFormatter).unwrap_err();
    assert!(matches!(err, CliError::InvalidObject(_)));

    let err = dependents_report(&db, KindArg::View, "public.users", &TextFormatter).unwrap_err();
    assert!(matches!(
        err,
        CliError::ObjectNotFound {
            kind: ObjectKind::View,
            ..
        }
    ));
}
