//! Tests against a running PostgreSQL server.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use pgcompare_core::diff_databases;
use pgcompare_loader::{load_database, load_databases, LoadConfig};

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable not set")
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_load_single_source() {
    let db = load_database(&database_url(), &LoadConfig::default())
        .await
        .unwrap();

    // pg_catalog is resolvable but never listed.
    assert!(db.namespaces().iter().all(|&ns| !db[ns].name.starts_with("pg_")));
    assert!(db.languages().iter().all(|&lang| db[lang].name != "internal"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_same_source_twice_has_no_differences() {
    let url = database_url();
    let dbs = load_databases(&[url.clone(), url], &LoadConfig::default())
        .await
        .unwrap();
    assert_eq!(dbs.len(), 2);

    let diff = diff_databases(&dbs);
    assert!(diff.is_empty(), "unexpected differences: {:?}", diff);
}

const OVERLOADS: &str = "
    CREATE SCHEMA pgcompare_s1;
    CREATE SCHEMA pgcompare_s2;
    CREATE DOMAIN pgcompare_s1.money2 AS numeric;
    CREATE DOMAIN pgcompare_s2.money2 AS numeric;
    CREATE FUNCTION pgcompare_s1.f(a int, OUT b int) LANGUAGE sql AS 'SELECT a';
    CREATE FUNCTION pgcompare_s1.f(a int, b int) RETURNS int LANGUAGE sql AS 'SELECT a + b';
    CREATE FUNCTION pgcompare_s1.g(pgcompare_s1.money2) RETURNS int LANGUAGE sql AS 'SELECT 1';
    CREATE FUNCTION pgcompare_s1.g(pgcompare_s2.money2) RETURNS int LANGUAGE sql AS 'SELECT 2';
";

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_overloads_load_as_distinct_functions() {
    use pgcompare_core::{ObjectId, ObjectKind};

    let url = database_url();
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    sqlx::raw_sql("DROP SCHEMA IF EXISTS pgcompare_s1, pgcompare_s2 CASCADE")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::raw_sql(OVERLOADS).execute(&pool).await.unwrap();

    let loaded = load_database(&url, &LoadConfig::default()).await;

    sqlx::raw_sql("DROP SCHEMA pgcompare_s1, pgcompare_s2 CASCADE")
        .execute(&pool)
        .await
        .unwrap();
    let db = loaded.unwrap();

    let find = |name: &str| db.find(ObjectKind::Function, "pgcompare_s1", name);
    for name in [
        "f(int4)",
        "f(int4, int4)",
        "g(pgcompare_s1.money2)",
        "g(pgcompare_s2.money2)",
    ] {
        assert!(
            matches!(find(name), Some(ObjectId::Function(_))),
            "{} not loaded",
            name
        );
    }
}
