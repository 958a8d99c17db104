//! PostgreSQL catalog loader.
//!
//! Reads `pg_catalog` inside a serializable, read-only transaction and
//! builds a [`Database`] snapshot. Several sources load concurrently, one
//! task per connection.

pub mod config;
pub mod error;
pub mod populate;
pub mod queries;

pub use config::LoadConfig;
pub use error::{LoadError, Result};
pub use populate::populate;
pub use queries::CatalogRows;

use pgcompare_core::catalog::source_label;
use pgcompare_core::Database;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, PgConnection};
use std::str::FromStr;
use std::time::Instant;
use tokio::task::{AbortHandle, JoinHandle};

/// Open a connection to one source.
async fn connect(source: &str, config: &LoadConfig) -> Result<PgConnection> {
    let options = PgConnectOptions::from_str(source)
        .map_err(LoadError::Connect)?
        .application_name(&config.application_name)
        .disable_statement_logging();

    tokio::time::timeout(config.connect_timeout, PgConnection::connect_with(&options))
        .await
        .map_err(|_| LoadError::ConnectTimeout(config.connect_timeout))?
        .map_err(LoadError::Connect)
}

/// Load one source's catalog snapshot.
///
/// `source` is a libpq connection string or URL.
pub async fn load_database(source: &str, config: &LoadConfig) -> Result<Database> {
    let label = source_label(source);
    let start = Instant::now();

    let mut conn = connect(source, config).await?;
    let mut tx = conn.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE, READ ONLY")
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "SET LOCAL statement_timeout = '{}'",
        config.statement_timeout_setting()
    ))
    .execute(&mut *tx)
    .await?;

    let rows = CatalogRows::fetch(&mut tx).await?;
    tx.commit().await?;
    conn.close().await?;

    tracing::debug!(source = %label, rows = rows.len(), "catalog rows fetched");
    let db = populate(source, rows)?;

    tracing::info!(
        source = %label,
        namespaces = db.namespaces().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "catalog loaded"
    );
    Ok(db)
}

/// Load every source concurrently. Snapshots come back in source order.
///
/// The first failure is returned, tagged with the failing source's label,
/// and the loads still running are aborted.
pub async fn load_databases(sources: &[String], config: &LoadConfig) -> Result<Vec<Database>> {
    let handles: Vec<JoinHandle<Result<Database>>> = sources
        .iter()
        .map(|source| {
            let source = source.clone();
            let config = config.clone();
            tokio::spawn(async move {
                load_database(&source, &config)
                    .await
                    .map_err(|error| LoadError::Source {
                        database: source_label(&source),
                        error: Box::new(error),
                    })
            })
        })
        .collect();
    let aborts: Vec<AbortHandle> = handles.iter().map(JoinHandle::abort_handle).collect();

    let loads = handles.into_iter().map(|handle| async move { handle.await? });
    let result = futures::future::try_join_all(loads).await;
    if result.is_err() {
        for abort in &aborts {
            abort.abort();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_invalid_source_is_tagged() {
        let config = LoadConfig::new().with_connect_timeout(Duration::from_millis(200));
        let sources = vec!["postgres://localhost:1/missing?sslmode=bogus".to_string()];
        let err = load_databases(&sources, &config).await.unwrap_err();
        match err {
            LoadError::Source { database, error } => {
                assert_eq!(database, "missing");
                assert!(matches!(
                    *error,
                    LoadError::Connect(_) | LoadError::ConnectTimeout(_)
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_wait_for_other_sources() {
        let config = LoadConfig::new().with_connect_timeout(Duration::from_secs(60));
        let sources = vec![
            "postgres://10.255.255.1:5432/slow".to_string(),
            "postgres://localhost:1/missing?sslmode=bogus".to_string(),
        ];
        let err = tokio::time::timeout(Duration::from_secs(10), load_databases(&sources, &config))
            .await
            .expect("load_databases waited for the slow source")
            .unwrap_err();
        match err {
            LoadError::Source { database, .. } => {
                assert!(database == "missing" || database == "slow", "{database}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_source_list() {
        let dbs = load_databases(&[], &LoadConfig::default()).await.unwrap();
        assert!(dbs.is_empty());
    }
}
