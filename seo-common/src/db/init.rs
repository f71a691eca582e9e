//! Database initialization
//!
//! Opens (or creates) the SQLite database and idempotently creates the
//! tables owned by the evaluator. Content tables such as `pages` belong to
//! the host CMS and are never created here.

use crate::config::EvaluationConfig;
use crate::db::checked_identifier;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create evaluator tables if needed
pub async fn init_database(db_path: &Path, config: &EvaluationConfig) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL lets the HTTP handlers read while a sweep writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool, config).await?;

    Ok(pool)
}

/// Create the evaluation and meta tables (idempotent)
pub async fn create_schema(pool: &SqlitePool, config: &EvaluationConfig) -> Result<()> {
    create_evaluation_table(pool, checked_identifier(&config.evaluation_table)?).await?;
    create_meta_table(pool, checked_identifier(&config.meta_table)?).await?;
    Ok(())
}

async fn create_evaluation_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            uid INTEGER PRIMARY KEY AUTOINCREMENT,
            uid_foreign INTEGER NOT NULL,
            tablenames TEXT NOT NULL,
            url TEXT NOT NULL DEFAULT '',
            results TEXT NOT NULL DEFAULT '{{}}',
            crdate INTEGER NOT NULL DEFAULT 0,
            tstamp INTEGER NOT NULL DEFAULT 0,
            UNIQUE (uid_foreign, tablenames)
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_meta_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            uid INTEGER PRIMARY KEY AUTOINCREMENT,
            uid_foreign INTEGER NOT NULL,
            tablenames TEXT NOT NULL,
            keyword TEXT NOT NULL DEFAULT ''
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_foreign ON {table} (uid_foreign, tablenames)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_schema_idempotent() {
        let pool = setup_test_db().await;
        let config = EvaluationConfig::default();

        create_schema(&pool, &config).await.unwrap();
        create_schema(&pool, &config).await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?, ?)",
        )
        .bind(&config.evaluation_table)
        .bind(&config.meta_table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 2);
    }

    #[tokio::test]
    async fn test_evaluation_table_rejects_duplicate_pair() {
        let pool = setup_test_db().await;
        let config = EvaluationConfig::default();
        create_schema(&pool, &config).await.unwrap();

        let insert = format!(
            "INSERT INTO {} (uid_foreign, tablenames) VALUES (42, 'pages')",
            config.evaluation_table
        );
        sqlx::query(&insert).execute(&pool).await.unwrap();
        let second = sqlx::query(&insert).execute(&pool).await;

        assert!(second.is_err(), "UNIQUE(uid_foreign, tablenames) must hold");
    }

    #[tokio::test]
    async fn test_invalid_table_name_rejected() {
        let pool = setup_test_db().await;
        let config = EvaluationConfig {
            evaluation_table: "bad name".to_string(),
            ..EvaluationConfig::default()
        };

        assert!(create_schema(&pool, &config).await.is_err());
    }
}
