//! Database initialization tests
//!
//! - Database file is created on first run
//! - Re-opening an existing database is harmless
//! - Evaluator-owned tables exist after init

use seo_common::config::EvaluationConfig;
use seo_common::db::init::init_database;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("sub").join("seo.db");

    let result = init_database(&db_path, &EvaluationConfig::default()).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("seo.db");
    let config = EvaluationConfig::default();

    let pool1 = init_database(&db_path, &config).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path, &config).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_evaluator_tables_created() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("seo.db");
    let config = EvaluationConfig::default();

    let pool = init_database(&db_path, &config).await.unwrap();

    for table in [&config.evaluation_table, &config.meta_table] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "table {} missing", table);
    }
}
