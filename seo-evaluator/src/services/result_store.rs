//! Evaluation persistence
//!
//! Upsert-by-lookup keyed by `(uid_foreign, tablenames)`: find the stored
//! evaluation or create one, overwrite url and results, commit. The lookup
//! and the write share a transaction and the table carries a UNIQUE
//! constraint on the pair.

use crate::scoring::EvaluationResult;
use seo_common::db::{checked_identifier, Evaluation};
use seo_common::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};

pub struct ResultStore {
    pool: SqlitePool,
    table: String,
}

impl ResultStore {
    pub fn new(pool: SqlitePool, evaluation_table: &str) -> Result<Self> {
        Ok(Self {
            pool,
            table: checked_identifier(evaluation_table)?.to_string(),
        })
    }

    /// Store `results` for the record, replacing any previous evaluation
    pub async fn save(
        &self,
        results: &EvaluationResult,
        uid_foreign: i64,
        table_name: &str,
        url: &str,
    ) -> Result<Evaluation> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(&format!(
            "SELECT * FROM {} WHERE uid_foreign = ? AND tablenames = ?",
            self.table
        ))
        .bind(uid_foreign)
        .bind(table_name)
        .fetch_optional(&mut *tx)
        .await?;

        let mut evaluation = match existing {
            Some(row) => Evaluation::from_row(&row)?,
            None => Evaluation::new(uid_foreign, table_name),
        };

        evaluation.url = url.to_string();
        evaluation.set_results(results)?;
        evaluation.tstamp = now;

        match evaluation.uid {
            None => {
                evaluation.crdate = now;
                let uid = sqlx::query(&format!(
                    "INSERT INTO {} (uid_foreign, tablenames, url, results, crdate, tstamp) VALUES (?, ?, ?, ?, ?, ?)",
                    self.table
                ))
                .bind(evaluation.uid_foreign)
                .bind(&evaluation.tablenames)
                .bind(&evaluation.url)
                .bind(&evaluation.results)
                .bind(evaluation.crdate)
                .bind(evaluation.tstamp)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();
                evaluation.uid = Some(uid);
                debug!(uid, uid_foreign, table = %table_name, "Inserted evaluation");
            }
            Some(uid) => {
                sqlx::query(&format!(
                    "UPDATE {} SET url = ?, results = ?, tstamp = ? WHERE uid = ?",
                    self.table
                ))
                .bind(&evaluation.url)
                .bind(&evaluation.results)
                .bind(evaluation.tstamp)
                .bind(uid)
                .execute(&mut *tx)
                .await?;
                debug!(uid, uid_foreign, table = %table_name, "Updated evaluation");
            }
        }

        tx.commit().await?;

        info!(
            uid_foreign,
            table = %table_name,
            url = %url,
            percentage = results.summary.percentage,
            "Stored evaluation"
        );

        Ok(evaluation)
    }

    pub async fn find(&self, uid_foreign: i64, table_name: &str) -> Result<Option<Evaluation>> {
        let row = sqlx::query(&format!(
            "SELECT * FROM {} WHERE uid_foreign = ? AND tablenames = ?",
            self.table
        ))
        .bind(uid_foreign)
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Evaluation::from_row).transpose()?)
    }

    pub async fn count(&self, uid_foreign: i64, table_name: &str) -> Result<i64> {
        let count = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE uid_foreign = ? AND tablenames = ?",
            self.table
        ))
        .bind(uid_foreign)
        .bind(table_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
