//! Focus keyword resolution
//!
//! A record linked to the meta side table takes its keyword from there;
//! otherwise the literal keyword field of the record is used. Several meta
//! rows for the same record resolve to the one with the highest `uid`.

use crate::db::CandidateRecord;
use seo_common::config::EvaluationConfig;
use seo_common::db::{checked_identifier, FocusKeywordMeta};
use seo_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

pub struct KeywordResolver {
    pool: SqlitePool,
    meta_table: String,
    meta_link_field: String,
    keyword_field: String,
}

impl KeywordResolver {
    pub fn new(pool: SqlitePool, config: &EvaluationConfig) -> Result<Self> {
        Ok(Self {
            pool,
            meta_table: checked_identifier(&config.meta_table)?.to_string(),
            meta_link_field: config.meta_link_field.clone(),
            keyword_field: config.keyword_field.clone(),
        })
    }

    /// Keyword of `candidate`, empty if none is configured
    pub async fn resolve(&self, candidate: &CandidateRecord) -> Result<String> {
        let keyword = if candidate.has_value(&self.meta_link_field) {
            self.latest_meta(candidate.uid, &candidate.table)
                .await?
                .map(|meta| meta.keyword)
                .unwrap_or_default()
        } else {
            candidate.field_text(&self.keyword_field)
        };

        let keyword = keyword.trim().to_string();
        debug!(uid = candidate.uid, table = %candidate.table, keyword = %keyword, "Resolved focus keyword");
        Ok(keyword)
    }

    /// Meta row with the highest uid for the record
    pub async fn latest_meta(&self, uid_foreign: i64, table: &str) -> Result<Option<FocusKeywordMeta>> {
        let row = sqlx::query(&format!(
            "SELECT uid, uid_foreign, tablenames, keyword FROM {} \
             WHERE uid_foreign = ? AND tablenames = ? ORDER BY uid DESC LIMIT 1",
            self.meta_table
        ))
        .bind(uid_foreign)
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;

        let meta = row.as_ref().map(FocusKeywordMeta::from_row).transpose()?;
        if let Some(meta) = &meta {
            debug!(meta_uid = meta.uid, uid_foreign, table, "Using focus keyword meta row");
        }
        Ok(meta)
    }
}
