//! Evaluation orchestration
//!
//! A sweep over one table runs two passes: the base pass over the selected
//! records, then exactly one localized pass over their translations. Each
//! record is processed completely (content → keyword → score → store) before
//! the next one starts, and every stored evaluation is committed on its own,
//! so an aborted sweep keeps what it already wrote.
//!
//! Failure semantics:
//! - storage errors abort the sweep and propagate
//! - a record without content is skipped
//! - configuration problems become diagnostics

use crate::db::{CandidateQuery, CandidateRecord, Predicate, RecordColumns};
use crate::diagnostics::Diagnostics;
use crate::schema::{LocalizationStrategy, SchemaRegistry};
use crate::scoring::ScoringEngine;
use crate::services::{ContentResolver, HttpContentResolver, KeywordResolver, ResultStore};
use seo_common::config::{EvaluationConfig, TomlConfig};
use seo_common::db::{checked_identifier, Evaluation};
use seo_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// One record that received an evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluatedEntity {
    pub uid_foreign: i64,
    pub table: String,
    pub url: String,
    pub percentage: u32,
}

/// Outcome of `EvaluationOrchestrator::evaluate`
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub sweep_id: Uuid,
    pub table: String,
    pub uid: i64,
    pub evaluated: Vec<EvaluatedEntity>,
    /// Records selected but without usable content
    pub skipped: usize,
    pub diagnostics: Diagnostics,
}

/// Table, query and column meaning for one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPlan {
    /// Table actually queried; evaluations are keyed by it
    pub table: String,
    pub query: CandidateQuery,
    pub columns: RecordColumns,
}

/// Decide what a pass over `table` selects
///
/// Returns `None` when the localized pass has no translation strategy.
pub fn plan_selection(
    config: &EvaluationConfig,
    schema: &SchemaRegistry,
    table: &str,
    uid: i64,
    localized: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Option<SelectionPlan>> {
    let base_schema = schema.get(table).cloned().unwrap_or_default();
    let mut query_table = table.to_string();
    let mut effective_schema = base_schema.clone();
    let mut subtype_filter = table == config.default_table;
    let mut language_filter = None;

    if localized {
        match base_schema.localization_strategy() {
            LocalizationStrategy::ForeignTable(foreign) => {
                effective_schema = schema.get(&foreign).cloned().unwrap_or_default();
                query_table = foreign;
                // translations are not subtype-filtered
                subtype_filter = false;
            }
            LocalizationStrategy::LanguageField(field) => {
                language_filter = Some(field);
            }
            LocalizationStrategy::None => {
                debug!(table, "No localization declared, localized pass selects nothing");
                return Ok(None);
            }
        }
    }

    let mut query = CandidateQuery::new(&query_table)?;

    if subtype_filter {
        if config.allowed_subtypes.is_empty() && !localized {
            diagnostics.warn(format!(
                "No evaluation doktypes configured, nothing in {} will be evaluated",
                table
            ));
        }
        query = query.and_where(Predicate::In(
            config.subtype_field.clone(),
            config.allowed_subtypes.clone(),
        ))?;
    }

    if let Some(field) = language_filter {
        query = query.and_where(Predicate::Gt(field, 0))?;
    }

    if uid > 0 {
        let column = match (localized, effective_schema.parent_pointer_field()) {
            (true, Some(parent)) => parent,
            _ => "uid",
        };
        query = query.and_where(Predicate::Eq(column.to_string(), uid))?;
    }

    let columns = RecordColumns {
        subtype_field: (query_table == config.default_table).then(|| config.subtype_field.clone()),
        language_field: effective_schema.language_field().map(str::to_string),
        parent_field: effective_schema.parent_pointer_field().map(str::to_string),
    };

    Ok(Some(SelectionPlan {
        table: query_table,
        query,
        columns,
    }))
}

/// Wires selection, content, keyword, scoring and storage together
pub struct EvaluationOrchestrator {
    pool: SqlitePool,
    config: EvaluationConfig,
    schema: SchemaRegistry,
    content: Arc<dyn ContentResolver>,
    keywords: KeywordResolver,
    scoring: ScoringEngine,
    store: ResultStore,
    /// Serializes sweeps; the store's lookup-then-write must not interleave
    sweep_lock: Mutex<()>,
}

impl EvaluationOrchestrator {
    pub fn new(
        pool: SqlitePool,
        config: EvaluationConfig,
        schema: SchemaRegistry,
        content: Arc<dyn ContentResolver>,
        keywords: KeywordResolver,
        scoring: ScoringEngine,
        store: ResultStore,
    ) -> Self {
        Self {
            pool,
            config,
            schema,
            content,
            keywords,
            scoring,
            store,
            sweep_lock: Mutex::new(()),
        }
    }

    /// Orchestrator with HTTP content resolution and the default checks
    pub fn from_config(pool: SqlitePool, config: &TomlConfig) -> Result<Self> {
        let content: Arc<dyn ContentResolver> = Arc::new(HttpContentResolver::new(&config.frontend)?);
        let keywords = KeywordResolver::new(pool.clone(), &config.evaluation)?;
        let store = ResultStore::new(pool.clone(), &config.evaluation.evaluation_table)?;

        Ok(Self::new(
            pool,
            config.evaluation.clone(),
            SchemaRegistry::from_config(&config.tables),
            content,
            keywords,
            ScoringEngine::with_default_checks(),
            store,
        ))
    }

    pub fn default_table(&self) -> &str {
        &self.config.default_table
    }

    /// Evaluate one record (`uid > 0`) or the whole table (`uid == 0`)
    ///
    /// An empty `table` means the default table, a negative uid means 0.
    pub async fn evaluate(&self, table: &str, uid: i64) -> Result<SweepReport> {
        let _guard = self.sweep_lock.lock().await;

        let table = match table.trim() {
            "" => self.config.default_table.clone(),
            name => checked_identifier(name)?.to_string(),
        };
        let uid = uid.max(0);
        let sweep_id = Uuid::new_v4();

        let mut report = SweepReport {
            sweep_id,
            table: table.clone(),
            uid,
            evaluated: Vec::new(),
            skipped: 0,
            diagnostics: Diagnostics::new(),
        };

        let span = info_span!("sweep", %sweep_id, table = %table, uid);
        async {
            info!("Starting evaluation sweep");

            self.run_pass(&table, uid, false, &mut report).await?;
            self.run_pass(&table, uid, true, &mut report).await?;

            info!(
                evaluated = report.evaluated.len(),
                skipped = report.skipped,
                diagnostics = report.diagnostics.len(),
                "Evaluation sweep complete"
            );
            Ok::<(), seo_common::Error>(())
        }
        .instrument(span)
        .await?;

        Ok(report)
    }

    /// Stored evaluation of one record
    pub async fn find_evaluation(&self, uid_foreign: i64, table: &str) -> Result<Option<Evaluation>> {
        self.store.find(uid_foreign, checked_identifier(table)?).await
    }

    async fn run_pass(
        &self,
        table: &str,
        uid: i64,
        localized: bool,
        report: &mut SweepReport,
    ) -> Result<()> {
        let Some(plan) = plan_selection(
            &self.config,
            &self.schema,
            table,
            uid,
            localized,
            &mut report.diagnostics,
        )?
        else {
            return Ok(());
        };

        let candidates = plan.query.fetch_all(&self.pool, &plan.columns).await?;
        debug!(
            table = %plan.table,
            localized,
            candidates = candidates.len(),
            "Selected candidates"
        );

        for candidate in candidates {
            match self.process_candidate(&candidate, &plan.table, &mut report.diagnostics).await? {
                Some(entity) => report.evaluated.push(entity),
                None => report.skipped += 1,
            }
        }

        Ok(())
    }

    async fn process_candidate(
        &self,
        candidate: &CandidateRecord,
        table: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<EvaluatedEntity>> {
        let Some(page) = self.content.resolve(candidate).await? else {
            debug!(uid = candidate.uid, table, "No front-end page, skipping");
            return Ok(None);
        };
        let Some(content) = page.usable_content() else {
            debug!(uid = candidate.uid, table, "Empty front-end content, skipping");
            return Ok(None);
        };

        let keyword = self.keywords.resolve(candidate).await?;

        let mut check_diagnostics = Diagnostics::new();
        let results = self.scoring.evaluate(content, &keyword, &mut check_diagnostics);
        check_diagnostics.set_default_context(&format!("{}:{}", table, candidate.uid));
        diagnostics.extend(check_diagnostics);

        self.store.save(&results, candidate.uid, table, &page.url).await?;

        Ok(Some(EvaluatedEntity {
            uid_foreign: candidate.uid,
            table: table.to_string(),
            url: page.url,
            percentage: results.summary.percentage,
        }))
    }
}
