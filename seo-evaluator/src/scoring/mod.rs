//! Scoring engine
//!
//! Runs a registry of independent checks against a rendered page and a
//! focus keyword. Checks are pure: same `(content, keyword)` in, same result
//! out. They may report configuration problems through `Diagnostics`.
//!
//! # Example
//! ```rust,ignore
//! let engine = ScoringEngine::with_default_checks();
//! let mut diagnostics = Diagnostics::new();
//! let result = engine.evaluate(&html, "coffee", &mut diagnostics);
//! println!("{}% good", result.summary.percentage);
//! ```

pub mod checks;
pub mod document;

pub use document::PageDocument;

use crate::diagnostics::Diagnostics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Outcome class of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Bad,
    Warning,
    Good,
}

/// Result of one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub state: CheckState,
    /// Measured quantity (length, occurrences, ...) when the check has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Check-specific details (JSON object)
    pub details: Value,
}

impl CheckResult {
    pub fn new(state: CheckState) -> Self {
        Self {
            state,
            count: None,
            details: Value::Object(Default::default()),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Aggregate over all check results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub good: usize,
    pub warning: usize,
    pub bad: usize,
    pub total: usize,
    /// Share of good checks, 0-100
    pub percentage: u32,
}

/// Named results of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub checks: BTreeMap<String, CheckResult>,
    pub summary: ScoreSummary,
}

impl EvaluationResult {
    /// Build the result and its summary from named check results
    pub fn from_checks(checks: BTreeMap<String, CheckResult>) -> Self {
        let count = |state| checks.values().filter(|r| r.state == state).count();
        let good = count(CheckState::Good);
        let warning = count(CheckState::Warning);
        let bad = count(CheckState::Bad);
        let total = checks.len();
        let percentage = if total == 0 {
            0
        } else {
            ((good as f64 / total as f64) * 100.0).round() as u32
        };

        Self {
            summary: ScoreSummary {
                good,
                warning,
                bad,
                total,
                percentage,
            },
            checks,
        }
    }

    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.checks.get(name)
    }
}

/// A single SEO heuristic
pub trait Check: Send + Sync {
    /// Key of the result in the evaluation payload
    fn name(&self) -> &'static str;

    /// Score the page; `keyword` is trimmed and may be empty
    fn evaluate(
        &self,
        document: &PageDocument,
        keyword: &str,
        diagnostics: &mut Diagnostics,
    ) -> CheckResult;
}

/// Append-only registry of checks
pub struct ScoringEngine {
    checks: Vec<Box<dyn Check>>,
}

impl ScoringEngine {
    /// Engine without any checks
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// Engine with the built-in check catalogue
    pub fn with_default_checks() -> Self {
        let mut engine = Self::empty();
        for check in checks::default_checks() {
            engine.register(check);
        }
        engine
    }

    /// Add a check; a name that is already registered is ignored
    pub fn register(&mut self, check: Box<dyn Check>) -> bool {
        if self.checks.iter().any(|c| c.name() == check.name()) {
            warn!(check = check.name(), "Check already registered, ignoring");
            return false;
        }
        self.checks.push(check);
        true
    }

    pub fn evaluate(&self, content: &str, keyword: &str, diagnostics: &mut Diagnostics) -> EvaluationResult {
        let document = PageDocument::parse(content);
        let keyword = keyword.trim();

        let results: BTreeMap<String, CheckResult> = self
            .checks
            .iter()
            .map(|check| {
                let result = check.evaluate(&document, keyword, diagnostics);
                debug!(check = check.name(), state = ?result.state, "Check complete");
                (check.name().to_string(), result)
            })
            .collect();

        EvaluationResult::from_checks(results)
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::with_default_checks()
    }
}
