//! Database models

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Stored outcome of evaluating one content record
///
/// Unique by `(uid_foreign, tablenames)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Primary key, `None` until the row has been inserted
    pub uid: Option<i64>,
    pub uid_foreign: i64,
    pub tablenames: String,
    pub url: String,
    /// JSON text of the scoring result
    pub results: String,
    pub crdate: i64,
    pub tstamp: i64,
}

impl Evaluation {
    /// Unsaved evaluation bound to a content record
    pub fn new(uid_foreign: i64, tablenames: impl Into<String>) -> Self {
        Self {
            uid: None,
            uid_foreign,
            tablenames: tablenames.into(),
            url: String::new(),
            results: "{}".to_string(),
            crdate: 0,
            tstamp: 0,
        }
    }

    pub fn is_new(&self) -> bool {
        self.uid.is_none()
    }

    /// Replace the result payload with the serialized value
    pub fn set_results<T: Serialize>(&mut self, results: &T) -> crate::Result<()> {
        self.results = serde_json::to_string(results)?;
        Ok(())
    }

    /// Result payload as a JSON value
    pub fn results_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.results)?)
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            uid: Some(row.try_get("uid")?),
            uid_foreign: row.try_get("uid_foreign")?,
            tablenames: row.try_get("tablenames")?,
            url: row.try_get("url")?,
            results: row.try_get("results")?,
            crdate: row.try_get("crdate")?,
            tstamp: row.try_get("tstamp")?,
        })
    }
}

/// Focus keyword row of the meta side table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusKeywordMeta {
    pub uid: i64,
    pub uid_foreign: i64,
    pub tablenames: String,
    pub keyword: String,
}

impl FocusKeywordMeta {
    /// Map a meta row; a NULL keyword reads as empty
    pub fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            uid: row.try_get("uid")?,
            uid_foreign: row.try_get("uid_foreign")?,
            tablenames: row.try_get("tablenames")?,
            keyword: row
                .try_get::<Option<String>, _>("keyword")?
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_evaluation_is_new() {
        let evaluation = Evaluation::new(42, "pages");
        assert!(evaluation.is_new());
        assert_eq!(evaluation.uid_foreign, 42);
        assert_eq!(evaluation.tablenames, "pages");
        assert_eq!(evaluation.results_json().unwrap(), json!({}));
    }

    #[test]
    fn test_set_results_overwrites() {
        let mut evaluation = Evaluation::new(1, "pages");
        evaluation.set_results(&json!({"h1": {"state": "good"}})).unwrap();
        evaluation.set_results(&json!({"h2": {"state": "bad"}})).unwrap();
        assert_eq!(evaluation.results_json().unwrap(), json!({"h2": {"state": "bad"}}));
    }
}
