//! Candidate record selection
//!
//! Builds `SELECT * FROM <table> WHERE ...` with bound parameters over host
//! content tables and converts each row into a `CandidateRecord`.

use seo_common::db::checked_identifier;
use seo_common::Result;
use serde_json::{json, Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, QueryBuilder, Row, Sqlite, SqlitePool, ValueRef};

/// Read-only snapshot of one content record
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub uid: i64,
    /// Table the record was read from
    pub table: String,
    /// Doktype, when the table has a subtype column
    pub subtype: Option<i64>,
    /// Language pointer, 0 for the default language
    pub language: i64,
    /// Default-language parent, for translated records
    pub translation_parent: Option<i64>,
    /// All columns of the row
    pub fields: Map<String, Value>,
}

impl CandidateRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// True if the column exists and is not NULL
    pub fn has_value(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(value) if !value.is_null())
    }

    /// Column value as text; numbers are stringified, NULL/missing is empty
    pub fn field_text(&self, name: &str) -> String {
        match self.fields.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    pub fn field_i64(&self, name: &str) -> Option<i64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Columns that give meaning to a table's rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordColumns {
    pub subtype_field: Option<String>,
    pub language_field: Option<String>,
    pub parent_field: Option<String>,
}

/// A single WHERE condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq(String, i64),
    Gt(String, i64),
    In(String, Vec<i64>),
}

impl Predicate {
    fn column(&self) -> &str {
        match self {
            Predicate::Eq(c, _) | Predicate::Gt(c, _) | Predicate::In(c, _) => c,
        }
    }
}

/// Parameterized selection over one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    table: String,
    predicates: Vec<Predicate>,
}

impl CandidateQuery {
    pub fn new(table: &str) -> Result<Self> {
        Ok(Self {
            table: checked_identifier(table)?.to_string(),
            predicates: Vec::new(),
        })
    }

    pub fn and_where(mut self, predicate: Predicate) -> Result<Self> {
        checked_identifier(predicate.column())?;
        self.predicates.push(predicate);
        Ok(self)
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    fn builder(&self) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new(format!("SELECT * FROM {}", self.table));

        for (i, predicate) in self.predicates.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            match predicate {
                Predicate::Eq(column, value) => {
                    builder.push(format!("{} = ", column));
                    builder.push_bind(*value);
                }
                Predicate::Gt(column, value) => {
                    builder.push(format!("{} > ", column));
                    builder.push_bind(*value);
                }
                Predicate::In(_, values) if values.is_empty() => {
                    builder.push("1 = 0");
                }
                Predicate::In(column, values) => {
                    builder.push(format!("{} IN (", column));
                    let mut list = builder.separated(", ");
                    for value in values {
                        list.push_bind(*value);
                    }
                    list.push_unseparated(")");
                }
            }
        }

        builder.push(" ORDER BY uid ASC");
        builder
    }

    /// SQL text with `?` placeholders
    pub fn sql(&self) -> String {
        self.builder().sql().to_string()
    }

    pub async fn fetch_all(
        &self,
        pool: &SqlitePool,
        columns: &RecordColumns,
    ) -> Result<Vec<CandidateRecord>> {
        let mut builder = self.builder();
        let rows = builder.build().fetch_all(pool).await?;

        Ok(rows
            .iter()
            .map(|row| record_from_row(row, &self.table, columns))
            .collect())
    }
}

fn record_from_row(row: &SqliteRow, table: &str, columns: &RecordColumns) -> CandidateRecord {
    let mut fields = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        fields.insert(column.name().to_string(), column_value(row, i));
    }

    let lookup = |name: &Option<String>| -> Option<i64> {
        name.as_deref()
            .and_then(|n| fields.get(n))
            .and_then(Value::as_i64)
    };
    let uid = fields.get("uid").and_then(Value::as_i64).unwrap_or_default();
    let subtype = lookup(&columns.subtype_field);
    let language = lookup(&columns.language_field).unwrap_or(0);
    let translation_parent = lookup(&columns.parent_field).filter(|parent| *parent > 0);

    CandidateRecord {
        uid,
        table: table.to_string(),
        subtype,
        language,
        translation_parent,
        fields,
    }
}

/// Convert an SQLite value to JSON (TEXT, INTEGER, REAL; anything else is null)
fn column_value(row: &SqliteRow, index: usize) -> Value {
    row.try_get_raw(index)
        .ok()
        .and_then(|raw| {
            if raw.is_null() {
                Some(Value::Null)
            } else {
                row.try_get::<String, _>(index)
                    .ok()
                    .map(Value::String)
                    .or_else(|| row.try_get::<i64, _>(index).ok().map(|v| json!(v)))
                    .or_else(|| row.try_get::<f64, _>(index).ok().map(|v| json!(v)))
            }
        })
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE pages (
                uid INTEGER PRIMARY KEY,
                doktype INTEGER NOT NULL DEFAULT 1,
                sys_language_uid INTEGER NOT NULL DEFAULT 0,
                l10n_parent INTEGER NOT NULL DEFAULT 0,
                title TEXT,
                tx_csseo_keyword TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        for (uid, doktype, lang, parent, title) in [
            (1, 1, 0, 0, "Home"),
            (2, 254, 0, 0, "Folder"),
            (3, 1, 1, 1, "Startseite"),
            (4, 4, 0, 0, "Shortcut"),
        ] {
            sqlx::query(
                "INSERT INTO pages (uid, doktype, sys_language_uid, l10n_parent, title) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(uid)
            .bind(doktype)
            .bind(lang)
            .bind(parent)
            .bind(title)
            .execute(&pool)
            .await
            .unwrap();
        }

        pool
    }

    fn page_columns() -> RecordColumns {
        RecordColumns {
            subtype_field: Some("doktype".to_string()),
            language_field: Some("sys_language_uid".to_string()),
            parent_field: Some("l10n_parent".to_string()),
        }
    }

    #[test]
    fn test_sql_shape() {
        let query = CandidateQuery::new("pages")
            .unwrap()
            .and_where(Predicate::In("doktype".to_string(), vec![1, 4]))
            .unwrap()
            .and_where(Predicate::Gt("sys_language_uid".to_string(), 0))
            .unwrap()
            .and_where(Predicate::Eq("l10n_parent".to_string(), 7))
            .unwrap();

        assert_eq!(
            query.sql(),
            "SELECT * FROM pages WHERE doktype IN (?, ?) AND sys_language_uid > ? AND l10n_parent = ? ORDER BY uid ASC"
        );
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        assert!(CandidateQuery::new("pages;--").is_err());
        assert!(CandidateQuery::new("pages")
            .unwrap()
            .and_where(Predicate::Eq("uid or 1=1".to_string(), 1))
            .is_err());
    }

    #[tokio::test]
    async fn test_in_filter() {
        let pool = setup_test_db().await;
        let records = CandidateQuery::new("pages")
            .unwrap()
            .and_where(Predicate::In("doktype".to_string(), vec![1]))
            .unwrap()
            .fetch_all(&pool, &page_columns())
            .await
            .unwrap();

        let uids: Vec<i64> = records.iter().map(|r| r.uid).collect();
        assert_eq!(uids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_empty_in_list_selects_nothing() {
        let pool = setup_test_db().await;
        let records = CandidateQuery::new("pages")
            .unwrap()
            .and_where(Predicate::In("doktype".to_string(), vec![]))
            .unwrap()
            .fetch_all(&pool, &page_columns())
            .await
            .unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_record_fields_and_columns() {
        let pool = setup_test_db().await;
        let records = CandidateQuery::new("pages")
            .unwrap()
            .and_where(Predicate::Gt("sys_language_uid".to_string(), 0))
            .unwrap()
            .fetch_all(&pool, &page_columns())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.uid, 3);
        assert_eq!(record.table, "pages");
        assert_eq!(record.subtype, Some(1));
        assert_eq!(record.language, 1);
        assert_eq!(record.translation_parent, Some(1));
        assert_eq!(record.field_text("title"), "Startseite");
        assert!(!record.has_value("tx_csseo_keyword"));
        assert!(record.field("tx_csseo_keyword").is_some());
        assert_eq!(record.field_text("missing"), "");
    }

    #[tokio::test]
    async fn test_missing_table_is_database_error() {
        let pool = setup_test_db().await;
        let result = CandidateQuery::new("tt_news")
            .unwrap()
            .fetch_all(&pool, &RecordColumns::default())
            .await;

        assert!(matches!(result, Err(seo_common::Error::Database(_))));
    }
}
