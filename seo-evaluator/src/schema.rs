//! Table schema registry
//!
//! The subset of the CMS table description the evaluator needs: how a
//! table stores its translations.

use seo_common::config::TableSchemaConfig;
use std::collections::BTreeMap;

/// Localization-related schema of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub trans_foreign_table: Option<String>,
    pub language_field: Option<String>,
    pub trans_orig_pointer_field: Option<String>,
}

/// How translated variants of a table are found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizationStrategy {
    /// Translations live in a distinct table
    ForeignTable(String),
    /// Translations are rows of the same table with language > 0
    LanguageField(String),
    /// No translations declared
    None,
}

impl TableSchema {
    /// Foreign table wins when both are declared
    pub fn localization_strategy(&self) -> LocalizationStrategy {
        if let Some(table) = non_empty(&self.trans_foreign_table) {
            LocalizationStrategy::ForeignTable(table.to_string())
        } else if let Some(field) = non_empty(&self.language_field) {
            LocalizationStrategy::LanguageField(field.to_string())
        } else {
            LocalizationStrategy::None
        }
    }

    pub fn parent_pointer_field(&self) -> Option<&str> {
        non_empty(&self.trans_orig_pointer_field)
    }

    pub fn language_field(&self) -> Option<&str> {
        non_empty(&self.language_field)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl From<&TableSchemaConfig> for TableSchema {
    fn from(config: &TableSchemaConfig) -> Self {
        Self {
            trans_foreign_table: config.trans_foreign_table.clone(),
            language_field: config.language_field.clone(),
            trans_orig_pointer_field: config.trans_orig_pointer_field.clone(),
        }
    }
}

/// Schema descriptions keyed by table name
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(tables: &BTreeMap<String, TableSchemaConfig>) -> Self {
        Self {
            tables: tables
                .iter()
                .map(|(name, config)| (name.clone(), TableSchema::from(config)))
                .collect(),
        }
    }

    pub fn with_table(mut self, name: impl Into<String>, schema: TableSchema) -> Self {
        self.tables.insert(name.into(), schema);
        self
    }

    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(table)
    }
}
