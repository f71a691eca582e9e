//! Configuration loading and root folder resolution
//!
//! Every key of the TOML file is optional. A missing or malformed file is
//! reported with a warning and the compiled defaults are used instead, the
//! evaluator never refuses to start because of configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SEO_ROOT_FOLDER";

/// Environment variable overriding the configuration file location
pub const CONFIG_FILE_ENV: &str = "SEO_CONFIG";

/// Directory name used below the platform config/data directories
const APP_DIR: &str = "seo-evaluator";

/// Database file name inside the root folder
const DATABASE_FILE: &str = "seo.db";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding the database
    pub root_folder: Option<PathBuf>,
    /// Explicit database path (default: `<root_folder>/seo.db`)
    pub database: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub evaluation: EvaluationConfig,
    pub frontend: FrontendConfig,
    /// Per-table schema description, keyed by table name
    pub tables: BTreeMap<String, TableSchemaConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Which records are evaluated and where keywords and results live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Page-like table restricted by the subtype allow-list
    pub default_table: String,
    /// Discriminator column of the default table
    pub subtype_field: String,
    /// Evaluation doktypes
    pub allowed_subtypes: Vec<i64>,
    /// Side table holding focus keywords
    pub meta_table: String,
    /// Record field whose presence links the record to the meta table
    pub meta_link_field: String,
    /// Literal keyword field on the record
    pub keyword_field: String,
    /// Table storing evaluation results
    pub evaluation_table: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            default_table: "pages".to_string(),
            subtype_field: "doktype".to_string(),
            allowed_subtypes: vec![1],
            meta_table: "tx_csseo_domain_model_meta".to_string(),
            meta_link_field: "tx_csseo".to_string(),
            keyword_field: "tx_csseo_keyword".to_string(),
            evaluation_table: "tx_csseo_domain_model_evaluation".to_string(),
        }
    }
}

/// Front-end rendering access
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrontendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// URL template per table; placeholders `{base_url}`, `{uid}`, `{language}`
    pub url_templates: BTreeMap<String, String>,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        let mut url_templates = BTreeMap::new();
        url_templates.insert(
            "pages".to_string(),
            "{base_url}/index.php?id={uid}&L={language}".to_string(),
        );
        Self {
            base_url: "http://localhost".to_string(),
            timeout_secs: 30,
            user_agent: format!("seo-evaluator/{}", env!("CARGO_PKG_VERSION")),
            url_templates,
        }
    }
}

/// Localization-related part of a table's schema description
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableSchemaConfig {
    /// Distinct table holding the translations of this table
    pub trans_foreign_table: Option<String>,
    /// Column holding the language pointer
    pub language_field: Option<String>,
    /// Column pointing at the default-language parent record
    pub trans_orig_pointer_field: Option<String>,
}

impl TomlConfig {
    /// Compiled defaults, including the `pages` schema entry
    pub fn compiled_defaults() -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(
            "pages".to_string(),
            TableSchemaConfig {
                trans_foreign_table: None,
                language_field: Some("sys_language_uid".to_string()),
                trans_orig_pointer_field: Some("l10n_parent".to_string()),
            },
        );
        Self {
            tables,
            ..Self::default()
        }
    }

    /// Parse a TOML document; tables not mentioned keep the compiled schema
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut parsed: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        for (name, schema) in Self::compiled_defaults().tables {
            parsed.tables.entry(name).or_insert(schema);
        }
        Ok(parsed)
    }

    /// Load configuration from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration, falling back to compiled defaults on any problem
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("No configuration file found, using compiled defaults");
            return Self::compiled_defaults();
        };

        match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Could not load configuration from {}: {}. Using compiled defaults.",
                    path.display(),
                    e
                );
                Self::compiled_defaults()
            }
        }
    }
}

/// Locate the configuration file
///
/// Priority: explicit path, `SEO_CONFIG`, user config dir, `/etc`.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Root folder resolution
///
/// 1. Command-line argument (highest priority)
/// 2. `SEO_ROOT_FOLDER` environment variable
/// 3. `root_folder` key of the TOML config
/// 4. OS-dependent compiled default
pub struct RootFolderResolver<'a> {
    cli_arg: Option<PathBuf>,
    config: Option<&'a TomlConfig>,
}

impl<'a> RootFolderResolver<'a> {
    pub fn new() -> Self {
        Self {
            cli_arg: None,
            config: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_config(mut self, config: &'a TomlConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = self.config.and_then(|c| c.root_folder.clone()) {
            return path;
        }

        default_root_folder()
    }
}

impl Default for RootFolderResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the root folder and derives paths inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./seo_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_defaults_declare_pages_schema() {
        let config = TomlConfig::compiled_defaults();
        let pages = config.tables.get("pages").unwrap();
        assert_eq!(pages.language_field.as_deref(), Some("sys_language_uid"));
        assert_eq!(pages.trans_orig_pointer_field.as_deref(), Some("l10n_parent"));
        assert!(pages.trans_foreign_table.is_none());
        assert_eq!(config.evaluation.allowed_subtypes, vec![1]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [evaluation]
            allowed_subtypes = [1, 4]

            [tables.news]
            trans_foreign_table = "news_translations"
            "#,
        )
        .unwrap();

        assert_eq!(config.evaluation.allowed_subtypes, vec![1, 4]);
        assert_eq!(config.evaluation.default_table, "pages");
        assert_eq!(config.logging.level, "info");
        assert!(config.tables.contains_key("pages"));
        assert_eq!(
            config.tables["news"].trans_foreign_table.as_deref(),
            Some("news_translations")
        );
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("evaluation = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_initializer_database_path() {
        let initializer = RootFolderInitializer::new(PathBuf::from("/tmp/seo-root"));
        assert_eq!(initializer.database_path(), PathBuf::from("/tmp/seo-root/seo.db"));
    }
}
