//! Front-end content resolution
//!
//! Fetches the rendered page of a content record from the CMS front end.
//! A page that cannot be fetched is not an error: the record is skipped.

use crate::db::CandidateRecord;
use crate::scoring::document::canonical_url;
use async_trait::async_trait;
use seo_common::config::FrontendConfig;
use seo_common::{Error, Result};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Rendered representation of a content record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendPage {
    /// Rendered HTML, `None` if the front end returned nothing usable
    pub content: Option<String>,
    /// Canonical URL of the page
    pub url: String,
}

impl FrontendPage {
    /// Content if present and not blank
    pub fn usable_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Produces the rendered front-end page of a record
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// `Ok(None)` means "nothing to evaluate"; `Err` aborts the sweep
    async fn resolve(&self, candidate: &CandidateRecord) -> Result<Option<FrontendPage>>;
}

/// Resolves pages over HTTP using per-table URL templates
pub struct HttpContentResolver {
    http_client: reqwest::Client,
    base_url: String,
    url_templates: BTreeMap<String, String>,
}

impl HttpContentResolver {
    pub fn new(config: &FrontendConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            url_templates: config.url_templates.clone(),
        })
    }

    /// Front-end URL of a record, `None` if its table has no template
    pub fn url_for(&self, candidate: &CandidateRecord) -> Option<String> {
        let template = self.url_templates.get(&candidate.table)?;
        Some(
            template
                .replace("{base_url}", &self.base_url)
                .replace("{uid}", &candidate.uid.to_string())
                .replace("{language}", &candidate.language.to_string()),
        )
    }
}

#[async_trait]
impl ContentResolver for HttpContentResolver {
    async fn resolve(&self, candidate: &CandidateRecord) -> Result<Option<FrontendPage>> {
        let Some(url) = self.url_for(candidate) else {
            debug!(table = %candidate.table, "No front-end URL template for table");
            return Ok(None);
        };

        debug!(uid = candidate.uid, url = %url, "Fetching front-end page");

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(uid = candidate.uid, url = %url, "Front-end request failed: {}", e);
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(uid = candidate.uid, url = %url, status = status.as_u16(), "Front-end returned error status");
            return Ok(None);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(uid = candidate.uid, url = %url, "Failed to read front-end response: {}", e);
                return Ok(None);
            }
        };

        if body.trim().is_empty() {
            return Ok(Some(FrontendPage { content: None, url }));
        }

        let canonical = canonical_url(&body).unwrap_or(url);
        Ok(Some(FrontendPage {
            content: Some(body),
            url: canonical,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use serde_json::Map;
    use tokio::net::TcpListener;

    const CANONICAL_PAGE: &str = r#"<html><head>
<link rel="canonical" href="https://example.org/coffee">
</head><body><h1>Coffee</h1></body></html>"#;

    /// Front end on a random local port: `/page/:uid` renders, `/empty/:uid`
    /// is blank, `/gone/:uid` is a 404
    async fn spawn_frontend() -> String {
        let app = Router::new()
            .route("/page/:uid", get(|| async { CANONICAL_PAGE }))
            .route("/plain/:uid", get(|| async { "<html><body>plain</body></html>" }))
            .route("/empty/:uid", get(|| async { "" }))
            .route("/gone/:uid", get(|| async { (StatusCode::NOT_FOUND, "gone") }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn resolver_for(base_url: &str) -> HttpContentResolver {
        let mut url_templates = BTreeMap::new();
        for table in ["page", "plain", "empty", "gone"] {
            url_templates.insert(table.to_string(), format!("{{base_url}}/{}/{{uid}}", table));
        }
        let config = FrontendConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            url_templates,
            ..FrontendConfig::default()
        };
        HttpContentResolver::new(&config).unwrap()
    }

    fn candidate(table: &str, uid: i64, language: i64) -> CandidateRecord {
        CandidateRecord {
            uid,
            table: table.to_string(),
            subtype: Some(1),
            language,
            translation_parent: None,
            fields: Map::new(),
        }
    }

    #[test]
    fn test_url_for_pages() {
        let config = FrontendConfig {
            base_url: "https://example.org/".to_string(),
            ..FrontendConfig::default()
        };
        let resolver = HttpContentResolver::new(&config).unwrap();

        assert_eq!(
            resolver.url_for(&candidate("pages", 42, 1)).as_deref(),
            Some("https://example.org/index.php?id=42&L=1")
        );
    }

    #[test]
    fn test_url_for_unknown_table() {
        let resolver = HttpContentResolver::new(&FrontendConfig::default()).unwrap();
        assert_eq!(resolver.url_for(&candidate("tt_news", 1, 0)), None);
    }

    #[tokio::test]
    async fn test_unknown_table_resolves_to_none() {
        let resolver = HttpContentResolver::new(&FrontendConfig::default()).unwrap();
        let page = resolver.resolve(&candidate("tt_news", 1, 0)).await.unwrap();
        assert!(page.is_none());
    }

    #[test]
    fn test_usable_content() {
        let blank = FrontendPage {
            content: Some("  \n".to_string()),
            url: "u".to_string(),
        };
        assert_eq!(blank.usable_content(), None);

        let page = FrontendPage {
            content: Some("<p>x</p>".to_string()),
            url: "u".to_string(),
        };
        assert_eq!(page.usable_content(), Some("<p>x</p>"));
    }

    #[tokio::test]
    async fn test_canonical_link_overrides_request_url() {
        let resolver = resolver_for(&spawn_frontend().await);

        let page = resolver.resolve(&candidate("page", 3, 0)).await.unwrap().unwrap();

        assert_eq!(page.url, "https://example.org/coffee");
        assert_eq!(page.usable_content(), Some(CANONICAL_PAGE));
    }

    #[tokio::test]
    async fn test_request_url_without_canonical_link() {
        let base_url = spawn_frontend().await;
        let resolver = resolver_for(&base_url);

        let page = resolver.resolve(&candidate("plain", 3, 0)).await.unwrap().unwrap();

        assert_eq!(page.url, format!("{}/plain/3", base_url));
    }

    #[tokio::test]
    async fn test_empty_body_has_no_content() {
        let base_url = spawn_frontend().await;
        let resolver = resolver_for(&base_url);

        let page = resolver.resolve(&candidate("empty", 3, 0)).await.unwrap().unwrap();

        assert_eq!(page.content, None);
        assert_eq!(page.url, format!("{}/empty/3", base_url));
    }

    #[tokio::test]
    async fn test_error_status_resolves_to_none() {
        let resolver = resolver_for(&spawn_frontend().await);
        assert!(resolver.resolve(&candidate("gone", 3, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_frontend_resolves_to_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let resolver = resolver_for(&format!("http://{}", addr));

        assert!(resolver.resolve(&candidate("page", 3, 0)).await.unwrap().is_none());
    }
}
