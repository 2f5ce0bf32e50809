//! Knowledge Store Loader.
//!
//! Fetches the FAQ knowledge document and the directives document from a
//! static source. Every failure (missing file, non-success status, network
//! fault, malformed JSON) resolves to `None`: missing knowledge degrades to
//! "no extra context", never to a failed request.
//!
//! Documents are re-read on every call. There is no cache, so concurrent
//! requests may observe different snapshots while a document is replaced.

use async_trait::async_trait;
use relaydesk_config::KnowledgeConfig;
use relaydesk_core::error::LoadError;
use relaydesk_core::knowledge::{DirectivesDocument, KnowledgeDocument};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// A static source addressed by logical path.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Fetch the raw text stored at `path`.
    async fn fetch(&self, path: &str) -> Result<String, LoadError>;
}

/// Documents stored in a local directory.
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentSource for FsSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        let full = self.root.join(path.trim_start_matches('/'));
        tokio::fs::read_to_string(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(full.display().to_string())
            } else {
                LoadError::Io {
                    path: full.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }
}

/// Documents served over HTTP from a base URL.
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoadError::Network {
                path: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LoadError::NotFound(url));
        }
        if !status.is_success() {
            return Err(LoadError::Status {
                path: url,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| LoadError::Network {
            path: url,
            reason: e.to_string(),
        })
    }
}

/// Loads the two documents the assembler consults.
#[derive(Clone)]
pub struct DocumentLoader {
    source: Arc<dyn DocumentSource>,
    faq_path: String,
    directives_path: String,
}

impl DocumentLoader {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        faq_path: impl Into<String>,
        directives_path: impl Into<String>,
    ) -> Self {
        Self {
            source,
            faq_path: faq_path.into(),
            directives_path: directives_path.into(),
        }
    }

    /// Pick a filesystem or HTTP source depending on the configured base.
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        let source: Arc<dyn DocumentSource> = if config.is_remote() {
            Arc::new(HttpSource::new(&config.base))
        } else {
            Arc::new(FsSource::new(&config.base))
        };
        Self::new(source, &config.faq_path, &config.directives_path)
    }

    pub async fn load_knowledge(&self) -> Option<KnowledgeDocument> {
        self.load(&self.faq_path, KnowledgeDocument::from_json).await
    }

    pub async fn load_directives(&self) -> Option<DirectivesDocument> {
        self.load(&self.directives_path, DirectivesDocument::from_json)
            .await
    }

    async fn load<T>(
        &self,
        path: &str,
        parse: fn(&str) -> Result<T, serde_json::Error>,
    ) -> Option<T> {
        let result = match self.source.fetch(path).await {
            Ok(text) => parse(&text).map_err(|e| LoadError::Parse {
                path: path.to_string(),
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        };

        match result {
            Ok(doc) => Some(doc),
            Err(e) if e.is_not_found() => {
                debug!(source = %self.source.describe(), path, "Document absent");
                None
            }
            Err(e) => {
                warn!(source = %self.source.describe(), error = %e, "Document unavailable, continuing without it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader_for(dir: &tempfile::TempDir) -> DocumentLoader {
        DocumentLoader::new(
            Arc::new(FsSource::new(dir.path())),
            "kb.json",
            "directives.json",
        )
    }

    #[tokio::test]
    async fn loads_documents_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("kb.json"),
            r#"{"brand":{"name":"Acme"},"faq":[{"q":"Hours?","a":"9 to 5"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("directives.json"), r#"{"tone":"warm"}"#).unwrap();

        let loader = loader_for(&dir);
        let kb = loader.load_knowledge().await.unwrap();
        assert_eq!(kb.brand_name(), Some("Acme"));
        assert_eq!(kb.faq.len(), 1);

        let directives = loader.load_directives().await.unwrap();
        assert_eq!(directives.get("tone").unwrap(), "warm");
    }

    #[tokio::test]
    async fn missing_documents_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(&dir);
        assert!(loader.load_knowledge().await.is_none());
        assert!(loader.load_directives().await.is_none());
    }

    #[tokio::test]
    async fn malformed_documents_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kb.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("directives.json"), "[1, 2]").unwrap();

        let loader = loader_for(&dir);
        assert!(loader.load_knowledge().await.is_none());
        assert!(loader.load_directives().await.is_none());
    }

    #[tokio::test]
    async fn fs_source_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsSource::new(dir.path()).fetch("/missing.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unreachable_http_source_is_absent() {
        // Port 9 (discard) on localhost refuses connections.
        let loader = DocumentLoader::new(
            Arc::new(HttpSource::new("http://127.0.0.1:9/assets")),
            "kb.json",
            "directives.json",
        );
        assert!(loader.load_knowledge().await.is_none());
    }

    #[test]
    fn http_source_joins_paths() {
        let source = HttpSource::new("https://assets.example.test/");
        assert_eq!(source.url_for("/kb.json"), "https://assets.example.test/kb.json");
        assert_eq!(source.url_for("kb.json"), "https://assets.example.test/kb.json");
    }

    #[test]
    fn config_selects_source_kind() {
        let remote = KnowledgeConfig {
            base: "https://assets.example.test".into(),
            ..KnowledgeConfig::default()
        };
        assert_eq!(
            DocumentLoader::from_config(&remote).source.describe(),
            "https://assets.example.test"
        );

        let local = KnowledgeConfig::default();
        assert_eq!(DocumentLoader::from_config(&local).source.describe(), "public");
    }
}
