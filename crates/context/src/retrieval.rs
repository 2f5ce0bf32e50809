//! Retrieval Augmentor.
//!
//! Asks an optional retrieval service for context relevant to the latest
//! user message. A synthesized answer is preferred; raw search is used only
//! when the backend does not offer synthesis. Every other failure skips the
//! layer.

use async_trait::async_trait;
use relaydesk_config::RetrievalConfig;
use relaydesk_core::error::RetrievalError;
use relaydesk_core::retrieval::{RetrievalHit, Retriever};
use serde::Deserialize;
use tracing::{debug, warn};

/// Fetch retrieval context for `query`, or `None` when there is nothing to add.
pub async fn augment(retriever: &dyn Retriever, query: &str, filter: Option<&str>) -> Option<String> {
    if query.trim().is_empty() {
        return None;
    }

    let result = match retriever.synthesize(query, filter).await {
        Err(RetrievalError::Unsupported(_)) => {
            debug!(retriever = retriever.name(), "Synthesis unsupported, falling back to search");
            retriever
                .search(query, filter)
                .await
                .map(|hits| join_hits(&hits))
        }
        other => other,
    };

    match result {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(RetrievalError::Unsupported(_)) => None,
        Err(e) => {
            warn!(retriever = retriever.name(), error = %e, "Retrieval failed, skipping layer");
            None
        }
    }
}

fn join_hits(hits: &[RetrievalHit]) -> String {
    hits.iter()
        .filter(|hit| !hit.content.trim().is_empty())
        .map(|hit| match &hit.source {
            Some(source) => format!("[{source}] {}", hit.content.trim()),
            None => hit.content.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Retrieval service reached over HTTP.
///
/// `POST {base}/ai-search` returns `{"response": ...}` and
/// `POST {base}/search` returns `{"data": [{"content": ..., "filename": ..., "score": ...}]}`.
pub struct HttpRetriever {
    base_url: String,
    api_key: Option<String>,
    synthesize: bool,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SynthesisResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    #[serde(default)]
    content: String,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    score: Option<f32>,
}

impl HttpRetriever {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            synthesize: true,
            client: reqwest::Client::new(),
        }
    }

    /// Disable the synthesis endpoint so only raw search is used.
    pub fn with_synthesis(mut self, enabled: bool) -> Self {
        self.synthesize = enabled;
        self
    }

    /// Build a retriever when retrieval is enabled and a URL is configured.
    pub fn from_config(config: &RetrievalConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let url = config.url.as_deref()?;
        Some(Self::new(url, config.api_key.clone()).with_synthesis(config.synthesize))
    }

    fn request_body(query: &str, filter: Option<&str>) -> serde_json::Value {
        let mut body = serde_json::json!({ "query": query });
        if let Some(tenant) = filter {
            body["filters"] = serde_json::json!({
                "type": "eq",
                "key": "tenant",
                "value": tenant,
            });
        }
        body
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<String, RetrievalError> {
        let mut request = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| RetrievalError::Request(e.to_string()))
    }
}

fn parse_synthesis(text: &str) -> Result<String, RetrievalError> {
    let parsed: SynthesisResponse =
        serde_json::from_str(text).map_err(|e| RetrievalError::Parse(e.to_string()))?;
    Ok(parsed.response.unwrap_or_default())
}

fn parse_search(text: &str) -> Result<Vec<RetrievalHit>, RetrievalError> {
    let parsed: SearchResponse =
        serde_json::from_str(text).map_err(|e| RetrievalError::Parse(e.to_string()))?;
    Ok(parsed
        .data
        .into_iter()
        .map(|item| RetrievalHit {
            content: item.content,
            source: item.filename,
            score: item.score,
        })
        .collect())
}

#[async_trait]
impl Retriever for HttpRetriever {
    fn name(&self) -> &str {
        "http"
    }

    async fn synthesize(&self, query: &str, filter: Option<&str>) -> Result<String, RetrievalError> {
        if !self.synthesize {
            return Err(RetrievalError::Unsupported("synthesize"));
        }
        let text = self
            .post("ai-search", Self::request_body(query, filter))
            .await?;
        parse_synthesis(&text)
    }

    async fn search(
        &self,
        query: &str,
        filter: Option<&str>,
    ) -> Result<Vec<RetrievalHit>, RetrievalError> {
        let text = self.post("search", Self::request_body(query, filter)).await?;
        parse_search(&text)
    }
}
