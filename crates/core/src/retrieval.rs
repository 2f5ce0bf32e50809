//! Retriever trait: the optional retrieval-augmentation capability.
//!
//! A retrieval service may offer a synthesized answer, a raw passage
//! search, or both. Methods a backend lacks keep the default body and
//! report [`RetrievalError::Unsupported`], which lets the caller fall back
//! from synthesis to search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A passage returned by a raw search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    /// Produce a synthesized answer for `query`, scoped by an optional tenant filter.
    async fn synthesize(
        &self,
        _query: &str,
        _filter: Option<&str>,
    ) -> Result<String, RetrievalError> {
        Err(RetrievalError::Unsupported("synthesize"))
    }

    /// Return raw passages relevant to `query`.
    async fn search(
        &self,
        _query: &str,
        _filter: Option<&str>,
    ) -> Result<Vec<RetrievalHit>, RetrievalError> {
        Err(RetrievalError::Unsupported("search"))
    }
}
