//! Wire protocol shared by the gateway and the client.
//!
//! - Request: `POST /api/chat` with `{ "messages": [ChatMessage] }`
//! - Success: a streamed body of newline-delimited JSON objects, one per
//!   line, each `{ "response": "<text fragment>" }`. Extra fields are
//!   permitted and ignored by readers.
//! - Failure: non-success status with `{ "error": "<generic message>" }`.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// Path of the chat endpoint.
pub const CHAT_PATH: &str = "/api/chat";

/// Content type of the streamed response body.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// One transport-level unit of incremental generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl WireChunk {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            response: Some(fragment.into()),
        }
    }

    /// Serialize as a single NDJSON line, newline included.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| "{}".into());
        line.push('\n');
        line
    }
}

/// Structured error body for request-fatal failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_line_is_single_terminated_line() {
        let line = WireChunk::new("multi\nline").to_line();
        assert_eq!(line, "{\"response\":\"multi\\nline\"}\n");
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn chunk_ignores_extra_fields() {
        let chunk: WireChunk =
            serde_json::from_str(r#"{"response":"hi","p":"abc","usage":{"x":1}}"#).unwrap();
        assert_eq!(chunk.response.as_deref(), Some("hi"));

        let empty: WireChunk = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(empty.response.is_none());
    }
}
