//! `POST /api/chat`: context assembly plus Stream Relay.
//!
//! Each provider content chunk becomes exactly one NDJSON line
//! `{"response": "..."}`. Failures before the stream starts produce one
//! structured error; after that the body simply ends.

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use relaydesk_core::protocol::{ChatRequest, ErrorBody, NDJSON_CONTENT_TYPE, WireChunk};
use relaydesk_core::provider::{ModelRequest, StreamChunk};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::SharedState;

/// Request-fatal failures. Messages are generic; details go to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatError {
    InvalidBody,
    ModelFailed,
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody => StatusCode::BAD_REQUEST,
            Self::ModelFailed => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidBody => "Invalid request body",
            Self::ModelFailed => "Model request failed",
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.message()))).into_response()
    }
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ChatError> {
    let request_id = Uuid::new_v4();

    let Json(payload) = payload.map_err(|rejection| {
        warn!(%request_id, error = %rejection, "Rejected chat request body");
        ChatError::InvalidBody
    })?;

    info!(%request_id, messages = payload.messages.len(), "Chat request");

    let assembled = state.assembler.assemble(payload.messages).await;
    info!(%request_id, layers = ?assembled.layer_names(), "Context assembled");

    let request = ModelRequest {
        model: state.model.clone(),
        messages: assembled.messages,
        temperature: state.temperature,
        max_tokens: Some(state.max_tokens),
    };

    let rx = state.provider.stream(request).await.map_err(|e| {
        warn!(%request_id, provider = state.provider.name(), error = %e, "Model request failed");
        ChatError::ModelFailed
    })?;

    let body = ReceiverStream::new(rx)
        .take_while(move |item| match item {
            Ok(chunk) => {
                if let Some(usage) = &chunk.usage {
                    debug!(%request_id, total_tokens = usage.total_tokens, "Model usage");
                }
                true
            }
            Err(e) => {
                warn!(%request_id, error = %e, "Model stream ended early");
                false
            }
        })
        .filter_map(|item| item.ok().and_then(frame));

    Ok((
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(body),
    )
        .into_response())
}

/// Frame one provider chunk as an NDJSON line. Chunks without text produce nothing.
fn frame(chunk: StreamChunk) -> Option<Result<Bytes, Infallible>> {
    let text = chunk.content.filter(|c| !c.is_empty())?;
    Some(Ok(Bytes::from(WireChunk::new(text).to_line())))
}
