//! Chat client and session.
//!
//! [`ChatClient`] posts the whole conversation to the chat endpoint and
//! consumes the streamed answer. [`ChatSession`] owns the conversation,
//! allows one request at a time, and records either the answer or an
//! apology once the request settles.

use async_trait::async_trait;
use relaydesk_core::message::ChatMessage;
use relaydesk_core::protocol::{CHAT_PATH, ChatRequest, ErrorBody};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::consumer::consume;
use crate::error::ClientError;

/// Shown in place of an answer when a request fails.
pub const APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// Delivers a conversation to the assistant and streams back the answer.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// `on_update` receives the accumulated answer after every chunk.
    async fn send(
        &self,
        messages: &[ChatMessage],
        on_update: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, ClientError>;
}

/// HTTP transport for the `POST /api/chat` endpoint.
pub struct ChatClient {
    base_url: String,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{CHAT_PATH}", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn send(
        &self,
        messages: &[ChatMessage],
        on_update: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, ClientError> {
        let body = ChatRequest {
            messages: messages.to_vec(),
        };
        let response = self.client.post(self.endpoint()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        consume(response.bytes_stream(), |text| on_update(text))
            .await
            .map_err(|e| ClientError::Stream(e.to_string()))
    }
}

/// Clears the busy flag however the request ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A conversation with one request in flight at most.
pub struct ChatSession<T: ChatTransport = ChatClient> {
    transport: T,
    history: Mutex<Vec<ChatMessage>>,
    busy: AtomicBool,
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            history: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.clone()
    }

    /// Send a user message and stream the answer through `on_update`.
    ///
    /// On failure the apology is recorded as the assistant turn and the
    /// error is returned. A send while another is in flight fails with
    /// [`ClientError::Busy`] and leaves the history untouched.
    pub async fn send(
        &self,
        text: &str,
        mut on_update: impl FnMut(&str) + Send,
    ) -> Result<String, ClientError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let snapshot = {
            let mut history = self.history.lock().await;
            history.push(ChatMessage::user(text));
            history.clone()
        };

        let result = self.transport.send(&snapshot, &mut on_update).await;

        let reply = match &result {
            Ok(answer) => {
                debug!(chars = answer.len(), "Answer received");
                answer.clone()
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                APOLOGY.to_string()
            }
        };
        self.history.lock().await.push(ChatMessage::assistant(reply));

        result
    }
}
