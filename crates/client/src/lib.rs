//! Streaming chat client for RelayDesk.
//!
//! Reads the chat endpoint's NDJSON stream, accumulates the answer, and
//! renders it as escaped markup with clickable links.

pub mod consumer;
pub mod decoder;
pub mod error;
pub mod linkify;
pub mod session;

pub use consumer::{StreamConsumer, consume};
pub use decoder::Utf8StreamDecoder;
pub use error::ClientError;
pub use linkify::{escape_html, render};
pub use session::{APOLOGY, ChatClient, ChatSession, ChatTransport};
