//! # RelayDesk Core
//!
//! Domain types, capability traits, and error definitions for the RelayDesk
//! chat front end. This crate has **zero framework dependencies**: it defines
//! the data model that the context pipeline, the gateway, and the client all
//! agree on.
//!
//! ## Design Philosophy
//!
//! External collaborators (the model-execution backend, the retrieval
//! service) are traits here. Implementations live in their respective crates,
//! which keeps the assembly pipeline testable with stub capabilities.

pub mod error;
pub mod knowledge;
pub mod message;
pub mod protocol;
pub mod provider;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use error::{LoadError, ProviderError, RetrievalError};
pub use knowledge::{Brand, CompactContext, DirectivesDocument, FaqEntry, KnowledgeDocument};
pub use message::{ChatMessage, Role, latest_user_content};
pub use protocol::{CHAT_PATH, ChatRequest, ErrorBody, NDJSON_CONTENT_TYPE, WireChunk};
pub use provider::{ChunkReceiver, ModelRequest, Provider, StreamChunk, Usage};
pub use retrieval::{RetrievalHit, Retriever};
