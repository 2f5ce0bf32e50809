//! Model-execution provider implementations for RelayDesk.
//!
//! All providers implement the `relaydesk_core::Provider` trait.
//! [`configured::from_config`] builds the one named in the configuration.

pub mod configured;
pub mod openai_compat;

pub use configured::{ConfiguredProvider, from_config};
pub use openai_compat::OpenAiCompatProvider;
