//! Context Assembler.
//!
//! Turns the client's conversation into the message list sent to the model.
//! Up to four system layers are placed in front of the untouched history,
//! always in this order:
//!
//! ```text
//! [retrieval?, policy?, resources?, baseline?, ...history]
//! ```
//!
//! The most recently conceived layer sits first and the baseline persona sits
//! last, directly before the conversation. Models weight early context more
//! heavily, so this order changes behavior and must stay as it is.

use relaydesk_config::{AppConfig, AssistantConfig};
use relaydesk_core::knowledge::{DirectivesDocument, KnowledgeDocument};
use relaydesk_core::message::{ChatMessage, latest_user_content};
use relaydesk_core::retrieval::Retriever;
use std::sync::Arc;
use tracing::debug;

use crate::faq::{self, FaqLimits};
use crate::loader::DocumentLoader;
use crate::policy;
use crate::retrieval::{HttpRetriever, augment};

/// Label heading the retrieval system message.
pub const RETRIEVAL_LABEL: &str = "Retrieval context:";

/// Label heading the resources system message.
pub const RESOURCES_LABEL: &str = "Resources context (JSON):";

/// Assembly settings: the baseline persona prompt and FAQ limits.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub baseline_prompt: String,
    pub faq: FaqLimits,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self::from(&AssistantConfig::default())
    }
}

impl From<&AssistantConfig> for AssemblerConfig {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            baseline_prompt: config.baseline_prompt.clone(),
            faq: FaqLimits {
                max_count: config.faq_max_entries,
                max_answer_chars: config.faq_max_answer_chars,
            },
        }
    }
}

/// A system layer the assembler can add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextLayer {
    Retrieval,
    Policy,
    Resources,
    Baseline,
}

impl ContextLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieval => "retrieval",
            Self::Policy => "policy",
            Self::Resources => "resources",
            Self::Baseline => "baseline",
        }
    }
}

/// The assembled message list plus the layers that activated, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub messages: Vec<ChatMessage>,
    pub layers: Vec<ContextLayer>,
}

impl AssembledContext {
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(ContextLayer::as_str).collect()
    }
}

/// Resolved layer contents for one request.
#[derive(Default)]
struct Layers {
    retrieval: Option<String>,
    policy: Option<String>,
    resources: Option<String>,
    baseline: Option<String>,
}

impl Layers {
    fn into_context(self, history: Vec<ChatMessage>) -> AssembledContext {
        let ordered = [
            (ContextLayer::Retrieval, self.retrieval),
            (ContextLayer::Policy, self.policy),
            (ContextLayer::Resources, self.resources),
            (ContextLayer::Baseline, self.baseline),
        ];

        let mut messages = Vec::with_capacity(ordered.len() + history.len());
        let mut layers = Vec::new();
        for (layer, content) in ordered {
            if let Some(content) = content {
                messages.push(ChatMessage::system(content));
                layers.push(layer);
            }
        }
        messages.extend(history);

        AssembledContext { messages, layers }
    }
}

/// Builds model input from conversation history and the knowledge sources.
#[derive(Clone)]
pub struct ContextAssembler {
    config: AssemblerConfig,
    loader: DocumentLoader,
    retriever: Option<Arc<dyn Retriever>>,
    tenant: Option<String>,
}

impl ContextAssembler {
    pub fn new(config: AssemblerConfig, loader: DocumentLoader) -> Self {
        Self {
            config,
            loader,
            retriever: None,
            tenant: None,
        }
    }

    /// Attach a retrieval service, with an optional tenant filter.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>, tenant: Option<String>) -> Self {
        self.retriever = Some(retriever);
        self.tenant = tenant;
        self
    }

    /// Wire loader and optional HTTP retriever from application config.
    pub fn from_config(config: &AppConfig) -> Self {
        let assembler = Self::new(
            AssemblerConfig::from(&config.assistant),
            DocumentLoader::from_config(&config.knowledge),
        );
        match HttpRetriever::from_config(&config.retrieval) {
            Some(retriever) => {
                assembler.with_retriever(Arc::new(retriever), config.retrieval.tenant.clone())
            }
            None => assembler,
        }
    }

    pub fn has_retriever(&self) -> bool {
        self.retriever.is_some()
    }

    /// Assemble the model input for `history`.
    ///
    /// Document loads and retrieval run concurrently; their results are
    /// placed in the fixed layer order regardless of completion order.
    /// Pre-existing messages are never removed or reordered.
    pub async fn assemble(&self, history: Vec<ChatMessage>) -> AssembledContext {
        let query = latest_user_content(&history);

        let (knowledge, directives, retrieval) = tokio::join!(
            self.loader.load_knowledge(),
            self.loader.load_directives(),
            self.retrieve(query),
        );

        let layers = Layers {
            retrieval: retrieval.map(|text| format!("{RETRIEVAL_LABEL}\n{text}")),
            policy: self.policy_layer(directives.as_ref()),
            resources: self.resources_layer(query, knowledge.as_ref()),
            baseline: (!history.iter().any(ChatMessage::is_system))
                .then(|| self.config.baseline_prompt.clone()),
        };

        let assembled = layers.into_context(history);
        debug!(layers = ?assembled.layer_names(), messages = assembled.messages.len(), "Context assembled");
        assembled
    }

    async fn retrieve(&self, query: &str) -> Option<String> {
        let retriever = self.retriever.as_deref()?;
        augment(retriever, query, self.tenant.as_deref()).await
    }

    fn policy_layer(&self, directives: Option<&DirectivesDocument>) -> Option<String> {
        policy::compile(directives)
    }

    fn resources_layer(&self, query: &str, knowledge: Option<&KnowledgeDocument>) -> Option<String> {
        let compact = faq::compact_context(query, knowledge?, self.config.faq);
        if compact.is_empty() {
            return None;
        }
        let json = serde_json::to_string(&compact).ok()?;
        Some(format!("{RESOURCES_LABEL}\n{json}"))
    }
}
