//! Knowledge data model: the FAQ/resource document, the directives
//! document, and the compact per-request context blob built from them.
//!
//! Wire format of the knowledge document:
//!
//! ```json
//! { "brand": { "name": "Acme" },
//!   "faq": [ { "q": "...", "a": "...", "url": "...", "category": "..." } ] }
//! ```

use serde::{Deserialize, Serialize};

/// Brand metadata carried by the knowledge document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
}

/// A single FAQ / resource entry.
///
/// Entries with an empty question or answer are invalid; they are dropped
/// when a document is built or parsed, never at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    #[serde(rename = "q", default)]
    pub question: String,

    #[serde(rename = "a", default)]
    pub answer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            url: None,
            category: None,
            subcategory: None,
            extra: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Both question and answer carry non-whitespace text.
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// The FAQ / resource knowledge document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,

    /// Entries in source order. Order is significant: it is the tie-break
    /// order for FAQ selection.
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
}

impl KnowledgeDocument {
    /// Parse a knowledge document, dropping invalid entries.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Self = serde_json::from_str(text)?;
        doc.faq.retain(FaqEntry::is_valid);
        Ok(doc)
    }

    pub fn brand_name(&self) -> Option<&str> {
        self.brand.as_ref().map(|b| b.name.as_str())
    }
}

/// The policy/directives document: a flat mapping of field name to text or
/// arbitrary structured value. Unrecognized fields are carried but ignored
/// by the policy compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectivesDocument(pub serde_json::Map<String, serde_json::Value>);

impl DirectivesDocument {
    /// Parse a directives document. Anything other than a JSON object is an error.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for DirectivesDocument {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

/// Request-scoped, bounded subset of the knowledge document injected as the
/// "resources" system message. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactContext {
    pub brand: Option<Brand>,
    pub selected_faq: Vec<FaqEntry>,
}

impl CompactContext {
    pub fn is_empty(&self) -> bool {
        self.selected_faq.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_wire_field_names() {
        let doc = KnowledgeDocument::from_json(
            r#"{"brand":{"name":"Acme"},"faq":[{"q":"Hours?","a":"9-5","url":"https://acme.test/hours"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.brand_name(), Some("Acme"));
        assert_eq!(doc.faq.len(), 1);
        assert_eq!(doc.faq[0].question, "Hours?");
        assert_eq!(doc.faq[0].url.as_deref(), Some("https://acme.test/hours"));
    }

    #[test]
    fn drops_entries_missing_question_or_answer() {
        let doc = KnowledgeDocument::from_json(
            r#"{"faq":[{"q":"ok","a":"fine"},{"q":"","a":"orphan"},{"q":"no answer"},{"a":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.faq.len(), 1);
        assert_eq!(doc.faq[0].question, "ok");
    }

    #[test]
    fn missing_faq_key_is_empty() {
        let doc = KnowledgeDocument::from_json(r#"{"brand":{"name":"Acme"}}"#).unwrap();
        assert!(doc.faq.is_empty());
    }

    #[test]
    fn directives_must_be_an_object() {
        assert!(DirectivesDocument::from_json(r#"{"tone":"warm"}"#).is_ok());
        assert!(DirectivesDocument::from_json(r#"["tone"]"#).is_err());
        assert!(DirectivesDocument::from_json("not json").is_err());
    }

    #[test]
    fn compact_context_serializes_entries_with_wire_names() {
        let ctx = CompactContext {
            brand: Some(Brand {
                name: "Acme".into(),
            }),
            selected_faq: vec![FaqEntry::new("Q", "A")],
        };
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(
            json,
            r#"{"brand":{"name":"Acme"},"selected_faq":[{"q":"Q","a":"A"}]}"#
        );
    }
}
