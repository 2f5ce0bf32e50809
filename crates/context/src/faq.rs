//! FAQ Selector.
//!
//! Picks the FAQ entries injected into a request. Matching is a
//! case-insensitive contiguous substring test against question or answer;
//! there is no scoring, so source order decides among matches.
//!
//! When nothing matches (or the query is empty) the whole FAQ set is the
//! candidate set. The selector returns zero entries only when it was given
//! zero entries.

use relaydesk_core::knowledge::{CompactContext, FaqEntry, KnowledgeDocument};

/// Marker appended to truncated answers.
pub const ELLIPSIS: char = '…';

/// Selection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaqLimits {
    pub max_count: usize,
    pub max_answer_chars: usize,
}

impl Default for FaqLimits {
    fn default() -> Self {
        Self {
            max_count: 5,
            max_answer_chars: 400,
        }
    }
}

/// Select up to `limits.max_count` entries relevant to `query`.
pub fn select(query: &str, faqs: &[FaqEntry], limits: FaqLimits) -> Vec<FaqEntry> {
    let needle = query.to_lowercase();

    let matches: Vec<&FaqEntry> = if needle.is_empty() {
        Vec::new()
    } else {
        faqs.iter()
            .filter(|entry| {
                entry.question.to_lowercase().contains(&needle)
                    || entry.answer.to_lowercase().contains(&needle)
            })
            .collect()
    };

    let candidates: Vec<&FaqEntry> = if matches.is_empty() {
        faqs.iter().collect()
    } else {
        matches
    };

    candidates
        .into_iter()
        .take(limits.max_count)
        .map(|entry| FaqEntry {
            answer: truncate_chars(&entry.answer, limits.max_answer_chars),
            ..entry.clone()
        })
        .collect()
}

/// Build the request-scoped resources blob from a knowledge document.
pub fn compact_context(query: &str, doc: &KnowledgeDocument, limits: FaqLimits) -> CompactContext {
    CompactContext {
        brand: doc.brand.clone(),
        selected_faq: select(query, &doc.faq, limits),
    }
}

/// Cut `text` to `max_chars` characters, appending [`ELLIPSIS`] when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push(ELLIPSIS);
            cut
        }
        None => text.to_string(),
    }
}
