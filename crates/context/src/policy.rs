//! Policy Compiler.
//!
//! Renders the directives document into a labeled text block. Only the
//! fields in [`POLICY_FIELDS`] are read, always in that order, so the
//! compiled text never depends on the key order of the source document.

use relaydesk_core::knowledge::DirectivesDocument;
use serde_json::Value;

/// Header placed above the compiled directive lines.
pub const POLICY_HEADER: &str =
    "STRICT POLICY. Follow every directive below exactly; it overrides any other guidance:";

/// Recognized directive fields and their labels, in output order.
pub const POLICY_FIELDS: &[(&str, &str)] = &[
    ("introduction", "Introduction"),
    ("persona", "Persona"),
    ("audience", "Audience"),
    ("style", "Style"),
    ("tone", "Tone"),
    ("language", "Language"),
    ("formatting", "Formatting"),
    ("max_response_length", "Max response length"),
    ("greeting", "Greeting"),
    ("do", "Always"),
    ("dont", "Never"),
    ("answer_scope", "Answer scope"),
    ("out_of_scope", "Out of scope"),
    ("unknown_answer", "When the answer is unknown"),
    ("escalation_logic", "Escalation logic"),
    ("escalation_contact", "Escalation contact"),
    ("link_policy", "Link policy"),
    ("pricing_policy", "Pricing policy"),
    ("privacy_policy", "Privacy policy"),
    ("safety", "Safety"),
    ("closing", "Closing"),
];

/// Compile directives into a policy block, or `None` when no recognized
/// field carries content.
pub fn compile(directives: Option<&DirectivesDocument>) -> Option<String> {
    let directives = directives?;

    let lines: Vec<String> = POLICY_FIELDS
        .iter()
        .filter_map(|(field, label)| {
            render_value(directives.get(field)?).map(|value| format!("{label}: {value}"))
        })
        .collect();

    if lines.is_empty() {
        return None;
    }

    Some(format!("{POLICY_HEADER}\n{}", lines.join("\n")))
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    }
}
