//! Structured proposal extraction from free-form model output.
//!
//! The model is asked for a bare JSON object but routinely wraps it in
//! markdown fences, prose, or leftover reasoning markers. Extraction is a
//! layered best-effort interpreter: each layer is a pure function over the
//! text, tried in order, first success wins. The whole operation is
//! deterministic and total — failures return `None`, never panic.
//!
//! Layers:
//! 1. strip `<think>…</think>` spans and markdown fences
//! 2. keyed snippet — smallest flat `{…}` containing `"toolName"`
//! 3. balanced-brace scan from the first `{`
//! 4. raw parse of the entire text
//!
//! Known limitation, preserved deliberately: the balanced scan counts every
//! brace character, including braces inside JSON string literals, so a
//! payload whose `reason` contains `}` can close the candidate object early.
//! The raw-parse layer does not recover such payloads either; they surface
//! as extraction failure.

use std::sync::LazyLock;

use kubesentinel_core::proposal::Proposal;
use regex::Regex;
use serde_json::Value;

static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

static KEYED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)\{[^{}]*"toolName"[^}]*\}"#).expect("valid regex"));

/// Extract one proposal from the full accumulated model output.
///
/// Missing optional fields are defaulted (`scale_deployment`, empty args,
/// fallback reason); a syntactically valid object is never rejected.
pub fn extract_proposal(text: &str) -> Option<Proposal> {
    let without_think = THINK_SPAN.replace_all(text, "");
    let candidate = strip_fences(without_think.trim());
    let candidate = candidate.trim();

    for strategy in [keyed_object, balanced_object, raw_object] {
        if let Some(value) = strategy(candidate) {
            return Some(Proposal::from_value(&value));
        }
    }
    None
}

/// Reduce the text to the first fenced block, if any.
///
/// A fence explicitly labeled `json` wins; otherwise the first fenced block
/// of any kind; otherwise the text is unchanged. An unterminated fence keeps
/// everything after the opening.
fn strip_fences(text: &str) -> &str {
    if let Some((_, after)) = text.split_once("```json") {
        return after.split("```").next().unwrap_or(after).trim();
    }
    if text.contains("```") {
        let mut parts = text.split("```");
        let _before = parts.next();
        if let Some(inner) = parts.next() {
            return inner.trim();
        }
    }
    text
}

/// Smallest flat `{…}` object (no nested braces) carrying a `toolName` key.
fn keyed_object(text: &str) -> Option<Value> {
    let found = KEYED_OBJECT.find(text)?;
    parse_object(found.as_str())
}

/// Naive balanced-brace scan from the first `{`.
///
/// Brace characters inside string literals are counted like any other — the
/// first depth-zero close ends the candidate, parse failure ends the layer.
fn balanced_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let mut depth: u32 = 0;

    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return parse_object(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Attempt to parse the entire text as one object.
fn raw_object(text: &str) -> Option<Value> {
    parse_object(text)
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text.trim())
        .ok()
        .filter(Value::is_object)
}
