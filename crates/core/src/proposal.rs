//! The remediation proposal — the structured result of one analysis.
//!
//! A proposal is constructed once per completed stream from whatever JSON
//! object the extractor recovered, handed to the caller, and never mutated.
//! The `args` shape varies per tool catalog entry and is treated as opaque
//! key/value data: the contract is "round-trip what was given", not
//! "validate against a schema".

use serde::{Deserialize, Serialize};

/// Fallback tool when the model's object carries no `toolName`.
pub const FALLBACK_TOOL: &str = "scale_deployment";

/// Fallback rationale when the model's object carries no `reason`.
pub const FALLBACK_REASON: &str = "AI analysis complete";

/// An AI-proposed remediation action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Name of the catalog tool to invoke.
    #[serde(rename = "toolName")]
    pub tool_name: String,

    /// Tool-specific parameters — opaque to the core.
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,

    /// The model's explanation of root cause and fix.
    pub reason: String,
}

impl Proposal {
    /// Build a proposal from a parsed JSON object, filling defaults for any
    /// missing optional field. A syntactically valid object is never rejected.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let tool_name = value
            .get("toolName")
            .and_then(|v| v.as_str())
            .unwrap_or(FALLBACK_TOOL)
            .to_string();

        let args = value
            .get("args")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let reason = value
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or(FALLBACK_REASON)
            .to_string();

        Self {
            tool_name,
            args,
            reason,
        }
    }
}
