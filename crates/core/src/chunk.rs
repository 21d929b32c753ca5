//! Caller-facing output of a cascade.

use serde::{Deserialize, Serialize};

/// Sentinel reported as the serving tier when every tier failed.
pub const NO_TIER: &str = "none";

/// The unit yielded to stream consumers.
///
/// Fields are independent; a chunk may carry text and grounding data at once.
/// `error_message` is terminal: at most one per stream, always last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    /// Incremental text (never empty when present)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Opaque citation metadata from the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_refs: Option<Vec<serde_json::Value>>,

    /// Marks the tier about to be attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_model: Option<String>,

    /// Terminal failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn active_model(model: impl Into<String>) -> Self {
        Self {
            active_model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.error_message.is_some()
    }

    /// SSE event name for this chunk.
    pub fn event_type(&self) -> &'static str {
        if self.error_message.is_some() {
            "error"
        } else if self.active_model.is_some() {
            "model"
        } else {
            "chunk"
        }
    }
}

/// Result of a one-shot cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// Full response text (safety preface included)
    pub text: String,

    /// Tier that served the request, or [`NO_TIER`]
    pub active_model_tier: String,
}

impl SendResult {
    pub fn succeeded(&self) -> bool {
        self.active_model_tier != NO_TIER
    }
}
