//! Provider trait — the abstraction over the Model Invocation Provider.
//!
//! A Provider knows how to send ordered conversation content plus a system
//! instruction to a model and get a response back, either in one piece or as
//! a stream of deltas.
//!
//! Implementations: Gemini over HTTP, scripted (tests and offline demos).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::ConversationTurn;

/// A fully assembled request for one tier attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier of the tier being attempted
    pub model: String,

    /// Ordered conversation content, newest turn last
    pub contents: Vec<ConversationTurn>,

    /// Assembled system instruction
    pub system_instruction: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Tools forwarded for this tier (empty when the tier has no tool support)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,
}

/// An augmentation tool the caller may request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDeclaration {
    /// Provider-side web search grounding
    WebSearch,

    /// A callable function described by a JSON Schema
    Function {
        name: String,
        description: String,
        parameters: serde_json::Value,
    },
}

/// A complete (non-streaming) response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text (may be empty)
    pub text: String,

    /// Opaque grounding/citation references, in provider order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_refs: Vec<serde_json::Value>,
}

/// One streamed delta from the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderChunk {
    /// Partial text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_delta: Option<String>,

    /// Grounding references carried by this delta
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_refs: Vec<serde_json::Value>,
}

impl ProviderChunk {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            text_delta: Some(delta.into()),
            grounding_refs: Vec::new(),
        }
    }

    /// True when the chunk carries neither text nor grounding data.
    pub fn is_empty(&self) -> bool {
        self.text_delta.as_deref().is_none_or(str::is_empty) && self.grounding_refs.is_empty()
    }
}

/// Receiving half of a provider stream. The stream ends when the sender is dropped.
pub type ProviderStream = mpsc::Receiver<Result<ProviderChunk, ProviderError>>;

/// The core Provider trait.
///
/// The cascade calls `generate()` or `generate_stream()` without knowing
/// which backend is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError>;

    /// Send a request and get a stream of deltas.
    ///
    /// An `Err` here means the call could not be established; failures after
    /// that arrive as `Err` items on the stream.
    ///
    /// Default implementation calls `generate()` and wraps the result as a single chunk.
    async fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> Result<ProviderStream, ProviderError> {
        let response = self.generate(request).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx
            .send(Ok(ProviderChunk {
                text_delta: Some(response.text),
                grounding_refs: response.grounding_refs,
            }))
            .await;
        Ok(rx)
    }
}
