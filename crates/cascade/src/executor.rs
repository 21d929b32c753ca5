//! The model cascade executor.
//!
//! For each request the executor walks the model ladder from the top:
//! 1. Assemble the instruction, the safety preface and the bounded history
//! 2. Announce the tier, call the provider, relay its output
//! 3. On a quota failure with a tier left, emit a transition notice and move down
//! 4. On any other failure, or quota on the last tier, emit one terminal error
//!
//! A cascade never revisits a tier and never surfaces a raw provider error.

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;
use wrenchwise_config::{AppConfig, ConfigError};
use wrenchwise_core::message::joined_text;
use wrenchwise_core::{
    AgentPersona, ConversationTurn, GenerateRequest, Language, ModelLadder, ModelTier, NO_TIER,
    Part, Provider, ProviderChunk, ProviderError, Role, SendResult, StreamChunk, ToolDeclaration,
};

use crate::classify::{ErrorKind, classify};
use crate::history::truncate;
use crate::locale;
use crate::prompt::{PromptError, build_instruction};
use crate::safety::SafetyInterceptor;
use crate::tools::resolve_tools;

/// Turns forwarded to the provider when no limit is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Runs cascades against one provider and one ladder.
///
/// Cheap to clone; every call is an independent cascade.
#[derive(Clone)]
pub struct ModelCascadeExecutor {
    provider: Arc<dyn Provider>,
    ladder: ModelLadder,
    safety: Arc<SafetyInterceptor>,
    history_limit: usize,
    temperature: f32,
    attempt_timeout: Option<Duration>,
}

/// Everything a tier attempt needs that does not depend on the tier.
struct Prepared {
    instruction: String,
    preface: Option<String>,
    contents: Vec<ConversationTurn>,
}

/// Outcome of one tier attempt.
enum AttemptOutcome {
    Success,
    Failed(ProviderError),
    Cancelled,
}

impl ModelCascadeExecutor {
    pub fn new(provider: Arc<dyn Provider>, ladder: ModelLadder) -> Self {
        Self {
            provider,
            ladder,
            safety: Arc::new(SafetyInterceptor::default()),
            history_limit: DEFAULT_HISTORY_LIMIT,
            temperature: DEFAULT_TEMPERATURE,
            attempt_timeout: None,
        }
    }

    /// Build an executor with the ladder, safety keywords and limits from `config`.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
    ) -> Result<Self, ConfigError> {
        let cascade = &config.cascade;
        Ok(Self::new(provider, cascade.ladder()?)
            .with_safety(SafetyInterceptor::new(&config.safety.keywords))
            .with_history_limit(cascade.history_limit)
            .with_temperature(cascade.temperature)
            .with_attempt_timeout(cascade.attempt_timeout()))
    }

    pub fn with_safety(mut self, safety: SafetyInterceptor) -> Self {
        self.safety = Arc::new(safety);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Deadline for establishing each tier call and for each following chunk.
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn ladder(&self) -> &ModelLadder {
        &self.ladder
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn safety(&self) -> &SafetyInterceptor {
        &self.safety
    }

    /// Start a streaming cascade.
    ///
    /// The cascade runs on its own task and stops as soon as the returned
    /// stream is dropped or cancelled.
    pub fn stream(
        &self,
        persona: &AgentPersona,
        history: &[ConversationTurn],
        new_parts: Vec<Part>,
        language: Language,
        tools: Vec<ToolDeclaration>,
    ) -> CascadeStream {
        let (tx, rx) = mpsc::channel(1);
        let prepared = self.prepare(persona, history, new_parts, language);
        let span = info_span!(
            "cascade",
            id = %Uuid::new_v4(),
            persona = %persona.id,
            lang = %language,
            mode = "stream"
        );

        let this = self.clone();
        tokio::spawn(
            async move { this.run_stream(prepared, language, tools, tx).await }.instrument(span),
        );

        CascadeStream { rx }
    }

    /// Run a cascade to completion and return the buffered result.
    pub async fn send(
        &self,
        persona: &AgentPersona,
        history: &[ConversationTurn],
        new_parts: Vec<Part>,
        language: Language,
    ) -> SendResult {
        let span = info_span!(
            "cascade",
            id = %Uuid::new_v4(),
            persona = %persona.id,
            lang = %language,
            mode = "send"
        );
        let prepared = self.prepare(persona, history, new_parts, language);
        self.run_send(prepared, language).instrument(span).await
    }

    fn prepare(
        &self,
        persona: &AgentPersona,
        history: &[ConversationTurn],
        new_parts: Vec<Part>,
        language: Language,
    ) -> Result<Prepared, PromptError> {
        let instruction = build_instruction(persona, language)?;
        let preface = self.safety.check_risk(&joined_text(&new_parts), language);

        let recent = truncate(history, self.history_limit);
        let mut contents = Vec::with_capacity(recent.len() + 1);
        contents.extend_from_slice(recent);
        contents.push(ConversationTurn::new(Role::User, new_parts));

        Ok(Prepared {
            instruction,
            preface,
            contents,
        })
    }

    fn request(
        &self,
        tier: &ModelTier,
        prepared: &Prepared,
        tools: &[ToolDeclaration],
    ) -> GenerateRequest {
        GenerateRequest {
            model: tier.id.clone(),
            contents: prepared.contents.clone(),
            system_instruction: prepared.instruction.clone(),
            temperature: self.temperature,
            tools: resolve_tools(tier, tools),
        }
    }

    /// The tier to fall back to after `err` on tier `index`, if any.
    fn fallback_after(&self, index: usize, err: &ProviderError) -> Option<&ModelTier> {
        let tier = self.ladder.get(index).map(|t| t.id.as_str()).unwrap_or_default();
        match (classify(err), self.ladder.get(index + 1)) {
            (ErrorKind::QuotaExceeded, Some(next)) => {
                warn!(tier, next = %next.id, error = %err, "Tier over quota, falling back");
                Some(next)
            }
            (ErrorKind::QuotaExceeded, None) => {
                error!(tier, error = %err, kind = "ladder_exhausted", "Every tier is over quota");
                None
            }
            (ErrorKind::NonRetryable, _) => {
                error!(tier, error = %err, kind = "non_retryable", "Tier failed");
                None
            }
        }
    }

    async fn with_deadline<T>(
        &self,
        model: &str,
        fut: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
                Err(ProviderError::Timeout(format!(
                    "no response from {model} after {}s",
                    limit.as_secs_f32()
                )))
            }),
            None => fut.await,
        }
    }

    // ── Streaming ────────────────────────────────────────────────────────

    async fn run_stream(
        self,
        prepared: Result<Prepared, PromptError>,
        language: Language,
        tools: Vec<ToolDeclaration>,
        tx: mpsc::Sender<StreamChunk>,
    ) {
        let prepared = match prepared {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "Instruction assembly failed");
                let _ = tx.send(StreamChunk::error(locale::failure_message(language))).await;
                return;
            }
        };

        if let Some(preface) = &prepared.preface {
            if tx.send(StreamChunk::text(preface)).await.is_err() {
                return;
            }
        }

        let total = self.ladder.len();
        for (index, tier) in self.ladder.iter().enumerate() {
            let request = self.request(tier, &prepared, &tools);

            if tx.send(StreamChunk::active_model(&tier.id)).await.is_err() {
                return;
            }
            info!(
                tier = %tier.id,
                attempt = index + 1,
                total,
                tools = request.tools.len(),
                "Attempting tier"
            );

            match self.attempt_stream(request, &tx).await {
                AttemptOutcome::Success => {
                    info!(tier = %tier.id, "Tier completed");
                    return;
                }
                AttemptOutcome::Cancelled => {
                    debug!(tier = %tier.id, "Consumer went away, abandoning cascade");
                    return;
                }
                AttemptOutcome::Failed(err) => match self.fallback_after(index, &err) {
                    Some(next) => {
                        let notice = locale::transition_notice(language, &tier.id, &next.id);
                        if tx.send(StreamChunk::text(notice)).await.is_err() {
                            return;
                        }
                    }
                    None => {
                        let _ = tx
                            .send(StreamChunk::error(locale::failure_message(language)))
                            .await;
                        return;
                    }
                },
            }
        }
    }

    /// Relay one tier's stream until it ends, fails, or the consumer leaves.
    async fn attempt_stream(
        &self,
        request: GenerateRequest,
        tx: &mpsc::Sender<StreamChunk>,
    ) -> AttemptOutcome {
        let model = request.model.clone();

        let call = self.with_deadline(&model, self.provider.generate_stream(request));
        let mut upstream = tokio::select! {
            _ = tx.closed() => return AttemptOutcome::Cancelled,
            result = call => match result {
                Ok(rx) => rx,
                Err(e) => return AttemptOutcome::Failed(e),
            },
        };

        loop {
            let next = tokio::select! {
                _ = tx.closed() => return AttemptOutcome::Cancelled,
                item = self.with_deadline(&model, async {
                    Ok::<_, ProviderError>(upstream.recv().await)
                }) => item,
            };

            match next {
                Ok(None) => return AttemptOutcome::Success,
                Ok(Some(Ok(chunk))) => {
                    if let Some(out) = relay(chunk) {
                        if tx.send(out).await.is_err() {
                            return AttemptOutcome::Cancelled;
                        }
                    }
                }
                Ok(Some(Err(e))) | Err(e) => return AttemptOutcome::Failed(e),
            }
        }
    }

    // ── One-shot ─────────────────────────────────────────────────────────

    async fn run_send(
        &self,
        prepared: Result<Prepared, PromptError>,
        language: Language,
    ) -> SendResult {
        let prepared = match prepared {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "Instruction assembly failed");
                return SendResult {
                    text: locale::failure_message(language).to_string(),
                    active_model_tier: NO_TIER.to_string(),
                };
            }
        };
        let preface = prepared.preface.as_deref().unwrap_or_default();

        let total = self.ladder.len();
        for (index, tier) in self.ladder.iter().enumerate() {
            let request = self.request(tier, &prepared, &[]);
            info!(tier = %tier.id, attempt = index + 1, total, "Attempting tier");

            match self.with_deadline(&tier.id, self.provider.generate(request)).await {
                Ok(response) => {
                    info!(tier = %tier.id, "Tier completed");
                    return SendResult {
                        text: format!("{preface}{}", response.text),
                        active_model_tier: tier.id.clone(),
                    };
                }
                Err(err) => {
                    if self.fallback_after(index, &err).is_none() {
                        break;
                    }
                }
            }
        }

        SendResult {
            text: format!("{preface}{}", locale::failure_message(language)),
            active_model_tier: NO_TIER.to_string(),
        }
    }
}

/// Map a provider delta to a caller chunk, dropping empty ones.
fn relay(chunk: ProviderChunk) -> Option<StreamChunk> {
    let out = StreamChunk {
        text: chunk.text_delta.filter(|t| !t.is_empty()),
        grounding_refs: (!chunk.grounding_refs.is_empty()).then_some(chunk.grounding_refs),
        ..StreamChunk::default()
    };
    (out.text.is_some() || out.grounding_refs.is_some()).then_some(out)
}

/// The caller's end of a streaming cascade.
///
/// Dropping it, or calling [`cancel`](Self::cancel), stops the cascade.
pub struct CascadeStream {
    rx: mpsc::Receiver<StreamChunk>,
}

impl CascadeStream {
    /// The next chunk, or `None` once the cascade has finished.
    pub async fn next(&mut self) -> Option<StreamChunk> {
        self.rx.recv().await
    }

    /// Stop the cascade. Chunks already queued can still be read.
    pub fn cancel(&mut self) {
        self.rx.close();
    }
}

impl Stream for CascadeStream {
    type Item = StreamChunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamChunk>> {
        self.rx.poll_recv(cx)
    }
}
