//! Scripted provider for tests and offline demos.
//!
//! Each model id gets a queue of [`Script`]s. A call pops the next script;
//! the last one sticks, so a single `on()` applies to every call. Every
//! request is recorded for later inspection.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use wrenchwise_core::error::ProviderError;
use wrenchwise_core::message::{Role, joined_text};
use wrenchwise_core::provider::*;

/// What the provider does for one call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Stream these chunks, then end normally
    Reply(Vec<ProviderChunk>),

    /// Fail before producing anything
    Fail(ProviderError),

    /// Stream these chunks, then fail
    FailAfter(Vec<ProviderChunk>, ProviderError),

    /// Never respond
    Hang,

    /// Emit `delta` every `interval` until the consumer goes away
    Drip { delta: String, interval: Duration },

    /// Reply with the latest user text, word by word
    Echo,
}

impl Script {
    /// A reply streamed as the given deltas.
    pub fn deltas(deltas: &[&str]) -> Self {
        Self::Reply(deltas.iter().map(|d| ProviderChunk::text(*d)).collect())
    }

    /// A single-chunk reply.
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(vec![ProviderChunk::text(text)])
    }

    /// The failure a quota-exhausted Gemini model returns.
    pub fn quota() -> Self {
        Self::Fail(ProviderError::RateLimited(
            "RESOURCE_EXHAUSTED: Quota exceeded for this model".into(),
        ))
    }

    /// A failure that is not quota related.
    pub fn hard(message: impl Into<String>) -> Self {
        Self::Fail(ProviderError::InvalidRequest(message.into()))
    }
}

/// A [`Provider`] whose behavior is fixed per model id.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    fallback: Option<Script>,
    calls: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Echoes on every model; used when `provider.kind = "scripted"`.
    pub fn demo() -> Self {
        Self::new().with_fallback(Script::Echo)
    }

    /// Queue `script` for `model`.
    pub fn on(mut self, model: impl Into<String>, script: Script) -> Self {
        self.scripts
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .entry(model.into())
            .or_default()
            .push_back(script);
        self
    }

    /// Script used for models with no queue of their own.
    pub fn with_fallback(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    /// Model ids of every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock_calls().iter().map(|r| r.model.clone()).collect()
    }

    /// Full requests of every call made so far, in order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.lock_calls().clone()
    }

    pub fn call_count(&self, model: &str) -> usize {
        self.lock_calls().iter().filter(|r| r.model == model).count()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<GenerateRequest>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self, request: &GenerateRequest) -> Result<Script, ProviderError> {
        self.lock_calls().push(request.clone());

        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        let next = match scripts.get_mut(&request.model) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        next.or_else(|| self.fallback.clone()).ok_or_else(|| {
            ProviderError::NotConfigured(format!("no script for model '{}'", request.model))
        })
    }
}

/// Deltas for an echo reply.
fn echo_chunks(request: &GenerateRequest) -> Vec<ProviderChunk> {
    let said = request
        .contents
        .iter()
        .rev()
        .find(|t| t.role == Role::User)
        .map(|t| joined_text(&t.parts))
        .unwrap_or_default();
    let reply = format!("({}, offline) You said: {}", request.model, said);
    reply.split_inclusive(' ').map(ProviderChunk::text).collect()
}

fn concat(chunks: Vec<ProviderChunk>) -> GenerateResponse {
    let mut response = GenerateResponse::default();
    for chunk in chunks {
        if let Some(text) = chunk.text_delta {
            response.text.push_str(&text);
        }
        response.grounding_refs.extend(chunk.grounding_refs);
    }
    response
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        match self.begin(&request)? {
            Script::Reply(chunks) => Ok(concat(chunks)),
            Script::Echo => Ok(concat(echo_chunks(&request))),
            Script::Fail(e) | Script::FailAfter(_, e) => Err(e),
            Script::Hang | Script::Drip { .. } => std::future::pending().await,
        }
    }

    async fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> Result<ProviderStream, ProviderError> {
        let script = self.begin(&request)?;
        let (tx, rx) = mpsc::channel(1);

        let (chunks, tail) = match script {
            Script::Fail(e) => return Err(e),
            Script::Hang => std::future::pending().await,
            Script::Drip { delta, interval } => {
                tokio::spawn(async move {
                    while tx.send(Ok(ProviderChunk::text(delta.clone()))).await.is_ok() {
                        tokio::time::sleep(interval).await;
                    }
                });
                return Ok(rx);
            }
            Script::Reply(chunks) => (chunks, None),
            Script::Echo => (echo_chunks(&request), None),
            Script::FailAfter(chunks, e) => (chunks, Some(e)),
        };

        tokio::spawn(async move {
            for chunk in chunks {
                if tx.send(Ok(chunk)).await.is_err() {
                    return;
                }
            }
            if let Some(e) = tail {
                let _ = tx.send(Err(e)).await;
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrenchwise_core::message::ConversationTurn;

    fn request(model: &str) -> GenerateRequest {
        GenerateRequest {
            model: model.into(),
            contents: vec![ConversationTurn::user("my tap drips")],
            system_instruction: String::new(),
            temperature: 0.7,
            tools: vec![],
        }
    }

    async fn drain(mut rx: ProviderStream) -> (String, Option<ProviderError>) {
        let mut text = String::new();
        while let Some(item) = rx.recv().await {
            match item {
                Ok(chunk) => text.push_str(chunk.text_delta.as_deref().unwrap_or("")),
                Err(e) => return (text, Some(e)),
            }
        }
        (text, None)
    }

    #[tokio::test]
    async fn replies_are_streamed_in_order() {
        let provider = ScriptedProvider::new().on("a", Script::deltas(&["Hel", "lo"]));
        let rx = provider.generate_stream(request("a")).await.unwrap();
        assert_eq!(drain(rx).await, ("Hello".to_string(), None));
        assert_eq!(provider.calls(), vec!["a"]);
    }

    #[tokio::test]
    async fn queued_scripts_pop_and_last_sticks() {
        let provider = ScriptedProvider::new()
            .on("a", Script::quota())
            .on("a", Script::reply("ok"));

        assert!(provider.generate(request("a")).await.is_err());
        assert_eq!(provider.generate(request("a")).await.unwrap().text, "ok");
        assert_eq!(provider.generate(request("a")).await.unwrap().text, "ok");
        assert_eq!(provider.call_count("a"), 3);
    }

    #[tokio::test]
    async fn unscripted_model_is_not_configured() {
        let provider = ScriptedProvider::new();
        match provider.generate_stream(request("nope")).await {
            Err(ProviderError::NotConfigured(msg)) => assert!(msg.contains("nope")),
            other => panic!("Expected NotConfigured, got: {:?}", other.map(|_| ())),
        }
        assert_eq!(provider.calls(), vec!["nope"]);
    }

    #[tokio::test]
    async fn fail_after_delivers_chunks_then_error() {
        let provider = ScriptedProvider::new().on(
            "a",
            Script::FailAfter(
                vec![ProviderChunk::text("partial")],
                ProviderError::StreamInterrupted("reset".into()),
            ),
        );
        let rx = provider.generate_stream(request("a")).await.unwrap();
        let (text, err) = drain(rx).await;
        assert_eq!(text, "partial");
        assert!(matches!(err, Some(ProviderError::StreamInterrupted(_))));
    }

    #[tokio::test]
    async fn demo_echoes_the_user() {
        let provider = ScriptedProvider::demo();
        let resp = provider.generate(request("gemini-2.5-flash")).await.unwrap();
        assert_eq!(resp.text, "(gemini-2.5-flash, offline) You said: my tap drips");
    }

    #[tokio::test(start_paused = true)]
    async fn drip_stops_when_receiver_dropped() {
        let provider = ScriptedProvider::new().on(
            "a",
            Script::Drip {
                delta: "tick ".into(),
                interval: Duration::from_millis(10),
            },
        );
        let mut rx = provider.generate_stream(request("a")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().unwrap().text_delta.as_deref(), Some("tick "));
        assert_eq!(rx.recv().await.unwrap().unwrap().text_delta.as_deref(), Some("tick "));
        drop(rx);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
