//! Google Gemini provider.
//!
//! Implements `generateContent` and `streamGenerateContent?alt=sse`.
//! Auth is the `x-goog-api-key` header, so request URLs never carry the key.
//!
//! Supports:
//! - Text and inline-data parts
//! - System instructions and temperature
//! - Google Search grounding and function declarations
//! - Grounding metadata (`groundingChunks`) on responses and stream deltas

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::StreamExt;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use wrenchwise_core::error::ProviderError;
use wrenchwise_core::message::{ConversationTurn, Part, Role};
use wrenchwise_core::provider::*;

/// A Gemini API client.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider against `base_url` (e.g. `https://generativelanguage.googleapis.com`).
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %error_body, "Gemini returned error");
        Err(ProviderError::from_status(
            status.as_u16(),
            error_message(&error_body),
        ))
    }
}

/// Convert a [`reqwest::Error`] into a [`ProviderError`].
fn from_reqwest(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Pull `STATUS: message` out of a Gemini error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    match error {
        Some(err) => {
            let status = err.get("status").and_then(Value::as_str).unwrap_or("");
            let message = err.get("message").and_then(Value::as_str).unwrap_or(body);
            if status.is_empty() {
                message.to_string()
            } else {
                format!("{status}: {message}")
            }
        }
        None => body.to_string(),
    }
}

// ── Request building ─────────────────────────────────────────────────────

fn turn_to_gemini(turn: &ConversationTurn) -> Value {
    let role = match turn.role {
        Role::User => "user",
        Role::Model => "model",
    };
    let parts: Vec<Value> = turn
        .parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => json!({ "text": text }),
            Part::InlineData { mime_type, data } => json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": STANDARD.encode(data),
                }
            }),
        })
        .collect();
    json!({ "role": role, "parts": parts })
}

fn tools_to_gemini(tools: &[ToolDeclaration]) -> Vec<Value> {
    let mut out = Vec::new();
    let mut functions = Vec::new();
    for tool in tools {
        match tool {
            ToolDeclaration::WebSearch => out.push(json!({ "googleSearch": {} })),
            ToolDeclaration::Function {
                name,
                description,
                parameters,
            } => functions.push(json!({
                "name": name,
                "description": description,
                "parameters": parameters,
            })),
        }
    }
    if !functions.is_empty() {
        out.push(json!({ "functionDeclarations": functions }));
    }
    out
}

fn build_body(request: &GenerateRequest) -> Value {
    let contents: Vec<Value> = request.contents.iter().map(turn_to_gemini).collect();

    let mut body = json!({
        "contents": contents,
        "generationConfig": { "temperature": request.temperature },
    });

    if !request.system_instruction.is_empty() {
        body["systemInstruction"] = json!({
            "parts": [{ "text": request.system_instruction }]
        });
    }

    let tools = tools_to_gemini(&request.tools);
    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    body
}

// ── Response parsing ─────────────────────────────────────────────────────

/// Text and grounding references of the first candidate.
fn parse_candidate(v: &Value) -> Result<ProviderChunk, ProviderError> {
    if let Some(err) = v.get("error") {
        let code = err
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(500);
        return Err(ProviderError::from_status(
            code,
            error_message(&json!({ "error": err }).to_string()),
        ));
    }

    let Some(candidate) = v
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
    else {
        if let Some(reason) = v
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(Value::as_str)
        {
            return Err(ProviderError::InvalidResponse(format!(
                "prompt blocked: {reason}"
            )));
        }
        // Usage-only frames carry no candidates.
        return Ok(ProviderChunk::default());
    };

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let grounding_refs = candidate
        .get("groundingMetadata")
        .and_then(|m| m.get("groundingChunks"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(ProviderChunk {
        text_delta: (!text.is_empty()).then_some(text),
        grounding_refs,
    })
}

fn parse_response(v: &Value) -> Result<GenerateResponse, ProviderError> {
    if v.get("candidates").is_none() && v.get("error").is_none() {
        return Err(ProviderError::InvalidResponse(
            "no candidates in response".into(),
        ));
    }
    let chunk = parse_candidate(v)?;
    Ok(GenerateResponse {
        text: chunk.text_delta.unwrap_or_default(),
        grounding_refs: chunk.grounding_refs,
    })
}

fn parse_stream_data(data: &str) -> Result<ProviderChunk, ProviderError> {
    let v: Value = serde_json::from_str(data)
        .map_err(|e| ProviderError::InvalidResponse(format!("bad stream frame: {e}")))?;
    parse_candidate(&v)
}

/// Incremental server-sent-events decoder.
///
/// Bytes may split lines and UTF-8 sequences anywhere; complete `data:`
/// payloads are returned once their terminating blank line arrives.
#[derive(Default)]
struct SseDecoder {
    buf: Vec<u8>,
    data: String,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            self.feed_line(line.trim_end_matches(['\n', '\r']), &mut events);
        }
        events
    }

    fn feed_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            if !self.data.is_empty() {
                events.push(std::mem::take(&mut self.data));
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data);
        }
    }

    /// Flush a trailing event that was not followed by a blank line.
    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let mut events = Vec::new();
        if !rest.is_empty() {
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.feed_line(line.trim_end_matches('\r'), &mut events);
        }
        self.feed_line("", &mut events);
        events.pop()
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let url = self.generate_url(&request.model);
        let body = build_body(&request);

        debug!(model = %request.model, turns = request.contents.len(), "Sending generate request");

        let response = self.post(&url, &body).await?;
        let v: Value = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {e}"))
        })?;
        parse_response(&v)
    }

    async fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> Result<ProviderStream, ProviderError> {
        let url = self.stream_url(&request.model);
        let body = build_body(&request);

        debug!(model = %request.model, turns = request.contents.len(), "Sending streaming request");

        let response = self.post(&url, &body).await?;

        let (tx, rx) = mpsc::channel(16);
        let model = request.model;

        // Spawn task to read the SSE byte stream and parse chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::default();

            loop {
                // A stalled upstream must not outlive the consumer.
                let next = tokio::select! {
                    _ = tx.closed() => {
                        trace!(model = %model, "Stream receiver dropped, closing connection");
                        return;
                    }
                    next = byte_stream.next() => next,
                };
                let Some(next) = next else { break };

                let bytes = match next {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for data in decoder.push(&bytes) {
                    if !forward(&tx, &data).await {
                        trace!(model = %model, "Stream receiver dropped, closing connection");
                        return;
                    }
                }
            }

            if let Some(data) = decoder.finish() {
                forward(&tx, &data).await;
            }
        });

        Ok(rx)
    }
}

/// Parse one SSE payload and send it on. Returns false when the stream should stop.
async fn forward(
    tx: &mpsc::Sender<Result<ProviderChunk, ProviderError>>,
    data: &str,
) -> bool {
    match parse_stream_data(data) {
        Ok(chunk) if chunk.is_empty() => true,
        Ok(chunk) => tx.send(Ok(chunk)).await.is_ok(),
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}
