//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `GET  /v1/personas`     — Persona catalog, localized (`?lang=de`)
//! - `GET  /v1/tiers`        — The model ladder in fallback order
//! - `POST /v1/chat`         — One-shot cascade, returns a `SendResult`
//! - `POST /v1/chat/stream`  — Streaming cascade as server-sent events

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

use wrenchwise_cascade::ModelCascadeExecutor;
use wrenchwise_config::AppConfig;
use wrenchwise_core::{
    AgentPersona, ConversationTurn, Language, Part, SendResult, StreamChunk, ToolDeclaration,
};

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub config: AppConfig,
    pub executor: ModelCascadeExecutor,
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/personas", get(list_personas_handler))
        .route("/tiers", get(list_tiers_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Persona id
    pub persona: String,

    /// Language code; the configured default when omitted
    #[serde(default)]
    pub language: Option<String>,

    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<ConversationTurn>,

    /// Plain-text message, sent ahead of `parts`
    #[serde(default)]
    pub message: Option<String>,

    /// Additional parts such as inline images
    #[serde(default)]
    pub parts: Vec<Part>,

    /// Request web-search grounding (streaming only)
    #[serde(default)]
    pub web_search: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    #[serde(default)]
    lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaSummary {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub warning: String,
}

impl PersonaSummary {
    fn localized(persona: &AgentPersona, lang: Language) -> Self {
        Self {
            id: persona.id.clone(),
            name: persona.name.clone(),
            title: persona.title.get(lang).to_string(),
            description: persona.description.get(lang).to_string(),
            icon: persona.icon.clone(),
            color: persona.color.clone(),
            warning: persona.warning.get(lang).to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaListResponse {
    pub language: Language,
    pub personas: Vec<PersonaSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDto {
    pub id: String,
    pub supports_tools: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TierListResponse {
    pub provider: String,
    pub tiers: Vec<TierDto>,
}

// ── Request parsing ───────────────────────────────────────────────────────

fn resolve_language(state: &ApiV1State, code: Option<&str>) -> Result<Language, ApiError> {
    match code {
        Some(code) => code
            .parse()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("{e}"))),
        None => Ok(state.config.cascade.default_language),
    }
}

/// A validated chat request.
struct Turn<'a> {
    persona: &'a AgentPersona,
    language: Language,
    parts: Vec<Part>,
}

fn parse_chat<'a>(state: &'a ApiV1State, payload: &mut ChatRequest) -> Result<Turn<'a>, ApiError> {
    let persona = state.config.persona(&payload.persona).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("Unknown persona: '{}'", payload.persona),
        )
    })?;
    let language = resolve_language(state, payload.language.as_deref())?;

    let mut parts = Vec::with_capacity(payload.parts.len() + 1);
    if let Some(message) = payload.message.take().filter(|m| !m.trim().is_empty()) {
        parts.push(Part::text(message));
    }
    parts.append(&mut payload.parts);
    if parts.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Request needs a message or at least one part",
        ));
    }

    Ok(Turn {
        persona,
        language,
        parts,
    })
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `GET /v1/personas` — List personas in the requested language.
async fn list_personas_handler(
    State(state): State<SharedApiState>,
    Query(query): Query<LangQuery>,
) -> Result<Json<PersonaListResponse>, ApiError> {
    let language = resolve_language(&state, query.lang.as_deref())?;
    let personas = state
        .config
        .personas
        .iter()
        .map(|p| PersonaSummary::localized(p, language))
        .collect();
    Ok(Json(PersonaListResponse {
        language,
        personas,
    }))
}

/// `GET /v1/tiers` — The ladder the cascade walks.
async fn list_tiers_handler(State(state): State<SharedApiState>) -> Json<TierListResponse> {
    let tiers = state
        .executor
        .ladder()
        .iter()
        .map(|t| TierDto {
            id: t.id.clone(),
            supports_tools: t.supports_tools,
        })
        .collect();
    Json(TierListResponse {
        provider: state.executor.provider_name().to_string(),
        tiers,
    })
}

/// `POST /v1/chat` — Run a cascade and return the buffered result.
async fn chat_handler(
    State(state): State<SharedApiState>,
    Json(mut payload): Json<ChatRequest>,
) -> Result<Json<SendResult>, ApiError> {
    let turn = parse_chat(&state, &mut payload)?;
    info!(
        persona = %turn.persona.id,
        lang = %turn.language,
        history = payload.history.len(),
        "v1/chat request"
    );

    let result = state
        .executor
        .send(turn.persona, &payload.history, turn.parts, turn.language)
        .await;
    Ok(Json(result))
}

/// `POST /v1/chat/stream` — Run a cascade, receive an SSE stream of chunks.
///
/// Event names are `model`, `chunk` and `error`; each data field is one
/// JSON `StreamChunk`. Closing the connection cancels the cascade.
async fn chat_stream_handler(
    State(state): State<SharedApiState>,
    Json(mut payload): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let turn = parse_chat(&state, &mut payload)?;
    info!(
        persona = %turn.persona.id,
        lang = %turn.language,
        history = payload.history.len(),
        "v1/chat/stream SSE request"
    );

    let tools = if payload.web_search {
        vec![ToolDeclaration::WebSearch]
    } else {
        vec![]
    };

    let stream = state
        .executor
        .stream(turn.persona, &payload.history, turn.parts, turn.language, tools)
        .map(|chunk: StreamChunk| {
            let data = serde_json::to_string(&chunk).unwrap_or_default();
            Ok(SseEvent::default().event(chunk.event_type()).data(data))
        });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wrenchwise_core::ModelLadder;
    use wrenchwise_providers::{Script, ScriptedProvider};

    fn test_api_state(provider: ScriptedProvider) -> SharedApiState {
        let mut config = AppConfig::default();
        config.personas = wrenchwise_config::builtin_personas();
        let ladder = ModelLadder::from_ids(["gemini-2.5-pro", "gemini-2.5-flash"]).unwrap();
        Arc::new(ApiV1State {
            config,
            executor: ModelCascadeExecutor::new(Arc::new(provider), ladder),
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn sse_field<'a>(frame: &'a str, name: &str) -> Option<&'a str> {
        frame
            .lines()
            .find_map(|l| l.strip_prefix(name))
            .map(str::trim_start)
    }

    /// `(event, data)` pairs of an SSE body.
    fn sse_events(body: &str) -> Vec<(String, StreamChunk)> {
        body.split("\n\n")
            .filter_map(|frame| {
                let event = sse_field(frame, "event:")?;
                let data = sse_field(frame, "data:")?;
                Some((event.to_string(), serde_json::from_str(data).unwrap()))
            })
            .collect()
    }

    #[tokio::test]
    async fn personas_are_localized() {
        let app = v1_router(test_api_state(ScriptedProvider::demo()));

        let req = Request::builder()
            .uri("/personas?lang=de")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: PersonaListResponse =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json.language, Language::De);
        let electrician = json.personas.iter().find(|p| p.id == "electrician").unwrap();
        assert_eq!(electrician.title, "Elektriker");
    }

    #[tokio::test]
    async fn unsupported_language_is_rejected() {
        let app = v1_router(test_api_state(ScriptedProvider::demo()));
        let req = Request::builder()
            .uri("/personas?lang=fr")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tiers_in_fallback_order() {
        let app = v1_router(test_api_state(ScriptedProvider::demo()));
        let req = Request::builder().uri("/tiers").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();

        let json: TierListResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json.provider, "scripted");
        assert_eq!(json.tiers.len(), 2);
        assert_eq!(json.tiers[0].id, "gemini-2.5-pro");
        assert!(json.tiers[0].supports_tools);
        assert!(!json.tiers[1].supports_tools);
    }

    #[tokio::test]
    async fn chat_returns_send_result() {
        let provider = ScriptedProvider::new()
            .on("gemini-2.5-pro", Script::quota())
            .on("gemini-2.5-flash", Script::reply("Use a 10 mm spanner."));
        let app = v1_router(test_api_state(provider));

        let response = app
            .oneshot(post_json(
                "/chat",
                serde_json::json!({
                    "persona": "mechanic",
                    "language": "en",
                    "history": [{"role": "user", "parts": [{"type": "text", "text": "Hi"}]}],
                    "message": "Which spanner for the oil drain plug?"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let result: SendResult = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(result.text, "Use a 10 mm spanner.");
        assert_eq!(result.active_model_tier, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn chat_failure_is_still_ok_with_sentinel() {
        let provider = ScriptedProvider::new().with_fallback(Script::hard("API key not valid"));
        let app = v1_router(test_api_state(provider));

        let response = app
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"persona": "handyman", "message": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result: SendResult = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(!result.succeeded());
    }

    #[tokio::test]
    async fn unknown_persona_is_not_found() {
        let app = v1_router(test_api_state(ScriptedProvider::demo()));
        let response = app
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"persona": "astronaut", "message": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(err.error.contains("astronaut"));
    }

    #[tokio::test]
    async fn empty_message_is_bad_request() {
        let app = v1_router(test_api_state(ScriptedProvider::demo()));
        let response = app
            .oneshot(post_json(
                "/chat/stream",
                serde_json::json!({"persona": "handyman", "message": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stream_emits_named_events() {
        let provider = ScriptedProvider::new()
            .on("gemini-2.5-pro", Script::quota())
            .on("gemini-2.5-flash", Script::deltas(&["Check ", "the fuse."]));
        let app = v1_router(test_api_state(provider));

        let response = app
            .oneshot(post_json(
                "/chat/stream",
                serde_json::json!({
                    "persona": "electrician",
                    "language": "de",
                    "message": "Licht geht nicht",
                    "webSearch": true
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );

        let events = sse_events(&body_string(response).await);
        let names: Vec<&str> = events.iter().map(|(e, _)| e.as_str()).collect();
        assert_eq!(names, vec!["model", "chunk", "model", "chunk", "chunk"]);
        assert_eq!(events[0].1, StreamChunk::active_model("gemini-2.5-pro"));
        assert_eq!(events[4].1, StreamChunk::text("the fuse."));
    }

    #[tokio::test]
    async fn stream_failure_ends_with_error_event() {
        let provider = ScriptedProvider::new().with_fallback(Script::hard("API key not valid"));
        let app = v1_router(test_api_state(provider));

        let response = app
            .oneshot(post_json(
                "/chat/stream",
                serde_json::json!({"persona": "handyman", "message": "hello"}),
            ))
            .await
            .unwrap();
        let events = sse_events(&body_string(response).await);
        let (name, chunk) = events.last().unwrap();
        assert_eq!(name, "error");
        assert!(chunk.error_message.is_some());
        assert_eq!(events.len(), 2);
    }
}
