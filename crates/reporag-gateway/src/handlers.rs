use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use reporag_core::pipeline::INVALID_QUERY_MESSAGE;

use super::server::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPT_JS: &str = include_str!("../static/script.js");

#[derive(serde::Deserialize)]
pub(crate) struct ChatRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Namespace to search; blank means the configured default.
    #[serde(default)]
    pub codebase: Option<String>,
}

#[derive(serde::Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

pub(crate) async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        SCRIPT_JS,
    )
}

pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> impl IntoResponse {
    let query = payload.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Json(ChatResponse {
            response: INVALID_QUERY_MESSAGE.to_owned(),
        });
    }

    let namespace = payload
        .codebase
        .as_deref()
        .map(str::trim)
        .filter(|ns| !ns.is_empty());
    tracing::info!(
        query_len = query.len(),
        namespace = namespace.unwrap_or("<default>"),
        "chat request"
    );

    let response = state.service.answer(&query, namespace).await;
    Json(ChatResponse { response })
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
