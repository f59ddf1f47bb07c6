use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::HeaderValue,
    routing::{get, post},
};
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::chat::{ChatRequest, ChatResponse, EMPTY_MESSAGE_REPLY, reply};
use crate::message::SessionId;
use crate::poet::PoetryPipeline;

pub struct ServerState {
    pub pipeline: PoetryPipeline,
    /// Used by requests that do not name a session.
    pub default_session: SessionId,
}

pub fn router(state: Arc<ServerState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

pub async fn serve(state: Arc<ServerState>, bind_addr: &str, allowed_origins: &[String]) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .wrap_err_with(|| format!("could not bind {bind_addr}"))?;
    log::info!("Serving poetry chat on http://{bind_addr}");
    axum::serve(listener, router(state, allowed_origins).into_make_service())
        .await
        .wrap_err("server error")?;
    Ok(())
}

pub async fn chat_handler(
    State(state): State<Arc<ServerState>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            log::warn!("Unreadable chat request: {rejection}");
            return Json(ChatResponse {
                response: EMPTY_MESSAGE_REPLY.to_string(),
            });
        }
    };
    let session = match request.session_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => SessionId::new(id),
        None => state.default_session.clone(),
    };
    Json(reply(&state.pipeline, &session, &request.message).await)
}

async fn health_handler() -> &'static str {
    "ok"
}

// Credentials are allowed, so methods and headers are mirrored instead of wildcarded.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            let origin = origin.trim().trim_end_matches('/');
            match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
