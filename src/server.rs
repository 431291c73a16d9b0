//! HTTP front end: health check and a single chat endpoint.
//!
//! Business failures come back as `200` with `success: false` so a browser
//! client can render them; only a missing provider key is a transport-level
//! error.

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::dispatcher::{Dispatcher, Mode, Reply};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub configured: bool,
}

/// Shared by every request. `dispatcher` is `None` when no provider key is set.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Option<Arc<Dispatcher>>,
}

impl AppState {
    pub fn new(dispatcher: Option<Arc<Dispatcher>>) -> Self {
        Self { dispatcher }
    }

    /// Build the pipeline if the configuration allows it; otherwise serve in
    /// degraded mode so `/health` can report what is missing.
    pub fn from_config(config: &Config) -> Self {
        match Dispatcher::from_config(config) {
            Ok(dispatcher) => Self::new(Some(Arc::new(dispatcher))),
            Err(e) if e.is_config() => {
                log::warn!("Server: {}, chat is disabled", e);
                Self::new(None)
            }
            Err(e) => {
                log::error!("Server: chat disabled: {}", e);
                Self::new(None)
            }
        }
    }
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/chat", post(chat))
        .route("/api/chat", post(chat))
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}

/// Build the CORS layer for the configured browser origins.
///
/// An empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        log::info!("CORS: allowing all origins");
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("CORS: ignoring invalid origin {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "task-agent",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "chat": "/chat (POST)"
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let configured = state.dispatcher.is_some();

    Json(HealthResponse {
        status: (if configured { "ok" } else { "warning" }).to_string(),
        message: if configured {
            "Agente IA funcionando correctamente".to_string()
        } else {
            "GOOGLE_API_KEY no configurada".to_string()
        },
        configured,
    })
}

async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    if request.message.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "message must contain at least 1 character" })),
        )
            .into_response();
    }

    let Some(dispatcher) = state.dispatcher else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "GOOGLE_API_KEY no configurada. Verifica el archivo .env" })),
        )
            .into_response();
    };

    let body = match dispatcher.handle(&request.message, Mode::Silent).await {
        Ok(reply) => {
            if let Reply::Tool { name, .. } = &reply {
                log::info!("Server: chat answered by {}", name);
            }
            ChatResponse {
                response: reply.render(),
                success: true,
                error: None,
            }
        }
        Err(e) => {
            log::error!("Server: chat request failed: {}", e);
            ChatResponse {
                response: format!(
                    "Lo siento, ocurrió un error al procesar tu solicitud: {}",
                    e
                ),
                success: false,
                error: Some(format!("Error procesando consulta: {}", e)),
            }
        }
    };

    Json(body).into_response()
}

pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config);
    let app = router(state, &config.server.cors_origins);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Server: listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Server: shutting down");
        })
        .await?;

    Ok(())
}
