//! Luna web UI: serves the embedded chat page and wires it to the pipeline.
//! Run: cargo run -p luna-web-ui
//! Binds the first free port in 7860-7869 and prints the URL. The browser
//! keeps the conversation history and sends it back with every message.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use luna_core::{ChatPipeline, Turn, TurnOutcome};

const PORT_RANGE: std::ops::Range<u16> = 7860..7870;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<ChatPipeline>,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<Turn>,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
    crisis: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pipeline = Arc::new(ChatPipeline::from_env());
    for issue in pipeline.config().preflight() {
        tracing::warn!("preflight: {}", issue);
    }
    let state = AppState { pipeline };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any);

    let app = Router::new()
        .route("/", get(serve_chat_ui))
        .route("/health", get(health))
        .route("/api/chat", post(api_chat))
        .with_state(state)
        .layer(cors);

    let listener = bind_first_free_port().await?;
    let addr = listener.local_addr()?;
    println!("🌙 Luna web UI: http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Tries each port in the range in order; the first successful bind wins.
async fn bind_first_free_port() -> std::io::Result<tokio::net::TcpListener> {
    for port in PORT_RANGE {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(_) => tracing::debug!("port {} busy, trying the next one", port),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AddrInUse,
        format!("no free port in {:?}", PORT_RANGE),
    ))
}

async fn health() -> &'static str {
    "OK"
}

/// Chat page: embedded single-file UI, calm blue theme.
async fn serve_chat_ui() -> Html<&'static str> {
    const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(INDEX)
}

async fn api_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let (reply, outcome) = state
        .pipeline
        .respond_traced(&body.message, &body.history)
        .await;
    Json(ChatResponse {
        reply,
        crisis: outcome == TurnOutcome::Crisis,
    })
}
