//! Luna lite UI: one shared session, fixed port, no browser-side state.
//! Run: cargo run -p luna-lite-ui
//! The server keeps the conversation history; the page only sends the latest
//! message. Meant for a single local user, so one session is the whole state.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use luna_core::{ChatPipeline, Turn, TurnOutcome};

const PORT: u16 = 8501;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<ChatPipeline>,
    session: Arc<Mutex<Vec<Turn>>>,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
    crisis: bool,
    turns: usize,
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
    let state = AppState {
        pipeline,
        session: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/", get(serve_chat_ui))
        .route("/health", get(health))
        .route("/api/chat", post(api_chat))
        .route("/api/reset", post(api_reset))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], PORT));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("🌙 Luna lite UI: http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn serve_chat_ui() -> Html<&'static str> {
    const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(INDEX)
}

async fn api_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Json<ChatResponse> {
    // Hold the session lock across the turn so concurrent posts cannot
    // interleave their history updates.
    let mut session = state.session.lock().await;
    let (reply, outcome) = state.pipeline.respond_traced(&body.message, &session).await;
    if outcome == TurnOutcome::Generated || outcome == TurnOutcome::Crisis {
        session.push(Turn::new(body.message, reply.clone()));
    }
    Json(ChatResponse {
        reply,
        crisis: outcome == TurnOutcome::Crisis,
        turns: session.len(),
    })
}

async fn api_reset(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut session = state.session.lock().await;
    let dropped = session.len();
    session.clear();
    tracing::info!("session reset ({} turns dropped)", dropped);
    Json(serde_json::json!({ "status": "ok", "dropped": dropped }))
}
