//! Minimal standalone chat-log service: the external "shared resource" a node accesses only
//! while holding the critical section. Not part of the RA core — a demo client can be pointed
//! at it to see the mutual-exclusion contract do something observable.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(about = "Demo shared chat-log service for the ra-dme examples")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: SocketAddr,
    #[arg(long, default_value = "chat.log")]
    chatfile: PathBuf,
}

#[derive(Clone)]
struct AppState {
    chatfile: Arc<PathBuf>,
    // serializes appends; reads are not locked against concurrent writers, matching the original
    // reference service's best-effort consistency.
    write_lock: Arc<Mutex<()>>,
}

#[derive(Deserialize)]
struct AppendRequest {
    node_id: String,
    client_time: String,
    text: String,
}

async fn view(State(state): State<AppState>) -> Result<String, StatusCode> {
    match tokio::fs::read_to_string(&*state.chatfile).await {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => {
            tracing::warn!(%err, "failed to read chat log");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn append(State(state): State<AppState>, Json(body): Json<AppendRequest>) -> StatusCode {
    let _guard = state.write_lock.lock().await;
    let line = format!("{} {}: {}\n", body.client_time, body.node_id, body.text);
    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&*state.chatfile)
        .await;
    match file {
        Ok(mut file) => match file.write_all(line.as_bytes()).await {
            Ok(()) => StatusCode::OK,
            Err(err) => {
                tracing::warn!(%err, "failed to append to chat log");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        Err(err) => {
            tracing::warn!(%err, "failed to open chat log");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let state = AppState {
        chatfile: Arc::new(args.chatfile),
        write_lock: Arc::new(Mutex::new(())),
    };
    let app = Router::new()
        .route("/view", get(view))
        .route("/append", post(append))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "file server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
