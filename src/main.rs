use axum::{
  extract::{State, WebSocketUpgrade},
  http::Method,
  response::IntoResponse,
  routing::get,
  Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod app;
mod broadcast;
mod game;
mod leaderboard;
mod protocol;
mod scheduler;
mod server;
mod session;
mod shared;
mod transport;

use app::config::AppConfig;
use broadcast::ChannelHub;
use leaderboard::LeaderboardClient;
use scheduler::TickScheduler;
use server::GameServer;
use session::SessionManager;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
  ok: bool,
  active_sessions: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = AppConfig::from_env()?;

  let sessions = Arc::new(SessionManager::new());
  let hub = Arc::new(ChannelHub::new());
  let server = Arc::new(GameServer::new(
    Arc::clone(&sessions),
    Arc::clone(&hub),
    config.board_width,
    config.board_height,
  ));

  let leaderboard = config.leaderboard_url.as_deref().map(LeaderboardClient::new);
  match &leaderboard {
    Some(client) => tracing::info!(endpoint = client.endpoint(), "leaderboard submissions enabled"),
    None => tracing::info!("LEADERBOARD_URL not set, scores stay local"),
  }
  let (finished_tx, finished_rx) = mpsc::unbounded_channel();
  tokio::spawn(leaderboard::run_submitter(
    finished_rx,
    leaderboard,
    config.leaderboard_region.clone(),
  ));

  let scheduler = TickScheduler::new(
    Arc::clone(&sessions),
    hub,
    config.tick_interval,
    config.idle_broadcast_interval,
  )
  .with_finished_games(finished_tx);
  tokio::spawn(scheduler.run());

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET])
    .allow_headers(Any);

  let app = Router::new()
    .route("/api/health", get(health))
    .route("/api/game", get(ws_handler))
    .layer(cors)
    .with_state(server);

  let address = format!("0.0.0.0:{}", config.port);
  tracing::info!(
    width = config.board_width,
    height = config.board_height,
    "listening on {address}"
  );

  let listener = tokio::net::TcpListener::bind(&address).await?;
  axum::serve(listener, app).await?;

  Ok(())
}

async fn health(State(server): State<Arc<GameServer>>) -> impl IntoResponse {
  Json(HealthResponse {
    ok: true,
    active_sessions: server.sessions().len(),
  })
}

async fn ws_handler(
  ws: WebSocketUpgrade,
  State(server): State<Arc<GameServer>>,
) -> impl IntoResponse {
  ws.on_upgrade(move |socket| transport::ws_session::handle_socket(socket, server))
}
