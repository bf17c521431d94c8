//! The operator console's websocket entrypoint, built on `axum` — the
//! `tokio` ecosystem's idiomatic choice for the job.

use crate::session::{handle_socket, SharedState};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use reviewbot_config::Config;
use reviewbot_scheduler::{Command, RawDelta};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use crate::snapshot::{spawn_mirror, Snapshot};

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<SharedState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run the operator console server until `shutdown` resolves. `deltas` is
/// the scheduler's broadcast sender — a mirror subscription is created
/// immediately so no delta is missed between startup and the first
/// connection.
///
/// # Errors
/// Returns an I/O error if `config.bind_address` cannot be bound.
pub async fn serve(
    config: &Config,
    deltas: broadcast::Sender<RawDelta>,
    commands_tx: mpsc::UnboundedSender<Command>,
    shutdown: impl std::future::Future<Output = ()>,
) -> std::io::Result<()> {
    let snapshot = Arc::new(Snapshot::new());
    spawn_mirror(snapshot.clone(), deltas.subscribe());

    let ignore_list = config.ignore_list.iter().map(ToString::to_string).collect();
    let state = Arc::new(SharedState {
        snapshot,
        deltas,
        commands_tx,
        operator_secret: config.operator_secret.clone(),
        ignore_list,
    });

    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "operator console listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}
