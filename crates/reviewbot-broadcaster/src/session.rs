//! One connected operator session (C10): login gating, command forwarding,
//! and delta fan-out, all driven from a single per-connection task.

use crate::wire::{project_delta, ClientMessage, DeltaMap, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use reviewbot_core::{PackageName, Version};
use reviewbot_scheduler::{Command, RawDelta};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::snapshot::Snapshot;

/// State shared by every connected session.
pub struct SharedState {
    pub snapshot: Arc<Snapshot>,
    pub deltas: broadcast::Sender<RawDelta>,
    pub commands_tx: mpsc::UnboundedSender<Command>,
    pub operator_secret: String,
    pub ignore_list: Vec<String>,
}

/// Drive one websocket connection until it closes. Unauthenticated sessions
/// only accept `LoginRequest`; every other verb is a no-op.
pub async fn handle_socket(mut socket: WebSocket, state: Arc<SharedState>) {
    let mut deltas = state.deltas.subscribe();
    let mut authenticated = false;

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(message) = serde_json::from_str::<ClientMessage>(&text) else {
                            warn!("dropped an unparseable operator console message");
                            continue;
                        };
                        if !authenticated {
                            if let ClientMessage::LoginRequest { password } = message {
                                authenticated = secrets_match(&password, &state.operator_secret);
                                if send(&mut socket, &ServerMessage::LoginResult { ok: authenticated }).await.is_err() {
                                    break;
                                }
                                if authenticated {
                                    let snapshot = state.snapshot.full().await;
                                    let first = ServerMessage::FirstUpdate { snapshot, ignore_list: state.ignore_list.clone() };
                                    if send(&mut socket, &first).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            continue;
                        }
                        if let Some(command) = to_command(message) {
                            let _ = state.commands_tx.send(command);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        debug!(%error, "operator console socket errored");
                        break;
                    }
                }
            }
            delta = deltas.recv(), if authenticated => {
                match delta {
                    Ok(delta) => {
                        if let Some((name, status)) = project_delta(&delta) {
                            let mut map = DeltaMap::new();
                            map.insert(name, vec![status]);
                            if send(&mut socket, &ServerMessage::Updates { delta: map }).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "operator console session lagged behind the delta stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).expect("server messages always serialize");
    socket.send(Message::Text(text.into())).await
}

fn to_command(message: ClientMessage) -> Option<Command> {
    match message {
        ClientMessage::ResetBackend => Some(Command::ResetBackend),
        ClientMessage::ResetRules => Some(Command::ResetRules),
        ClientMessage::LoginRequest { .. } => None,
        ClientMessage::PullRequestRequest { name } => PackageName::parse(&name).ok().map(Command::PullRequestRequest),
        ClientMessage::RerunPackageRequest { name, version } => {
            let name = PackageName::parse(&name).ok()?;
            let version: Version = version.parse().ok()?;
            Some(Command::RerunPackageRequest(name, version))
        }
    }
}

/// Constant-time secret comparison: length is checked up front
/// (an unavoidable, widely accepted leak for bearer-secret comparisons)
/// before the constant-time byte comparison.
fn secrets_match(provided: &str, expected: &str) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
