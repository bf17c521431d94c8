//! The subscription broadcaster (C9) and operator command handler (C10):
//! the websocket-facing side of the operator console.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod server;
mod session;
mod snapshot;
mod wire;

pub use server::serve;
pub use snapshot::Snapshot;
pub use wire::{
    project_delta, project_record, ClientMessage, DeltaMap, ProjectedOutcome, ProjectedStatus, ServerMessage,
    VersionedStatus,
};
