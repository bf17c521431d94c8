//! The package cache (C2) and the process-wide backend state it lives in.
//!
//! Everything here is a plain owned value, mutated through `&mut` — there is
//! deliberately no interior mutability or shared-memory concurrency. The
//! actor loop in `reviewbot-scheduler` is the only thing that ever holds a
//! `BackendState` at a time.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod cache;
mod insertion_order;
mod record;
mod state;

pub use cache::PackageCache;
pub use record::{FoundErrorsPayload, PackageRecord};
pub use state::{BackendState, SessionId};
