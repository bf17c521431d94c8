//! The work scheduler (C4): the actor loop that owns `BackendState` and
//! drives the fetch → analyze → PR pipeline end to end.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod actor;
mod command;
mod delta;
mod outcome_map;
mod selection;

pub use actor::Scheduler;
pub use command::Command;
pub use delta::RawDelta;
pub use selection::{select, Selection};
