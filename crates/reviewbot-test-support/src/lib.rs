//! Shared fixtures for crate test suites: sample manifests, in-memory
//! archives, a scriptable rule engine, and HTTP mock servers for the
//! registry and hosting platform.

#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod fixtures;
pub mod mock_hosting;
pub mod mock_registry;
pub mod scripted_engine;

pub use mock_hosting::{MockArchiveHost, MockHostingApi};
pub use mock_registry::MockRegistry;
pub use scripted_engine::ScriptedRuleEngine;
