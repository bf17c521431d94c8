//! The external rule-engine contract.
//!
//! The rule engine's own internals (the static-analysis implementation) live
//! outside this crate; this is the boundary the analysis driver is written
//! against.

use crate::project::Project;
use reviewbot_core::Diagnostic;

/// What one invocation of the rule engine returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineOutput {
    /// Every diagnostic the engine produced for this invocation.
    pub diagnostics: Vec<Diagnostic>,
}

/// The contract the analysis driver is written against. A real engine
/// implementation lives outside this system; tests drive the loop against a
/// scripted fake (see `reviewbot-test-support`).
pub trait RuleEngine: Send + Sync {
    /// Run the rule(s) against `project` and return every diagnostic
    /// produced. Must be pure with respect to `project`: same input, same
    /// output, since the fixpoint loop re-runs it after every patch.
    fn run(&self, project: &Project) -> EngineOutput;
}
