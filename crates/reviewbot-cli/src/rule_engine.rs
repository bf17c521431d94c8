//! The default `RuleEngine` binding.
//!
//! The rule that actually decides which dependencies are unused lives
//! outside this crate — operators wire their own `RuleEngine` in place of
//! this one. `NoOpRuleEngine` exists so the binary links and runs the full
//! pipeline (every record still reaches `FetchedAndChecked`) before a real
//! engine is plugged in.

use reviewbot_analysis::{EngineOutput, Project, RuleEngine};

#[derive(Debug, Default)]
pub struct NoOpRuleEngine;

impl RuleEngine for NoOpRuleEngine {
    fn run(&self, _project: &Project) -> EngineOutput {
        EngineOutput::default()
    }
}
