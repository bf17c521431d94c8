//! A scriptable `RuleEngine` fake for driving the iterative fix loop in
//! tests without a real static-analysis implementation.

use reviewbot_analysis::{EngineOutput, Project, RuleEngine};
use std::sync::Mutex;

/// Returns a pre-scripted sequence of `EngineOutput`s, one per call to
/// `run`. Panics if `run` is called more times than outputs were scripted —
/// tests should script one output per expected fixpoint iteration, ending
/// with an empty-diagnostics output once the loop should converge.
#[derive(Debug)]
pub struct ScriptedRuleEngine {
    outputs: Mutex<std::vec::IntoIter<EngineOutput>>,
}

impl ScriptedRuleEngine {
    #[must_use]
    pub fn new(outputs: Vec<EngineOutput>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into_iter()),
        }
    }

    /// An engine that finds nothing, on every call.
    #[must_use]
    pub fn clean() -> Self {
        Self::new(vec![EngineOutput::default()])
    }
}

impl RuleEngine for ScriptedRuleEngine {
    fn run(&self, _project: &Project) -> EngineOutput {
        let mut outputs = self.outputs.lock().expect("scripted engine mutex is never poisoned");
        outputs.next().unwrap_or_else(|| {
            panic!("ScriptedRuleEngine::run called more times than outputs were scripted")
        })
    }
}
