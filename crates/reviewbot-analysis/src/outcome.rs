//! Outcome taxonomy: what an analysis attempt, or the pipeline stages before
//! it, produced.

use reviewbot_core::{Diagnostic, PackageName, TransportError};

/// Why a fix could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixFailReason {
    /// Applying the fix's edits produced byte-identical text.
    Unchanged,
    /// The fix's edits fell outside the manifest text or split a character.
    SourceCodeInvalid(String),
    /// Two or more edits in the fix overlapped.
    OverlappingFixRanges,
}

/// The result of running the rule engine's iterative fix loop to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// The engine reported a `"ParsingError"` diagnostic.
    ParsingError(Vec<String>),
    /// The engine reported an `"Incorrect project"` diagnostic.
    IncorrectProject,
    /// A manifest fix was found but could not be applied.
    FixFailed(FixFailReason),
    /// The iteration budget was exhausted before reaching a fixpoint.
    NotEnoughIterations,
    /// The manifest's `elm-version` constraint excludes the fixed target.
    NotAnEligiblePackage,
    /// A direct dependency could not be resolved from the local cache.
    MissingDependencies(Vec<PackageName>),
    /// The loop reached a fixpoint having applied one or more fixes.
    FoundErrors {
        /// Every diagnostic whose fix was applied, in application order.
        errors: Vec<Diagnostic>,
        /// The manifest text before any fix was applied (iteration 0).
        old_manifest_text: String,
        /// The manifest text after the last applied fix.
        new_manifest_text: String,
    },
    /// The loop reached a fixpoint having applied no fixes.
    NoErrors,
}

/// Everything that can happen while reviewing one package-version, from
/// archive retrieval through analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The archive bytes did not parse as a valid ZIP, or had no top-level
    /// folder.
    CouldNotOpenArchive,
    /// The archive retriever got a 404 for the version's tag.
    TagNotFound,
    /// A transport failure occurred fetching the archive.
    TransportError(TransportError),
    /// The rule engine ran to completion (possibly with zero iterations).
    RuleRun(RunResult),
}
