//! Resolution of the open question: what the default-branch/tag SHA guard
//! does when it fails.

/// How the pull-request orchestrator treats a default-branch-head/tag-SHA
/// mismatch.
///
/// The upstream behavior this system was distilled from computes the
/// equivalence but never acts on it; this toggle makes the previously
/// ambiguous behavior explicit and operator-controlled instead of silently
/// picking one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrGuardMode {
    /// Compute the guard and pass it through to the UI layer as a label; the
    /// PR sequence runs regardless of whether it matches. This is the
    /// observed default behavior.
    #[default]
    Annotate,
    /// Abort the PR sequence with `PRFailed("guard", ...)` when the
    /// default-branch head does not match the tag for `manifest.version`.
    Enforce,
}

impl PrGuardMode {
    /// Parse the `REVIEWBOT_PR_GUARD_MODE` environment value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "annotate" => Some(Self::Annotate),
            "enforce" => Some(Self::Enforce),
            _ => None,
        }
    }
}
