//! The bounded fixpoint loop that drives the rule engine and applies
//! manifest-targeted fixes.
//!
//! Implemented as an explicit iteration counter rather than recursion, so
//! lifting the iteration cap never risks stack growth.

use crate::engine::RuleEngine;
use crate::outcome::{FixFailReason, RunResult};
use crate::project::{Project, CANONICAL_MANIFEST_PATH};
use reviewbot_core::{Diagnostic, FixApplyOutcome, PackageManifest};
use tracing::debug;

/// The initial iteration budget for the fix loop.
pub const MAX_FIX_ITERATIONS: u32 = 10;

/// Run `engine` against `project` to a fixpoint, applying manifest fixes as
/// they're found, and classify the result.
#[must_use]
pub fn run_analysis(project: Project, engine: &dyn RuleEngine) -> RunResult {
    let old_manifest_text = project.manifest.to_json();
    let mut current_text = old_manifest_text.clone();
    let mut current_project = project;
    let mut applied: Vec<Diagnostic> = Vec::new();
    let mut budget = MAX_FIX_ITERATIONS;

    loop {
        let output = engine.run(&current_project);

        if output
            .diagnostics
            .iter()
            .any(|d| d.rule_name == "ParsingError")
        {
            let messages = output
                .diagnostics
                .iter()
                .filter(|d| d.rule_name == "ParsingError")
                .map(|d| d.message.clone())
                .collect();
            return RunResult::ParsingError(messages);
        }

        if output
            .diagnostics
            .iter()
            .any(|d| d.rule_name == "Incorrect project")
        {
            return RunResult::IncorrectProject;
        }

        let manifest_fix = output
            .diagnostics
            .iter()
            .find(|d| d.file_path == CANONICAL_MANIFEST_PATH && d.fix.is_some());

        let Some(diagnostic) = manifest_fix else {
            return if applied.is_empty() {
                RunResult::NoErrors
            } else {
                RunResult::FoundErrors {
                    errors: applied,
                    old_manifest_text,
                    new_manifest_text: current_text,
                }
            };
        };

        let fix = diagnostic
            .fix
            .as_ref()
            .expect("manifest_fix filters on fix.is_some()");

        let new_text = match fix.apply(&current_text) {
            FixApplyOutcome::Applied(text) => text,
            FixApplyOutcome::Unchanged => {
                return RunResult::FixFailed(FixFailReason::Unchanged);
            }
            FixApplyOutcome::OverlappingFixRanges => {
                return RunResult::FixFailed(FixFailReason::OverlappingFixRanges);
            }
            FixApplyOutcome::SourceCodeInvalid(msg) => {
                return RunResult::FixFailed(FixFailReason::SourceCodeInvalid(msg));
            }
        };

        let new_manifest = match PackageManifest::parse(&new_text) {
            Ok(manifest) => manifest,
            Err(_) => {
                return RunResult::FixFailed(FixFailReason::SourceCodeInvalid(
                    "manifest is now application-typed".to_string(),
                ));
            }
        };

        debug!(rule = %diagnostic.rule_name, iterations_left = budget - 1, "applied manifest fix");

        applied.push(diagnostic.clone());
        current_text = new_text;
        current_project = current_project.with_manifest(new_manifest);
        budget -= 1;

        if budget == 0 {
            return RunResult::NotEnoughIterations;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOutput;
    use reviewbot_core::{Fix, FixEdit, PackageName, SourceRange, VersionConstraint, Version};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manifest(deps: &[(&str, &str)]) -> PackageManifest {
        let mut dependencies = BTreeMap::new();
        for (name, constraint) in deps {
            dependencies.insert(
                PackageName::parse(name).unwrap(),
                VersionConstraint::parse(constraint).unwrap(),
            );
        }
        PackageManifest {
            name: PackageName::parse("x/y").unwrap(),
            version: Version::new(1, 0, 0),
            exposed_modules: vec!["X".to_string()],
            dependencies,
            test_dependencies: BTreeMap::new(),
            elm_version: VersionConstraint::parse("0.19.0 <= v < 0.20.0").unwrap(),
        }
    }

    fn project_with(deps: &[(&str, &str)]) -> Project {
        Project {
            manifest: manifest(deps),
            modules: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// An engine that always reports no diagnostics.
    struct CleanEngine;
    impl RuleEngine for CleanEngine {
        fn run(&self, _project: &Project) -> EngineOutput {
            EngineOutput::default()
        }
    }

    #[test]
    fn no_diagnostics_is_no_errors() {
        let project = project_with(&[]);
        assert_eq!(run_analysis(project, &CleanEngine), RunResult::NoErrors);
    }

    /// An engine that reports one unused-dependency diagnostic removing
    /// `"dependencies": {...}` down to `{}`, exactly once, then goes clean.
    struct RemoveDependencyEngine {
        calls: AtomicUsize,
    }

    impl RuleEngine for RemoveDependencyEngine {
        fn run(&self, project: &Project) -> EngineOutput {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call > 0 || project.manifest.dependencies.is_empty() {
                return EngineOutput::default();
            }
            let text = project.manifest.to_json();
            let start = text.find("\"dependencies\":").unwrap();
            let brace_start = text[start..].find('{').unwrap() + start;
            let mut depth = 0i32;
            let mut end = brace_start;
            for (i, c) in text[brace_start..].char_indices() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = brace_start + i + 1;
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let range = byte_range_to_source_range(&text, brace_start, end);
            EngineOutput {
                diagnostics: vec![Diagnostic {
                    message: "Unused dependency `elm/core`".to_string(),
                    rule_name: "NoUnused.Dependencies".to_string(),
                    file_path: CANONICAL_MANIFEST_PATH.to_string(),
                    details: vec![],
                    range,
                    fix: Some(Fix {
                        edits: vec![FixEdit {
                            range,
                            replacement: "{}".to_string(),
                        }],
                    }),
                }],
            }
        }
    }

    fn byte_range_to_source_range(text: &str, start: usize, end: usize) -> SourceRange {
        let (mut row, mut col) = (0u32, 0u32);
        for (i, b) in text.bytes().enumerate() {
            if i == start {
                break;
            }
            if b == b'\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        let (start_row, start_col) = (row, col);
        for (i, b) in text.bytes().enumerate().skip(start) {
            if i == end {
                break;
            }
            if b == b'\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        SourceRange {
            start_row,
            start_col,
            end_row: row,
            end_col: col,
        }
    }

    #[test]
    fn applies_fix_then_converges_to_found_errors() {
        let project = project_with(&[("elm/core", "1.0.0 <= v < 2.0.0")]);
        let engine = RemoveDependencyEngine {
            calls: AtomicUsize::new(0),
        };
        let result = run_analysis(project, &engine);
        match result {
            RunResult::FoundErrors {
                errors,
                new_manifest_text,
                ..
            } => {
                assert_eq!(errors.len(), 1);
                let reparsed = PackageManifest::parse(&new_manifest_text).unwrap();
                assert!(reparsed.dependencies.is_empty());
            }
            other => panic!("expected FoundErrors, got {other:?}"),
        }
    }

    struct AlwaysParsingError;
    impl RuleEngine for AlwaysParsingError {
        fn run(&self, _project: &Project) -> EngineOutput {
            EngineOutput {
                diagnostics: vec![Diagnostic {
                    message: "unexpected token".to_string(),
                    rule_name: "ParsingError".to_string(),
                    file_path: "src/Foo.elm".to_string(),
                    details: vec![],
                    range: SourceRange {
                        start_row: 0,
                        start_col: 0,
                        end_row: 0,
                        end_col: 1,
                    },
                    fix: None,
                }],
            }
        }
    }

    #[test]
    fn parsing_error_terminates_immediately() {
        let project = project_with(&[]);
        let result = run_analysis(project, &AlwaysParsingError);
        assert!(matches!(result, RunResult::ParsingError(messages) if messages.len() == 1));
    }

    struct AlwaysIncorrectProject;
    impl RuleEngine for AlwaysIncorrectProject {
        fn run(&self, _project: &Project) -> EngineOutput {
            EngineOutput {
                diagnostics: vec![Diagnostic {
                    message: "no exposed modules resolve".to_string(),
                    rule_name: "Incorrect project".to_string(),
                    file_path: CANONICAL_MANIFEST_PATH.to_string(),
                    details: vec![],
                    range: SourceRange {
                        start_row: 0,
                        start_col: 0,
                        end_row: 0,
                        end_col: 1,
                    },
                    fix: None,
                }],
            }
        }
    }

    #[test]
    fn incorrect_project_terminates_immediately() {
        let project = project_with(&[]);
        assert_eq!(
            run_analysis(project, &AlwaysIncorrectProject),
            RunResult::IncorrectProject
        );
    }

    /// An engine that always proposes the same no-op fix, forcing
    /// `FixFailed(Unchanged)`.
    struct NoOpFixEngine;
    impl RuleEngine for NoOpFixEngine {
        fn run(&self, project: &Project) -> EngineOutput {
            let text = project.manifest.to_json();
            EngineOutput {
                diagnostics: vec![Diagnostic {
                    message: "no-op".to_string(),
                    rule_name: "NoUnused.Dependencies".to_string(),
                    file_path: CANONICAL_MANIFEST_PATH.to_string(),
                    details: vec![],
                    range: SourceRange {
                        start_row: 0,
                        start_col: 0,
                        end_row: 0,
                        end_col: 1,
                    },
                    fix: Some(Fix {
                        edits: vec![FixEdit {
                            range: SourceRange {
                                start_row: 0,
                                start_col: 0,
                                end_row: 0,
                                end_col: 1,
                            },
                            replacement: text[0..1].to_string(),
                        }],
                    }),
                }],
            }
        }
    }

    #[test]
    fn unchanged_fix_fails() {
        let project = project_with(&[]);
        assert_eq!(
            run_analysis(project, &NoOpFixEngine),
            RunResult::FixFailed(FixFailReason::Unchanged)
        );
    }

    /// An engine that keeps proposing a real fix forever, to exercise the
    /// iteration cap. Each call flips one character in a comment-like spot
    /// that doesn't change manifest semantics, so it can keep "succeeding"
    /// without ever converging.
    struct NeverConvergesEngine;
    impl RuleEngine for NeverConvergesEngine {
        fn run(&self, project: &Project) -> EngineOutput {
            let text = project.manifest.to_json();
            // Toggle the license-less summary-ish padding by inserting a
            // space before the closing brace; always parses, never settles.
            let insert_at = text.rfind('}').unwrap();
            EngineOutput {
                diagnostics: vec![Diagnostic {
                    message: "always reapplies".to_string(),
                    rule_name: "NoUnused.Dependencies".to_string(),
                    file_path: CANONICAL_MANIFEST_PATH.to_string(),
                    details: vec![],
                    range: SourceRange {
                        start_row: 0,
                        start_col: 0,
                        end_row: 0,
                        end_col: 0,
                    },
                    fix: Some(Fix {
                        edits: vec![FixEdit {
                            range: byte_range_to_source_range(&text, insert_at, insert_at),
                            replacement: " ".to_string(),
                        }],
                    }),
                }],
            }
        }
    }

    #[test]
    fn exhausting_budget_yields_not_enough_iterations() {
        let project = project_with(&[]);
        assert_eq!(
            run_analysis(project, &NeverConvergesEngine),
            RunResult::NotEnoughIterations
        );
    }

    /// P7: `FoundErrors`'s `old_manifest_text` parses as a library manifest
    /// whose direct+test dependencies are a proper superset of
    /// `new_manifest_text`'s.
    #[test]
    fn found_errors_old_manifest_is_a_proper_superset_of_new() {
        let project = project_with(&[("elm/core", "1.0.0 <= v < 2.0.0")]);
        let engine = RemoveDependencyEngine { calls: AtomicUsize::new(0) };
        let RunResult::FoundErrors { old_manifest_text, new_manifest_text, .. } = run_analysis(project, &engine) else {
            panic!("expected FoundErrors");
        };
        let old = PackageManifest::parse(&old_manifest_text).unwrap();
        let new = PackageManifest::parse(&new_manifest_text).unwrap();

        let old_deps: std::collections::BTreeSet<_> =
            old.dependencies.keys().chain(old.test_dependencies.keys()).collect();
        let new_deps: std::collections::BTreeSet<_> =
            new.dependencies.keys().chain(new.test_dependencies.keys()).collect();
        assert!(new_deps.is_subset(&old_deps));
        assert!(new_deps.len() < old_deps.len());
    }

    /// P6: re-running analysis with `new_manifest_text` as the starting
    /// manifest converges to `NoErrors` under the same rule.
    #[test]
    fn rerunning_on_the_fixed_manifest_is_idempotent() {
        let project = project_with(&[("elm/core", "1.0.0 <= v < 2.0.0")]);
        let first_engine = RemoveDependencyEngine { calls: AtomicUsize::new(0) };
        let RunResult::FoundErrors { new_manifest_text, .. } = run_analysis(project, &first_engine) else {
            panic!("expected FoundErrors");
        };

        let fixed_manifest = PackageManifest::parse(&new_manifest_text).unwrap();
        let fixed_project = Project {
            manifest: fixed_manifest,
            modules: Vec::new(),
            dependencies: Vec::new(),
        };
        let second_engine = RemoveDependencyEngine { calls: AtomicUsize::new(0) };
        assert_eq!(run_analysis(fixed_project, &second_engine), RunResult::NoErrors);
    }
}
