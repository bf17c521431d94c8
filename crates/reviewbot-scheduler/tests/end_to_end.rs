//! End-to-end scheduler scenarios, driven over real HTTP against mock
//! registry/archive/hosting servers rather than unit-level fakes.

use reviewbot_analysis::{EngineOutput, ReviewOutcome, RunResult};
use reviewbot_cache::PackageRecord;
use reviewbot_config::{Config, PrGuardMode};
use reviewbot_core::{Diagnostic, Fix, FixEdit, PackageName, SourceRange, TransportError, Version};
use reviewbot_scheduler::{Command, RawDelta, Scheduler};
use reviewbot_test_support::{fixtures, MockArchiveHost, MockHostingApi, MockRegistry, ScriptedRuleEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

fn test_config(registry: &MockRegistry, archive: &MockArchiveHost, hosting: &MockHostingApi) -> Config {
    Config {
        hosting_token: "test-token".to_string(),
        operator_secret: "test-secret".to_string(),
        package_count_offset: 0,
        ignore_list: Vec::new(),
        poll_interval: Duration::from_secs(3600),
        pr_guard_mode: PrGuardMode::Annotate,
        bind_address: "127.0.0.1:0".to_string(),
        registry_host: registry.base_url(),
        archive_host: archive.base_url(),
        hosting_api_host: hosting.base_url(),
    }
}

/// Runs `scheduler` in the background and returns a handle plus a receiver
/// for every delta it emits, along with the shutdown trigger and command
/// sender the test drives it with.
struct Harness {
    deltas: broadcast::Receiver<RawDelta>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl Harness {
    fn spawn(config: &Config, rule_engine: Arc<dyn reviewbot_analysis::RuleEngine>) -> Self {
        let (deltas_tx, deltas_rx) = broadcast::channel(64);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let scheduler = Scheduler::new(config, rule_engine, deltas_tx);
        let task = tokio::spawn(scheduler.run(commands_rx, async {
            let _ = shutdown_rx.await;
        }));
        Self {
            deltas: deltas_rx,
            commands: commands_tx,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn next_delta_for(&mut self, name: &PackageName, timeout: Duration) -> RawDelta {
        tokio::time::timeout(timeout, async {
            loop {
                let delta = self.deltas.recv().await.expect("deltas channel closed early");
                if &delta.name == name {
                    return delta;
                }
            }
        })
        .await
        .expect("expected a delta before the timeout")
    }

    async fn shutdown(mut self) {
        let _ = self.shutdown.take().unwrap().send(());
        let _ = self.task.await;
    }
}

fn removal_fix_output(old_manifest_text: &str) -> EngineOutput {
    let start = old_manifest_text.find("\"dependencies\":").unwrap();
    let brace_start = old_manifest_text[start..].find('{').unwrap() + start;
    let mut depth = 0i32;
    let mut end = brace_start;
    for (i, c) in old_manifest_text[brace_start..].char_indices() {
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
    let range = byte_range_to_source_range(old_manifest_text, brace_start, end);
    EngineOutput {
        diagnostics: vec![Diagnostic {
            message: "Unused dependency `elm/core`".to_string(),
            rule_name: "NoUnused.Dependencies".to_string(),
            file_path: reviewbot_analysis::CANONICAL_MANIFEST_PATH.to_string(),
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
    SourceRange { start_row, start_col, end_row: row, end_col: col }
}

#[tokio::test]
async fn fresh_poll_discovers_a_pending_package() {
    let registry = MockRegistry::start().await;
    let archive = MockArchiveHost::start().await;
    let hosting = MockHostingApi::start().await;
    registry.register_since(0, &["owner/repo@1.0.0"]).await;

    let config = test_config(&registry, &archive, &hosting);
    let mut harness = Harness::spawn(&config, Arc::new(ScriptedRuleEngine::clean()));

    let name = PackageName::parse("owner/repo").unwrap();
    let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
    assert!(matches!(delta.record, PackageRecord::Pending { .. }));
    assert_eq!(delta.version, Version::new(1, 0, 0));

    harness.shutdown().await;
}

#[tokio::test]
async fn metadata_fetch_failure_marks_the_record_failed() {
    let registry = MockRegistry::start().await;
    let archive = MockArchiveHost::start().await;
    let hosting = MockHostingApi::start().await;
    registry.register_since(0, &["owner/repo@1.0.0"]).await;
    registry.register_manifest_not_found("owner", "repo", "1.0.0").await;

    let config = test_config(&registry, &archive, &hosting);
    let mut harness = Harness::spawn(&config, Arc::new(ScriptedRuleEngine::clean()));

    let name = PackageName::parse("owner/repo").unwrap();
    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
        if let PackageRecord::FetchMetaFailed { error, .. } = delta.record {
            assert!(matches!(error, TransportError::NotFound));
            break;
        }
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn clean_package_analyzes_to_no_errors() {
    let registry = MockRegistry::start().await;
    let archive = MockArchiveHost::start().await;
    let hosting = MockHostingApi::start().await;

    let version = Version::new(1, 0, 0);
    let manifest_json = fixtures::manifest_json("owner/repo", version);
    registry.register_since(0, &["owner/repo@1.0.0"]).await;
    registry.register_package("owner", "repo", "1.0.0", &manifest_json, "[]").await;
    archive
        .register_archive("owner", "repo", "1.0.0", reviewbot_test_support::archive::minimal_package_archive("repo", "1.0.0", &manifest_json))
        .await;

    let config = test_config(&registry, &archive, &hosting);
    let mut harness = Harness::spawn(&config, Arc::new(ScriptedRuleEngine::clean()));

    let name = PackageName::parse("owner/repo").unwrap();
    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
        if let PackageRecord::FetchedAndChecked { outcome, .. } = delta.record {
            assert_eq!(outcome, ReviewOutcome::RuleRun(RunResult::NoErrors));
            break;
        }
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn only_the_latest_known_version_reaches_analysis() {
    let registry = MockRegistry::start().await;
    let archive = MockArchiveHost::start().await;
    let hosting = MockHostingApi::start().await;

    let older = Version::new(1, 0, 0);
    let latest = Version::new(1, 1, 0);
    let older_json = fixtures::manifest_json("owner/repo", older);
    let latest_json = fixtures::manifest_json("owner/repo", latest);

    // Oldest-first on the wire; the poller reverses it to newest-first.
    registry.register_since(0, &["owner/repo@1.0.0", "owner/repo@1.1.0"]).await;
    registry.register_package("owner", "repo", "1.0.0", &older_json, "[]").await;
    registry.register_package("owner", "repo", "1.1.0", &latest_json, "[]").await;
    archive
        .register_archive("owner", "repo", "1.1.0", reviewbot_test_support::archive::minimal_package_archive("repo", "1.1.0", &latest_json))
        .await;
    // No archive mounted for 1.0.0 — if the scheduler ever tried to analyze
    // it, the request would 404 and the test's failure branch below would
    // trip.

    let config = test_config(&registry, &archive, &hosting);
    let mut harness = Harness::spawn(&config, Arc::new(ScriptedRuleEngine::clean()));

    let name = PackageName::parse("owner/repo").unwrap();
    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
        match delta.record {
            PackageRecord::FetchedAndChecked { version, .. } => {
                assert_eq!(version, latest, "only the latest version should ever reach FetchedAndChecked");
                break;
            }
            PackageRecord::FetchMetaFailed { version, .. } => {
                panic!("unexpected metadata failure for {version}");
            }
            _ => continue,
        }
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn reserved_root_package_is_fetched_but_never_analyzed() {
    let registry = MockRegistry::start().await;
    let archive = MockArchiveHost::start().await;
    let hosting = MockHostingApi::start().await;

    let version = Version::new(1, 0, 0);
    let manifest_json = fixtures::manifest_json("elm/core", version);
    registry.register_since(0, &["elm/core@1.0.0"]).await;
    registry.register_package("elm", "core", "1.0.0", &manifest_json, "[]").await;
    // Deliberately no archive mounted for elm/core: reaching it would be a
    // defect in the reserved-prefix skip.

    let config = test_config(&registry, &archive, &hosting);
    let mut harness = Harness::spawn(&config, Arc::new(ScriptedRuleEngine::clean()));

    let name = PackageName::parse("elm/core").unwrap();
    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(2)).await;
        if let PackageRecord::Fetched { .. } = delta.record {
            break;
        }
    }

    // Give the scheduler a further beat to (incorrectly) attempt analysis,
    // then confirm it never did.
    tokio::select! {
        delta = harness.next_delta_for(&name, Duration::from_millis(500)) => {
            panic!("elm/core should never progress past Fetched, got {:?}", delta.record);
        }
        () = tokio::time::sleep(Duration::from_millis(600)) => {}
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn pull_request_round_trip_opens_a_pr_for_the_fixed_manifest() {
    let registry = MockRegistry::start().await;
    let archive = MockArchiveHost::start().await;
    let hosting = MockHostingApi::start().await;

    let version = Version::new(1, 0, 0);
    let manifest = fixtures::manifest_with_dependencies("owner/repo", version, &[("elm/core", "1.0.0 <= v < 2.0.0")]);
    let manifest_json = manifest.to_json();
    registry.register_since(0, &["owner/repo@1.0.0"]).await;
    registry.register_package("owner", "repo", "1.0.0", &manifest_json, "[]").await;
    archive
        .register_archive("owner", "repo", "1.0.0", reviewbot_test_support::archive::minimal_package_archive("repo", "1.0.0", &manifest_json))
        .await;

    hosting.register_repository("owner", "repo", "main").await;
    hosting.register_fork("owner", "repo", "reviewbot-bot").await;
    hosting.register_branch_head("reviewbot-bot", "repo", "main", "head-sha").await;
    hosting.register_commit("reviewbot-bot", "repo", "head-sha", "tree-sha").await;
    hosting.register_create_tree("reviewbot-bot", "repo", "new-tree-sha").await;
    hosting.register_create_commit("reviewbot-bot", "repo", "new-commit-sha").await;
    hosting.register_update_ref("reviewbot-bot", "repo", "main").await;
    hosting
        .register_open_pull_request("owner", "repo", "https://example.invalid/owner/repo/pull/1")
        .await;

    let engine = ScriptedRuleEngine::new(vec![removal_fix_output(&manifest_json), EngineOutput::default()]);
    let config = test_config(&registry, &archive, &hosting);
    let mut harness = Harness::spawn(&config, Arc::new(engine));

    let name = PackageName::parse("owner/repo").unwrap();
    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
        if let PackageRecord::FetchedAndChecked { outcome: ReviewOutcome::RuleRun(RunResult::FoundErrors { .. }), .. } = delta.record {
            break;
        }
    }

    harness.commands.send(Command::PullRequestRequest(name.clone())).unwrap();

    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
        match delta.record {
            PackageRecord::PrSent { url, .. } => {
                assert_eq!(url, "https://example.invalid/owner/repo/pull/1");
                break;
            }
            PackageRecord::PrFailed { stage, error, .. } => {
                panic!("pull request sequence failed at {stage}: {error:?}");
            }
            _ => continue,
        }
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn retrying_after_a_pr_failure_reuses_the_preserved_found_errors() {
    let registry = MockRegistry::start().await;
    let archive = MockArchiveHost::start().await;
    let hosting = MockHostingApi::start().await;

    let version = Version::new(1, 0, 0);
    let manifest = fixtures::manifest_with_dependencies("owner/repo", version, &[("elm/core", "1.0.0 <= v < 2.0.0")]);
    let manifest_json = manifest.to_json();
    registry.register_since(0, &["owner/repo@1.0.0"]).await;
    registry.register_package("owner", "repo", "1.0.0", &manifest_json, "[]").await;
    archive
        .register_archive("owner", "repo", "1.0.0", reviewbot_test_support::archive::minimal_package_archive("repo", "1.0.0", &manifest_json))
        .await;

    hosting.register_repository("owner", "repo", "main").await;
    hosting.register_fork("owner", "repo", "reviewbot-bot").await;
    hosting.register_branch_head("reviewbot-bot", "repo", "main", "head-sha").await;
    hosting.register_commit("reviewbot-bot", "repo", "head-sha", "tree-sha").await;
    hosting.register_create_tree("reviewbot-bot", "repo", "new-tree-sha").await;
    hosting.register_create_commit("reviewbot-bot", "repo", "new-commit-sha").await;
    hosting.register_update_ref_failing_once("reviewbot-bot", "repo", "main").await;
    hosting
        .register_open_pull_request("owner", "repo", "https://example.invalid/owner/repo/pull/1")
        .await;

    let engine = ScriptedRuleEngine::new(vec![removal_fix_output(&manifest_json), EngineOutput::default()]);
    let config = test_config(&registry, &archive, &hosting);
    let mut harness = Harness::spawn(&config, Arc::new(engine));

    let name = PackageName::parse("owner/repo").unwrap();
    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
        if let PackageRecord::FetchedAndChecked { outcome: ReviewOutcome::RuleRun(RunResult::FoundErrors { .. }), .. } = delta.record {
            break;
        }
    }

    harness.commands.send(Command::PullRequestRequest(name.clone())).unwrap();

    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
        if let PackageRecord::PrFailed { stage, error, .. } = delta.record {
            assert_eq!(stage, "updateBranch");
            assert!(matches!(error, TransportError::BadStatus { status: 422 }));
            break;
        }
    }

    // Retry: the failed record's preserved `found_errors` must let the
    // second request find its way back into `PrPending` instead of hitting
    // the "no analyzed record" branch.
    harness.commands.send(Command::PullRequestRequest(name.clone())).unwrap();

    loop {
        let delta = harness.next_delta_for(&name, Duration::from_secs(5)).await;
        match delta.record {
            PackageRecord::PrSent { url, .. } => {
                assert_eq!(url, "https://example.invalid/owner/repo/pull/1");
                break;
            }
            PackageRecord::PrFailed { stage, error, .. } => {
                panic!("retried pull request sequence failed at {stage}: {error:?}");
            }
            _ => continue,
        }
    }

    harness.shutdown().await;
}
