//! The scheduler (C4): the actor loop that owns `BackendState` and drives
//! every mutation in the system.
//!
//! `BackendState` is never shared — it lives here, and every external I/O
//! call is spawned as a detached task that reports its result back over
//! `events`. The loop itself only ever does one of: handle an inbound
//! operator command, handle a completed task, or fire the poll timer.

use crate::command::Command;
use crate::delta::RawDelta;
use crate::outcome_map::{archive_retrieval_failure, assemble_outcome_to_review_outcome, hosting_error_to_transport};
use crate::selection::{select, Selection};
use reviewbot_analysis::{run_analysis, ReviewOutcome, RuleEngine};
use reviewbot_archive::{assemble_project, AssembleOutcome, ArchiveRetriever};
use reviewbot_cache::{BackendState, FoundErrorsPayload, PackageCache, PackageRecord};
use reviewbot_config::{Config, PrGuardMode, SCHEDULER_PACING_DELAY};
use reviewbot_core::{ModuleDoc, PackageManifest, PackageName, TransportError, Version};
use reviewbot_hosting::{HostingClient, HostingError, PrOutcome, PullRequestOrchestrator, BOT_IDENTITY};
use reviewbot_registry::{MetadataFetcher, RegistryIndexPoller};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What an in-flight task reported back.
enum Event {
    PollCompleted(Result<Vec<(PackageName, Version)>, reviewbot_registry::PollError>),
    MetadataFetched {
        name: PackageName,
        version: Version,
        result: Result<(PackageManifest, Vec<ModuleDoc>), TransportError>,
    },
    ArchiveRetrieved {
        name: PackageName,
        version: Version,
        result: Result<Vec<u8>, TransportError>,
    },
    /// Same shape as `ArchiveRetrieved`, but sourced from an operator-issued
    /// `RerunPackageRequest`, which (like `PullRequestRequest`) is exempt
    /// from the single-in-flight-pipeline constraint and so must not
    /// clear `in_flight` on completion.
    RerunArchiveRetrieved {
        name: PackageName,
        version: Version,
        result: Result<Vec<u8>, TransportError>,
    },
    PrSettled {
        name: PackageName,
        version: Version,
        outcome: PrOutcome,
    },
}

/// The scheduler actor. Construct with `new`, then run it with `run` until
/// the shutdown signal resolves.
pub struct Scheduler {
    state: BackendState,
    poller: RegistryIndexPoller,
    fetcher: MetadataFetcher,
    retriever: ArchiveRetriever,
    orchestrator: PullRequestOrchestrator,
    rule_engine: Arc<dyn RuleEngine>,
    pr_guard_mode: PrGuardMode,
    ignore_list: Vec<PackageName>,
    poll_interval: std::time::Duration,
    cursor_baseline: u64,
    cursor: u64,
    /// At most one C3/C5+C6+C7 pipeline stage outstanding at a time.
    /// PR orchestrations are exempt — they're operator-initiated.
    in_flight: bool,
    deltas: tokio::sync::broadcast::Sender<RawDelta>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
}

impl Scheduler {
    /// Build a scheduler from configuration. `deltas` is the sending half of
    /// a broadcast channel every raw record mutation is published to — the
    /// broadcaster (C9) subscribes once per connected session to project
    /// and fan each one out.
    #[must_use]
    pub fn new(config: &Config, rule_engine: Arc<dyn RuleEngine>, deltas: tokio::sync::broadcast::Sender<RawDelta>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(reviewbot_config::METADATA_REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client configuration is static and always valid");

        let hosting_client = HostingClient::new(client.clone(), config.hosting_api_host.clone(), config.hosting_token.clone());

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            state: BackendState::new(),
            poller: RegistryIndexPoller::new(client.clone(), config.registry_host.clone()),
            fetcher: MetadataFetcher::new(client.clone(), config.registry_host.clone()),
            retriever: ArchiveRetriever::new(client, config.archive_host.clone()),
            orchestrator: PullRequestOrchestrator::new(hosting_client, BOT_IDENTITY),
            rule_engine,
            pr_guard_mode: config.pr_guard_mode,
            ignore_list: config.ignore_list.clone(),
            poll_interval: config.poll_interval,
            cursor_baseline: config.package_count_offset,
            cursor: config.package_count_offset,
            in_flight: false,
            deltas,
            events_tx,
            events_rx,
        }
    }

    /// Run the actor loop until `shutdown` resolves. Returns once any
    /// in-flight pipeline stage has settled, so callers can rely on a clean
    /// exit.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, shutdown: impl std::future::Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut poll_timer = tokio::time::interval(self.poll_interval);
        poll_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        self.spawn_poll();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested; draining in-flight pipeline");
                    break;
                }
                _ = poll_timer.tick() => {
                    self.spawn_poll();
                }
                Some(command) = commands.recv() => {
                    self.handle_command(command);
                }
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }
            }
        }

        while self.in_flight {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.handle_event(event);
        }
        info!("scheduler stopped");
    }

    fn emit_delta(&mut self, name: &PackageName, version: Version, record: PackageRecord) {
        let update_index = self.state.next_update_index();
        self.state.cache.update_version_record(name, version, record.clone());
        let _ = self.deltas.send(RawDelta {
            name: name.clone(),
            version,
            record,
            update_index,
        });
    }

    fn spawn_poll(&mut self) {
        let poller = self.poller.clone();
        let cursor = self.cursor;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = poller.poll_since(cursor).await;
            let _ = tx.send(Event::PollCompleted(result));
        });
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::ResetBackend => {
                self.state.reset_backend();
                self.cursor = self.cursor_baseline;
                self.in_flight = false;
                self.spawn_poll();
            }
            Command::ResetRules => {
                self.state.reset_rules();
            }
            Command::PullRequestRequest(name) => {
                self.dispatch_pull_request(&name);
            }
            Command::RerunPackageRequest(name, version) => {
                self.dispatch_rerun(&name, version);
            }
        }
        self.drive();
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::PollCompleted(result) => self.handle_poll_completed(result),
            Event::MetadataFetched { name, version, result } => self.handle_metadata_fetched(name, version, result),
            Event::ArchiveRetrieved { name, version, result } => {
                self.in_flight = false;
                self.apply_archive_result(name, version, result);
            }
            Event::RerunArchiveRetrieved { name, version, result } => {
                self.apply_archive_result(name, version, result);
            }
            Event::PrSettled { name, version, outcome } => self.handle_pr_settled(name, version, outcome),
        }
        self.drive();
    }

    fn handle_poll_completed(&mut self, result: Result<Vec<(PackageName, Version)>, reviewbot_registry::PollError>) {
        match result {
            Ok(pairs) => {
                self.cursor += pairs.len() as u64;
                for (name, version) in pairs {
                    if self.state.cache.get(&name, &version).is_some() {
                        continue;
                    }
                    let insertion_index = self.state.next_update_index();
                    let record = PackageRecord::Pending { version, insertion_index };
                    self.state.cache.insert_if_absent(name.clone(), version, record.clone());
                    let _ = self.deltas.send(RawDelta {
                        name,
                        version,
                        record,
                        update_index: insertion_index,
                    });
                }
            }
            Err(error) => {
                warn!(%error, "registry index poll failed; will retry next interval");
            }
        }
    }

    fn handle_metadata_fetched(
        &mut self,
        name: PackageName,
        version: Version,
        result: Result<(PackageManifest, Vec<ModuleDoc>), TransportError>,
    ) {
        self.in_flight = false;
        let Some(existing) = self.state.cache.get(&name, &version) else {
            return;
        };
        let insertion_index = existing.insertion_index();
        let record = match result {
            Ok((manifest, docs)) => PackageRecord::Fetched {
                version,
                insertion_index,
                manifest,
                docs,
            },
            Err(error) => {
                warn!(package = %name, %version, %error, "metadata fetch failed");
                PackageRecord::FetchMetaFailed { version, insertion_index, error }
            }
        };
        self.emit_delta(&name, version, record);
    }

    fn apply_archive_result(&mut self, name: PackageName, version: Version, result: Result<Vec<u8>, TransportError>) {
        let Some(existing) = self.state.cache.get(&name, &version) else {
            return;
        };
        let Some((manifest, docs)) = existing.manifest_and_docs() else {
            return;
        };
        let insertion_index = existing.insertion_index();
        let manifest = manifest.clone();
        let docs = docs.to_vec();

        let outcome = match result {
            Err(error) => archive_retrieval_failure(error),
            Ok(bytes) => match assemble_project(manifest.clone(), &bytes, &self.state.cache) {
                None => ReviewOutcome::CouldNotOpenArchive,
                Some(AssembleOutcome::Assembled(project)) => {
                    ReviewOutcome::RuleRun(run_analysis(project, self.rule_engine.as_ref()))
                }
                Some(other) => assemble_outcome_to_review_outcome(other),
            },
        };

        let record = PackageRecord::FetchedAndChecked {
            version,
            insertion_index,
            manifest,
            docs,
            outcome,
        };
        self.emit_delta(&name, version, record);
    }

    fn dispatch_pull_request(&mut self, name: &PackageName) {
        let Some((version, found_errors, manifest, docs, insertion_index)) = self.latest_found_errors(name) else {
            warn!(package = %name, "pull request requested but no analyzed record with unused dependencies was found");
            return;
        };

        let pending = PackageRecord::PrPending {
            version,
            insertion_index,
            manifest: manifest.clone(),
            docs: docs.clone(),
            found_errors: found_errors.clone(),
        };
        self.emit_delta(name, version, pending);

        let orchestrator = self.orchestrator.clone();
        let tx = self.events_tx.clone();
        let name = name.clone();
        let guard_mode = self.pr_guard_mode;
        tokio::spawn(async move {
            let outcome = if guard_mode == PrGuardMode::Enforce {
                match orchestrator.check_tag_guard(&name, &version).await {
                    Ok(guard) if guard.matches => {
                        orchestrator.open_pull_request(&name, &version, &found_errors).await
                    }
                    Ok(_) => PrOutcome::Failed {
                        stage: "guard".to_string(),
                        error: HostingError::UnexpectedShape(
                            "default branch head does not match the release tag".to_string(),
                        ),
                    },
                    Err(error) => PrOutcome::Failed { stage: "guard".to_string(), error },
                }
            } else {
                orchestrator.open_pull_request(&name, &version, &found_errors).await
            };
            let _ = tx.send(Event::PrSettled { name, version, outcome });
        });
    }

    /// Find the version to open (or retry) a pull request for: the latest
    /// `FetchedAndChecked` record with unused dependencies, or the latest
    /// `PrFailed` record, so a second `PullRequestRequest` after a failure
    /// re-submits rather than finding nothing. `PrPending`/`PrSent` records
    /// are excluded — a request already in flight or already sent must not
    /// be re-fired.
    fn latest_found_errors(
        &self,
        name: &PackageName,
    ) -> Option<(Version, FoundErrorsPayload, PackageManifest, Vec<ModuleDoc>, u64)> {
        self.state
            .cache
            .iter()
            .filter(|(n, _, _)| *n == name)
            .filter_map(|(_, version, record)| match record {
                PackageRecord::FetchedAndChecked {
                    manifest,
                    docs,
                    outcome: ReviewOutcome::RuleRun(result),
                    insertion_index,
                    ..
                } => FoundErrorsPayload::from_run_result(result)
                    .map(|payload| (*version, payload, manifest.clone(), docs.clone(), *insertion_index)),
                PackageRecord::PrFailed {
                    manifest,
                    docs,
                    found_errors,
                    insertion_index,
                    ..
                } => Some((*version, found_errors.clone(), manifest.clone(), docs.clone(), *insertion_index)),
                _ => None,
            })
            .max_by_key(|(version, ..)| *version)
    }

    fn handle_pr_settled(&mut self, name: PackageName, version: Version, outcome: PrOutcome) {
        let Some(existing) = self.state.cache.get(&name, &version) else {
            return;
        };
        let PackageRecord::PrPending {
            insertion_index,
            manifest,
            docs,
            found_errors,
            ..
        } = existing
        else {
            return;
        };
        let insertion_index = *insertion_index;
        let manifest = manifest.clone();
        let docs = docs.clone();
        let found_errors = found_errors.clone();

        let record = match outcome {
            PrOutcome::Sent { url } => PackageRecord::PrSent {
                version,
                insertion_index,
                manifest,
                docs,
                found_errors,
                url,
            },
            PrOutcome::Failed { stage, error } => PackageRecord::PrFailed {
                version,
                insertion_index,
                manifest,
                docs,
                found_errors,
                stage,
                error: hosting_error_to_transport(error),
            },
        };
        self.emit_delta(&name, version, record);
    }

    fn dispatch_rerun(&mut self, name: &PackageName, version: Version) {
        let Some(existing) = self.state.cache.get(name, &version) else {
            return;
        };
        let Some((manifest, docs)) = existing.manifest_and_docs() else {
            return;
        };
        let insertion_index = existing.insertion_index();
        let manifest = manifest.clone();
        let docs = docs.to_vec();

        self.emit_delta(
            name,
            version,
            PackageRecord::Fetched {
                version,
                insertion_index,
                manifest,
                docs,
            },
        );

        let retriever = self.retriever.clone();
        let tx = self.events_tx.clone();
        let name = name.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SCHEDULER_PACING_DELAY).await;
            let result = retriever.retrieve(&name, &version).await;
            let _ = tx.send(Event::RerunArchiveRetrieved { name, version, result });
        });
    }

    /// Select the next candidate and dispatch it, unless a data-fetch
    /// pipeline stage is already outstanding.
    fn drive(&mut self) {
        if self.in_flight {
            return;
        }
        match select(&self.state.cache, &self.ignore_list) {
            Selection::FetchMetadata { name, version } => {
                self.in_flight = true;
                let fetcher = self.fetcher.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(SCHEDULER_PACING_DELAY).await;
                    let result = fetcher.fetch(&name, &version).await;
                    let _ = tx.send(Event::MetadataFetched { name, version, result });
                });
            }
            Selection::Analyze { name, version } => {
                self.in_flight = true;
                let retriever = self.retriever.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(SCHEDULER_PACING_DELAY).await;
                    let result = retriever.retrieve(&name, &version).await;
                    let _ = tx.send(Event::ArchiveRetrieved { name, version, result });
                });
            }
            Selection::Idle => {
                debug!("no eligible work; scheduler idle");
            }
        }
    }

    /// Exposed for the broadcaster's snapshot-on-connect behavior.
    #[must_use]
    pub fn cache(&self) -> &PackageCache {
        &self.state.cache
    }

    #[must_use]
    pub fn update_index(&self) -> u64 {
        self.state.update_index()
    }
}
