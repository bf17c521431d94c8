//! The broadcaster's own mirrored projection of cache state.
//!
//! `BackendState` has exactly one owner — the scheduler actor — so the
//! broadcaster never reads it directly. Instead it keeps a live, already
//! projected copy built by replaying every `RawDelta` it observes, which is
//! also what a newly authenticated client's `FirstUpdate` snapshot is built
//! from.

use crate::wire::{project_delta, DeltaMap, VersionedStatus};
use reviewbot_scheduler::RawDelta;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Snapshot {
    by_name: RwLock<BTreeMap<String, BTreeMap<String, VersionedStatus>>>,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one delta into the mirror. `Pending` records project to
    /// nothing and are simply not reflected here.
    pub async fn apply(&self, delta: &RawDelta) {
        let Some((name, status)) = project_delta(delta) else {
            return;
        };
        let mut guard = self.by_name.write().await;
        guard.entry(name).or_default().insert(status.version.clone(), status);
    }

    /// The full current projection, in the `{ packageName -> [versions] }`
    /// shape a `FirstUpdate` sends.
    pub async fn full(&self) -> DeltaMap {
        let guard = self.by_name.read().await;
        guard
            .iter()
            .map(|(name, versions)| (name.clone(), versions.values().cloned().collect()))
            .collect()
    }
}

/// Keep `snapshot` live for as long as the process runs, independent of
/// whether any client is currently connected.
pub fn spawn_mirror(
    snapshot: std::sync::Arc<Snapshot>,
    mut deltas: broadcast::Receiver<RawDelta>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match deltas.recv().await {
                Ok(delta) => snapshot.apply(&delta).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "snapshot mirror lagged behind the delta stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
