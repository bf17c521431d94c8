//! `BackendState`: the single owned value the whole system's actor loop
//! threads through — an explicit owned state struct, no module-level
//! singletons.

use crate::cache::PackageCache;
use crate::record::PackageRecord;
use ahash::AHashSet;
use reviewbot_core::Version;
use tracing::debug;

/// Identifies one connected, not-necessarily-authenticated operator session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Process-wide state: the package cache, connected sessions, and the
/// monotonic mutation counter every write is stamped with.
#[derive(Debug, Default)]
pub struct BackendState {
    pub cache: PackageCache,
    pub clients: AHashSet<SessionId>,
    update_index: u64,
}

impl BackendState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn update_index(&self) -> u64 {
        self.update_index
    }

    /// Stamp and return the next `updateIndex` (P2: strictly increases with
    /// every mutation).
    pub fn next_update_index(&mut self) -> u64 {
        self.update_index += 1;
        self.update_index
    }

    /// `ResetRules`: downgrade every `FetchedAndChecked` record back to
    /// `Fetched` (keeping its manifest/docs) and every `FetchMetaFailed`
    /// record back to `Pending`. PR-bearing states are left untouched.
    pub fn reset_rules(&mut self) {
        let downgrades: Vec<(_, Version)> = self
            .cache
            .iter()
            .filter_map(|(name, version, record)| match record {
                PackageRecord::FetchedAndChecked { .. } | PackageRecord::FetchMetaFailed { .. } => {
                    Some((name.clone(), *version))
                }
                _ => None,
            })
            .collect();

        for (name, version) in downgrades {
            let Some(current) = self.cache.get(&name, &version) else {
                continue;
            };
            let replacement = match current {
                PackageRecord::FetchedAndChecked {
                    insertion_index,
                    manifest,
                    docs,
                    ..
                } => PackageRecord::Fetched {
                    version,
                    insertion_index: *insertion_index,
                    manifest: manifest.clone(),
                    docs: docs.clone(),
                },
                PackageRecord::FetchMetaFailed { insertion_index, .. } => PackageRecord::Pending {
                    version,
                    insertion_index: *insertion_index,
                },
                _ => continue,
            };
            self.next_update_index();
            self.cache.update_version_record(&name, version, replacement);
        }
        debug!("applied ResetRules");
    }

    /// `ResetBackend`: discard the entire cache. The scheduler replays the
    /// registry poll from the operator-configured baseline cursor
    /// afterwards; this call only clears the in-memory state.
    pub fn reset_backend(&mut self) {
        self.cache.clear();
        self.next_update_index();
        debug!("applied ResetBackend");
    }

    pub fn add_client(&mut self, session: SessionId) {
        self.clients.insert(session);
    }

    pub fn remove_client(&mut self, session: SessionId) {
        self.clients.remove(&session);
    }
}
