//! The scheduler's deterministic selection policy.

use reviewbot_cache::PackageCache;
use reviewbot_core::{PackageName, Version};

/// What the selection policy picked to dispatch next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Fetch metadata for this `Pending` record.
    FetchMetadata { name: PackageName, version: Version },
    /// Retrieve the archive, assemble the project, and analyze this
    /// `Fetched` record.
    Analyze { name: PackageName, version: Version },
    /// Nothing eligible; remain idle.
    Idle,
}

/// Apply the three-step selection policy over `cache`, skipping any name in
/// `ignore_list` at step 2.
#[must_use]
pub fn select(cache: &PackageCache, ignore_list: &[PackageName]) -> Selection {
    for (name, version, record) in cache.iter() {
        if record.is_pending() {
            return Selection::FetchMetadata {
                name: name.clone(),
                version: *version,
            };
        }
    }

    for (name, version, record) in cache.iter() {
        if !record.is_fetched() {
            continue;
        }
        if name.is_reserved_root() || ignore_list.contains(name) {
            continue;
        }
        if cache.is_latest_known_version(name, version) {
            return Selection::Analyze {
                name: name.clone(),
                version: *version,
            };
        }
    }

    Selection::Idle
}
