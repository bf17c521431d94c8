//! The raw delta the scheduler emits after every cache mutation.
//!
//! This carries the full `PackageRecord` — manifests and docs included. The
//! subscription broadcaster (C9) is the stage that projects this down to the
//! wire shape clients actually see; the scheduler doesn't know about
//! sessions or the wire format at all.

use reviewbot_cache::PackageRecord;
use reviewbot_core::{PackageName, Version};

/// One record's new state, stamped with the `updateIndex` the mutation that
/// produced it was assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDelta {
    pub name: PackageName,
    pub version: Version,
    pub record: PackageRecord,
    pub update_index: u64,
}
