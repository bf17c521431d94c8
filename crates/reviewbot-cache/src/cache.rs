//! `PackageCache` (C2): `name -> (version -> PackageRecord)`, insertion
//! ordered at both levels.

use crate::insertion_order::InsertionOrderedMap;
use crate::record::PackageRecord;
use reviewbot_core::{ModuleDoc, PackageManifest, PackageName, Version, VersionConstraint};

#[derive(Debug, Clone, Default)]
pub struct PackageCache {
    by_name: InsertionOrderedMap<PackageName, InsertionOrderedMap<Version, PackageRecord>>,
}

impl PackageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record` under `(name, version)` only if that pair is not
    /// already present. Returns `true` if the insertion happened.
    pub fn insert_if_absent(&mut self, name: PackageName, version: Version, record: PackageRecord) -> bool {
        let versions = match self.by_name.get_mut(&name) {
            Some(versions) => versions,
            None => {
                self.by_name.insert_if_absent(name.clone(), InsertionOrderedMap::new());
                self.by_name.get_mut(&name).expect("just inserted")
            }
        };
        versions.insert_if_absent(version, record)
    }

    /// Overwrite the record at an existing `(name, version)`. A no-op (aside
    /// from the outer map gaining an empty entry) if the pair was never
    /// inserted — callers are expected to have inserted it as `Pending`
    /// first.
    pub fn update_version_record(&mut self, name: &PackageName, version: Version, record: PackageRecord) {
        if let Some(versions) = self.by_name.get_mut(name) {
            versions.upsert(version, record);
        }
    }

    #[must_use]
    pub fn get(&self, name: &PackageName, version: &Version) -> Option<&PackageRecord> {
        self.by_name.get(name)?.get(version)
    }

    /// True if `name` is known to the cache at all.
    #[must_use]
    pub fn contains_name(&self, name: &PackageName) -> bool {
        self.by_name.contains_key(name)
    }

    /// Among cached versions of `name` with a usable manifest+docs (any
    /// state except `Pending`/`FetchMetaFailed`) that satisfy `constraint`,
    /// return the one with the highest version number (P8).
    #[must_use]
    pub fn get_latest_satisfying(
        &self,
        name: &PackageName,
        constraint: &VersionConstraint,
    ) -> Option<(Version, &PackageManifest, &[ModuleDoc])> {
        let versions = self.by_name.get(name)?;
        versions
            .values()
            .filter_map(|record| {
                let (manifest, docs) = record.manifest_and_docs()?;
                constraint
                    .satisfies(record.version())
                    .then_some((*record.version(), manifest, docs))
            })
            .max_by_key(|(version, _, _)| *version)
    }

    /// Whether `version` is the unique known version of `name` with a
    /// version number `>= version` — i.e. the latest known version,
    /// duplicates coalesced to exactly one candidate.
    #[must_use]
    pub fn is_latest_known_version(&self, name: &PackageName, version: &Version) -> bool {
        let Some(versions) = self.by_name.get(name) else {
            return false;
        };
        versions.values().filter(|r| r.version() >= version).count() == 1
    }

    /// Every `(name, version, record)` triple, in insertion order: outer
    /// names first, then versions within a name.
    pub fn iter(&self) -> impl Iterator<Item = (&PackageName, &Version, &PackageRecord)> {
        self.by_name
            .iter()
            .flat_map(|(name, versions)| versions.iter().map(move |(version, record)| (name, version, record)))
    }

    /// Clear the entire cache (used by `ResetBackend`).
    pub fn clear(&mut self) {
        self.by_name.clear();
    }
}
