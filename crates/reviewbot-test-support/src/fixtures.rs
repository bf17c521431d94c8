//! Sample data shared across crate test suites.

use reviewbot_core::{PackageManifest, PackageName, Version, VersionConstraint};
use std::collections::BTreeMap;

/// A minimal, valid library manifest for `name`, with no dependencies.
#[must_use]
pub fn manifest(name: &str, version: Version) -> PackageManifest {
    PackageManifest {
        name: PackageName::parse(name).expect("fixture name is valid"),
        version,
        exposed_modules: vec!["Main".to_string()],
        dependencies: BTreeMap::new(),
        test_dependencies: BTreeMap::new(),
        elm_version: VersionConstraint::parse("0.19.0 <= v < 0.20.0").expect("fixture constraint is valid"),
    }
}

/// A manifest for `name` that depends on every `(dep_name, constraint)` pair.
#[must_use]
pub fn manifest_with_dependencies(name: &str, version: Version, deps: &[(&str, &str)]) -> PackageManifest {
    let mut manifest = manifest(name, version);
    for (dep_name, constraint) in deps {
        manifest.dependencies.insert(
            PackageName::parse(dep_name).expect("fixture dependency name is valid"),
            VersionConstraint::parse(constraint).expect("fixture constraint is valid"),
        );
    }
    manifest
}

/// The canonical `elm.json` text for [`manifest`].
#[must_use]
pub fn manifest_json(name: &str, version: Version) -> String {
    manifest(name, version).to_json()
}
