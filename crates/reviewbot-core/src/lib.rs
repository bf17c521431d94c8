//! Core data model shared across the registry crawler.
//!
//! This crate provides the foundational types used throughout the pipeline:
//! - Package identity and semantic versioning (`PackageName`, `Version`, `VersionConstraint`)
//! - Package manifests and module documentation (`PackageManifest`, `ModuleDoc`)
//! - Static-analysis diagnostics and fixes (`Diagnostic`, `Fix`)
//! - Error types shared by every downstream crate

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod diagnostic;
pub mod error;
mod manifest;
mod module_doc;
mod package_name;
mod version;

pub use diagnostic::{Diagnostic, Fix, FixApplyOutcome, FixEdit, SourceRange};
pub use error::{CoreError, Result, TransportError};
pub use manifest::{ManifestKind, PackageManifest};
pub use module_doc::ModuleDoc;
pub use package_name::PackageName;
pub use version::{Version, VersionConstraint};

/// The fixed language version every candidate package's `elm-version` constraint
/// is checked against. Packages whose constraint excludes this version are
/// `NotAnEligiblePackage` (see `reviewbot_analysis::RunResult`).
pub const TARGET_LANGUAGE_VERSION: Version = Version::new(0, 19, 1);

/// Packages under this owner prefix have no upstream hosting repository we can
/// open a pull request against, and are excluded from analysis entirely.
pub const RESERVED_ECOSYSTEM_ROOT: &str = "elm";
