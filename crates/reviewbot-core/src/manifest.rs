//! Package manifests (`elm.json`-shaped), library-typed only.
//!
//! Application-typed manifests cause the owning record to be marked failed
//! before this type is ever constructed; see `PackageManifest::parse`.

use crate::error::{CoreError, Result};
use crate::package_name::PackageName;
use crate::version::{Version, VersionConstraint};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Which manifest variant was declared. Only `Library` manifests are analyzed;
/// `Application` manifests cause the owning record to fail before a
/// `PackageManifest` is ever built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// `"type": "package"` — a reusable library manifest.
    Library,
    /// `"type": "application"` — not analyzable by this system.
    Application,
}

/// A parsed library-typed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    /// Package identity.
    pub name: PackageName,
    /// Declared version.
    pub version: Version,
    /// Flattened exposed-module list (groups are flattened in declaration order).
    pub exposed_modules: Vec<String>,
    /// Direct dependencies.
    pub dependencies: BTreeMap<PackageName, VersionConstraint>,
    /// Test-only dependencies.
    pub test_dependencies: BTreeMap<PackageName, VersionConstraint>,
    /// The target-language version constraint used for eligibility filtering.
    pub elm_version: VersionConstraint,
}

impl PackageManifest {
    /// Determine the manifest's declared type without fully parsing it.
    ///
    /// # Errors
    /// Returns `CoreError::MalformedManifest` if the JSON doesn't parse or is
    /// missing the `type` field.
    pub fn peek_kind(text: &str) -> Result<ManifestKind> {
        let probe: TypeProbe =
            sonic_rs::from_str(text).map_err(|e| CoreError::MalformedManifest(e.to_string()))?;
        match probe.kind.as_str() {
            "package" => Ok(ManifestKind::Library),
            "application" => Ok(ManifestKind::Application),
            other => Err(CoreError::MalformedManifest(format!(
                "unknown manifest type '{other}'"
            ))),
        }
    }

    /// Parse a library-typed manifest's full contents.
    ///
    /// # Errors
    /// Returns `CoreError::NotLibraryManifest` if the manifest is
    /// application-typed, or `CoreError::MalformedManifest` if the JSON is
    /// malformed or any name/version/constraint within it fails to parse.
    pub fn parse(text: &str) -> Result<Self> {
        if Self::peek_kind(text)? != ManifestKind::Library {
            return Err(CoreError::NotLibraryManifest);
        }

        let raw: LibraryManifestRaw =
            sonic_rs::from_str(text).map_err(|e| CoreError::MalformedManifest(e.to_string()))?;

        let name = PackageName::parse(&raw.name)
            .map_err(|e| CoreError::MalformedManifest(e.to_string()))?;
        let version: Version = raw
            .version
            .parse()
            .map_err(|e: CoreError| CoreError::MalformedManifest(e.to_string()))?;
        let elm_version = VersionConstraint::parse(&raw.elm_version)
            .map_err(|e| CoreError::MalformedManifest(e.to_string()))?;

        Ok(Self {
            name,
            version,
            exposed_modules: raw.exposed_modules.flatten(),
            dependencies: convert_deps(raw.dependencies)?,
            test_dependencies: convert_deps(raw.test_dependencies)?,
            elm_version,
        })
    }

    /// Re-serialize this manifest back to its canonical `elm.json` shape.
    ///
    /// Used by the analysis driver to re-assemble a `Project` after a fix
    /// has been applied, and never needed in the pull-request path (which
    /// works over the already-patched text produced by the rule engine).
    #[must_use]
    pub fn to_json(&self) -> String {
        let deps: BTreeMap<String, String> = self
            .dependencies
            .iter()
            .map(|(k, v)| (k.full_name(), v.to_string()))
            .collect();
        let test_deps: BTreeMap<String, String> = self
            .test_dependencies
            .iter()
            .map(|(k, v)| (k.full_name(), v.to_string()))
            .collect();
        let raw = LibraryManifestRawOut {
            kind: "package",
            name: self.name.full_name(),
            version: self.version.to_string(),
            exposed_modules: self.exposed_modules.clone(),
            elm_version: self.elm_version.to_string(),
            dependencies: deps,
            test_dependencies: test_deps,
        };
        sonic_rs::to_string(&raw).unwrap_or_default()
    }
}

fn convert_deps(
    raw: BTreeMap<String, String>,
) -> Result<BTreeMap<PackageName, VersionConstraint>> {
    raw.into_iter()
        .map(|(name, constraint)| {
            let name = PackageName::parse(&name)
                .map_err(|e| CoreError::MalformedManifest(e.to_string()))?;
            let constraint = VersionConstraint::parse(&constraint)
                .map_err(|e| CoreError::MalformedManifest(e.to_string()))?;
            Ok((name, constraint))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct TypeProbe {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct LibraryManifestRaw {
    name: String,
    version: String,
    #[serde(rename = "exposed-modules")]
    exposed_modules: ExposedModules,
    #[serde(rename = "elm-version")]
    elm_version: String,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "test-dependencies")]
    test_dependencies: BTreeMap<String, String>,
}

#[derive(Debug, serde::Serialize)]
struct LibraryManifestRawOut {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    version: String,
    #[serde(rename = "exposed-modules")]
    exposed_modules: Vec<String>,
    #[serde(rename = "elm-version")]
    elm_version: String,
    dependencies: BTreeMap<String, String>,
    #[serde(rename = "test-dependencies")]
    test_dependencies: BTreeMap<String, String>,
}

/// `exposed-modules` may be a flat list or grouped under category names;
/// either is accepted and flattened in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExposedModules {
    List(Vec<String>),
    Grouped(indexmap_like::OrderedGroups),
}

impl ExposedModules {
    fn flatten(self) -> Vec<String> {
        match self {
            Self::List(modules) => modules,
            Self::Grouped(groups) => groups.into_flattened(),
        }
    }
}

/// A tiny insertion-ordered `String -> Vec<String>` map, enough to flatten
/// grouped `exposed-modules` without pulling in a whole indexmap dependency
/// for one call site.
mod indexmap_like {
    use serde::Deserialize;

    #[derive(Debug, Default)]
    pub struct OrderedGroups(Vec<(String, Vec<String>)>);

    impl OrderedGroups {
        pub fn into_flattened(self) -> Vec<String> {
            self.0.into_iter().flat_map(|(_, modules)| modules).collect()
        }
    }

    impl<'de> Deserialize<'de> for OrderedGroups {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            struct Visitor;
            impl<'de> serde::de::Visitor<'de> for Visitor {
                type Value = OrderedGroups;

                fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str("a map of group name to module list")
                }

                fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
                where
                    A: serde::de::MapAccess<'de>,
                {
                    let mut out = Vec::new();
                    while let Some((key, value)) = map.next_entry::<String, Vec<String>>()? {
                        out.push((key, value));
                    }
                    Ok(OrderedGroups(out))
                }
            }
            deserializer.deserialize_map(Visitor)
        }
    }
}
