//! Project Assembler (C6): turn a manifest + archive bytes + the local cache
//! into an analyzable `Project`, or a short-circuited classification.

use once_cell::sync::Lazy;
use regex::Regex;
use reviewbot_analysis::{DependencyEntry, ModuleSource, Project};
use reviewbot_cache::PackageCache;
use reviewbot_core::{PackageManifest, PackageName, TARGET_LANGUAGE_VERSION};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io::{Cursor, Read};

const SOURCE_EXTENSION: &str = ".elm";

/// One file pulled from the archive under `src/` or `tests/`, top-level
/// folder already stripped.
#[derive(Debug, Clone)]
struct RawModule {
    path: String,
    contents: String,
    is_test: bool,
}

/// What assembly produced, short of a usable `Project`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleOutcome {
    Assembled(Project),
    NotAnEligiblePackage,
    MissingDependencies(Vec<PackageName>),
}

/// Open the archive bytes as a single-rooted ZIP and extract every `src/` or
/// `tests/` entry. Returns `None` if the bytes don't parse as a ZIP, or the
/// entries don't share one top-level folder — the caller reports this as
/// `ReviewOutcome::CouldNotOpenArchive`.
fn open_archive(bytes: &[u8]) -> Option<Vec<RawModule>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
    if zip.len() == 0 {
        return None;
    }

    let top = detect_top_folder(&mut zip)?;
    let prefix = format!("{top}/");

    let mut modules = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).ok()?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let Some(rest) = name.strip_prefix(&prefix) else {
            continue;
        };
        let Some((folder, _)) = rest.split_once('/') else {
            continue;
        };
        let is_test = match folder {
            "src" => false,
            "tests" => true,
            _ => continue,
        };
        if !rest.ends_with(SOURCE_EXTENSION) {
            continue;
        }

        let mut contents = String::new();
        if entry.read_to_string(&mut contents).is_err() {
            continue;
        }
        modules.push(RawModule {
            path: rest.to_string(),
            contents,
            is_test,
        });
    }

    Some(modules)
}

fn detect_top_folder<R: std::io::Read + std::io::Seek>(zip: &mut zip::ZipArchive<R>) -> Option<String> {
    let mut top: Option<String> = None;
    for i in 0..zip.len() {
        let entry = zip.by_index(i).ok()?;
        let first = entry.name().split('/').next()?;
        if first.is_empty() {
            continue;
        }
        match &top {
            None => top = Some(first.to_string()),
            Some(t) if t == first => {}
            Some(_) => return None,
        }
    }
    top
}

/// `src/Foo/Bar.elm` -> `Foo.Bar`. `None` for anything outside `src/` or
/// without the source extension.
fn module_name_from_src_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix("src/")?.strip_suffix(SOURCE_EXTENSION)?;
    Some(rest.replace('/', "."))
}

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*import[ \t]+(\S+)").expect("import scan regex is valid")
});

/// Every module named in an `import` line, scanned textually rather than
/// parsed. Tolerates `\r\n` and leading whitespace.
fn scan_imports(contents: &str) -> Vec<String> {
    let normalized = contents.replace("\r\n", "\n");
    IMPORT_RE
        .captures_iter(&normalized)
        .map(|c| c[1].to_string())
        .collect()
}

/// The set of `src/` paths reachable from the manifest's `exposed-modules`
/// seed, closed transitively over imports. Modules named in
/// `exposed-modules` but absent from the archive are silently dropped from
/// the seed.
fn reachable_src_paths(manifest: &PackageManifest, src_modules: &[RawModule]) -> HashSet<String> {
    let by_name: HashMap<String, &RawModule> = src_modules
        .iter()
        .filter_map(|m| module_name_from_src_path(&m.path).map(|name| (name, m)))
        .collect();

    let mut visited: HashSet<String> = HashSet::new();
    let mut worklist: VecDeque<String> = manifest
        .exposed_modules
        .iter()
        .filter(|name| by_name.contains_key(*name))
        .cloned()
        .collect();

    while let Some(name) = worklist.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let Some(module) = by_name.get(&name) else {
            continue;
        };
        for imported in scan_imports(&module.contents) {
            if by_name.contains_key(&imported) && !visited.contains(&imported) {
                worklist.push_back(imported);
            }
        }
    }

    visited
        .into_iter()
        .filter_map(|name| by_name.get(&name).map(|m| m.path.clone()))
        .collect()
}

/// Resolve every direct and test dependency against the cache. `Err`
/// carries every name that could not be resolved.
fn resolve_dependencies(manifest: &PackageManifest, cache: &PackageCache) -> Result<Vec<DependencyEntry>, Vec<PackageName>> {
    let mut resolved: BTreeMap<PackageName, DependencyEntry> = BTreeMap::new();
    let mut missing: Vec<PackageName> = Vec::new();

    for (name, constraint) in manifest.dependencies.iter().chain(manifest.test_dependencies.iter()) {
        if resolved.contains_key(name) {
            continue;
        }
        match cache.get_latest_satisfying(name, constraint) {
            Some((_, dep_manifest, docs)) => {
                resolved.insert(
                    name.clone(),
                    DependencyEntry {
                        name: name.clone(),
                        manifest: dep_manifest.clone(),
                        docs: docs.to_vec(),
                    },
                );
            }
            None => missing.push(name.clone()),
        }
    }

    if missing.is_empty() {
        Ok(resolved.into_values().collect())
    } else {
        Err(missing)
    }
}

/// Assemble a `Project` from a manifest and the raw archive bytes, or return
/// the short-circuit classification. A `None` return means the
/// archive could not be opened at all (`ReviewOutcome::CouldNotOpenArchive`
/// at the caller).
#[must_use]
pub fn assemble_project(manifest: PackageManifest, archive_bytes: &[u8], cache: &PackageCache) -> Option<AssembleOutcome> {
    let modules = open_archive(archive_bytes)?;

    if !manifest.elm_version.satisfies(&TARGET_LANGUAGE_VERSION) {
        return Some(AssembleOutcome::NotAnEligiblePackage);
    }

    let dependencies = match resolve_dependencies(&manifest, cache) {
        Ok(entries) => entries,
        Err(missing) => return Some(AssembleOutcome::MissingDependencies(missing)),
    };

    let (src_modules, test_modules): (Vec<RawModule>, Vec<RawModule>) =
        modules.into_iter().partition(|m| !m.is_test);
    let reachable = reachable_src_paths(&manifest, &src_modules);

    let mut project_modules: Vec<ModuleSource> = src_modules
        .into_iter()
        .filter(|m| reachable.contains(&m.path))
        .map(|m| ModuleSource {
            path: m.path,
            contents: m.contents,
        })
        .collect();
    project_modules.extend(test_modules.into_iter().map(|m| ModuleSource {
        path: m.path,
        contents: m.contents,
    }));

    Some(AssembleOutcome::Assembled(Project {
        manifest,
        modules: project_modules,
        dependencies,
    }))
}
