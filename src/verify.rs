//! Setup verification
//!
//! Answers "is this library ready to use?" by inspecting local state only: a
//! cached registry snapshot, cached dependency lists for both modes, and an
//! installed folder for every resolved library. Verification never fails;
//! unreadable or missing pieces simply show up as `false` in the report.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheStore, GraphCache};
use crate::config::REGISTRY_CACHE_KEY;
use crate::library::Mode;
use crate::registry::{RawRegistryList, RegistryIndex};

/// Presence of the cached dependency list per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeChecks {
    pub view: bool,
    pub edit: bool,
}

/// Outcome of a setup check for one library.
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    /// The cached registry snapshot exists and lists this library.
    pub registry: bool,
    pub lists: ModeChecks,
    /// Install folder presence per library label, across both modes.
    pub libraries: BTreeMap<String, bool>,
    /// True when every individual check passed.
    pub ok: bool,
}

/// Checks a library's local setup against the cache and install folders.
pub struct SetupVerifier {
    store: CacheStore,
    graphs: GraphCache,
    libraries_dir: PathBuf,
}

impl SetupVerifier {
    pub fn new(store: CacheStore, graphs: GraphCache, libraries_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            graphs,
            libraries_dir: libraries_dir.into(),
        }
    }

    pub fn verify(&self, library: &str) -> SetupReport {
        let registry = self
            .store
            .read::<RawRegistryList>(REGISTRY_CACHE_KEY)
            .map(|raw| RegistryIndex::from_raw(&raw).by_name(library).is_some())
            .unwrap_or(false);
        let lists = ModeChecks {
            view: self.graphs.exists(library, Mode::View),
            edit: self.graphs.exists(library, Mode::Edit),
        };

        let mut libraries = BTreeMap::new();
        for mode in [Mode::View, Mode::Edit] {
            // An unreadable cached list counts the same as a missing one.
            let Ok(graph) = self.graphs.load(library, mode) else {
                continue;
            };
            for node in graph.values() {
                let label = node.install_label();
                let installed = self.libraries_dir.join(&label).is_dir();
                if !installed {
                    debug!("{label} not installed");
                }
                libraries
                    .entry(label)
                    .and_modify(|present| *present &= installed)
                    .or_insert(installed);
            }
        }

        let ok = registry
            && lists.view
            && lists.edit
            && libraries.values().all(|present| *present);

        SetupReport {
            registry,
            lists,
            libraries,
            ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::DependencyRef;
    use crate::resolver::graph::{DependencyGraph, LibraryVersion, ResolvedNode};
    use serde_json::Value;
    use tempfile::TempDir;

    fn node(id: &str) -> ResolvedNode {
        ResolvedNode {
            id: id.to_string(),
            title: id.to_string(),
            repo_name: id.to_lowercase(),
            org: "h5p".to_string(),
            version: LibraryVersion {
                major: 1,
                minor: 4,
                patch: 0,
            },
            runnable: 0,
            preloaded_js: vec![],
            preloaded_css: vec![],
            preloaded_dependencies: Vec::<DependencyRef>::new(),
            editor_dependencies: vec![],
            semantics: Value::Null,
            required_by: vec!["".to_string()],
            level: 0,
            weight: 0,
        }
    }

    fn registry_list() -> RawRegistryList {
        serde_json::from_value(serde_json::json!([
            {"id": "H5P.Accordion", "repo": {"url": "https://github.com/h5p/h5p-accordion"}}
        ]))
        .unwrap()
    }

    fn verifier(dir: &TempDir) -> SetupVerifier {
        let store = CacheStore::new(dir.path().join("cache"));
        let graphs = GraphCache::new(store.clone());
        SetupVerifier::new(store, graphs, dir.path().join("libraries"))
    }

    #[test]
    fn empty_setup_fails_every_check() {
        let dir = TempDir::new().unwrap();
        let report = verifier(&dir).verify("h5p-accordion");

        assert!(!report.registry);
        assert!(!report.lists.view);
        assert!(!report.lists.edit);
        assert!(report.libraries.is_empty());
        assert!(!report.ok);
    }

    #[test]
    fn complete_setup_passes() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("cache"));
        store.write(REGISTRY_CACHE_KEY, &registry_list()).unwrap();

        let graphs = GraphCache::new(store.clone());
        let mut graph = DependencyGraph::new();
        graph.insert("h5p.a".to_string(), node("H5P.A"));
        graphs.save("h5p-accordion", Mode::View, &graph).unwrap();
        graphs.save("h5p-accordion", Mode::Edit, &graph).unwrap();

        let libraries_dir = dir.path().join("libraries");
        std::fs::create_dir_all(libraries_dir.join("H5P.A-1.4")).unwrap();

        let report =
            SetupVerifier::new(store, graphs, &libraries_dir).verify("h5p-accordion");

        assert!(report.registry);
        assert!(report.lists.view);
        assert!(report.lists.edit);
        assert_eq!(report.libraries.get("H5P.A-1.4"), Some(&true));
        assert!(report.ok);
    }

    #[test]
    fn missing_install_folder_fails_the_report() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("cache"));
        store.write(REGISTRY_CACHE_KEY, &registry_list()).unwrap();

        let graphs = GraphCache::new(store.clone());
        let mut graph = DependencyGraph::new();
        graph.insert("h5p.a".to_string(), node("H5P.A"));
        graph.insert("h5p.b".to_string(), node("H5P.B"));
        graphs.save("h5p-accordion", Mode::View, &graph).unwrap();
        graphs.save("h5p-accordion", Mode::Edit, &graph).unwrap();

        let libraries_dir = dir.path().join("libraries");
        std::fs::create_dir_all(libraries_dir.join("H5P.A-1.4")).unwrap();

        let report =
            SetupVerifier::new(store, graphs, &libraries_dir).verify("h5p-accordion");

        assert_eq!(report.libraries.get("H5P.A-1.4"), Some(&true));
        assert_eq!(report.libraries.get("H5P.B-1.4"), Some(&false));
        assert!(!report.ok);
    }

    #[test]
    fn library_absent_from_snapshot_fails_the_registry_check() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("cache"));
        store.write(REGISTRY_CACHE_KEY, &registry_list()).unwrap();

        let graphs = GraphCache::new(store.clone());
        let report = SetupVerifier::new(store, graphs, dir.path().join("libraries"))
            .verify("h5p-unlisted");

        assert!(!report.registry);
        assert!(!report.ok);
    }
}
