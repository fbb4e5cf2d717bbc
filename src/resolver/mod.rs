//! Leveled breadth-first dependency resolution
//!
//! Starting from a root library, the resolver walks three kinds of outgoing
//! edges level by level: preloaded dependencies, editor dependencies and
//! optional library references embedded in the semantics schema. Requests are
//! processed strictly in queue order, one at a time; every remote fetch is a
//! suspension point but there is no fan-out, which keeps weight accumulation
//! and the in-run manifest cache deterministic.
//!
//! A request is dropped when its requiredBy path would repeat an ancestor
//! (cycle) or when the exact path was already recorded (duplicate). Dropped
//! requests create no node and add no weight. A dependency name with no
//! registry entry is skipped with a warning.
//!
//! All mutable per-run state lives in a [`ResolveContext`] threaded through
//! the algorithm, so independent resolutions cannot interfere.

pub mod graph;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::library::source::{LibraryLocation, LibrarySource};
use crate::library::{LibraryManifest, Mode, RawManifest, VersionSpec};
use crate::registry::RegistryIndex;
use crate::resolver::graph::{DependencyGraph, LibraryVersion, PendingEntry, ResolvedNode};
use crate::semantics::{OptionalDependency, find_optional_libraries};

/// A manifest and schema fetched once per repo name per run.
struct CachedLibrary {
    manifest: LibraryManifest,
    semantics: Value,
    optionals: Option<IndexMap<String, OptionalDependency>>,
}

/// Mutable per-run resolution state.
struct ResolveContext {
    mode: Mode,
    /// Whether the run resolves from local library folders.
    local_source: bool,
    /// Work queue for the next level, in insertion order.
    queue: Vec<PendingEntry>,
    libraries: HashMap<String, CachedLibrary>,
    nodes: HashMap<String, ResolvedNode>,
    /// Repo names in first-discovery order, one list per level.
    levels: Vec<Vec<String>>,
}

/// Computes the complete, deduplicated, cycle-safe, load-ordered dependency
/// graph for a root library.
pub struct DependencyResolver {
    registry: RegistryIndex,
    source: Arc<dyn LibrarySource>,
}

impl DependencyResolver {
    pub fn new(registry: RegistryIndex, source: Arc<dyn LibrarySource>) -> Self {
        Self { registry, source }
    }

    /// Resolve `library`'s full dependency closure.
    ///
    /// Fails with [`ResolveError::LibraryNotFound`] when the root is absent
    /// from the registry and no local folder is given, and with
    /// [`ResolveError::LibraryInfoNotFound`] when any manifest comes back
    /// without its required descriptive data. Fatal errors unwind the whole
    /// call; nothing is persisted here.
    pub async fn resolve(
        &self,
        library: &str,
        mode: Mode,
        version: VersionSpec,
        folder: Option<String>,
    ) -> Result<DependencyGraph, ResolveError> {
        info!("resolving {library} dependencies, mode {mode}");

        if folder.is_none() && self.registry.by_name(library).is_none() {
            return Err(ResolveError::LibraryNotFound(library.to_string()));
        }

        let mut ctx = ResolveContext {
            mode,
            local_source: folder.is_some(),
            queue: vec![PendingEntry {
                name: library.to_string(),
                parent: String::new(),
                version,
                folder,
            }],
            libraries: HashMap::new(),
            nodes: HashMap::new(),
            levels: Vec::new(),
        };

        let mut level = 0;
        while !ctx.queue.is_empty() {
            debug!("level {level}: {} pending", ctx.queue.len());
            let batch = std::mem::take(&mut ctx.queue);
            ctx.levels.push(Vec::new());
            for entry in batch {
                self.process(&mut ctx, entry, level).await?;
            }
            level += 1;
        }

        Ok(assemble(ctx))
    }

    /// Handle one queued request: drop it, or record the edge and enqueue the
    /// target's own dependencies for the next level.
    async fn process(
        &self,
        ctx: &mut ResolveContext,
        entry: PendingEntry,
        level: usize,
    ) -> Result<(), ResolveError> {
        let path = required_by_path(ctx, &entry);

        if has_repeated_segment(&path) {
            debug!("dropping cyclic request for {} via {path}", entry.name);
            return Ok(());
        }
        if ctx
            .nodes
            .get(&entry.name)
            .is_some_and(|node| node.required_by.contains(&path))
        {
            return Ok(());
        }

        debug!("{} required by '{}'", entry.name, entry.parent);
        self.ensure_library(ctx, &entry).await?;

        let manifest = ctx.libraries[&entry.name].manifest.clone();
        self.record_edge(ctx, &entry, &manifest, &path, level);

        let optionals = {
            let lib = ctx
                .libraries
                .get_mut(&entry.name)
                .expect("library cached above");
            lib.optionals
                .get_or_insert_with(|| find_optional_libraries(&lib.semantics))
                .clone()
        };

        // The root's own runtime edges are suppressed in edit mode; deeper
        // nodes enumerate them normally.
        if !(ctx.mode == Mode::Edit && level == 0) {
            for dep in &manifest.preloaded_dependencies {
                let declared = format!("{}.{}", dep.major_version, dep.minor_version);
                let folder = ctx
                    .local_source
                    .then(|| format!("{}-{declared}", dep.machine_name));
                self.enqueue(ctx, &dep.machine_name, &entry, declared, folder);
            }
            for optional in optionals.values() {
                let folder = ctx
                    .local_source
                    .then(|| format!("{}-{}", optional.name, optional.version));
                self.enqueue(ctx, &optional.name, &entry, optional.version.clone(), folder);
            }
        }

        if ctx.mode == Mode::Edit {
            for dep in &manifest.editor_dependencies {
                let declared = format!("{}.{}", dep.major_version, dep.minor_version);
                let folder = ctx
                    .local_source
                    .then(|| format!("{}-{declared}", dep.machine_name));
                self.enqueue(ctx, &dep.machine_name, &entry, declared, folder);
            }
        }

        Ok(())
    }

    /// Fetch the target's manifest and schema unless this run already has
    /// them.
    async fn ensure_library(
        &self,
        ctx: &mut ResolveContext,
        entry: &PendingEntry,
    ) -> Result<(), ResolveError> {
        if ctx.libraries.contains_key(&entry.name) {
            debug!("{} manifest cached", entry.name);
            return Ok(());
        }

        let org = self
            .registry
            .by_name(&entry.name)
            .map(|e| e.org.clone())
            .unwrap_or_default();

        let manifest_location = match &entry.folder {
            Some(folder) => LibraryLocation::Local {
                folder: folder.clone(),
            },
            None => LibraryLocation::Remote {
                org: org.clone(),
                name: entry.name.clone(),
                version: entry.version.as_str().to_string(),
            },
        };
        let raw = self.source.manifest(&manifest_location).await?;
        let manifest = raw.and_then(RawManifest::into_manifest).ok_or_else(|| {
            let what = entry.folder.clone().unwrap_or_else(|| entry.name.clone());
            warn!("missing library info for {what}");
            ResolveError::LibraryInfoNotFound(what)
        })?;

        // The schema is read at the manifest's concrete version.
        let semantics_location = match &entry.folder {
            Some(folder) => LibraryLocation::Local {
                folder: folder.clone(),
            },
            None => LibraryLocation::Remote {
                org,
                name: entry.name.clone(),
                version: manifest.version(),
            },
        };
        let semantics = self.source.semantics(&semantics_location).await?;

        ctx.libraries.insert(
            entry.name.clone(),
            CachedLibrary {
                manifest,
                semantics,
                optionals: None,
            },
        );
        Ok(())
    }

    /// Create the target's node on first resolution or extend an existing
    /// one. The level is fixed at creation; later retained edges only add a
    /// requiredBy path and weight.
    fn record_edge(
        &self,
        ctx: &mut ResolveContext,
        entry: &PendingEntry,
        manifest: &LibraryManifest,
        path: &str,
        level: usize,
    ) {
        if let Some(node) = ctx.nodes.get_mut(&entry.name) {
            node.required_by.push(path.to_string());
            if !entry.parent.is_empty() {
                node.weight += 1;
            }
            return;
        }

        let registered = self.registry.by_name(&entry.name);
        let node = ResolvedNode {
            id: registered
                .map(|e| e.id.clone())
                .unwrap_or_else(|| manifest.machine_name.clone()),
            title: manifest.title.clone(),
            repo_name: entry.name.clone(),
            org: registered.map(|e| e.org.clone()).unwrap_or_default(),
            version: LibraryVersion {
                major: manifest.major_version,
                minor: manifest.minor_version,
                patch: manifest.patch_version,
            },
            runnable: manifest.runnable,
            preloaded_js: manifest.preloaded_js.clone(),
            preloaded_css: manifest.preloaded_css.clone(),
            preloaded_dependencies: manifest.preloaded_dependencies.clone(),
            editor_dependencies: manifest.editor_dependencies.clone(),
            semantics: ctx.libraries[&entry.name].semantics.clone(),
            required_by: vec![path.to_string()],
            level,
            weight: if entry.parent.is_empty() { 0 } else { 1 },
        };
        ctx.nodes.insert(entry.name.clone(), node);
        ctx.levels[level].push(entry.name.clone());
    }

    /// Translate a declared dependency name into a repo name and queue it for
    /// the next level. Names the registry cannot resolve are skipped.
    fn enqueue(
        &self,
        ctx: &mut ResolveContext,
        machine_name: &str,
        parent: &PendingEntry,
        declared_version: String,
        folder: Option<String>,
    ) {
        let Some(registered) = self.registry.by_id(machine_name) else {
            warn!("{machine_name} not found in registry; skipping");
            return;
        };
        // An explicit track-latest request propagates unchanged down the
        // graph; patch-level pinning happens at materialize time, not here.
        let version = if parent.version.is_latest() {
            VersionSpec::Latest
        } else {
            VersionSpec::Exact(declared_version)
        };
        ctx.queue.push(PendingEntry {
            name: registered.repo_name.clone(),
            parent: parent.name.clone(),
            version,
            folder,
        });
    }
}

/// The chain of repo names through which a request was reached: the parent's
/// own last-recorded path extended with the parent. Empty for the root.
fn required_by_path(ctx: &ResolveContext, entry: &PendingEntry) -> String {
    if entry.parent.is_empty() {
        return String::new();
    }
    let last = ctx
        .nodes
        .get(&entry.parent)
        .and_then(|node| node.required_by.last())
        .map(String::as_str)
        .unwrap_or_default();
    format!("{last}/{}", entry.parent)
}

/// Whether a requiredBy path repeats an ancestor segment.
fn has_repeated_segment(path: &str) -> bool {
    let mut seen = HashSet::new();
    path.split('/').any(|segment| !seen.insert(segment))
}

/// Concatenate levels deepest-first into the final ordered graph. Within a
/// level, strictly descending weight; ties keep first-discovery order.
fn assemble(mut ctx: ResolveContext) -> DependencyGraph {
    let mut output = DependencyGraph::new();
    for names in ctx.levels.iter().rev() {
        let mut ordered = names.clone();
        ordered.sort_by_key(|name| std::cmp::Reverse(ctx.nodes[name.as_str()].weight));
        for name in ordered {
            if let Some(node) = ctx.nodes.remove(&name) {
                output.insert(name, node);
            }
        }
    }
    output
}
