//! Filesystem-backed key→JSON-document store and the per-(library, mode)
//! graph cache built on it
//!
//! Writes fully overwrite prior content; there is no merge logic and no
//! cross-process coordination. Concurrent writers for the same key are the
//! caller's problem.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CacheError;
use crate::library::Mode;
use crate::resolver::graph::DependencyGraph;

/// Key→JSON store rooted at a cache folder. One file per key.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path(key).exists()
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        let content = std::fs::read_to_string(self.path(key))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path(key);
        std::fs::write(&path, serde_json::to_vec(value)?)?;
        debug!("wrote cache entry {}", path.display());
        Ok(())
    }
}

/// Persisted resolved graphs, keyed by (library, mode).
#[derive(Debug, Clone)]
pub struct GraphCache {
    store: CacheStore,
}

impl GraphCache {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    fn key(library: &str, mode: Mode) -> String {
        format!("{library}{}", mode.cache_suffix())
    }

    /// Persist a graph, overwriting any previous one for this (library, mode).
    pub fn save(&self, library: &str, mode: Mode, graph: &DependencyGraph) -> Result<(), CacheError> {
        self.store.write(&Self::key(library, mode), graph)
    }

    pub fn load(&self, library: &str, mode: Mode) -> Result<DependencyGraph, CacheError> {
        self.store.read(&Self::key(library, mode))
    }

    pub fn exists(&self, library: &str, mode: Mode) -> bool {
        self.store.exists(&Self::key(library, mode))
    }
}
