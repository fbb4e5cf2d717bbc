//! Loading and caching the registry snapshot

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::config::REGISTRY_CACHE_KEY;
use crate::error::RegistryError;
use crate::registry::source::RegistrySource;
use crate::registry::{RawRegistryList, RegistryIndex, decorate};

/// Loads the registry, preferring the on-disk snapshot, and rebuilds the dual
/// index from the raw list on every call.
pub struct RegistryLoader {
    source: Arc<dyn RegistrySource>,
    store: CacheStore,
}

impl RegistryLoader {
    pub fn new(source: Arc<dyn RegistrySource>, store: CacheStore) -> Self {
        Self { source, store }
    }

    /// Get the registry index.
    ///
    /// With `force_refresh`, or when no snapshot exists yet, the raw list is
    /// fetched from the remote source, decorated with its derived fields and
    /// persisted before the index is built. Otherwise the stored snapshot is
    /// used as-is.
    pub async fn get(&self, force_refresh: bool) -> Result<RegistryIndex, RegistryError> {
        if !force_refresh && self.store.exists(REGISTRY_CACHE_KEY) {
            debug!("using cached registry snapshot");
            let raw: RawRegistryList = self.store.read(REGISTRY_CACHE_KEY)?;
            return Ok(RegistryIndex::from_raw(&raw));
        }

        let mut raw = self.source.fetch().await?;
        decorate(&mut raw);
        self.store.write(REGISTRY_CACHE_KEY, &raw)?;
        info!("registry snapshot refreshed, {} entries", raw.len());
        Ok(RegistryIndex::from_raw(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::registry::source::MockRegistrySource;
    use serde_json::json;

    fn raw_list() -> RawRegistryList {
        serde_json::from_value(json!([
            {"id": "H5P.Accordion", "repo": {"url": "https://github.com/h5p/h5p-accordion"}}
        ]))
        .unwrap()
    }

    fn store() -> (tempfile::TempDir, CacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn first_load_fetches_and_persists_snapshot() {
        let (_dir, store) = store();
        let mut source = MockRegistrySource::new();
        source.expect_fetch().times(1).returning(|| Ok(raw_list()));

        let loader = RegistryLoader::new(Arc::new(source), store.clone());
        let index = loader.get(false).await.unwrap();

        assert_eq!(index.len(), 1);
        assert!(store.exists(REGISTRY_CACHE_KEY));

        // The persisted list carries the derived fields.
        let cached: RawRegistryList = store.read(REGISTRY_CACHE_KEY).unwrap();
        assert_eq!(cached[0].repo_name.as_deref(), Some("h5p-accordion"));
        assert_eq!(cached[0].org.as_deref(), Some("h5p"));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_remote_source() {
        let (_dir, store) = store();
        store.write(REGISTRY_CACHE_KEY, &raw_list()).unwrap();

        let mut source = MockRegistrySource::new();
        source.expect_fetch().times(0);

        let loader = RegistryLoader::new(Arc::new(source), store);
        let index = loader.get(false).await.unwrap();

        assert!(index.by_name("h5p-accordion").is_some());
    }

    #[tokio::test]
    async fn force_refresh_bypasses_the_snapshot() {
        let (_dir, store) = store();
        store.write(REGISTRY_CACHE_KEY, &Vec::<crate::registry::RawRegistryEntry>::new())
            .unwrap();

        let mut source = MockRegistrySource::new();
        source.expect_fetch().times(1).returning(|| Ok(raw_list()));

        let loader = RegistryLoader::new(Arc::new(source), store.clone());
        let index = loader.get(true).await.unwrap();

        assert_eq!(index.len(), 1);
        let cached: RawRegistryList = store.read(REGISTRY_CACHE_KEY).unwrap();
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn forced_refresh_against_unavailable_source_fails() {
        let (_dir, store) = store();
        store.write(REGISTRY_CACHE_KEY, &raw_list()).unwrap();

        let mut source = MockRegistrySource::new();
        source
            .expect_fetch()
            .returning(|| Err(RegistryError::Unavailable("connection refused".to_string())));

        let loader = RegistryLoader::new(Arc::new(source), store);
        assert!(matches!(
            loader.get(true).await,
            Err(RegistryError::Unavailable(_))
        ));
    }
}
