//! The global library registry and its lookup views
//!
//! The registry is one remote JSON document listing every known library. It is
//! cached on disk and rebuilt into a dual index on every load: by repo name
//! (the primary working key during resolution) and by id (used to translate a
//! declared dependency name into a repo name/org pair).

pub mod loader;
pub mod source;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// The raw registry document: an array of entries.
pub type RawRegistryList = Vec<RawRegistryEntry>;

/// One registry entry as stored remotely and in the snapshot cache. Fields the
/// resolver never reads are dropped on (de)serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRegistryEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub repo: RepoRef,
    /// Derived from the repo URL when the snapshot is refreshed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
}

/// Source-control location of a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRef {
    pub url: String,
}

/// A registry entry with its derived fields filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub id: String,
    pub title: Option<String>,
    pub repo_url: String,
    pub repo_name: String,
    pub org: String,
}

/// Dual lookup index over the registry, immutable for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    by_name: HashMap<String, RegistryEntry>,
    by_id: HashMap<String, RegistryEntry>,
}

impl RegistryIndex {
    /// Build both views fresh from a raw list, deriving `repo_name` and `org`
    /// from each entry's source URL. Entries with an unusable URL are skipped.
    pub fn from_raw(raw: &RawRegistryList) -> Self {
        let mut index = Self::default();
        for item in raw {
            let (Some(repo_name), Some(org)) =
                (derive_repo_name(&item.repo.url), derive_org(&item.repo.url))
            else {
                warn!("registry entry {} has an unusable repo url, skipping", item.id);
                continue;
            };
            let entry = RegistryEntry {
                id: item.id.clone(),
                title: item.title.clone(),
                repo_url: item.repo.url.clone(),
                repo_name: repo_name.clone(),
                org,
            };
            index.by_id.insert(entry.id.clone(), entry.clone());
            index.by_name.insert(repo_name, entry);
        }
        index
    }

    /// Lookup by machine-derived repo name.
    pub fn by_name(&self, repo_name: &str) -> Option<&RegistryEntry> {
        self.by_name.get(repo_name)
    }

    /// Reverse lookup by library id, used to translate declared dependency
    /// names.
    pub fn by_id(&self, id: &str) -> Option<&RegistryEntry> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Last path segment of a source URL.
fn derive_repo_name(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Organization path segment of a source URL
/// (`https://host/{org}/{repo}`).
fn derive_org(url: &str) -> Option<String> {
    url.split('/')
        .nth(3)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Fill in the derived fields on a raw list before it is persisted, so the
/// snapshot on disk matches what downstream consumers read.
pub(crate) fn decorate(raw: &mut RawRegistryList) {
    for item in raw {
        item.repo_name = derive_repo_name(&item.repo.url);
        item.org = derive_org(&item.repo.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_list() -> RawRegistryList {
        serde_json::from_value(json!([
            {
                "id": "H5P.Accordion",
                "title": "Accordion",
                "repo": {"url": "https://github.com/h5p/h5p-accordion"}
            },
            {
                "id": "H5P.AdvancedText",
                "repo": {"url": "https://github.com/h5p/h5p-advanced-text"}
            }
        ]))
        .unwrap()
    }

    #[test]
    fn index_provides_both_lookup_views() {
        let index = RegistryIndex::from_raw(&sample_list());

        let by_name = index.by_name("h5p-accordion").unwrap();
        assert_eq!(by_name.id, "H5P.Accordion");
        assert_eq!(by_name.org, "h5p");

        let by_id = index.by_id("H5P.AdvancedText").unwrap();
        assert_eq!(by_id.repo_name, "h5p-advanced-text");

        assert_eq!(index.len(), 2);
        assert!(index.by_name("h5p-missing").is_none());
    }

    #[test]
    fn entries_with_unusable_urls_are_skipped() {
        let raw: RawRegistryList = serde_json::from_value(json!([
            {"id": "H5P.Broken", "repo": {"url": ""}},
            {"id": "H5P.Good", "repo": {"url": "https://github.com/otacke/snordian"}}
        ]))
        .unwrap();

        let index = RegistryIndex::from_raw(&raw);
        assert_eq!(index.len(), 1);
        assert_eq!(index.by_id("H5P.Good").unwrap().org, "otacke");
    }

    #[test]
    fn decorate_fills_derived_fields_for_persistence() {
        let mut raw = sample_list();
        decorate(&mut raw);

        assert_eq!(raw[0].repo_name.as_deref(), Some("h5p-accordion"));
        assert_eq!(raw[0].org.as_deref(), Some("h5p"));
    }

    #[test]
    fn volatile_fields_are_dropped_on_round_trip() {
        let raw: RawRegistryList = serde_json::from_value(json!([
            {
                "id": "H5P.Accordion",
                "repo": {"url": "https://github.com/h5p/h5p-accordion"},
                "resume": true,
                "fullscreen": false,
                "xapiVerbs": ["answered"]
            }
        ]))
        .unwrap();

        let serialized = serde_json::to_value(&raw).unwrap();
        let entry = &serialized.as_array().unwrap()[0];
        assert!(entry.get("resume").is_none());
        assert!(entry.get("xapiVerbs").is_none());
        assert_eq!(entry["id"], "H5P.Accordion");
    }
}
