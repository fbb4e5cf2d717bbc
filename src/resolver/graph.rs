//! Resolved dependency graph types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::library::{DependencyRef, FileRef, VersionSpec};

/// A concrete library version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl std::fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// One resolved library in the output graph.
///
/// `version` and `level` are fixed when the node is first created;
/// `required_by` and `weight` may still grow when later non-duplicate,
/// non-cyclic requests reach the same library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNode {
    pub id: String,
    pub title: String,
    pub repo_name: String,
    pub org: String,
    pub version: LibraryVersion,
    pub runnable: u8,
    pub preloaded_js: Vec<FileRef>,
    pub preloaded_css: Vec<FileRef>,
    pub preloaded_dependencies: Vec<DependencyRef>,
    pub editor_dependencies: Vec<DependencyRef>,
    pub semantics: Value,
    /// Every distinct path through which this library was reached, in
    /// discovery order. The root carries a single empty path.
    pub required_by: Vec<String>,
    /// Breadth-first depth at first discovery.
    pub level: usize,
    /// Count of retained incoming edges (the root seed adds none).
    pub weight: usize,
}

impl ResolvedNode {
    /// Folder name the library installs into.
    pub fn install_label(&self) -> String {
        format!("{}-{}.{}", self.id, self.version.major, self.version.minor)
    }
}

/// The finished graph: repo name → node, iteration order is the load order
/// (dependencies before dependents, deepest level first).
pub type DependencyGraph = IndexMap<String, ResolvedNode>;

/// A queued resolution request, alive only inside the in-flight work queue.
#[derive(Debug, Clone)]
pub(crate) struct PendingEntry {
    /// Target repo name.
    pub name: String,
    /// Requesting parent's repo name, empty for the root.
    pub parent: String,
    pub version: VersionSpec,
    /// Local-source override folder, when resolving from disk.
    pub folder: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_label_uses_id_and_major_minor() {
        let node = ResolvedNode {
            id: "H5P.Accordion".to_string(),
            title: "Accordion".to_string(),
            repo_name: "h5p-accordion".to_string(),
            org: "h5p".to_string(),
            version: LibraryVersion {
                major: 1,
                minor: 0,
                patch: 33,
            },
            runnable: 1,
            preloaded_js: vec![],
            preloaded_css: vec![],
            preloaded_dependencies: vec![],
            editor_dependencies: vec![],
            semantics: Value::Null,
            required_by: vec!["".to_string()],
            level: 0,
            weight: 0,
        };

        assert_eq!(node.install_label(), "H5P.Accordion-1.0");
        assert_eq!(node.version.to_string(), "1.0.33");
    }

    #[test]
    fn node_serializes_with_camel_case_keys() {
        let node = ResolvedNode {
            id: "H5P.A".to_string(),
            title: "A".to_string(),
            repo_name: "h5p-a".to_string(),
            org: "h5p".to_string(),
            version: LibraryVersion {
                major: 1,
                minor: 2,
                patch: 3,
            },
            runnable: 0,
            preloaded_js: vec![FileRef {
                path: "js/a.js".to_string(),
            }],
            preloaded_css: vec![],
            preloaded_dependencies: vec![],
            editor_dependencies: vec![],
            semantics: Value::Null,
            required_by: vec!["/h5p-r".to_string()],
            level: 1,
            weight: 1,
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["repoName"], "h5p-a");
        assert_eq!(value["requiredBy"][0], "/h5p-r");
        assert_eq!(value["preloadedJs"][0]["path"], "js/a.js");
        assert_eq!(value["version"]["patch"], 3);
    }
}
