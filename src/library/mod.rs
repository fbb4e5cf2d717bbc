//! Library manifests and the documents they are built from
//!
//! Library metadata arrives as loosely-typed JSON (`library.json` plus a
//! `semantics.json` schema). Raw documents land in [`RawManifest`] with every
//! field optional, then get mapped into [`LibraryManifest`] with defaulted
//! lists so the resolver never has to do presence checks.

pub mod source;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resolution mode: runtime playback or authoring interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    View,
    Edit,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::View => "view",
            Mode::Edit => "edit",
        }
    }

    /// Suffix appended to the per-library graph cache key.
    pub fn cache_suffix(&self) -> &'static str {
        match self {
            Mode::View => "",
            Mode::Edit => "_edit",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Mode::View),
            "edit" => Ok(Mode::Edit),
            other => Err(format!("unknown mode '{other}', expected 'view' or 'edit'")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested version for a library: track the latest development state or an
/// explicit version/branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// Track the repository's primary branch.
    Latest,
    /// An explicit `major.minor` or `major.minor.patch`.
    Exact(String),
}

impl VersionSpec {
    /// The branch name used when tracking latest.
    pub const LATEST_REF: &'static str = "master";

    pub fn parse(s: &str) -> Self {
        if s == Self::LATEST_REF {
            VersionSpec::Latest
        } else {
            VersionSpec::Exact(s.to_string())
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, VersionSpec::Latest)
    }

    pub fn as_str(&self) -> &str {
        match self {
            VersionSpec::Latest => Self::LATEST_REF,
            VersionSpec::Exact(version) => version,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A preloaded script or stylesheet reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
}

/// A dependency declared in a manifest's preloaded or editor list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRef {
    pub machine_name: String,
    #[serde(default)]
    pub major_version: u64,
    #[serde(default)]
    pub minor_version: u64,
}

/// A `library.json` document exactly as fetched, everything optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawManifest {
    pub title: Option<String>,
    pub machine_name: Option<String>,
    pub major_version: u64,
    pub minor_version: u64,
    pub patch_version: u64,
    pub runnable: u8,
    pub preloaded_js: Option<Vec<FileRef>>,
    pub preloaded_css: Option<Vec<FileRef>>,
    pub preloaded_dependencies: Option<Vec<DependencyRef>>,
    pub editor_dependencies: Option<Vec<DependencyRef>>,
}

impl RawManifest {
    /// Map into an explicit manifest. `None` when the document lacks the
    /// required descriptive data (a fetch that came back empty or truncated).
    pub fn into_manifest(self) -> Option<LibraryManifest> {
        let title = self.title?;
        Some(LibraryManifest {
            title,
            machine_name: self.machine_name.unwrap_or_default(),
            major_version: self.major_version,
            minor_version: self.minor_version,
            patch_version: self.patch_version,
            runnable: self.runnable,
            preloaded_js: self.preloaded_js.unwrap_or_default(),
            preloaded_css: self.preloaded_css.unwrap_or_default(),
            preloaded_dependencies: self.preloaded_dependencies.unwrap_or_default(),
            editor_dependencies: self.editor_dependencies.unwrap_or_default(),
        })
    }
}

/// A validated library manifest with all optional lists defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryManifest {
    pub title: String,
    pub machine_name: String,
    pub major_version: u64,
    pub minor_version: u64,
    pub patch_version: u64,
    pub runnable: u8,
    pub preloaded_js: Vec<FileRef>,
    pub preloaded_css: Vec<FileRef>,
    pub preloaded_dependencies: Vec<DependencyRef>,
    pub editor_dependencies: Vec<DependencyRef>,
}

impl LibraryManifest {
    /// The full `major.minor.patch` string of this manifest.
    pub fn version(&self) -> String {
        format!(
            "{}.{}.{}",
            self.major_version, self.minor_version, self.patch_version
        )
    }
}
