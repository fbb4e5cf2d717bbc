//! Fetching library documents from their remote or local source

#[cfg(test)]
use mockall::automock;

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::config::{Urls, expand_template};
use crate::error::SourceError;
use crate::library::RawManifest;

/// Where a library's documents are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryLocation {
    /// Templated remote location keyed on organization, repo name and
    /// version/branch.
    Remote {
        org: String,
        name: String,
        version: String,
    },
    /// A folder under the local libraries tree, at the fixed relative layout
    /// (`library.json` / `semantics.json` at the folder root).
    Local { folder: String },
}

/// Source of per-library documents: the manifest and the semantics schema.
///
/// Not-found responses and transport-level failures are normalized to empty
/// content (`None` / `Value::Null`); only malformed documents and local read
/// errors surface as [`SourceError`].
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait LibrarySource: Send + Sync {
    async fn manifest(&self, location: &LibraryLocation) -> Result<Option<RawManifest>, SourceError>;

    async fn semantics(&self, location: &LibraryLocation) -> Result<Value, SourceError>;
}

/// [`LibrarySource`] backed by templated raw-file URLs, with a local-folder
/// substitution for libraries resolved from disk.
pub struct HttpLibrarySource {
    client: reqwest::Client,
    manifest_template: String,
    semantics_template: String,
    libraries_dir: PathBuf,
}

impl HttpLibrarySource {
    pub fn new(urls: &Urls, libraries_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("h5p-deps")
                .build()
                .expect("Failed to create HTTP client"),
            manifest_template: urls.manifest.clone(),
            semantics_template: urls.semantics.clone(),
            libraries_dir: libraries_dir.into(),
        }
    }

    /// Fetch a document body, normalizing failures to `None`.
    async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("fetch failed for {url}: {e}");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            if status != reqwest::StatusCode::NOT_FOUND {
                warn!("unexpected status {status} for {url}");
            }
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("failed to read body for {url}: {e}");
                None
            }
        }
    }

    fn local_path(&self, folder: &str, file: &str) -> PathBuf {
        self.libraries_dir.join(folder).join(file)
    }

    fn read_local(path: &Path) -> Result<Option<String>, SourceError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SourceError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    async fn document(
        &self,
        location: &LibraryLocation,
        template: &str,
        file: &str,
    ) -> Result<Option<String>, SourceError> {
        match location {
            LibraryLocation::Remote { org, name, version } => {
                let url = expand_template(
                    template,
                    &[("org", org), ("repo", name), ("version", version)],
                );
                Ok(self.fetch(&url).await)
            }
            LibraryLocation::Local { folder } => Self::read_local(&self.local_path(folder, file)),
        }
    }
}

#[async_trait::async_trait]
impl LibrarySource for HttpLibrarySource {
    async fn manifest(&self, location: &LibraryLocation) -> Result<Option<RawManifest>, SourceError> {
        let Some(body) = self.document(location, &self.manifest_template, "library.json").await?
        else {
            return Ok(None);
        };
        let manifest = serde_json::from_str(&body)
            .map_err(|e| SourceError::InvalidDocument(format!("library.json: {e}")))?;
        Ok(Some(manifest))
    }

    async fn semantics(&self, location: &LibraryLocation) -> Result<Value, SourceError> {
        let Some(body) = self
            .document(location, &self.semantics_template, "semantics.json")
            .await?
        else {
            return Ok(Value::Null);
        };
        serde_json::from_str(&body)
            .map_err(|e| SourceError::InvalidDocument(format!("semantics.json: {e}")))
    }
}
