//! Version-control tag listing
//!
//! Tag lookups need a local working copy: clone it if absent, synchronize
//! tags from origin, then list. git2 work is blocking, so it runs on the
//! blocking pool.

#[cfg(test)]
use mockall::automock;

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, info};

use crate::config::expand_template;
use crate::error::VcsError;

/// Capability to list a repository's tags.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagProvider: Send + Sync {
    async fn tags(&self, org: &str, repo: &str) -> Result<Vec<String>, VcsError>;
}

/// [`TagProvider`] backed by a git working copy under the libraries folder.
pub struct GitTagProvider {
    libraries_dir: PathBuf,
    clone_template: String,
}

impl GitTagProvider {
    pub fn new(libraries_dir: impl Into<PathBuf>, clone_template: &str) -> Self {
        Self {
            libraries_dir: libraries_dir.into(),
            clone_template: clone_template.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl TagProvider for GitTagProvider {
    async fn tags(&self, org: &str, repo: &str) -> Result<Vec<String>, VcsError> {
        let path = self.libraries_dir.join(repo);
        let url = expand_template(&self.clone_template, &[("org", org), ("repo", repo)]);

        tokio::task::spawn_blocking(move || list_tags(&path, &url))
            .await
            .map_err(|e| VcsError::Task(e.to_string()))?
    }
}

fn list_tags(path: &Path, url: &str) -> Result<Vec<String>, VcsError> {
    let repo = if path.join(".git").exists() {
        Repository::open(path)?
    } else {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("cloning {url} into {}", path.display());
        Repository::clone(url, path)?
    };

    sync_tags(&repo)?;

    let names = repo.tag_names(None)?;
    let tags: Vec<String> = names.iter().flatten().map(str::to_owned).collect();
    debug!("{} tags in {}", tags.len(), path.display());
    Ok(tags)
}

/// Fetch tags from origin. A missing remote is fine; the working copy's own
/// tags are still usable.
fn sync_tags(repo: &Repository) -> Result<(), VcsError> {
    let Ok(mut remote) = repo.find_remote("origin") else {
        return Ok(());
    };
    remote.fetch(&["refs/tags/*:refs/tags/*"], None, None)?;
    Ok(())
}
