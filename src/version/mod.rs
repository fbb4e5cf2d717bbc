//! Pinning requested versions against version-control tags

pub mod vcs;

use crate::error::VcsError;
use crate::version::vcs::TagProvider;

/// Turns a requested `major.minor` into a concrete `major.minor.patch` using
/// a repository's tag list.
pub struct VersionResolver<P: TagProvider> {
    provider: P,
}

impl<P: TagProvider> VersionResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The repository's tags, sorted descending by (major, minor, patch) so
    /// the most recent tag comes first.
    pub async fn tags(&self, org: &str, repo: &str) -> Result<Vec<String>, VcsError> {
        let mut tags = self.provider.tags(org, repo).await?;
        sort_tags_desc(&mut tags);
        Ok(tags)
    }

    /// Pin `major_minor` to its latest patch release.
    ///
    /// Considers only tags that start with `major_minor` and parse into
    /// exactly three numeric components; picks the numerically greatest patch.
    /// Without a matching tag the input is returned unchanged, unpinned at
    /// patch level.
    pub async fn pin_patch(
        &self,
        org: &str,
        repo: &str,
        major_minor: &str,
    ) -> Result<String, VcsError> {
        let tags = self.tags(org, repo).await?;

        let mut best: Option<u64> = None;
        for tag in &tags {
            if !tag.starts_with(major_minor) {
                continue;
            }
            let Ok(version) = semver::Version::parse(tag) else {
                continue;
            };
            if !version.pre.is_empty() || !version.build.is_empty() {
                continue;
            }
            best = Some(best.map_or(version.patch, |b| b.max(version.patch)));
        }

        Ok(match best {
            Some(patch) => format!("{major_minor}.{patch}"),
            None => major_minor.to_string(),
        })
    }
}

/// Sort tags descending by their numeric (major, minor, patch) components.
/// Components that fail to parse sort as zero.
pub fn sort_tags_desc(tags: &mut [String]) {
    tags.sort_by(|a, b| tag_key(b).cmp(&tag_key(a)));
}

fn tag_key(tag: &str) -> (u64, u64, u64) {
    let mut parts = tag.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}
