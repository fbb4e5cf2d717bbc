use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Cache store key under which the registry snapshot is persisted.
pub const REGISTRY_CACHE_KEY: &str = "libraries";

/// Runtime configuration: folder layout and remote endpoints.
///
/// All fields have defaults matching the public H5P endpoints, so an absent
/// or partial config file is fine.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub folders: Folders,
    pub urls: Urls,
}

/// Local folder layout.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Folders {
    /// Where installed libraries live, one `{id}-{major}.{minor}` folder each.
    pub libraries: PathBuf,
    /// Where the registry snapshot and resolved graphs are cached.
    pub cache: PathBuf,
}

impl Default for Folders {
    fn default() -> Self {
        Self {
            libraries: PathBuf::from("libraries"),
            cache: PathBuf::from("cache"),
        }
    }
}

/// Remote endpoint templates. Placeholders are expanded with
/// [`expand_template`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Urls {
    pub registry: String,
    pub manifest: String,
    pub semantics: String,
    pub clone: String,
}

impl Default for Urls {
    fn default() -> Self {
        Self {
            registry: "https://raw.githubusercontent.com/h5p/h5p-registry/main/libraries.json"
                .to_string(),
            manifest: "https://raw.githubusercontent.com/{org}/{repo}/{version}/library.json"
                .to_string(),
            semantics: "https://raw.githubusercontent.com/{org}/{repo}/{version}/semantics.json"
                .to_string(),
            clone: "https://github.com/{org}/{repo}".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Expand `{key}` placeholders in a URL template.
pub fn expand_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut output = template.to_string();
    for (key, value) in vars {
        output = output.replace(&format!("{{{key}}}"), value);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn expand_template_replaces_all_placeholders() {
        let url = expand_template(
            "https://example.com/{org}/{repo}/{version}/library.json",
            &[("org", "h5p"), ("repo", "h5p-accordion"), ("version", "1.0.3")],
        );
        assert_eq!(
            url,
            "https://example.com/h5p/h5p-accordion/1.0.3/library.json"
        );
    }

    #[test]
    fn expand_template_leaves_unknown_placeholders_untouched() {
        let url = expand_template("https://example.com/{org}/{repo}", &[("org", "h5p")]);
        assert_eq!(url, "https://example.com/h5p/{repo}");
    }

    #[test]
    fn config_from_partial_file_uses_defaults_for_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"folders": {{"cache": "/tmp/h5p-cache"}}}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.folders.cache, PathBuf::from("/tmp/h5p-cache"));
        assert_eq!(config.folders.libraries, PathBuf::from("libraries"));
        assert_eq!(config.urls, Urls::default());
    }

    #[test]
    fn config_load_fails_on_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
