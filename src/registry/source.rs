//! Remote source of the registry document

#[cfg(test)]
use mockall::automock;

use crate::error::RegistryError;
use crate::registry::RawRegistryList;

/// Source of the raw registry list. Unlike library documents, a failed
/// registry fetch is not normalized away: the caller decides whether the
/// cached snapshot can stand in.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RegistrySource: Send + Sync {
    async fn fetch(&self) -> Result<RawRegistryList, RegistryError>;
}

/// [`RegistrySource`] fetching the registry JSON over HTTP.
pub struct HttpRegistrySource {
    client: reqwest::Client,
    url: String,
}

impl HttpRegistrySource {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("h5p-deps")
                .build()
                .expect("Failed to create HTTP client"),
            url: url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl RegistrySource for HttpRegistrySource {
    async fn fetch(&self) -> Result<RawRegistryList, RegistryError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Unavailable(format!(
                "{} returned status {status}",
                self.url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))
    }
}
