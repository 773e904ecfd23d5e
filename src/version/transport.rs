//! Transport trait for posting requests to the remote update API

#[cfg(test)]
use mockall::automock;

use tracing::debug;

use crate::config::HttpConfig;
use crate::version::error::RemoteError;

/// Trait for sending a form-encoded POST to the update API
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Posts `form` to `url` and returns the response body
    ///
    /// # Returns
    /// * `Ok(String)` - Response body, whatever the HTTP status
    /// * `Err(RemoteError::Transport)` - Connection failure or timeout
    async fn post_form(&self, url: &str, form: Vec<(String, String)>)
    -> Result<String, RemoteError>;
}

/// Transport implementation backed by reqwest
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport using the configured timeout and TLS policy
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("remote-updater")
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &str,
        form: Vec<(String, String)>,
    ) -> Result<String, RemoteError> {
        let response = self.client.post(url).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Update API returned status {}: {}", status, url);
        }

        Ok(response.text().await?)
    }
}
