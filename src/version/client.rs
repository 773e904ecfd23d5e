//! Remote version RPC against the custom update API

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::version::error::RemoteError;
use crate::version::identity::{ClientIdentity, RemoteCredentials};
use crate::version::transport::Transport;
use crate::version::types::{Action, VersionInfo};

/// Stateless client for the update API
///
/// Holds only the transport and credentials; the identity is supplied by the
/// caller so that a single checker owns it.
pub struct RemoteClient {
    transport: Arc<dyn Transport>,
    credentials: RemoteCredentials,
}

impl RemoteClient {
    pub fn new(transport: Arc<dyn Transport>, credentials: RemoteCredentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Calls the API and decodes the version information it returns
    ///
    /// `params` must carry `slug` equal to the identity's slug, otherwise the
    /// call is not made and `IdentityMismatch` is returned.
    pub async fn check_remote(
        &self,
        identity: &ClientIdentity,
        action: Action,
        params: &IndexMap<String, String>,
    ) -> Result<VersionInfo, RemoteError> {
        let data = self.credentials.merged_with(params);

        let requested = data.get("slug").map(String::as_str).unwrap_or_default();
        if requested != identity.slug() {
            debug!(
                "Skipping {} for {}: not {}",
                action.as_str(),
                requested,
                identity.slug()
            );
            return Err(RemoteError::IdentityMismatch {
                expected: identity.slug().to_string(),
                actual: requested.to_string(),
            });
        }

        let field = |name: &str| data.get(name).cloned().unwrap_or_default();
        let form = vec![
            ("action".to_string(), action.as_str().to_string()),
            ("key".to_string(), field("key")),
            ("product".to_string(), field("product")),
            ("version".to_string(), field("version")),
            ("slug".to_string(), identity.slug().to_string()),
        ];

        let body = self
            .transport
            .post_form(identity.api_url(), form)
            .await
            .inspect_err(|e| warn!("Update API request to {} failed: {}", identity.api_url(), e))?;

        let info = decode_version_info(&body, identity)?;
        debug!(
            "Update API reports {} {} for {}",
            action.as_str(),
            info.new_version,
            identity.slug()
        );
        Ok(info)
    }
}

/// Builds `VersionInfo` from a response body. Anything that is not a
/// non-empty JSON object counts as an empty response.
fn decode_version_info(body: &str, identity: &ClientIdentity) -> Result<VersionInfo, RemoteError> {
    let response = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) if !object.is_empty() => object,
        Ok(_) => {
            warn!("Update API returned no version object for {}", identity.slug());
            return Err(RemoteError::EmptyResponse);
        }
        Err(e) => {
            warn!("Failed to parse update API response: {}", e);
            return Err(RemoteError::EmptyResponse);
        }
    };

    let text = |name: &str| match response.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Ok(VersionInfo {
        new_version: text("new_version"),
        package: text("package"),
        slug: identity.slug().to_string(),
        url: identity.api_url().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiData;
    use crate::version::transport::MockTransport;
    use std::path::Path;

    fn identity() -> ClientIdentity {
        ClientIdentity::new(
            "https://updates.example.com/api",
            Path::new("my-plugin/my-plugin.php"),
            "1.0.0",
        )
    }

    fn credentials() -> RemoteCredentials {
        RemoteCredentials::new(Some(&ApiData {
            key: "secret".to_string(),
            product: "pro".to_string(),
            version: "1.0.0".to_string(),
            ..Default::default()
        }))
    }

    fn slug_params(slug: &str) -> IndexMap<String, String> {
        IndexMap::from([("slug".to_string(), slug.to_string())])
    }

    #[tokio::test]
    async fn check_remote_posts_credentials_and_decodes_response() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_form()
            .withf(|url, form| {
                url == "https://updates.example.com/api/"
                    && *form
                        == vec![
                            ("action".to_string(), "plugin_latest_version".to_string()),
                            ("key".to_string(), "secret".to_string()),
                            ("product".to_string(), "pro".to_string()),
                            ("version".to_string(), "1.0.0".to_string()),
                            ("slug".to_string(), "my-plugin".to_string()),
                        ]
            })
            .times(1)
            .returning(|_, _| {
                Ok(r#"{"new_version":"1.1.0","package":"https://dl/my-plugin.zip","extra":1}"#
                    .to_string())
            });

        let client = RemoteClient::new(Arc::new(transport), credentials());
        let info = client
            .check_remote(&identity(), Action::LatestVersion, &slug_params("my-plugin"))
            .await
            .unwrap();

        assert_eq!(
            info,
            VersionInfo {
                new_version: "1.1.0".to_string(),
                package: "https://dl/my-plugin.zip".to_string(),
                slug: "my-plugin".to_string(),
                url: "https://updates.example.com/api/".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn check_remote_with_foreign_slug_makes_no_request() {
        let mut transport = MockTransport::new();
        transport.expect_post_form().times(0);

        let client = RemoteClient::new(Arc::new(transport), credentials());
        let result = client
            .check_remote(&identity(), Action::Information, &slug_params("other-plugin"))
            .await;

        assert_eq!(
            result,
            Err(RemoteError::IdentityMismatch {
                expected: "my-plugin".to_string(),
                actual: "other-plugin".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn check_remote_without_slug_makes_no_request() {
        let mut transport = MockTransport::new();
        transport.expect_post_form().times(0);

        let client = RemoteClient::new(Arc::new(transport), credentials());
        let result = client
            .check_remote(&identity(), Action::Information, &IndexMap::new())
            .await;

        assert!(matches!(result, Err(RemoteError::IdentityMismatch { .. })));
    }

    #[tokio::test]
    async fn check_remote_propagates_transport_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_form()
            .returning(|_, _| Err(RemoteError::Transport("timed out".to_string())));

        let client = RemoteClient::new(Arc::new(transport), credentials());
        let result = client
            .check_remote(&identity(), Action::LatestVersion, &slug_params("my-plugin"))
            .await;

        assert_eq!(result, Err(RemoteError::Transport("timed out".to_string())));
    }

    #[rstest::rstest]
    #[case("")]
    #[case("null")]
    #[case("{}")]
    #[case("[1, 2]")]
    #[case("\"1.2.0\"")]
    #[case("<html>maintenance</html>")]
    #[tokio::test]
    async fn check_remote_treats_unusable_body_as_empty_response(#[case] body: &'static str) {
        let mut transport = MockTransport::new();
        transport
            .expect_post_form()
            .returning(move |_, _| Ok(body.to_string()));

        let client = RemoteClient::new(Arc::new(transport), credentials());
        let result = client
            .check_remote(&identity(), Action::LatestVersion, &slug_params("my-plugin"))
            .await;

        assert_eq!(result, Err(RemoteError::EmptyResponse));
    }

    #[test]
    fn decode_version_info_stringifies_non_string_fields() {
        let info = decode_version_info(r#"{"new_version": 2, "package": null}"#, &identity())
            .unwrap();

        assert_eq!(info.new_version, "2");
        assert_eq!(info.package, "");
    }
}
