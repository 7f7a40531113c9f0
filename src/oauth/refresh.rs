//! Refresh orchestration across the local and delegated paths.

use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use tracing::debug;

use super::gate::{gate, GateResult};
use super::hooks::IntegrationHooks;
use super::schema::{normalize, TokenObject};
use crate::config::SyncConfig;
use crate::error::{refresh_error, Error, RefreshErrorKind};
use crate::http::CapturedResponse;

/// Orchestrates a single token refresh.
///
/// Two divergent paths converge on one normalized result:
/// - **local**: the integration's own fetch callback is invoked directly
/// - **delegated**: the centrally-hosted credential-sync service is called
///   over HTTP with the shared secret
///
/// The path is chosen by `SyncConfig::delegate_for`; an incomplete
/// configuration always falls back to local. Nothing here is retried; a
/// single failure propagates to the caller.
pub struct Refresher {
    config: SyncConfig,
    http: reqwest::Client,
}

impl Refresher {
    /// Create a refresher with the given sync configuration.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The sync configuration in use.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Refresh a token for an owner and integration.
    ///
    /// # Arguments
    ///
    /// * `owner_id` - Resource owner id, the correlation key for delegated sync
    /// * `slug` - Integration identifier, passed through opaquely
    /// * `refresh_token` - Refresh token bound into the local fetch callback
    /// * `hooks` - Per-integration capability set
    ///
    /// # Returns
    ///
    /// `Some(TokenObject)` with the normalized replacement token, or `None`
    /// when there was nothing to refresh (no response supplied at all).
    ///
    /// # Errors
    ///
    /// * `RefreshErrorKind::SyncEndpointUnreachable` - connection failure on
    ///   the delegated path (never retried here)
    /// * `RefreshErrorKind::TokenInvalidated` - explicit revocation signal
    /// * `RefreshErrorKind::UpstreamHttp` - non-success refresh response
    /// * `SchemaErrorKind::Validation` - response body off the universal shape
    pub async fn refresh<H: IntegrationHooks>(
        &self,
        owner_id: Option<i64>,
        slug: &str,
        refresh_token: Option<&str>,
        hooks: &H,
    ) -> Result<Option<TokenObject>, Error> {
        let response = match self.config.delegate_for(owner_id) {
            Some(target) => {
                debug!(
                    slug,
                    owner_id = ?owner_id,
                    endpoint = %target.endpoint,
                    "refreshing token via credential-sync endpoint"
                );
                let owner_id = owner_id.unwrap_or_default();

                let response = self
                    .http
                    .post(target.endpoint.clone())
                    .header(target.secret_header, target.secret.expose_secret().as_str())
                    .form(&[("ownerId", owner_id.to_string()), ("appSlug", slug.to_string())])
                    .send()
                    .await
                    .map_err(|e| unreachable_error(target.endpoint.as_str(), e))?;

                let captured = CapturedResponse::capture(response)
                    .await
                    .map_err(|e| unreachable_error(target.endpoint.as_str(), e))?;

                Some(captured)
            }
            None => {
                debug!(slug, owner_id = ?owner_id, "refreshing token via local callback");
                hooks.fetch_new_token(refresh_token).await?
            }
        };

        match gate(response, hooks).await? {
            GateResult::NoOp => Ok(None),
            GateResult::Invalidated => Err(refresh_error(
                RefreshErrorKind::TokenInvalidated,
                "refresh response invalidated the token",
            )),
            GateResult::Success(body) => {
                // A 204 contributes an empty object to the normalizer.
                let body = body.unwrap_or_else(|| Value::Object(Map::new()));
                let token = normalize(&body)?;
                Ok(Some(token))
            }
        }
    }
}

fn unreachable_error(endpoint: &str, err: reqwest::Error) -> Error {
    let mut error = refresh_error(
        RefreshErrorKind::SyncEndpointUnreachable {
            endpoint: endpoint.to_string(),
        },
        "could not reach the credential-sync endpoint",
    );
    error.source = Some(Box::new(err));
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use mockito::Matcher;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    /// Hooks that count fetch invocations and replay a canned response.
    struct CountingHooks {
        fetch_calls: AtomicUsize,
        fetch_response: Option<CapturedResponse>,
        invalidates: bool,
    }

    impl CountingHooks {
        fn returning(response: Option<CapturedResponse>) -> Self {
            Self {
                fetch_calls: AtomicUsize::new(0),
                fetch_response: response,
                invalidates: false,
            }
        }

        fn invalidating(response: CapturedResponse) -> Self {
            Self {
                fetch_calls: AtomicUsize::new(0),
                fetch_response: Some(response),
                invalidates: true,
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IntegrationHooks for CountingHooks {
        async fn fetch_new_token(
            &self,
            _refresh_token: Option<&str>,
        ) -> Result<Option<CapturedResponse>, Error> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.fetch_response.clone())
        }

        async fn is_token_valid(&self, _token: &TokenObject) -> Result<bool, Error> {
            Ok(false)
        }

        async fn response_invalidates_token(
            &self,
            _response: CapturedResponse,
        ) -> Result<bool, Error> {
            Ok(self.invalidates)
        }
    }

    fn sync_config(endpoint: &str) -> SyncConfig {
        SyncConfig {
            enabled: true,
            endpoint: Some(Url::parse(endpoint).unwrap()),
            secret_header: Some("x-credential-sync-secret".to_string()),
            secret: Some(SecretString::from("s3cret".to_string())),
        }
    }

    #[tokio::test]
    async fn test_delegated_refresh_posts_secret_and_form_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/getToken")
            .match_header("x-credential-sync-secret", "s3cret")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ownerId".into(), "42".into()),
                Matcher::UrlEncoded("appSlug".into(), "google-calendar".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"synced","expires_in":3600}"#)
            .create_async()
            .await;

        let refresher = Refresher::new(sync_config(&format!("{}/api/getToken", server.url())));
        let hooks = CountingHooks::returning(None);

        let token = refresher
            .refresh(Some(42), "google-calendar", Some("r1"), &hooks)
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(token.access_token(), Some("synced"));
        assert!(token.expiry_date_ms().is_some());
        // The local callback must not run when delegation is configured.
        assert_eq!(hooks.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_config_falls_back_to_local() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/getToken")
            .expect(0)
            .create_async()
            .await;

        // Three of the four required values: the secret is missing.
        let mut config = sync_config(&format!("{}/api/getToken", server.url()));
        config.secret = None;

        let refresher = Refresher::new(config);
        let hooks = CountingHooks::returning(Some(CapturedResponse::new(
            200,
            "OK",
            r#"{"access_token":"local"}"#,
        )));

        let token = refresher
            .refresh(Some(42), "zoom", Some("r1"), &hooks)
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(token.access_token(), Some("local"));
        assert_eq!(hooks.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_fatal_and_names_it() {
        let endpoint = "http://127.0.0.1:1/api/getToken";
        let refresher = Refresher::new(sync_config(endpoint));
        let hooks = CountingHooks::returning(None);

        let err = refresher
            .refresh(Some(42), "zoom", None, &hooks)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Refresh(RefreshErrorKind::SyncEndpointUnreachable {
                endpoint: endpoint.to_string(),
            })
        );
        // No fallback to the local path on a delegated failure.
        assert_eq!(hooks.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_invalidated_response_fails_before_normalization() {
        let refresher = Refresher::new(SyncConfig::disabled());
        // Body would normalize fine; the invalidation verdict must win anyway.
        let hooks = CountingHooks::invalidating(CapturedResponse::new(
            200,
            "OK",
            r#"{"access_token":"x"}"#,
        ));

        let err = refresher
            .refresh(Some(42), "zoom", Some("r1"), &hooks)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Refresh(RefreshErrorKind::TokenInvalidated)
        );
    }

    #[tokio::test]
    async fn test_no_response_means_nothing_to_refresh() {
        let refresher = Refresher::new(SyncConfig::disabled());
        let hooks = CountingHooks::returning(None);

        let token = refresher.refresh(Some(42), "zoom", None, &hooks).await.unwrap();

        assert!(token.is_none());
        assert_eq!(hooks.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_delegated_204_yields_empty_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/getToken")
            .with_status(204)
            .create_async()
            .await;

        let refresher = Refresher::new(sync_config(&format!("{}/api/getToken", server.url())));
        let hooks = CountingHooks::returning(None);

        let token = refresher
            .refresh(Some(7), "zoom", None, &hooks)
            .await
            .unwrap()
            .unwrap();

        assert!(token.fields().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_error_status_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/getToken")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let refresher = Refresher::new(sync_config(&format!("{}/api/getToken", server.url())));
        let hooks = CountingHooks::returning(None);

        let err = refresher
            .refresh(Some(7), "zoom", None, &hooks)
            .await
            .unwrap_err();

        match err.error_kind {
            ErrorKind::Refresh(RefreshErrorKind::UpstreamHttp { status, .. }) => {
                assert_eq!(status, 403);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }
}
