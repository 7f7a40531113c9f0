//! Injected capability set implemented per integration.

use async_trait::async_trait;

use super::schema::TokenObject;
use crate::error::Error;
use crate::http::CapturedResponse;

/// Per-integration capabilities injected into the token lifecycle.
///
/// Behavior that varies by integration (how to call the provider's refresh
/// endpoint, what counts as a valid token, what counts as a revocation signal)
/// is expressed as one small capability set rather than a type hierarchy.
/// This crate treats every method as opaque.
#[async_trait]
pub trait IntegrationHooks: Send + Sync {
    /// Fetch a fresh token response from the provider.
    ///
    /// # Arguments
    ///
    /// * `refresh_token` - The currently held refresh token, or `None` when no
    ///   refresh token is available (possible when a third party synced the
    ///   credential without sharing one)
    ///
    /// # Returns
    ///
    /// The provider's HTTP response, or `None` when there was nothing to
    /// refresh at all (treated upstream as "nothing changed").
    async fn fetch_new_token(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<Option<CapturedResponse>, Error>;

    /// Whether the currently held token is still usable.
    ///
    /// May suspend (e.g., a remote introspection call).
    async fn is_token_valid(&self, token: &TokenObject) -> Result<bool, Error>;

    /// Whether a refresh response signals that the credential has been revoked.
    ///
    /// Receives its own independent copy of the response, so reading the body
    /// here never starves the parse path that runs afterwards.
    async fn response_invalidates_token(
        &self,
        response: CapturedResponse,
    ) -> Result<bool, Error>;
}
