//! Delegated credential-sync configuration.

use secrecy::SecretString;
use url::Url;

/// Default header used to carry the shared secret when none is configured.
pub const DEFAULT_SECRET_HEADER: &str = "x-credential-sync-secret";

/// Process-wide configuration for the delegated credential-sync service.
///
/// The choice between local and delegated refresh is a pure function of this
/// struct plus the owner id (`delegate_for`), so it can be tested without
/// mutating the environment. When the configuration is incomplete in any way,
/// refresh always falls back to the local path.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Feature flag enabling delegated sync.
    pub enabled: bool,
    /// Sync endpoint URL.
    pub endpoint: Option<Url>,
    /// Header name carrying the shared secret.
    pub secret_header: Option<String>,
    /// Shared secret for authenticating against the sync endpoint.
    pub secret: Option<SecretString>,
}

/// Resolved delegation target, borrowed from a complete `SyncConfig`.
#[derive(Debug)]
pub struct DelegateTarget<'a> {
    pub endpoint: &'a Url,
    pub secret_header: &'a str,
    pub secret: &'a SecretString,
}

impl SyncConfig {
    /// Configuration with delegated sync turned off entirely.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Read configuration from the process environment.
    ///
    /// Variables:
    /// - `CREDENTIAL_SYNC_ENABLED` - "1" or "true" enables delegated sync
    /// - `CREDENTIAL_SYNC_ENDPOINT` - sync endpoint URL
    /// - `CREDENTIAL_SYNC_SECRET` - shared secret
    /// - `CREDENTIAL_SYNC_SECRET_HEADER_NAME` - secret header name
    ///   (defaults to `x-credential-sync-secret`)
    ///
    /// Values that fail to parse are treated as absent, which means the
    /// refresh path falls back to local rather than failing at startup.
    pub fn from_env() -> Self {
        let enabled = std::env::var("CREDENTIAL_SYNC_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let endpoint = std::env::var("CREDENTIAL_SYNC_ENDPOINT")
            .ok()
            .and_then(|v| Url::parse(&v).ok());

        let secret = std::env::var("CREDENTIAL_SYNC_SECRET")
            .ok()
            .map(SecretString::from);

        let secret_header = Some(
            std::env::var("CREDENTIAL_SYNC_SECRET_HEADER_NAME")
                .unwrap_or_else(|_| DEFAULT_SECRET_HEADER.to_string()),
        );

        Self {
            enabled,
            endpoint,
            secret_header,
            secret,
        }
    }

    /// Decide whether a refresh for `owner_id` should be delegated.
    ///
    /// Returns the delegation target only when the feature flag, endpoint,
    /// secret header, and secret are all present AND the owner id is known.
    /// Any missing piece means the local refresh path is used instead.
    pub fn delegate_for(&self, owner_id: Option<i64>) -> Option<DelegateTarget<'_>> {
        if !self.enabled {
            return None;
        }
        owner_id?;

        match (&self.endpoint, &self.secret_header, &self.secret) {
            (Some(endpoint), Some(secret_header), Some(secret)) => Some(DelegateTarget {
                endpoint,
                secret_header,
                secret,
            }),
            _ => None,
        }
    }
}
