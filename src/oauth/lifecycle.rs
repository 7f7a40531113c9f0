//! Token lifecycle management with per-credential refresh locking.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::hooks::IntegrationHooks;
use super::owner::ResourceOwner;
use super::refresh::Refresher;
use super::schema::TokenObject;
use crate::config::SyncConfig;
use crate::error::Error;

/// Fallback expiry horizon for refreshed tokens that carry no expiry at all:
/// a practically-infinite year. The provider's own refresh cycle is expected
/// to replace the token long before it elapses.
const FALLBACK_EXPIRY_MS: i64 = 365 * 24 * 3600 * 1000;

/// Result of a lifecycle check.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    /// The usable token, or `None` when a refresh was attempted but there was
    /// nothing to refresh (e.g., no refresh token available).
    pub token: Option<TokenObject>,
    /// False when the held token was already valid and returned unchanged;
    /// true when a refresh attempt occurred.
    pub is_updated: bool,
}

/// Top-level manager for the check-then-refresh cycle of a credential.
///
/// Holds no token state itself; a token is read once per invocation, possibly
/// replaced, and handed back for the caller to persist. A per-(owner,
/// integration) async mutex serializes concurrent refresh attempts for the
/// same credential, so one caller cannot invalidate a token mid-flight for
/// another. Because nothing is persisted here the lock serializes rather than
/// deduplicates; callers that store tokens can re-check after acquiring.
pub struct Manager {
    refresher: Refresher,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Manager {
    /// Create a lifecycle manager with the given sync configuration.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            refresher: Refresher::new(config),
            refresh_locks: DashMap::new(),
        }
    }

    /// The underlying refresh orchestrator.
    pub fn refresher(&self) -> &Refresher {
        &self.refresher
    }

    /// Return the held token if still valid, otherwise refresh it.
    ///
    /// Owner preconditions are checked before anything else: team owners and
    /// user owners without an id are rejected without any network call. The
    /// validity predicate then decides between returning the token unchanged
    /// and a single refresh attempt (never retried internally).
    ///
    /// A refreshed token that still lacks `expiry_date` is patched to roughly
    /// a year out, so the caller does not perceive it as immediately
    /// re-expired.
    ///
    /// # Arguments
    ///
    /// * `owner` - Resource owner the credential belongs to
    /// * `slug` - Integration identifier
    /// * `current` - The currently held token
    /// * `hooks` - Per-integration capability set
    ///
    /// # Errors
    ///
    /// Owner precondition violations and all refresh-path failures propagate
    /// unmodified; see `Refresher::refresh`.
    pub async fn get_token_or_refresh<H: IntegrationHooks>(
        &self,
        owner: &ResourceOwner,
        slug: &str,
        current: &TokenObject,
        hooks: &H,
    ) -> Result<RefreshOutcome, Error> {
        let owner_id = owner.ensure_valid()?;

        let is_valid = hooks.is_token_valid(current).await?;
        debug!(slug, owner_id, is_valid, "token lifecycle check");

        if is_valid {
            return Ok(RefreshOutcome {
                token: Some(current.clone()),
                is_updated: false,
            });
        }

        // Serialize refreshes for this credential across concurrent callers.
        let lock = self
            .refresh_locks
            .entry(format!("{}:{}", owner_id, slug))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let refresh_token = current.refresh_token();
        let mut token = self
            .refresher
            .refresh(Some(owner_id), slug, refresh_token, hooks)
            .await?;

        if let Some(token) = token.as_mut() {
            if token.expiry_date_ms().is_none() {
                // Keep the old expiry and the credential would look expired
                // again right away.
                token.set_expiry_date_ms(Utc::now().timestamp_millis() + FALLBACK_EXPIRY_MS);
                debug!(slug, owner_id, "patched missing expiry on refreshed token");
            }
        }

        Ok(RefreshOutcome {
            token,
            is_updated: true,
        })
    }
}
