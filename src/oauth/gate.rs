//! Response gate: classify a refresh response before any token parsing.

use serde_json::Value;
use tracing::debug;

use super::hooks::IntegrationHooks;
use crate::error::{refresh_error, schema_error, Error, RefreshErrorKind, SchemaIssue};
use crate::http::CapturedResponse;

/// Outcome of gating a refresh response.
#[derive(Debug, Clone, PartialEq)]
pub enum GateResult {
    /// No response was supplied at all; nothing changed and the held token is
    /// considered still valid upstream.
    NoOp,
    /// The provider or delegate explicitly signaled revocation.
    Invalidated,
    /// A successful response. The body is `None` for 204 (no content).
    Success(Option<Value>),
}

/// Inspect a refresh response and decide how it should be handled.
///
/// Order of checks:
/// 1. No response → `NoOp`.
/// 2. Invalidation predicate (on an independent copy of the response) →
///    `Invalidated`, short-circuiting everything else.
/// 3. Non-2xx status → `UpstreamHttp` error.
/// 4. 204 → `Success(None)`, the empty body is never parsed.
/// 5. Body parsed as JSON → `Success(Some(body))`.
///
/// # Errors
///
/// * `RefreshErrorKind::UpstreamHttp` for non-2xx statuses
/// * `SchemaErrorKind::Validation` when a 2xx body is not valid JSON
pub async fn gate<H: IntegrationHooks>(
    response: Option<CapturedResponse>,
    hooks: &H,
) -> Result<GateResult, Error> {
    let response = match response {
        Some(response) => response,
        None => {
            debug!("no refresh response supplied, treating as no-op");
            return Ok(GateResult::NoOp);
        }
    };

    if hooks.response_invalidates_token(response.clone()).await? {
        debug!(status = response.status(), "response invalidates the token");
        return Ok(GateResult::Invalidated);
    }

    if !response.is_success() {
        debug!(
            status = response.status(),
            status_text = response.status_text(),
            "refresh response has non-success status"
        );
        return Err(refresh_error(
            RefreshErrorKind::UpstreamHttp {
                status: response.status(),
                status_text: response.status_text().to_string(),
            },
            "refresh response had a non-success status",
        ));
    }

    // 204 carries no body; parsing "" would fail.
    if response.status() == 204 {
        return Ok(GateResult::Success(None));
    }

    let body = response.json().map_err(|e| {
        schema_error(vec![SchemaIssue::new(
            "$",
            &format!("response body is not valid JSON: {e}"),
        )])
    })?;

    Ok(GateResult::Success(Some(body)))
}
