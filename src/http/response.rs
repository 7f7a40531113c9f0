//! Captured HTTP responses with re-readable bodies.

use serde_json::Value;

/// An HTTP response captured as immutable status metadata plus a buffered body.
///
/// Refresh flows need to read a response body twice: once for the invalidation
/// check and once for JSON parsing. Modeling the response as a captured buffer
/// rather than a single-consume stream lets both reads operate on independent
/// copies, so neither path can starve the other.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedResponse {
    status: u16,
    status_text: String,
    body: String,
}

impl CapturedResponse {
    /// Create a captured response from raw parts.
    ///
    /// # Arguments
    ///
    /// * `status` - HTTP status code
    /// * `status_text` - Status reason phrase (e.g., "Forbidden")
    /// * `body` - Full response body
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// Capture a `reqwest` response by buffering its full body.
    ///
    /// # Errors
    ///
    /// Returns the underlying transport error if the body cannot be read.
    pub async fn capture(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await?;

        Ok(Self {
            status: status.as_u16(),
            status_text,
            body,
        })
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status reason phrase.
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True if the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Raw body text.
    pub fn body_text(&self) -> &str {
        &self.body
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
