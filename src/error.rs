//! Error types for the `integration-auth` crate.
//!
//! Follows a root Error struct with error kind enums and optional source for
//! error chaining. Nothing here is retried or recovered internally; every kind
//! propagates to the caller with enough structure to log and act on.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for integration-auth.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in integration-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Owner(OwnerErrorKind),
    Refresh(RefreshErrorKind),
    Schema(SchemaErrorKind),
    Http(HttpErrorKind),
}

/// Precondition violations on the resource owner. Always fatal, never retried.
#[derive(Debug, PartialEq)]
pub enum OwnerErrorKind {
    /// Team-owned credentials are a recognized shape but not supported.
    UnsupportedTeam,
    /// A user owner must carry an id.
    MissingId,
}

/// Errors from the refresh paths (local or delegated).
#[derive(Debug, PartialEq)]
pub enum RefreshErrorKind {
    /// Connection-level failure reaching the delegated sync endpoint.
    /// The caller may retry with backoff; this crate never does.
    SyncEndpointUnreachable { endpoint: String },
    /// Non-2xx, non-204 response from either refresh path.
    UpstreamHttp { status: u16, status_text: String },
    /// The provider or delegate explicitly signaled revocation. The credential
    /// should be treated as dead and the user prompted to re-authorize.
    TokenInvalidated,
}

/// Errors from token schema validation.
#[derive(Debug, PartialEq)]
pub enum SchemaErrorKind {
    /// The response body does not match the universal token shape.
    /// Carries every field that failed, never just the first.
    Validation { issues: Vec<SchemaIssue> },
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIssue {
    pub field: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors from HTTP transport, mostly surfaced by hook implementations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Owner(kind) => write!(f, "Owner error: {:?}", kind),
            ErrorKind::Refresh(kind) => write!(f, "Refresh error: {:?}", kind),
            ErrorKind::Schema(kind) => write!(f, "Schema error: {:?}", kind),
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create owner precondition errors.
pub fn owner_error(kind: OwnerErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Owner(kind),
    }
}

/// Helper function to create refresh errors.
pub fn refresh_error(kind: RefreshErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Refresh(kind),
    }
}

/// Helper function to create schema validation errors from collected issues.
pub fn schema_error(issues: Vec<SchemaIssue>) -> Error {
    let summary = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Error {
        source: Some(summary.into()),
        error_kind: ErrorKind::Schema(SchemaErrorKind::Validation { issues }),
    }
}
