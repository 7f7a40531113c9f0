//! # integration-auth
//!
//! OAuth2 access token lifecycle for third-party integrations attached to a
//! resource owner:
//! - Universal token schema with backward-compatible normalization
//! - Response gating (no-op / invalidation / success classification)
//! - Refresh orchestration, local callback or delegated credential-sync
//! - Top-level check-then-refresh lifecycle with per-credential locking
//!
//! ## Architecture
//!
//! This crate decides whether a held token is still usable and obtains a
//! replacement when it is not. Everything around it is injected or external:
//! per-integration refresh mechanics arrive as an [`oauth::IntegrationHooks`]
//! capability set, and persistence of the returned token belongs to the
//! caller. Nothing is cached or stored here beyond a single
//! check-then-refresh cycle.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use integration_auth::{
//!     config::SyncConfig,
//!     oauth::{Manager, ResourceOwner},
//! };
//!
//! let manager = Manager::new(SyncConfig::from_env());
//! let outcome = manager
//!     .get_token_or_refresh(&ResourceOwner::user(Some(42)), "google-calendar", &held, &hooks)
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
