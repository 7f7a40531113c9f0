//! Resource owners of integration credentials.

use serde::{Deserialize, Serialize};

use crate::error::{owner_error, Error, OwnerErrorKind};

/// The kind of entity a credential belongs to.
///
/// `Team` is a recognized shape but always rejected; team-owned credentials
/// are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    User,
    Team,
}

/// The entity to which a credential belongs.
///
/// The owner id is the correlation key sent to the delegated sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwner {
    pub id: Option<i64>,
    pub kind: OwnerKind,
}

impl ResourceOwner {
    /// Create a user-owned resource owner.
    pub fn user(id: Option<i64>) -> Self {
        Self {
            id,
            kind: OwnerKind::User,
        }
    }

    /// Create a team-owned resource owner. Always rejected by `ensure_valid`.
    pub fn team(id: Option<i64>) -> Self {
        Self {
            id,
            kind: OwnerKind::Team,
        }
    }

    /// Validate the owner and return its id.
    ///
    /// # Errors
    ///
    /// * `OwnerErrorKind::UnsupportedTeam` for team owners
    /// * `OwnerErrorKind::MissingId` for user owners without an id
    pub fn ensure_valid(&self) -> Result<i64, Error> {
        match self.kind {
            OwnerKind::Team => Err(owner_error(
                OwnerErrorKind::UnsupportedTeam,
                "teams are not supported",
            )),
            OwnerKind::User => self.id.ok_or_else(|| {
                owner_error(OwnerErrorKind::MissingId, "resource owner should have id set")
            }),
        }
    }
}
