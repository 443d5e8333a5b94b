//! User domain model.
//!
//! # Responsibility
//! - Define the profile record behind feeds, roadmaps and social edges.
//! - Validate the immutable handle format at creation time.
//!
//! # Invariants
//! - `uuid` and `username` are stable for the lifetime of the account.
//! - `joined_at` is set once at creation and never updated.

use crate::model::{now_epoch_ms, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user account.
pub type UserId = Uuid;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]{3,30}$").expect("valid username regex"));

/// Profile record for an account.
///
/// The credential side of an account (email, password hash) lives with the
/// external identity provider; this store only holds the public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable account id referenced by every authored entity and edge.
    pub uuid: UserId,
    /// Immutable public handle, lowercase.
    pub username: String,
    /// Display name shown next to the handle.
    pub name: String,
    /// Avatar asset reference (path or URL).
    pub avatar_ref: String,
    pub bio: String,
    pub location: Option<String>,
    pub website_ref: Option<String>,
    /// Unix epoch milliseconds, set at creation.
    pub joined_at: i64,
}

impl User {
    /// Creates a profile with a generated stable id and current join time.
    pub fn new(username: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), username, name)
    }

    /// Creates a profile with a caller-provided stable id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(
        uuid: UserId,
        username: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            uuid,
            username: username.into(),
            name: name.into().trim().to_string(),
            avatar_ref: String::new(),
            bio: String::new(),
            location: None,
            website_ref: None,
            joined_at: now_epoch_ms(),
        }
    }

    /// Checks handle format and display-name presence.
    ///
    /// # Errors
    /// - `EmptyName` when the display name is blank.
    /// - `InvalidUsername` when the handle fails the format rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !USERNAME_RE.is_match(&self.username) {
            return Err(ValidationError::InvalidUsername(self.username.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::User;
    use crate::model::ValidationError;

    #[test]
    fn valid_profile_passes_validation() {
        let user = User::new("sarahchen", "Sarah Chen");
        assert!(user.validate().is_ok());
        assert!(user.joined_at > 0);
    }

    #[test]
    fn blank_name_is_rejected() {
        let user = User::new("sarahchen", "   ");
        assert_eq!(user.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn username_format_is_enforced() {
        for bad in ["ab", "Sarah", "sarah chen", "sarah-chen", ""] {
            let user = User::new(bad, "Sarah Chen");
            assert!(
                matches!(user.validate(), Err(ValidationError::InvalidUsername(_))),
                "username `{bad}` should be rejected"
            );
        }
    }

    #[test]
    fn serde_roundtrip_preserves_profile() {
        let user = User::new("marcusj", "Marcus Johnson");
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
