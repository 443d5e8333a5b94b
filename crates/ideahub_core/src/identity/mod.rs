//! Identity provider seam.
//!
//! # Responsibility
//! - Define the contract for resolving the acting user of a request.
//!
//! Credential verification (password hashing, session tokens) is an
//! external collaborator; this core only consumes the resolved identity.

use crate::model::user::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Failure to resolve an acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    /// No resolvable actor identity for the current request.
    Unauthenticated,
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no authenticated user for this request"),
        }
    }
}

impl Error for IdentityError {}

/// Resolves the current request to a stable user id.
///
/// Implementations may block or fail; callers must treat resolution as
/// fallible and surface `Unauthenticated` to the user.
pub trait IdentityProvider {
    fn resolve_current_user(&self) -> IdentityResult<UserId>;
}

/// Identity holder for embedding contexts that already resolved a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    user: Option<UserId>,
}

impl SessionIdentity {
    /// Identity for an authenticated session.
    pub fn authenticated(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    /// Identity for an anonymous session.
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for SessionIdentity {
    fn resolve_current_user(&self) -> IdentityResult<UserId> {
        self.user.ok_or(IdentityError::Unauthenticated)
    }
}
