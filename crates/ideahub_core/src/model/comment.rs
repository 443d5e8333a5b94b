//! Comment domain model.

use crate::model::idea::IdeaId;
use crate::model::user::UserId;
use crate::model::{now_epoch_ms, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a comment.
pub type CommentId = Uuid;

/// A user reply attached to one idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub uuid: CommentId,
    pub idea_uuid: IdeaId,
    /// Owning author, immutable after creation.
    pub author_uuid: UserId,
    pub body: String,
    /// Unix epoch milliseconds, immutable.
    pub created_at: i64,
}

impl Comment {
    /// Creates a comment with a generated id and current timestamp.
    ///
    /// The body is stored trimmed.
    pub fn new(idea_uuid: IdeaId, author_uuid: UserId, body: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            idea_uuid,
            author_uuid,
            body: body.into().trim().to_string(),
            created_at: now_epoch_ms(),
        }
    }

    /// Checks the non-empty body contract.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(())
    }
}
