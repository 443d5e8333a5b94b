//! Idea and roadmap update domain models.
//!
//! # Responsibility
//! - Define the idea record and its one-directional project promotion.
//! - Own tag normalization and the synthesis of initial roadmap updates.
//!
//! # Invariants
//! - `author_uuid` and `created_at` are immutable after creation.
//! - `is_project` transitions false -> true exactly once, never back.
//! - Exactly one `is_initial` update exists per project, and its
//!   `created_at` equals the idea's `created_at`.

use crate::model::user::UserId;
use crate::model::{now_epoch_ms, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an idea (and, once promoted, its project).
pub type IdeaId = Uuid;

/// Stable identifier for a roadmap update.
pub type RoadmapUpdateId = Uuid;

/// A user-authored post; may be promoted to a project.
///
/// Like and comment counts are derived from the edge/row set at read time
/// and intentionally absent here; see the repository read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub uuid: IdeaId,
    /// Owning author, immutable after creation.
    pub author_uuid: UserId,
    pub title: String,
    pub body: String,
    /// Trimmed, case-sensitively de-duplicated, first-seen order.
    pub tags: Vec<String>,
    /// Project flag; flips false -> true at most once.
    pub is_project: bool,
    /// Unix epoch milliseconds, immutable.
    pub created_at: i64,
}

impl Idea {
    /// Creates an idea with a generated id and current timestamp.
    ///
    /// Title and body are stored trimmed; tags pass through
    /// [`normalize_tags`].
    pub fn new(
        author_uuid: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
        tags: &[String],
        is_project: bool,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), author_uuid, title, body, tags, is_project)
    }

    /// Creates an idea with a caller-provided stable id.
    pub fn with_id(
        uuid: IdeaId,
        author_uuid: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
        tags: &[String],
        is_project: bool,
    ) -> Self {
        Self {
            uuid,
            author_uuid,
            title: title.into().trim().to_string(),
            body: body.into().trim().to_string(),
            tags: normalize_tags(tags),
            is_project,
            created_at: now_epoch_ms(),
        }
    }

    /// Checks the non-empty title/body contract.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(())
    }
}

/// A timestamped progress entry on a project's roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapUpdate {
    pub uuid: RoadmapUpdateId,
    /// Owning project; the referenced idea must have `is_project = true`.
    pub project_uuid: IdeaId,
    /// Must equal the project's author; only the owner posts updates.
    pub author_uuid: UserId,
    pub title: String,
    pub body: String,
    /// True only for the update synthesized from the original post.
    pub is_initial: bool,
    /// Unix epoch milliseconds. For the initial update this equals the
    /// project's `created_at`, so it sorts before every later update.
    pub created_at: i64,
}

impl RoadmapUpdate {
    /// Creates a non-initial update stamped with the current time.
    pub fn new(
        project_uuid: IdeaId,
        author_uuid: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            project_uuid,
            author_uuid,
            title: title.into().trim().to_string(),
            body: body.into().trim().to_string(),
            is_initial: false,
            created_at: now_epoch_ms(),
        }
    }

    /// Synthesizes the initial update from the idea's original post.
    ///
    /// Mirrors title, body, author and creation time, so the roadmap always
    /// starts at the moment the idea was posted.
    pub fn initial_for(idea: &Idea) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            project_uuid: idea.uuid,
            author_uuid: idea.author_uuid,
            title: idea.title.clone(),
            body: idea.body.clone(),
            is_initial: true,
            created_at: idea.created_at,
        }
    }

    /// Checks the non-empty title/body contract.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(())
    }
}

/// Normalizes one tag submission: trimmed, empty input dropped.
///
/// Matches the UI contract where adding an empty tag is a silent no-op.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes a tag list: trims, drops empties, de-duplicates by exact
/// case-sensitive match, preserving first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
    }
    seen
}
