//! Social graph use-case service.
//!
//! # Responsibility
//! - Provide follow/unfollow and like/bookmark toggle APIs.
//! - Enforce the pure graph-edge preconditions (no self-follow).
//!
//! # Invariants
//! - Toggles never fail on "already in desired state"; only target
//!   preconditions raise errors.
//! - Counts returned to callers are derived from the edge set.

use crate::model::comment::CommentId;
use crate::model::edge::{FollowTargetKind, LikeSubjectKind};
use crate::model::idea::IdeaId;
use crate::model::user::UserId;
use crate::repo::social_repo::{BookmarkToggle, LikeToggle, SocialGraphRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for social graph use-cases.
#[derive(Debug)]
pub enum SocialServiceError {
    /// A user cannot follow themselves.
    SelfFollow(UserId),
    /// Project-follow target exists but is not a project.
    InvalidTarget(IdeaId),
    UserNotFound(UserId),
    IdeaNotFound(IdeaId),
    CommentNotFound(CommentId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for SocialServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfFollow(id) => write!(f, "user {id} cannot follow themselves"),
            Self::InvalidTarget(id) => {
                write!(f, "idea {id} is not a project and cannot be followed as one")
            }
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::IdeaNotFound(id) => write!(f, "idea not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "comment not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SocialServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SocialServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::IdeaNotFound(id) => Self::IdeaNotFound(id),
            RepoError::CommentNotFound(id) => Self::CommentNotFound(id),
            RepoError::NotAProject(id) => Self::InvalidTarget(id),
            other => Self::Repo(other),
        }
    }
}

/// Social graph service facade over repository implementations.
pub struct SocialService<R: SocialGraphRepository> {
    repo: R,
}

impl<R: SocialGraphRepository> SocialService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Follows a user or project; repeat follows are a no-op.
    pub fn follow(
        &mut self,
        actor: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> Result<(), SocialServiceError> {
        if kind == FollowTargetKind::User && actor == target {
            return Err(SocialServiceError::SelfFollow(actor));
        }

        self.repo.insert_follow(actor, target, kind)?;

        info!(
            "event=follow_edge module=service status=ok actor={} target={} kind={:?}",
            actor, target, kind
        );

        Ok(())
    }

    /// Removes a follow edge; an absent edge is not an error.
    pub fn unfollow(
        &mut self,
        actor: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> Result<(), SocialServiceError> {
        self.repo.delete_follow(actor, target, kind)?;
        Ok(())
    }

    /// Flips like-edge presence for the actor on the subject.
    ///
    /// The returned count is always consistent with the edge set.
    pub fn toggle_like(
        &mut self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> Result<LikeToggle, SocialServiceError> {
        let toggle = self.repo.toggle_like(actor, subject, kind)?;

        info!(
            "event=like_toggle module=service status=ok actor={} subject={} liked={} count={}",
            actor, subject, toggle.liked, toggle.like_count
        );

        Ok(toggle)
    }

    /// Flips bookmark-edge presence for the actor on the subject.
    pub fn toggle_bookmark(
        &mut self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> Result<BookmarkToggle, SocialServiceError> {
        let toggle = self.repo.toggle_bookmark(actor, subject, kind)?;
        Ok(toggle)
    }

    /// Number of followers for a user or project target.
    pub fn follower_count(&self, target: Uuid, kind: FollowTargetKind) -> RepoResult<i64> {
        self.repo.follower_count(target, kind)
    }

    /// Whether the actor currently follows the target.
    pub fn is_following(
        &self,
        actor: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> RepoResult<bool> {
        self.repo.is_following(actor, target, kind)
    }

    /// Number of users the given user follows.
    pub fn following_count(&self, actor: UserId) -> RepoResult<i64> {
        self.repo.following_count(actor)
    }

    /// Whether the actor currently likes the subject.
    pub fn is_liked(&self, actor: UserId, subject: Uuid, kind: LikeSubjectKind) -> RepoResult<bool> {
        self.repo.is_liked(actor, subject, kind)
    }

    /// Whether the actor currently bookmarks the subject.
    pub fn is_bookmarked(
        &self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> RepoResult<bool> {
        self.repo.is_bookmarked(actor, subject, kind)
    }
}
