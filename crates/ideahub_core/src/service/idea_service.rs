//! Idea/project use-case service.
//!
//! # Responsibility
//! - Provide create/promote/update/delete/comment APIs over the idea
//!   aggregate.
//! - Enforce authorship on every author-restricted mutation.
//!
//! # Invariants
//! - `promote_to_project` is an explicit error on an already-promoted idea,
//!   never a silent no-op.
//! - Ownership checks run against the immutable `author_uuid`, so they may
//!   precede the repository transaction without a race.
//! - No partial success: each operation returns its value or exactly one
//!   error.

use crate::model::comment::{Comment, CommentId};
use crate::model::idea::{Idea, IdeaId, RoadmapUpdate};
use crate::model::user::UserId;
use crate::model::ValidationError;
use crate::repo::idea_repo::{CommentRecord, IdeaRecord, IdeaRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for idea/project use-cases.
#[derive(Debug)]
pub enum IdeaServiceError {
    /// A required field is empty after trimming.
    Validation(ValidationError),
    /// Acting user is not the author of the target entity.
    NotOwner { entity: Uuid, actor: UserId },
    IdeaNotFound(IdeaId),
    CommentNotFound(CommentId),
    AuthorNotFound(UserId),
    /// Target idea has not been promoted to a project.
    NotAProject(IdeaId),
    /// Target idea is already a project; double promotion is rejected.
    AlreadyProject(IdeaId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal mismatch between a write and its read-back.
    InconsistentState(&'static str),
}

impl Display for IdeaServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotOwner { entity, actor } => {
                write!(f, "user {actor} is not the author of {entity}")
            }
            Self::IdeaNotFound(id) => write!(f, "idea not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "comment not found: {id}"),
            Self::AuthorNotFound(id) => write!(f, "author not found: {id}"),
            Self::NotAProject(id) => write!(f, "idea {id} is not a project"),
            Self::AlreadyProject(id) => write!(f, "idea {id} is already a project"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent idea state: {details}"),
        }
    }
}

impl Error for IdeaServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for IdeaServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::UserNotFound(id) => Self::AuthorNotFound(id),
            RepoError::IdeaNotFound(id) => Self::IdeaNotFound(id),
            RepoError::CommentNotFound(id) => Self::CommentNotFound(id),
            RepoError::NotAProject(id) => Self::NotAProject(id),
            RepoError::AlreadyProject(id) => Self::AlreadyProject(id),
            other => Self::Repo(other),
        }
    }
}

/// Idea service facade over repository implementations.
pub struct IdeaService<R: IdeaRepository> {
    repo: R,
}

impl<R: IdeaRepository> IdeaService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one idea from form input.
    ///
    /// # Contract
    /// - Title and body are required non-empty after trimming.
    /// - Tags are trimmed and de-duplicated (case-sensitive, first-seen
    ///   order); empty and duplicate submissions are silently dropped.
    /// - With `mark_as_project`, the idea starts as a project and its
    ///   initial roadmap update is synthesized in the same transaction.
    pub fn create_idea(
        &mut self,
        author: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
        tags: Vec<String>,
        mark_as_project: bool,
    ) -> Result<IdeaRecord, IdeaServiceError> {
        let idea = Idea::new(author, title, body, &tags, mark_as_project);
        let idea_id = self.repo.create_idea(&idea)?;

        info!(
            "event=idea_create module=service status=ok idea={} author={} is_project={}",
            idea_id, author, mark_as_project
        );

        self.repo
            .get_idea(idea_id)?
            .ok_or(IdeaServiceError::InconsistentState(
                "created idea not found in read-back",
            ))
    }

    /// Promotes an existing idea to a project.
    ///
    /// Flips `is_project` exactly once and synthesizes the initial roadmap
    /// update; the second promotion attempt fails with `AlreadyProject`.
    pub fn promote_to_project(
        &mut self,
        idea_id: IdeaId,
        actor: UserId,
    ) -> Result<IdeaRecord, IdeaServiceError> {
        let current = self
            .repo
            .get_idea(idea_id)?
            .ok_or(IdeaServiceError::IdeaNotFound(idea_id))?;
        if current.author_uuid != actor {
            return Err(IdeaServiceError::NotOwner {
                entity: idea_id,
                actor,
            });
        }
        if current.is_project {
            return Err(IdeaServiceError::AlreadyProject(idea_id));
        }

        // The repository re-checks the flag inside its transaction; under
        // two concurrent promotions one of them lands here and still gets
        // AlreadyProject.
        self.repo.promote_to_project(idea_id)?;

        info!(
            "event=project_promote module=service status=ok idea={} actor={}",
            idea_id, actor
        );

        self.repo
            .get_idea(idea_id)?
            .ok_or(IdeaServiceError::InconsistentState(
                "promoted idea not found in read-back",
            ))
    }

    /// Appends one roadmap update to an owned project.
    pub fn post_roadmap_update(
        &mut self,
        project_id: IdeaId,
        actor: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<RoadmapUpdate, IdeaServiceError> {
        let current = self
            .repo
            .get_idea(project_id)?
            .ok_or(IdeaServiceError::IdeaNotFound(project_id))?;
        if current.author_uuid != actor {
            return Err(IdeaServiceError::NotOwner {
                entity: project_id,
                actor,
            });
        }
        if !current.is_project {
            return Err(IdeaServiceError::NotAProject(project_id));
        }

        let update = RoadmapUpdate::new(project_id, actor, title, body);
        self.repo.append_roadmap_update(&update)?;

        info!(
            "event=roadmap_append module=service status=ok project={} update={}",
            project_id, update.uuid
        );

        Ok(update)
    }

    /// Deletes an owned idea with full cascade.
    pub fn delete_idea(&mut self, idea_id: IdeaId, actor: UserId) -> Result<(), IdeaServiceError> {
        let current = self
            .repo
            .get_idea(idea_id)?
            .ok_or(IdeaServiceError::IdeaNotFound(idea_id))?;
        if current.author_uuid != actor {
            return Err(IdeaServiceError::NotOwner {
                entity: idea_id,
                actor,
            });
        }

        self.repo.delete_idea(idea_id)?;

        info!(
            "event=idea_delete module=service status=ok idea={} actor={}",
            idea_id, actor
        );

        Ok(())
    }

    /// Posts one comment on an idea.
    pub fn post_comment(
        &mut self,
        idea_id: IdeaId,
        author: UserId,
        body: impl Into<String>,
    ) -> Result<CommentRecord, IdeaServiceError> {
        let comment = Comment::new(idea_id, author, body);
        let comment_id = self.repo.create_comment(&comment)?;

        self.repo
            .get_comment(comment_id)?
            .ok_or(IdeaServiceError::InconsistentState(
                "created comment not found in read-back",
            ))
    }

    /// Deletes an owned comment.
    pub fn delete_comment(
        &mut self,
        comment_id: CommentId,
        actor: UserId,
    ) -> Result<(), IdeaServiceError> {
        let current = self
            .repo
            .get_comment(comment_id)?
            .ok_or(IdeaServiceError::CommentNotFound(comment_id))?;
        if current.author_uuid != actor {
            return Err(IdeaServiceError::NotOwner {
                entity: comment_id,
                actor,
            });
        }

        self.repo.delete_comment(comment_id)?;
        Ok(())
    }

    /// Gets one idea with derived counts and tags.
    pub fn get_idea(&self, idea_id: IdeaId) -> RepoResult<Option<IdeaRecord>> {
        self.repo.get_idea(idea_id)
    }

    /// Lists one author's ideas, newest first.
    pub fn list_ideas_by_author(&self, author: UserId) -> RepoResult<Vec<IdeaRecord>> {
        self.repo.list_ideas_by_author(author)
    }

    /// Lists an idea's comments, oldest first.
    pub fn list_comments(&self, idea_id: IdeaId) -> RepoResult<Vec<CommentRecord>> {
        self.repo.list_comments(idea_id)
    }
}
