//! Feed, roadmap and followed-project projections.
//!
//! # Responsibility
//! - Produce ordered idea views for the home and following pages.
//! - Produce ascending roadmap timelines for project detail pages.
//!
//! # Invariants
//! - Projections are pure reads; the store is the single source of truth
//!   and nothing here caches.
//! - Feed ordering is deterministic: `created_at DESC, uuid ASC`.
//! - The following-only feed is always an order-preserving subset of the
//!   full feed.

use crate::db::DbError;
use crate::model::idea::{IdeaId, RoadmapUpdate};
use crate::model::user::UserId;
use crate::repo::idea_repo::{
    load_tags_for_idea, parse_idea_row, parse_update_row, IdeaRecord, IDEA_SELECT_SQL,
    UPDATE_SELECT_SQL,
};
use crate::repo::RepoError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FeedResult<T> = Result<T, FeedError>;

/// Which ideas a feed view includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Every idea, newest first.
    All,
    /// Ideas from followed authors plus followed projects.
    FollowingOnly,
}

/// Error for feed/roadmap projection queries.
#[derive(Debug)]
pub enum FeedError {
    Db(DbError),
    IdeaNotFound(IdeaId),
    /// Roadmap requested for an idea that is not a project.
    NotAProject(IdeaId),
    InvalidData(String),
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::IdeaNotFound(id) => write!(f, "idea not found: {id}"),
            Self::NotAProject(id) => write!(f, "idea {id} is not a project"),
            Self::InvalidData(message) => write!(f, "invalid feed row: {message}"),
        }
    }
}

impl Error for FeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for FeedError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for FeedError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for FeedError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            RepoError::IdeaNotFound(id) => Self::IdeaNotFound(id),
            RepoError::NotAProject(id) => Self::NotAProject(id),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Summary row for the "followed projects" overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowedProjectSummary {
    pub idea_id: IdeaId,
    pub title: String,
    pub author_uuid: UserId,
    pub author_name: String,
    pub author_username: String,
    /// Project-follow edge count, derived.
    pub follower_count: i64,
    /// Roadmap length including the initial update.
    pub update_count: i64,
    /// Timestamp of the most recent roadmap update.
    pub last_updated: i64,
}

/// Composes the idea feed for one viewer.
///
/// `All` returns every idea; `FollowingOnly` keeps ideas whose author the
/// viewer follows or whose id the viewer follows as a project. Both orderings
/// are `created_at DESC, uuid ASC`.
pub fn compose_feed(
    conn: &Connection,
    viewer: UserId,
    scope: FeedScope,
) -> FeedResult<Vec<IdeaRecord>> {
    let mut sql = String::from(IDEA_SELECT_SQL);
    if scope == FeedScope::FollowingOnly {
        sql.push_str(
            "
             WHERE author_uuid IN (
                    SELECT target_uuid FROM follows
                    WHERE follower_uuid = ?1 AND target_kind = 'user'
                )
                OR uuid IN (
                    SELECT target_uuid FROM follows
                    WHERE follower_uuid = ?1 AND target_kind = 'project'
                )",
        );
    }
    sql.push_str(" ORDER BY created_at DESC, uuid ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let viewer_text = viewer.to_string();
    let mut rows = match scope {
        FeedScope::All => stmt.query([])?,
        FeedScope::FollowingOnly => stmt.query([viewer_text.as_str()])?,
    };

    let mut feed = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = parse_idea_row(row)?;
        record.tags = load_tags_for_idea(conn, &record.uuid.to_string())?;
        feed.push(record);
    }
    Ok(feed)
}

/// Composes one project's roadmap, oldest update first.
///
/// The initial update sorts first even when a later update shares its
/// millisecond timestamp.
pub fn compose_roadmap(conn: &Connection, project_id: IdeaId) -> FeedResult<Vec<RoadmapUpdate>> {
    let project_text = project_id.to_string();

    let mut state_stmt = conn.prepare("SELECT is_project FROM ideas WHERE uuid = ?1;")?;
    let mut state_rows = state_stmt.query([project_text.as_str()])?;
    match state_rows.next()? {
        None => return Err(FeedError::IdeaNotFound(project_id)),
        Some(row) => {
            let is_project: i64 = row.get(0)?;
            if is_project == 0 {
                return Err(FeedError::NotAProject(project_id));
            }
        }
    }

    let mut stmt = conn.prepare(&format!(
        "{UPDATE_SELECT_SQL}
         WHERE project_uuid = ?1
         ORDER BY created_at ASC, is_initial DESC, uuid ASC;"
    ))?;
    let mut rows = stmt.query([project_text.as_str()])?;
    let mut updates = Vec::new();
    while let Some(row) = rows.next()? {
        updates.push(parse_update_row(row)?);
    }
    Ok(updates)
}

/// Lists the viewer's followed projects, most recently updated first.
pub fn list_followed_projects(
    conn: &Connection,
    viewer: UserId,
) -> FeedResult<Vec<FollowedProjectSummary>> {
    let mut stmt = conn.prepare(
        "SELECT
            i.uuid AS idea_uuid,
            i.title AS title,
            u.uuid AS author_uuid,
            u.name AS author_name,
            u.username AS author_username,
            (SELECT COUNT(*) FROM follows pf
              WHERE pf.target_uuid = i.uuid AND pf.target_kind = 'project')
                AS follower_count,
            (SELECT COUNT(*) FROM roadmap_updates r
              WHERE r.project_uuid = i.uuid) AS update_count,
            COALESCE(
                (SELECT MAX(r.created_at) FROM roadmap_updates r
                  WHERE r.project_uuid = i.uuid),
                i.created_at
            ) AS last_updated
         FROM follows f
         INNER JOIN ideas i ON i.uuid = f.target_uuid
         INNER JOIN users u ON u.uuid = i.author_uuid
         WHERE f.follower_uuid = ?1 AND f.target_kind = 'project'
         ORDER BY last_updated DESC, i.uuid ASC;",
    )?;

    let mut rows = stmt.query([viewer.to_string()])?;
    let mut projects = Vec::new();
    while let Some(row) = rows.next()? {
        let idea_text: String = row.get("idea_uuid")?;
        let author_text: String = row.get("author_uuid")?;
        projects.push(FollowedProjectSummary {
            idea_id: crate::repo::parse_uuid(&idea_text, "ideas.uuid")?,
            title: row.get("title")?,
            author_uuid: crate::repo::parse_uuid(&author_text, "users.uuid")?,
            author_name: row.get("author_name")?,
            author_username: row.get("author_username")?,
            follower_count: row.get("follower_count")?,
            update_count: row.get("update_count")?,
            last_updated: row.get("last_updated")?,
        });
    }
    Ok(projects)
}
