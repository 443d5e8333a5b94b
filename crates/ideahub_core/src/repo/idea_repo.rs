//! Idea/roadmap/comment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for ideas, their tags, roadmap updates and
//!   comments.
//! - Keep promotion and delete-cascade transaction logic inside the
//!   persistence boundary.
//!
//! # Invariants
//! - Write paths call model `validate()` before SQL mutations.
//! - `is_project` flips false -> true inside one immediate transaction that
//!   also inserts the initial roadmap update; concurrent promotions cannot
//!   both succeed.
//! - Like/comment counts in read models are derived from the row set in the
//!   same statement that reads the entity.

use crate::model::comment::{Comment, CommentId};
use crate::model::idea::{Idea, IdeaId, RoadmapUpdate, RoadmapUpdateId};
use crate::model::user::UserId;
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

pub(crate) const IDEA_SELECT_SQL: &str = "SELECT
    uuid,
    author_uuid,
    title,
    body,
    is_project,
    created_at,
    (SELECT COUNT(*) FROM likes l
      WHERE l.subject_uuid = ideas.uuid AND l.subject_kind = 'idea') AS like_count,
    (SELECT COUNT(*) FROM comments c
      WHERE c.idea_uuid = ideas.uuid) AS comment_count
FROM ideas";

pub(crate) const UPDATE_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    author_uuid,
    title,
    body,
    is_initial,
    created_at
FROM roadmap_updates";

const COMMENT_SELECT_SQL: &str = "SELECT
    uuid,
    idea_uuid,
    author_uuid,
    body,
    created_at,
    (SELECT COUNT(*) FROM likes l
      WHERE l.subject_uuid = comments.uuid AND l.subject_kind = 'comment') AS like_count
FROM comments";

/// Read model for idea list/detail use-cases.
///
/// Counts are derived from the like-edge and comment row sets at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaRecord {
    pub uuid: IdeaId,
    pub author_uuid: UserId,
    pub title: String,
    pub body: String,
    /// Display-stable tag list in first-seen order.
    pub tags: Vec<String>,
    pub is_project: bool,
    pub created_at: i64,
    pub like_count: i64,
    pub comment_count: i64,
}

/// Read model for comment listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub uuid: CommentId,
    pub idea_uuid: IdeaId,
    pub author_uuid: UserId,
    pub body: String,
    pub created_at: i64,
    pub like_count: i64,
}

/// Repository interface for the idea aggregate.
pub trait IdeaRepository {
    /// Persists one idea with its tags; when the idea is flagged as a
    /// project, the initial roadmap update is inserted in the same
    /// transaction.
    fn create_idea(&mut self, idea: &Idea) -> RepoResult<IdeaId>;
    /// Gets one idea with derived counts and tags.
    fn get_idea(&self, id: IdeaId) -> RepoResult<Option<IdeaRecord>>;
    /// Lists one author's ideas, newest first.
    fn list_ideas_by_author(&self, author: UserId) -> RepoResult<Vec<IdeaRecord>>;
    /// Flips `is_project` and inserts the initial update atomically.
    fn promote_to_project(&mut self, id: IdeaId) -> RepoResult<()>;
    /// Appends one non-initial update after re-checking project state.
    fn append_roadmap_update(&mut self, update: &RoadmapUpdate) -> RepoResult<RoadmapUpdateId>;
    /// Hard-deletes one idea with full cascade (comments, updates, edges).
    fn delete_idea(&mut self, id: IdeaId) -> RepoResult<()>;
    /// Persists one comment.
    fn create_comment(&self, comment: &Comment) -> RepoResult<CommentId>;
    /// Gets one comment with its derived like count.
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>>;
    /// Lists an idea's comments, oldest first.
    fn list_comments(&self, idea_id: IdeaId) -> RepoResult<Vec<CommentRecord>>;
    /// Hard-deletes one comment and its like/bookmark edges.
    fn delete_comment(&mut self, id: CommentId) -> RepoResult<()>;
}

/// SQLite-backed idea repository.
pub struct SqliteIdeaRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteIdeaRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "ideas",
                    &[
                        "uuid",
                        "author_uuid",
                        "title",
                        "body",
                        "is_project",
                        "created_at",
                    ],
                ),
                ("idea_tags", &["idea_uuid", "tag", "position"]),
                (
                    "roadmap_updates",
                    &[
                        "uuid",
                        "project_uuid",
                        "author_uuid",
                        "title",
                        "body",
                        "is_initial",
                        "created_at",
                    ],
                ),
                (
                    "comments",
                    &["uuid", "idea_uuid", "author_uuid", "body", "created_at"],
                ),
                ("likes", &["user_uuid", "subject_uuid", "subject_kind"]),
                ("bookmarks", &["user_uuid", "subject_uuid", "subject_kind"]),
                ("follows", &["follower_uuid", "target_uuid", "target_kind"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl IdeaRepository for SqliteIdeaRepository<'_> {
    fn create_idea(&mut self, idea: &Idea) -> RepoResult<IdeaId> {
        idea.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !user_exists_in_tx(&tx, idea.author_uuid)? {
            return Err(RepoError::UserNotFound(idea.author_uuid));
        }

        tx.execute(
            "INSERT INTO ideas (
                uuid,
                author_uuid,
                title,
                body,
                is_project,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                idea.uuid.to_string(),
                idea.author_uuid.to_string(),
                idea.title.as_str(),
                idea.body.as_str(),
                bool_to_int(idea.is_project),
                idea.created_at,
            ],
        )?;

        for (position, tag) in idea.tags.iter().enumerate() {
            tx.execute(
                "INSERT INTO idea_tags (idea_uuid, tag, position) VALUES (?1, ?2, ?3);",
                params![idea.uuid.to_string(), tag.as_str(), position as i64],
            )?;
        }

        if idea.is_project {
            insert_update_in_tx(&tx, &RoadmapUpdate::initial_for(idea))?;
        }

        tx.commit()?;
        Ok(idea.uuid)
    }

    fn get_idea(&self, id: IdeaId) -> RepoResult<Option<IdeaRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{IDEA_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut record = parse_idea_row(row)?;
            record.tags = load_tags_for_idea(self.conn, &record.uuid.to_string())?;
            return Ok(Some(record));
        }
        Ok(None)
    }

    fn list_ideas_by_author(&self, author: UserId) -> RepoResult<Vec<IdeaRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IDEA_SELECT_SQL}
             WHERE author_uuid = ?1
             ORDER BY created_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([author.to_string()])?;
        let mut ideas = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = parse_idea_row(row)?;
            record.tags = load_tags_for_idea(self.conn, &record.uuid.to_string())?;
            ideas.push(record);
        }
        Ok(ideas)
    }

    fn promote_to_project(&mut self, id: IdeaId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Project-state check and flag flip must share the transaction so
        // exactly one of two concurrent promotions wins.
        let current = {
            let mut stmt = tx.prepare(
                "SELECT author_uuid, title, body, is_project, created_at
                 FROM ideas
                 WHERE uuid = ?1;",
            )?;
            let mut rows = stmt.query([id_text.as_str()])?;
            match rows.next()? {
                Some(row) => {
                    let author_text: String = row.get("author_uuid")?;
                    (
                        parse_uuid(&author_text, "ideas.author_uuid")?,
                        row.get::<_, String>("title")?,
                        row.get::<_, String>("body")?,
                        int_to_bool(row.get("is_project")?, "ideas.is_project")?,
                        row.get::<_, i64>("created_at")?,
                    )
                }
                None => return Err(RepoError::IdeaNotFound(id)),
            }
        };

        let (author_uuid, title, body, is_project, created_at) = current;
        if is_project {
            return Err(RepoError::AlreadyProject(id));
        }

        tx.execute(
            "UPDATE ideas SET is_project = 1 WHERE uuid = ?1;",
            [id_text.as_str()],
        )?;

        let initial = RoadmapUpdate {
            uuid: Uuid::new_v4(),
            project_uuid: id,
            author_uuid,
            title,
            body,
            is_initial: true,
            created_at,
        };
        insert_update_in_tx(&tx, &initial)?;

        tx.commit()?;
        Ok(())
    }

    fn append_roadmap_update(&mut self, update: &RoadmapUpdate) -> RepoResult<RoadmapUpdateId> {
        update.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        match idea_project_state_in_tx(&tx, update.project_uuid)? {
            None => return Err(RepoError::IdeaNotFound(update.project_uuid)),
            Some(false) => return Err(RepoError::NotAProject(update.project_uuid)),
            Some(true) => {}
        }

        insert_update_in_tx(&tx, update)?;
        tx.commit()?;
        Ok(update.uuid)
    }

    fn delete_idea(&mut self, id: IdeaId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if idea_project_state_in_tx(&tx, id)?.is_none() {
            return Err(RepoError::IdeaNotFound(id));
        }

        // Edge targets are polymorphic, so FK cascades cannot reach them;
        // edge cleanup runs before the idea row (and its comments) go away.
        for edge_table in ["likes", "bookmarks"] {
            tx.execute(
                &format!(
                    "DELETE FROM {edge_table}
                     WHERE (subject_kind = 'idea' AND subject_uuid = ?1)
                        OR (subject_kind = 'comment' AND subject_uuid IN (
                            SELECT uuid FROM comments WHERE idea_uuid = ?1
                        ));"
                ),
                [id_text.as_str()],
            )?;
        }
        tx.execute(
            "DELETE FROM follows WHERE target_kind = 'project' AND target_uuid = ?1;",
            [id_text.as_str()],
        )?;

        // Comments, tags and roadmap updates go with the idea via FK cascade.
        tx.execute("DELETE FROM ideas WHERE uuid = ?1;", [id_text.as_str()])?;

        tx.commit()?;
        Ok(())
    }

    fn create_comment(&self, comment: &Comment) -> RepoResult<CommentId> {
        comment.validate()?;

        let author_exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
            [comment.author_uuid.to_string()],
            |row| row.get(0),
        )?;
        if author_exists == 0 {
            return Err(RepoError::UserNotFound(comment.author_uuid));
        }

        let idea_exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM ideas WHERE uuid = ?1);",
            [comment.idea_uuid.to_string()],
            |row| row.get(0),
        )?;
        if idea_exists == 0 {
            return Err(RepoError::IdeaNotFound(comment.idea_uuid));
        }

        self.conn.execute(
            "INSERT INTO comments (
                uuid,
                idea_uuid,
                author_uuid,
                body,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                comment.uuid.to_string(),
                comment.idea_uuid.to_string(),
                comment.author_uuid.to_string(),
                comment.body.as_str(),
                comment.created_at,
            ],
        )?;

        Ok(comment.uuid)
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_comments(&self, idea_id: IdeaId) -> RepoResult<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE idea_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([idea_id.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn delete_comment(&mut self, id: CommentId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM comments WHERE uuid = ?1);",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::CommentNotFound(id));
        }

        for edge_table in ["likes", "bookmarks"] {
            tx.execute(
                &format!(
                    "DELETE FROM {edge_table}
                     WHERE subject_kind = 'comment' AND subject_uuid = ?1;"
                ),
                [id_text.as_str()],
            )?;
        }
        tx.execute("DELETE FROM comments WHERE uuid = ?1;", [id_text.as_str()])?;

        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn parse_idea_row(row: &Row<'_>) -> RepoResult<IdeaRecord> {
    let uuid_text: String = row.get("uuid")?;
    let author_text: String = row.get("author_uuid")?;

    Ok(IdeaRecord {
        uuid: parse_uuid(&uuid_text, "ideas.uuid")?,
        author_uuid: parse_uuid(&author_text, "ideas.author_uuid")?,
        title: row.get("title")?,
        body: row.get("body")?,
        tags: Vec::new(),
        is_project: int_to_bool(row.get("is_project")?, "ideas.is_project")?,
        created_at: row.get("created_at")?,
        like_count: row.get("like_count")?,
        comment_count: row.get("comment_count")?,
    })
}

pub(crate) fn load_tags_for_idea(conn: &Connection, idea_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM idea_tags
         WHERE idea_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([idea_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get::<_, String>(0)?);
    }
    Ok(tags)
}

pub(crate) fn parse_update_row(row: &Row<'_>) -> RepoResult<RoadmapUpdate> {
    let uuid_text: String = row.get("uuid")?;
    let project_text: String = row.get("project_uuid")?;
    let author_text: String = row.get("author_uuid")?;

    Ok(RoadmapUpdate {
        uuid: parse_uuid(&uuid_text, "roadmap_updates.uuid")?,
        project_uuid: parse_uuid(&project_text, "roadmap_updates.project_uuid")?,
        author_uuid: parse_uuid(&author_text, "roadmap_updates.author_uuid")?,
        title: row.get("title")?,
        body: row.get("body")?,
        is_initial: int_to_bool(row.get("is_initial")?, "roadmap_updates.is_initial")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<CommentRecord> {
    let uuid_text: String = row.get("uuid")?;
    let idea_text: String = row.get("idea_uuid")?;
    let author_text: String = row.get("author_uuid")?;

    Ok(CommentRecord {
        uuid: parse_uuid(&uuid_text, "comments.uuid")?,
        idea_uuid: parse_uuid(&idea_text, "comments.idea_uuid")?,
        author_uuid: parse_uuid(&author_text, "comments.author_uuid")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
        like_count: row.get("like_count")?,
    })
}

fn insert_update_in_tx(tx: &Transaction<'_>, update: &RoadmapUpdate) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO roadmap_updates (
            uuid,
            project_uuid,
            author_uuid,
            title,
            body,
            is_initial,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            update.uuid.to_string(),
            update.project_uuid.to_string(),
            update.author_uuid.to_string(),
            update.title.as_str(),
            update.body.as_str(),
            bool_to_int(update.is_initial),
            update.created_at,
        ],
    )?;
    Ok(())
}

fn user_exists_in_tx(tx: &Transaction<'_>, user: UserId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
        [user.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns `None` when the idea does not exist, otherwise its project flag.
fn idea_project_state_in_tx(tx: &Transaction<'_>, id: IdeaId) -> RepoResult<Option<bool>> {
    let mut stmt = tx.prepare("SELECT is_project FROM ideas WHERE uuid = ?1;")?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(int_to_bool(
            row.get("is_project")?,
            "ideas.is_project",
        )?)),
        None => Ok(None),
    }
}
