//! Social edge repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Own follow/like/bookmark edge rows and their toggle semantics.
//! - Keep precondition checks (target existence, project state) inside the
//!   same transaction as the edge mutation.
//!
//! # Invariants
//! - Edge uniqueness is the composite primary key; inserts are idempotent.
//! - Returned like counts are computed from the edge set after the flip,
//!   never from a separately maintained counter.

use crate::model::edge::{FollowTargetKind, LikeSubjectKind};
use crate::model::now_epoch_ms;
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Result of one like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    /// Whether the edge exists after the flip.
    pub liked: bool,
    /// Like-edge cardinality for the subject after the flip.
    pub like_count: i64,
}

/// Result of one bookmark toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkToggle {
    pub bookmarked: bool,
}

/// Repository interface for the social graph.
pub trait SocialGraphRepository {
    /// Idempotently inserts a follow edge after validating the target.
    fn insert_follow(
        &mut self,
        follower: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> RepoResult<()>;
    /// Idempotently removes a follow edge; absent edges are not an error.
    fn delete_follow(
        &self,
        follower: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> RepoResult<()>;
    fn is_following(
        &self,
        follower: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> RepoResult<bool>;
    fn follower_count(&self, target: Uuid, kind: FollowTargetKind) -> RepoResult<i64>;
    /// Number of users this user follows (user-kind edges only).
    fn following_count(&self, follower: UserId) -> RepoResult<i64>;
    /// Flips like-edge presence and returns the derived count.
    fn toggle_like(
        &mut self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> RepoResult<LikeToggle>;
    fn is_liked(&self, actor: UserId, subject: Uuid, kind: LikeSubjectKind) -> RepoResult<bool>;
    /// Flips bookmark-edge presence.
    fn toggle_bookmark(
        &mut self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> RepoResult<BookmarkToggle>;
    fn is_bookmarked(
        &self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> RepoResult<bool>;
}

/// SQLite-backed social graph repository.
pub struct SqliteSocialRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSocialRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "follows",
                    &["follower_uuid", "target_uuid", "target_kind", "created_at"],
                ),
                (
                    "likes",
                    &["user_uuid", "subject_uuid", "subject_kind", "created_at"],
                ),
                (
                    "bookmarks",
                    &["user_uuid", "subject_uuid", "subject_kind", "created_at"],
                ),
                ("users", &["uuid"]),
                ("ideas", &["uuid", "is_project"]),
                ("comments", &["uuid"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl SocialGraphRepository for SqliteSocialRepository<'_> {
    fn insert_follow(
        &mut self,
        follower: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_user_in_tx(&tx, follower)?;
        match kind {
            FollowTargetKind::User => ensure_user_in_tx(&tx, target)?,
            FollowTargetKind::Project => {
                match project_state_in_tx(&tx, target)? {
                    None => return Err(RepoError::IdeaNotFound(target)),
                    Some(false) => return Err(RepoError::NotAProject(target)),
                    Some(true) => {}
                };
            }
        }

        tx.execute(
            "INSERT OR IGNORE INTO follows (
                follower_uuid,
                target_uuid,
                target_kind,
                created_at
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                follower.to_string(),
                target.to_string(),
                follow_kind_to_db(kind),
                now_epoch_ms(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_follow(
        &self,
        follower: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM follows
             WHERE follower_uuid = ?1 AND target_uuid = ?2 AND target_kind = ?3;",
            params![
                follower.to_string(),
                target.to_string(),
                follow_kind_to_db(kind),
            ],
        )?;
        Ok(())
    }

    fn is_following(
        &self,
        follower: UserId,
        target: Uuid,
        kind: FollowTargetKind,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM follows
                WHERE follower_uuid = ?1 AND target_uuid = ?2 AND target_kind = ?3
            );",
            params![
                follower.to_string(),
                target.to_string(),
                follow_kind_to_db(kind),
            ],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn follower_count(&self, target: Uuid, kind: FollowTargetKind) -> RepoResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows
             WHERE target_uuid = ?1 AND target_kind = ?2;",
            params![target.to_string(), follow_kind_to_db(kind)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn following_count(&self, follower: UserId) -> RepoResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows
             WHERE follower_uuid = ?1 AND target_kind = 'user';",
            [follower.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn toggle_like(
        &mut self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> RepoResult<LikeToggle> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_user_in_tx(&tx, actor)?;
        ensure_subject_in_tx(&tx, subject, kind)?;

        let liked = !flip_edge_in_tx(&tx, "likes", actor, subject, kind)?;
        let like_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM likes
             WHERE subject_uuid = ?1 AND subject_kind = ?2;",
            params![subject.to_string(), like_kind_to_db(kind)],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(LikeToggle { liked, like_count })
    }

    fn is_liked(&self, actor: UserId, subject: Uuid, kind: LikeSubjectKind) -> RepoResult<bool> {
        edge_exists(self.conn, "likes", actor, subject, kind)
    }

    fn toggle_bookmark(
        &mut self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> RepoResult<BookmarkToggle> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_user_in_tx(&tx, actor)?;
        ensure_subject_in_tx(&tx, subject, kind)?;

        let bookmarked = !flip_edge_in_tx(&tx, "bookmarks", actor, subject, kind)?;

        tx.commit()?;
        Ok(BookmarkToggle { bookmarked })
    }

    fn is_bookmarked(
        &self,
        actor: UserId,
        subject: Uuid,
        kind: LikeSubjectKind,
    ) -> RepoResult<bool> {
        edge_exists(self.conn, "bookmarks", actor, subject, kind)
    }
}

pub(crate) fn follow_kind_to_db(kind: FollowTargetKind) -> &'static str {
    match kind {
        FollowTargetKind::User => "user",
        FollowTargetKind::Project => "project",
    }
}

pub(crate) fn like_kind_to_db(kind: LikeSubjectKind) -> &'static str {
    match kind {
        LikeSubjectKind::Idea => "idea",
        LikeSubjectKind::Comment => "comment",
    }
}

/// Removes the edge when present, inserts it otherwise.
///
/// Returns whether the edge existed before the flip.
fn flip_edge_in_tx(
    tx: &Transaction<'_>,
    table: &str,
    actor: UserId,
    subject: Uuid,
    kind: LikeSubjectKind,
) -> RepoResult<bool> {
    let removed = tx.execute(
        &format!(
            "DELETE FROM {table}
             WHERE user_uuid = ?1 AND subject_uuid = ?2 AND subject_kind = ?3;"
        ),
        params![
            actor.to_string(),
            subject.to_string(),
            like_kind_to_db(kind),
        ],
    )?;
    if removed > 0 {
        return Ok(true);
    }

    tx.execute(
        &format!(
            "INSERT INTO {table} (
                user_uuid,
                subject_uuid,
                subject_kind,
                created_at
            ) VALUES (?1, ?2, ?3, ?4);"
        ),
        params![
            actor.to_string(),
            subject.to_string(),
            like_kind_to_db(kind),
            now_epoch_ms(),
        ],
    )?;
    Ok(false)
}

fn edge_exists(
    conn: &Connection,
    table: &str,
    actor: UserId,
    subject: Uuid,
    kind: LikeSubjectKind,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(
                SELECT 1 FROM {table}
                WHERE user_uuid = ?1 AND subject_uuid = ?2 AND subject_kind = ?3
            );"
        ),
        params![
            actor.to_string(),
            subject.to_string(),
            like_kind_to_db(kind),
        ],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_user_in_tx(tx: &Transaction<'_>, user: UserId) -> RepoResult<()> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
        [user.to_string()],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(RepoError::UserNotFound(user));
    }
    Ok(())
}

fn ensure_subject_in_tx(
    tx: &Transaction<'_>,
    subject: Uuid,
    kind: LikeSubjectKind,
) -> RepoResult<()> {
    match kind {
        LikeSubjectKind::Idea => {
            let exists: i64 = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM ideas WHERE uuid = ?1);",
                [subject.to_string()],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(RepoError::IdeaNotFound(subject));
            }
        }
        LikeSubjectKind::Comment => {
            let exists: i64 = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM comments WHERE uuid = ?1);",
                [subject.to_string()],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(RepoError::CommentNotFound(subject));
            }
        }
    }
    Ok(())
}

/// Returns `None` when the idea does not exist, otherwise its project flag.
fn project_state_in_tx(tx: &Transaction<'_>, id: Uuid) -> RepoResult<Option<bool>> {
    let mut stmt = tx.prepare("SELECT is_project FROM ideas WHERE uuid = ?1;")?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => {
            let value: i64 = row.get(0)?;
            Ok(Some(value != 0))
        }
        None => Ok(None),
    }
}
