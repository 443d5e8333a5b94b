//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide account persistence and lookup by id/username.
//! - Derive profile statistics from the idea and follow row sets.
//!
//! # Invariants
//! - `username` is unique; duplicates fail with `UsernameTaken`.
//! - Profile statistics are computed from rows at read time, never stored.

use crate::model::user::{User, UserId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    username,
    name,
    avatar_ref,
    bio,
    location,
    website_ref,
    joined_at
FROM users";

/// Derived profile statistics shown on the profile header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileStats {
    /// Ideas authored by the user.
    pub ideas: i64,
    /// Users following this user.
    pub followers: i64,
    /// Users this user follows.
    pub following: i64,
}

/// Repository interface for account records.
pub trait UserRepository {
    /// Persists one validated profile and returns its stable id.
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    /// Gets one profile by stable id.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Gets one profile by immutable handle.
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Computes idea/follower/following counts for an existing user.
    fn profile_stats(&self, id: UserId) -> RepoResult<ProfileStats>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "users",
                    &[
                        "uuid",
                        "username",
                        "name",
                        "avatar_ref",
                        "bio",
                        "location",
                        "website_ref",
                        "joined_at",
                    ],
                ),
                ("ideas", &["uuid", "author_uuid"]),
                ("follows", &["follower_uuid", "target_uuid", "target_kind"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        let taken: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1);",
            [user.username.as_str()],
            |row| row.get(0),
        )?;
        if taken == 1 {
            return Err(RepoError::UsernameTaken(user.username.clone()));
        }

        self.conn.execute(
            "INSERT INTO users (
                uuid,
                username,
                name,
                avatar_ref,
                bio,
                location,
                website_ref,
                joined_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                user.uuid.to_string(),
                user.username.as_str(),
                user.name.as_str(),
                user.avatar_ref.as_str(),
                user.bio.as_str(),
                user.location.as_deref(),
                user.website_ref.as_deref(),
                user.joined_at,
            ],
        )?;

        Ok(user.uuid)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE username = ?1;"))?;
        let mut rows = stmt.query([username])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn profile_stats(&self, id: UserId) -> RepoResult<ProfileStats> {
        let id_text = id.to_string();

        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::UserNotFound(id));
        }

        let ideas: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM ideas WHERE author_uuid = ?1;",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        let followers: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows
             WHERE target_uuid = ?1 AND target_kind = 'user';",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        let following: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows
             WHERE follower_uuid = ?1 AND target_kind = 'user';",
            [id_text.as_str()],
            |row| row.get(0),
        )?;

        Ok(ProfileStats {
            ideas,
            followers,
            following,
        })
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "users.uuid")?;

    Ok(User {
        uuid,
        username: row.get("username")?,
        name: row.get("name")?,
        avatar_ref: row.get("avatar_ref")?,
        bio: row.get("bio")?,
        location: row.get("location")?,
        website_ref: row.get("website_ref")?,
        joined_at: row.get("joined_at")?,
    })
}
