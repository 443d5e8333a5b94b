//! Social edge kinds.
//!
//! An edge is a relation record between an acting user and a target entity.
//! Presence of the row is the whole state; edges are inserted or removed,
//! never mutated.

use serde::{Deserialize, Serialize};

/// Target kind of a follow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowTargetKind {
    /// Follow another user's activity.
    User,
    /// Follow one promoted idea's roadmap.
    Project,
}

/// Subject kind of a like or bookmark edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeSubjectKind {
    Idea,
    Comment,
}
