//! Core domain logic for IdeaHub.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod feed;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use feed::composer::{
    compose_feed, compose_roadmap, list_followed_projects, FeedError, FeedResult, FeedScope,
    FollowedProjectSummary,
};
pub use identity::{IdentityError, IdentityProvider, IdentityResult, SessionIdentity};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::comment::{Comment, CommentId};
pub use model::edge::{FollowTargetKind, LikeSubjectKind};
pub use model::idea::{normalize_tag, normalize_tags, Idea, IdeaId, RoadmapUpdate, RoadmapUpdateId};
pub use model::user::{User, UserId};
pub use model::{now_epoch_ms, ValidationError};
pub use repo::idea_repo::{CommentRecord, IdeaRecord, IdeaRepository, SqliteIdeaRepository};
pub use repo::social_repo::{
    BookmarkToggle, LikeToggle, SocialGraphRepository, SqliteSocialRepository,
};
pub use repo::user_repo::{ProfileStats, SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::idea_service::{IdeaService, IdeaServiceError};
pub use service::social_service::{SocialService, SocialServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
