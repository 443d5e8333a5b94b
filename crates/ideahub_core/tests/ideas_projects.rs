use ideahub_core::db::open_db_in_memory;
use ideahub_core::{
    compose_roadmap, FollowTargetKind, IdeaService, IdeaServiceError, LikeSubjectKind,
    SocialService, SqliteIdeaRepository, SqliteSocialRepository, SqliteUserRepository, User,
    UserId, UserRepository, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn create_idea_trims_input_and_deduplicates_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");

    let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
    let idea = service
        .create_idea(
            sarah,
            "  AI-Powered Recipe Generator  ",
            " Generates recipes from photos. \n",
            vec![
                "AI".to_string(),
                " AI ".to_string(),
                "".to_string(),
                "Food Tech".to_string(),
                "ai".to_string(),
            ],
            false,
        )
        .unwrap();

    assert_eq!(idea.title, "AI-Powered Recipe Generator");
    assert_eq!(idea.body, "Generates recipes from photos.");
    assert_eq!(idea.tags, vec!["AI", "Food Tech", "ai"]);
    assert!(!idea.is_project);
    assert_eq!(idea.like_count, 0);
    assert_eq!(idea.comment_count, 0);
}

#[test]
fn blank_title_fails_validation_and_persists_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");

    {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        let err = service
            .create_idea(sarah, "   ", "A body.", vec![], false)
            .unwrap_err();
        assert!(matches!(
            err,
            IdeaServiceError::Validation(ValidationError::EmptyTitle)
        ));
    }

    let ideas: i64 = conn
        .query_row("SELECT COUNT(*) FROM ideas;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(ideas, 0);
}

#[test]
fn create_idea_requires_existing_author() {
    let mut conn = open_db_in_memory().unwrap();

    let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
    let err = service
        .create_idea(Uuid::new_v4(), "Title", "Body.", vec![], false)
        .unwrap_err();
    assert!(matches!(err, IdeaServiceError::AuthorNotFound(_)));
}

#[test]
fn project_marked_idea_starts_with_initial_update() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");

    let idea = {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        service
            .create_idea(
                sarah,
                "AI-Powered Code Review Assistant",
                "An AI assistant for better code reviews.",
                vec!["AI".to_string(), "Developer Tools".to_string()],
                true,
            )
            .unwrap()
    };
    assert!(idea.is_project);

    let roadmap = compose_roadmap(&conn, idea.uuid).unwrap();
    assert_eq!(roadmap.len(), 1);
    assert!(roadmap[0].is_initial);
    assert_eq!(roadmap[0].title, "AI-Powered Code Review Assistant");
    assert_eq!(roadmap[0].body, "An AI assistant for better code reviews.");
    assert_eq!(roadmap[0].author_uuid, sarah);
    assert_eq!(roadmap[0].created_at, idea.created_at);
}

#[test]
fn promote_then_update_then_foreign_promote_scenario() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let alex = seed_user(&conn, "alexrivera", "Alex Rivera");

    let idea_id = {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        let idea = service
            .create_idea(
                sarah,
                "AI-Powered Code Review Assistant",
                "An AI assistant for better code reviews.",
                vec![],
                true,
            )
            .unwrap();

        let update = service
            .post_roadmap_update(
                idea.uuid,
                sarah,
                "Completed Initial Prototype",
                "First working version of the review pipeline.",
            )
            .unwrap();
        assert!(!update.is_initial);

        let foreign = service.promote_to_project(idea.uuid, alex).unwrap_err();
        assert!(matches!(foreign, IdeaServiceError::NotOwner { .. }));

        idea.uuid
    };

    let roadmap = compose_roadmap(&conn, idea_id).unwrap();
    assert_eq!(roadmap.len(), 2);
    assert!(roadmap[0].is_initial);
    assert!(!roadmap[1].is_initial);
    assert!(roadmap[0].created_at <= roadmap[1].created_at);
    assert_eq!(roadmap[1].title, "Completed Initial Prototype");
}

#[test]
fn second_promotion_fails_and_leaves_roadmap_unchanged() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");

    let idea_id = {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        let idea = service
            .create_idea(sarah, "Skill Exchange", "Trade skills locally.", vec![], false)
            .unwrap();

        let promoted = service.promote_to_project(idea.uuid, sarah).unwrap();
        assert!(promoted.is_project);

        let err = service.promote_to_project(idea.uuid, sarah).unwrap_err();
        assert!(matches!(err, IdeaServiceError::AlreadyProject(id) if id == idea.uuid));

        idea.uuid
    };

    let roadmap = compose_roadmap(&conn, idea_id).unwrap();
    assert_eq!(roadmap.len(), 1);
    assert!(roadmap[0].is_initial);
}

#[test]
fn roadmap_update_requires_owned_project() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");

    let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
    let plain = service
        .create_idea(sarah, "Plain Idea", "Not a project.", vec![], false)
        .unwrap();

    let not_project = service
        .post_roadmap_update(plain.uuid, sarah, "Update", "Body.")
        .unwrap_err();
    assert!(matches!(not_project, IdeaServiceError::NotAProject(_)));

    let missing = service
        .post_roadmap_update(Uuid::new_v4(), sarah, "Update", "Body.")
        .unwrap_err();
    assert!(matches!(missing, IdeaServiceError::IdeaNotFound(_)));
}

#[test]
fn comments_feed_the_derived_comment_count() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let alex = seed_user(&conn, "alexrivera", "Alex Rivera");

    let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
    let idea = service
        .create_idea(sarah, "Recipe AI", "Generates recipes.", vec![], false)
        .unwrap();

    let comment = service
        .post_comment(idea.uuid, alex, " Have you considered IDE integration? ")
        .unwrap();
    assert_eq!(comment.body, "Have you considered IDE integration?");
    assert_eq!(comment.like_count, 0);

    let blank = service.post_comment(idea.uuid, alex, "   ").unwrap_err();
    assert!(matches!(
        blank,
        IdeaServiceError::Validation(ValidationError::EmptyBody)
    ));

    let refreshed = service.get_idea(idea.uuid).unwrap().unwrap();
    assert_eq!(refreshed.comment_count, 1);

    let listed = service.list_comments(idea.uuid).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].uuid, comment.uuid);
}

#[test]
fn comment_deletion_is_author_only_and_drops_edges() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let alex = seed_user(&conn, "alexrivera", "Alex Rivera");

    let (idea_id, comment_id) = {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        let idea = service
            .create_idea(sarah, "Recipe AI", "Generates recipes.", vec![], false)
            .unwrap();
        let comment = service.post_comment(idea.uuid, alex, "Nice!").unwrap();
        (idea.uuid, comment.uuid)
    };
    {
        let mut social = SocialService::new(SqliteSocialRepository::try_new(&mut conn).unwrap());
        social
            .toggle_like(sarah, comment_id, LikeSubjectKind::Comment)
            .unwrap();
    }

    let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
    let foreign = service.delete_comment(comment_id, sarah).unwrap_err();
    assert!(matches!(foreign, IdeaServiceError::NotOwner { .. }));

    service.delete_comment(comment_id, alex).unwrap();
    let refreshed = service.get_idea(idea_id).unwrap().unwrap();
    assert_eq!(refreshed.comment_count, 0);
    drop(service);

    let comment_likes: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM likes WHERE subject_kind = 'comment';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(comment_likes, 0);
}

#[test]
fn idea_deletion_cascades_to_comments_updates_and_edges() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let alex = seed_user(&conn, "alexrivera", "Alex Rivera");

    let (idea_id, comment_id) = {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        let idea = service
            .create_idea(sarah, "Code Review AI", "Better reviews.", vec!["AI".to_string()], true)
            .unwrap();
        service
            .post_roadmap_update(idea.uuid, sarah, "Prototype", "Works.")
            .unwrap();
        let comment = service.post_comment(idea.uuid, alex, "Great idea.").unwrap();
        (idea.uuid, comment.uuid)
    };
    {
        let mut social = SocialService::new(SqliteSocialRepository::try_new(&mut conn).unwrap());
        social
            .follow(alex, idea_id, FollowTargetKind::Project)
            .unwrap();
        social
            .toggle_like(alex, idea_id, LikeSubjectKind::Idea)
            .unwrap();
        social
            .toggle_like(sarah, comment_id, LikeSubjectKind::Comment)
            .unwrap();
        social
            .toggle_bookmark(alex, idea_id, LikeSubjectKind::Idea)
            .unwrap();
    }

    {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        let foreign = service.delete_idea(idea_id, alex).unwrap_err();
        assert!(matches!(foreign, IdeaServiceError::NotOwner { .. }));

        service.delete_idea(idea_id, sarah).unwrap();
        assert!(service.get_idea(idea_id).unwrap().is_none());
    }

    for table in [
        "ideas",
        "idea_tags",
        "roadmap_updates",
        "comments",
        "likes",
        "bookmarks",
    ] {
        assert_eq!(count_rows(&conn, table), 0, "table {table} should be empty");
    }
    let project_follows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM follows WHERE target_kind = 'project';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(project_follows, 0);
}

fn seed_user(conn: &Connection, username: &str, name: &str) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    repo.create_user(&User::new(username, name)).unwrap()
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
