use ideahub_core::db::open_db_in_memory;
use ideahub_core::{
    compose_feed, compose_roadmap, list_followed_projects, FeedError, FeedScope, FollowTargetKind,
    IdeaId, IdeaService, SocialService, SqliteIdeaRepository, SqliteSocialRepository,
    SqliteUserRepository, User, UserId, UserRepository,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

#[test]
fn all_feed_is_newest_first_with_id_tiebreak() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");

    let idea_a = seed_idea(&mut conn, sarah, "Idea A", false);
    let idea_b = seed_idea(&mut conn, sarah, "Idea B", false);
    let idea_c = seed_idea(&mut conn, sarah, "Idea C", false);

    set_idea_created_at(&conn, idea_a, 3_000);
    set_idea_created_at(&conn, idea_b, 1_000);
    set_idea_created_at(&conn, idea_c, 1_000);

    let feed = compose_feed(&conn, sarah, FeedScope::All).unwrap();
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[0].uuid, idea_a);

    // Equal timestamps fall back to ascending id order.
    let (tie_first, tie_second) = if idea_b.to_string() < idea_c.to_string() {
        (idea_b, idea_c)
    } else {
        (idea_c, idea_b)
    };
    assert_eq!(feed[1].uuid, tie_first);
    assert_eq!(feed[2].uuid, tie_second);
}

#[test]
fn following_feed_is_an_order_preserving_subset() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let marcus = seed_user(&conn, "marcusj", "Marcus Johnson");
    let jordan = seed_user(&conn, "jordankim", "Jordan Kim");
    let viewer = seed_user(&conn, "alexrivera", "Alex Rivera");

    let by_sarah = seed_idea(&mut conn, sarah, "Recipe AI", false);
    let marcus_project = seed_idea(&mut conn, marcus, "Fashion Marketplace", true);
    let by_jordan = seed_idea(&mut conn, jordan, "Quiet Idea", false);
    let second_by_sarah = seed_idea(&mut conn, sarah, "Skill Exchange", false);

    set_idea_created_at(&conn, by_sarah, 1_000);
    set_idea_created_at(&conn, marcus_project, 2_000);
    set_idea_created_at(&conn, by_jordan, 3_000);
    set_idea_created_at(&conn, second_by_sarah, 4_000);

    {
        let mut social = SocialService::new(SqliteSocialRepository::try_new(&mut conn).unwrap());
        social
            .follow(viewer, sarah, FollowTargetKind::User)
            .unwrap();
        social
            .follow(viewer, marcus_project, FollowTargetKind::Project)
            .unwrap();
    }

    let all = compose_feed(&conn, viewer, FeedScope::All).unwrap();
    let following = compose_feed(&conn, viewer, FeedScope::FollowingOnly).unwrap();

    assert_eq!(all.len(), 4);
    assert_eq!(
        following
            .iter()
            .map(|idea| idea.uuid)
            .collect::<Vec<_>>(),
        vec![second_by_sarah, marcus_project, by_sarah]
    );

    // The following feed is exactly the followed subset of the full feed,
    // order preserved.
    let filtered: Vec<IdeaId> = all
        .iter()
        .filter(|idea| idea.author_uuid == sarah || idea.uuid == marcus_project)
        .map(|idea| idea.uuid)
        .collect();
    assert_eq!(
        following.iter().map(|idea| idea.uuid).collect::<Vec<_>>(),
        filtered
    );
}

#[test]
fn roadmap_is_ascending_with_the_initial_update_first() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let project = seed_idea(&mut conn, sarah, "Code Review AI", true);

    let (first_update, second_update) = {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        let first = service
            .post_roadmap_update(project, sarah, "Prototype", "First cut.")
            .unwrap();
        let second = service
            .post_roadmap_update(project, sarah, "Beta", "Opened beta.")
            .unwrap();
        (first.uuid, second.uuid)
    };

    set_idea_created_at(&conn, project, 1_000);
    set_update_created_at(&conn, first_update, 2_000);
    set_update_created_at(&conn, second_update, 3_000);
    conn.execute(
        "UPDATE roadmap_updates SET created_at = 1000 WHERE is_initial = 1;",
        [],
    )
    .unwrap();

    let roadmap = compose_roadmap(&conn, project).unwrap();
    assert_eq!(roadmap.len(), 3);
    assert!(roadmap[0].is_initial);
    assert_eq!(roadmap[1].uuid, first_update);
    assert_eq!(roadmap[2].uuid, second_update);
    assert!(roadmap
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at));
}

#[test]
fn initial_update_wins_equal_timestamp_ties() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let project = seed_idea(&mut conn, sarah, "Code Review AI", true);

    let posted = {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        service
            .post_roadmap_update(project, sarah, "Same-millisecond", "Update.")
            .unwrap()
            .uuid
    };
    conn.execute("UPDATE roadmap_updates SET created_at = 5000;", [])
        .unwrap();

    let roadmap = compose_roadmap(&conn, project).unwrap();
    assert_eq!(roadmap.len(), 2);
    assert!(roadmap[0].is_initial);
    assert_eq!(roadmap[1].uuid, posted);
}

#[test]
fn roadmap_rejects_unknown_and_unpromoted_ideas() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let plain = seed_idea(&mut conn, sarah, "Plain Idea", false);

    let missing = compose_roadmap(&conn, Uuid::new_v4()).unwrap_err();
    assert!(matches!(missing, FeedError::IdeaNotFound(_)));

    let not_project = compose_roadmap(&conn, plain).unwrap_err();
    assert!(matches!(not_project, FeedError::NotAProject(id) if id == plain));
}

#[test]
fn followed_projects_summarize_counts_and_recency() {
    let mut conn = open_db_in_memory().unwrap();
    let sarah = seed_user(&conn, "sarahchen", "Sarah Chen");
    let marcus = seed_user(&conn, "marcusj", "Marcus Johnson");
    let viewer = seed_user(&conn, "alexrivera", "Alex Rivera");

    let code_review = seed_idea(&mut conn, sarah, "Code Review AI", true);
    let marketplace = seed_idea(&mut conn, marcus, "Fashion Marketplace", true);
    let _unfollowed = seed_idea(&mut conn, sarah, "Unfollowed Project", true);

    let posted = {
        let mut service = IdeaService::new(SqliteIdeaRepository::try_new(&mut conn).unwrap());
        service
            .post_roadmap_update(code_review, sarah, "Prototype", "Works.")
            .unwrap()
            .uuid
    };
    {
        let mut social = SocialService::new(SqliteSocialRepository::try_new(&mut conn).unwrap());
        social
            .follow(viewer, code_review, FollowTargetKind::Project)
            .unwrap();
        social
            .follow(viewer, marketplace, FollowTargetKind::Project)
            .unwrap();
        social
            .follow(sarah, marketplace, FollowTargetKind::Project)
            .unwrap();
    }

    conn.execute("UPDATE roadmap_updates SET created_at = 1000;", [])
        .unwrap();
    set_update_created_at(&conn, posted, 9_000);

    let projects = list_followed_projects(&conn, viewer).unwrap();
    assert_eq!(projects.len(), 2);

    assert_eq!(projects[0].idea_id, code_review);
    assert_eq!(projects[0].author_username, "sarahchen");
    assert_eq!(projects[0].update_count, 2);
    assert_eq!(projects[0].follower_count, 1);
    assert_eq!(projects[0].last_updated, 9_000);

    assert_eq!(projects[1].idea_id, marketplace);
    assert_eq!(projects[1].update_count, 1);
    assert_eq!(projects[1].follower_count, 2);
}

fn seed_user(conn: &Connection, username: &str, name: &str) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    repo.create_user(&User::new(username, name)).unwrap()
}

fn seed_idea(conn: &mut Connection, author: UserId, title: &str, as_project: bool) -> IdeaId {
    let mut service = IdeaService::new(SqliteIdeaRepository::try_new(conn).unwrap());
    service
        .create_idea(author, title, "A body.", vec![], as_project)
        .unwrap()
        .uuid
}

fn set_idea_created_at(conn: &Connection, idea: IdeaId, created_at: i64) {
    conn.execute(
        "UPDATE ideas SET created_at = ?1 WHERE uuid = ?2;",
        params![created_at, idea.to_string()],
    )
    .unwrap();
}

fn set_update_created_at(conn: &Connection, update: Uuid, created_at: i64) {
    conn.execute(
        "UPDATE roadmap_updates SET created_at = ?1 WHERE uuid = ?2;",
        params![created_at, update.to_string()],
    )
    .unwrap();
}
