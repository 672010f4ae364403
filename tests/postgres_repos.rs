//! Repository behaviour against a real Postgres database.

use sqlx::PgPool;
use yatube::{
    application::repos::{
        CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, CreateUserParams,
        FollowsRepo, GroupsRepo, PostFilter, PostsRepo, RepoError, UsersRepo,
    },
    domain::{entities::UserRecord, follows::FollowEdge},
    infra::db::PostgresRepositories,
};

async fn user(repos: &PostgresRepositories, username: &str) -> UserRecord {
    repos
        .create_user(CreateUserParams {
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: "!".to_string(),
        })
        .await
        .expect("create user")
}

async fn post(
    repos: &PostgresRepositories,
    author: &UserRecord,
    text: &str,
    group_id: Option<i64>,
) -> i64 {
    repos
        .create_post(CreatePostParams {
            author_id: author.id,
            text: text.to_string(),
            group_id,
            image: None,
        })
        .await
        .expect("create post")
        .id
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn feeds_filter_and_order_posts(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = user(&repos, "leo").await;
    let anna = user(&repos, "anna").await;
    let group = repos
        .create_group(CreateGroupParams {
            title: "Classics".to_string(),
            slug: "classics".to_string(),
            description: String::new(),
        })
        .await
        .expect("create group");

    let first = post(&repos, &leo, "first", Some(group.id)).await;
    let second = post(&repos, &anna, "second", None).await;

    assert_eq!(repos.count_posts(&PostFilter::All).await.expect("count"), 2);
    assert_eq!(
        repos
            .count_posts(&PostFilter::Group(group.id))
            .await
            .expect("count"),
        1
    );
    assert_eq!(
        repos
            .count_posts(&PostFilter::Authors(Vec::new()))
            .await
            .expect("count"),
        0
    );

    let ids: Vec<i64> = repos
        .list_posts(&PostFilter::All, 0, 10)
        .await
        .expect("list")
        .into_iter()
        .map(|post| post.id)
        .collect();
    assert_eq!(ids, vec![second, first]);

    let by_leo = repos
        .list_posts(&PostFilter::Author(leo.id), 0, 10)
        .await
        .expect("list");
    assert_eq!(by_leo.len(), 1);
    assert_eq!(by_leo[0].group.as_ref().map(|g| g.slug.as_str()), Some("classics"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn follow_edges_are_unique(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = user(&repos, "leo").await;
    let anna = user(&repos, "anna").await;
    let edge = FollowEdge::new(anna.id, leo.id).expect("distinct users");

    assert!(repos.create_follow(edge).await.expect("follow"));
    assert!(!repos.create_follow(edge).await.expect("repeat follow"));
    assert!(repos.is_following(edge).await.expect("lookup"));
    assert_eq!(repos.count_followers(leo.id).await.expect("count"), 1);
    assert_eq!(repos.followed_author_ids(anna.id).await.expect("ids"), vec![leo.id]);

    assert!(repos.delete_follow(edge).await.expect("unfollow"));
    assert!(!repos.delete_follow(edge).await.expect("repeat unfollow"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_username_maps_to_duplicate_error(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    user(&repos, "leo").await;

    let err = repos
        .create_user(CreateUserParams {
            username: "leo".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: "!".to_string(),
        })
        .await
        .expect_err("duplicate username");
    assert!(matches!(err, RepoError::Duplicate { .. }), "{err:?}");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn comments_belong_to_their_post(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = user(&repos, "leo").await;
    let post_id = post(&repos, &leo, "discuss", None).await;
    let other_id = post(&repos, &leo, "quiet", None).await;

    repos
        .create_comment(CreateCommentParams {
            post_id,
            author_id: leo.id,
            text: "nice".to_string(),
        })
        .await
        .expect("comment");

    let comments = repos.list_comments(post_id).await.expect("list");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author.username, "leo");
    assert!(repos.list_comments(other_id).await.expect("list").is_empty());
}
