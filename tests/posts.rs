//! Creating and editing posts, image uploads and comments.

mod support;

use axum::http::{StatusCode, header};

use support::{MultipartBody, SMALL_GIF, TestApp, body_text, location};
use yatube::application::forms::{
    COMMENT_TEXT_REQUIRED, INVALID_GROUP, INVALID_IMAGE, POST_TEXT_REQUIRED,
};

#[tokio::test]
async fn multipart_post_with_image_is_created() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let group = app.repos.insert_group("Classics", "classics");
    let cookie = app.login(&author).await;

    let form = MultipartBody::default()
        .text("text", "Picture day")
        .text("group", &group.id.to_string())
        .file("image", "small.gif", "image/gif", SMALL_GIF);
    let response = app.post_multipart("/new/", &form, Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/"));

    let post = app.repos.latest_post().expect("post created");
    assert_eq!(post.text, "Picture day");
    assert_eq!(post.author.username, "leo");
    assert_eq!(post.group.map(|g| g.slug).as_deref(), Some("classics"));
    let image = post.image.expect("image stored");
    assert!(image.starts_with("posts/small"), "{image}");
    assert!(image.ends_with(".gif"), "{image}");

    let response = app.get(&format!("/media/{image}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("image/gif")
    );
    assert_eq!(
        response
            .headers()
            .get(header::X_CONTENT_TYPE_OPTIONS)
            .and_then(|value| value.to_str().ok()),
        Some("nosniff")
    );
}

#[tokio::test]
async fn image_is_rendered_on_every_page_showing_the_post() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let group = app.repos.insert_group("Classics", "classics");
    let cookie = app.login(&author).await;

    let form = MultipartBody::default()
        .text("text", "With a picture")
        .text("group", &group.id.to_string())
        .file("image", "small.gif", "image/gif", SMALL_GIF);
    app.post_multipart("/new/", &form, Some(&cookie)).await;
    let post = app.repos.latest_post().expect("post");
    let image_url = format!("/media/{}", post.image.expect("image"));

    for path in [
        "/".to_string(),
        "/group/classics/".to_string(),
        "/leo/".to_string(),
        format!("/leo/{}/", post.id),
    ] {
        let html = body_text(app.get(&path, None).await).await;
        assert!(html.contains(&image_url), "GET {path}");
    }
}

#[tokio::test]
async fn blank_text_re_renders_the_form() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let cookie = app.login(&author).await;

    let response = app.post_form("/new/", "text=+++", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(POST_TEXT_REQUIRED));
    assert_eq!(app.repos.post_count(), 0);
}

#[tokio::test]
async fn unknown_group_is_rejected() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let cookie = app.login(&author).await;

    let response = app
        .post_form("/new/", "text=Hello&group=999", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(INVALID_GROUP));
    assert_eq!(app.repos.post_count(), 0);
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let cookie = app.login(&author).await;

    let form = MultipartBody::default()
        .text("text", "Not a picture")
        .file("image", "notes.txt", "text/plain", b"just some text");
    let response = app.post_multipart("/new/", &form, Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(INVALID_IMAGE));
    assert!(html.contains("Not a picture"), "text is preserved");
    assert_eq!(app.repos.post_count(), 0);
}

#[tokio::test]
async fn image_with_markup_extension_is_rejected() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let cookie = app.login(&author).await;

    let mut payload = SMALL_GIF.to_vec();
    payload.extend_from_slice(b"<script>alert(1)</script>");
    let form = MultipartBody::default()
        .text("text", "Sneaky picture")
        .file("image", "pic.html", "text/html", &payload);
    let response = app.post_multipart("/new/", &form, Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(INVALID_IMAGE));
    assert_eq!(app.repos.post_count(), 0);
}

#[tokio::test]
async fn overlong_image_extension_is_a_form_error() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let cookie = app.login(&author).await;

    let filename = format!("pic.{}", "g".repeat(300));
    let form = MultipartBody::default()
        .text("text", "Long name")
        .file("image", &filename, "image/gif", SMALL_GIF);
    let response = app.post_multipart("/new/", &form, Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(INVALID_IMAGE));
    assert_eq!(app.repos.post_count(), 0);
}

#[tokio::test]
async fn stored_image_takes_the_extension_of_its_content() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let cookie = app.login(&author).await;

    let form = MultipartBody::default()
        .text("text", "Mislabelled")
        .file("image", "photo.png", "image/png", SMALL_GIF);
    let response = app.post_multipart("/new/", &form, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let image = app
        .repos
        .latest_post()
        .and_then(|post| post.image)
        .expect("image stored");
    assert!(image.starts_with("posts/photo-"), "{image}");
    assert!(image.ends_with(".gif"), "{image}");
}

#[tokio::test]
async fn author_edit_updates_the_same_post() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let group = app.repos.insert_group("Classics", "classics");
    let post_id = app.repos.insert_post(&author, "First draft", None);
    let cookie = app.login(&author).await;

    let edit_url = format!("/leo/{post_id}/edit/");
    let html = body_text(app.get(&edit_url, Some(&cookie)).await).await;
    assert!(html.contains("First draft"));

    let body = format!("text=Final+version&group={}", group.id);
    let response = app.post_form(&edit_url, &body, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some(format!("/leo/{post_id}/")));

    assert_eq!(app.repos.post_count(), 1);
    let post = app.repos.post(post_id).expect("post");
    assert_eq!(post.text, "Final version");
    assert_eq!(post.group.map(|g| g.id), Some(group.id));
}

#[tokio::test]
async fn invalid_edit_keeps_the_original() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let post_id = app.repos.insert_post(&author, "Keep me", None);
    let cookie = app.login(&author).await;

    let response = app
        .post_form(&format!("/leo/{post_id}/edit/"), "text=", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(POST_TEXT_REQUIRED));
    assert_eq!(app.repos.post(post_id).expect("post").text, "Keep me");
}

#[tokio::test]
async fn comments_are_added_and_shown() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let reader = app.repos.insert_user("anna");
    let post_id = app.repos.insert_post(&author, "Discuss", None);
    let cookie = app.login(&reader).await;

    let response = app
        .post_form(
            &format!("/leo/{post_id}/comment/"),
            "text=Great+read",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some(format!("/leo/{post_id}/")));
    assert_eq!(app.repos.comment_texts(post_id), vec!["Great read"]);

    let html = body_text(app.get(&format!("/leo/{post_id}/"), None).await).await;
    assert!(html.contains("Great read"));
    assert!(html.contains("anna"));
}

#[tokio::test]
async fn blank_comment_is_dropped() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let post_id = app.repos.insert_post(&author, "Discuss", None);
    let cookie = app.login(&author).await;

    let response = app
        .post_form(&format!("/leo/{post_id}/comment/"), "text=+", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some(format!("/leo/{post_id}/")));
    assert!(app.repos.comment_texts(post_id).is_empty());

    let html = body_text(app.get(&format!("/leo/{post_id}/"), None).await).await;
    assert!(!html.contains(COMMENT_TEXT_REQUIRED));
}

#[tokio::test]
async fn guest_comment_is_not_saved() {
    let app = TestApp::without_cache();
    let author = app.repos.insert_user("leo");
    let post_id = app.repos.insert_post(&author, "Discuss", None);
    let comment_url = format!("/leo/{post_id}/comment/");

    let response = app.post_form(&comment_url, "text=Anonymous", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        Some(format!("/auth/login/?next={comment_url}"))
    );
    assert!(app.repos.comment_texts(post_id).is_empty());
}
