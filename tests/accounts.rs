//! Signup, login and logout through the HTML forms.

mod support;

use axum::http::{StatusCode, header};

use support::{SESSION_COOKIE, TestApp, body_text, location};
use yatube::application::auth::{INVALID_CREDENTIALS, USERNAME_TAKEN};

const SIGNUP_BODY: &str = "first_name=Leo&last_name=Tolstoy&username=leo&email=leo%40example.com\
                           &password1=war-and-peace&password2=war-and-peace";

fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{SESSION_COOKIE}=")))
        .map(str::to_string)
}

/// `name=value` part of a `Set-Cookie` header, usable as a `Cookie` header.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn signup_creates_an_account_and_signs_it_in() {
    let app = TestApp::without_cache();

    let response = app.post_form("/auth/signup/", SIGNUP_BODY, None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/"));

    let set_cookie = session_cookie(&response).expect("session cookie issued");
    assert!(set_cookie.contains("HttpOnly"));

    let html = body_text(app.get("/new/", Some(&cookie_pair(&set_cookie))).await).await;
    assert!(html.contains("/auth/logout/"));
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = TestApp::without_cache();
    app.repos.insert_user("leo");

    let response = app.post_form("/auth/signup/", SIGNUP_BODY, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response).await.contains(USERNAME_TAKEN));
}

#[tokio::test]
async fn mismatched_passwords_are_rejected() {
    let app = TestApp::without_cache();

    let response = app
        .post_form(
            "/auth/signup/",
            "username=leo&password1=war-and-peace&password2=anna-karenina",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("The two password fields didn"));
    assert!(html.contains("value=\"leo\""), "username is preserved");
}

#[tokio::test]
async fn login_honours_next_and_rejects_bad_passwords() {
    let app = TestApp::without_cache();
    app.post_form("/auth/signup/", SIGNUP_BODY, None).await;

    let response = app
        .post_form("/auth/login/", "username=leo&password=wrong-password", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response).await.contains(INVALID_CREDENTIALS));

    let response = app
        .post_form(
            "/auth/login/?next=/new/",
            "username=leo&password=war-and-peace",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/new/"));
    assert!(session_cookie(&response).is_some());
}

#[tokio::test]
async fn offsite_next_falls_back_to_the_index() {
    let app = TestApp::without_cache();
    app.post_form("/auth/signup/", SIGNUP_BODY, None).await;

    let response = app
        .post_form(
            "/auth/login/",
            "username=leo&password=war-and-peace&next=https%3A%2F%2Fevil.example%2F",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::without_cache();
    let user = app.repos.insert_user("leo");
    let cookie = app.login(&user).await;

    let response = app.get("/auth/logout/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let removal = session_cookie(&response).expect("cookie removal");
    assert!(removal.contains("Max-Age=0"), "{removal}");

    let response = app.get("/new/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND, "old token no longer works");
}
