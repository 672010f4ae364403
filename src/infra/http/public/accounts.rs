use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::warn;

use crate::{
    application::{
        auth::{AuthError, INVALID_CREDENTIALS},
        error::HttpError,
        forms::{FormErrors, LoginForm, SignupForm},
        routes,
    },
    domain::entities::UserRecord,
    infra::http::{Viewer, found},
    presentation::views::{
        LayoutChrome, LayoutContext, LoggedOutTemplate, LoginTemplate, LoginView, SignupTemplate,
        SignupView, render_template_response,
    },
};

use super::HttpState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct NextQuery {
    next: Option<String>,
}

pub(super) async fn signup_form(viewer: Viewer) -> Response {
    render_signup(&viewer, &SignupForm::default(), FormErrors::default())
}

pub(super) async fn signup(
    State(state): State<HttpState>,
    viewer: Viewer,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Response {
    match state.auth.signup(&form).await {
        Ok(user) => sign_in(&state, jar, &user, routes::INDEX).await,
        Err(AuthError::Invalid(errors)) => render_signup(&viewer, &form, errors),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn login_form(viewer: Viewer, Query(query): Query<NextQuery>) -> Response {
    render_login(&viewer, String::new(), query.next, None)
}

pub(super) async fn login(
    State(state): State<HttpState>,
    viewer: Viewer,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = form.next.clone().or(query.next);

    match state.auth.authenticate(&form).await {
        Ok(user) => {
            let target = routes::safe_next(next.as_deref()).unwrap_or(routes::INDEX);
            sign_in(&state, jar, &user, target).await
        }
        Err(AuthError::InvalidCredentials) => render_login(
            &viewer,
            form.username.trim().to_string(),
            next,
            Some(INVALID_CREDENTIALS),
        ),
        Err(err) => HttpError::from(err).into_response(),
    }
}

/// End the session (if any) and show the logged-out page.
pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(&state.session_cookie.name)
        && let Err(err) = state.auth.logout(cookie.value()).await
    {
        warn!(
            target = "yatube::http::session",
            error = %err,
            "failed to delete session on logout"
        );
    }

    let jar = jar.remove(state.session_cookie.removal());
    let view = LayoutContext::new(LayoutChrome::new(None).with_title("Signed out"), ());
    (
        jar,
        render_template_response(LoggedOutTemplate { view }, StatusCode::OK),
    )
        .into_response()
}

async fn sign_in(state: &HttpState, jar: CookieJar, user: &UserRecord, target: &str) -> Response {
    match state.auth.start_session(user).await {
        Ok(session) => {
            let jar = jar.add(state.session_cookie.issue(session.token));
            (jar, found(target)).into_response()
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn render_signup(viewer: &Viewer, form: &SignupForm, errors: FormErrors) -> Response {
    let content = SignupView {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        username: form.username.clone(),
        email: form.email.clone(),
        errors,
    };
    let view = LayoutContext::new(viewer.chrome().with_title("Sign up"), content);
    render_template_response(SignupTemplate { view }, StatusCode::OK)
}

fn render_login(
    viewer: &Viewer,
    username: String,
    next: Option<String>,
    error: Option<&'static str>,
) -> Response {
    let content = LoginView {
        username,
        next: routes::safe_next(next.as_deref()).map(str::to_string),
        error,
    };
    let view = LayoutContext::new(viewer.chrome().with_title("Log in"), content);
    render_template_response(LoginTemplate { view }, StatusCode::OK)
}
