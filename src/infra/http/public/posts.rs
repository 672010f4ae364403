use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::{
    application::{
        access::{Access, author_access, check_author_username},
        error::HttpError,
        forms::{CommentForm, FormErrors, PostForm},
        posts::PostError,
        routes::{self, PostRoute},
    },
    domain::entities::PostRecord,
    infra::http::{Viewer, forms::PostFormInput, found},
    presentation::views::{
        CommentFormView, CommentView, LayoutContext, PostCardView, PostDetailView,
        PostFormTemplate, PostFormView, PostTemplate, render_template_response,
    },
};

use super::{HttpState, login_redirect};

const SOURCE: &str = "infra::http::public::posts";

pub(super) async fn new_post_form(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
) -> Response {
    if viewer.user().is_none() {
        return login_redirect(&uri);
    }

    match state.posts.group_choices().await {
        Ok(groups) => render_post_form(
            &viewer,
            PostFormView::initial(routes::NEW_POST.to_string(), None, &groups),
        ),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn create_post(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
    PostFormInput(form): PostFormInput,
) -> Response {
    let Some(user) = viewer.user() else {
        return login_redirect(&uri);
    };

    match state.posts.create_post(user, &form).await {
        Ok(_) => found(routes::INDEX),
        Err(PostError::Invalid(errors)) => {
            rerender_post_form(&state, &viewer, routes::NEW_POST.to_string(), None, &form, &errors)
                .await
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn post_view(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path((username, post_id)): Path<(String, String)>,
) -> Response {
    let post = match locate_post(&state, &username, &post_id, PostRoute::View).await {
        Ok(post) => post,
        Err(response) => return response,
    };

    let detail = match state.posts.detail(post).await {
        Ok(detail) => detail,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let post = &detail.post;
    let edit_href = viewer
        .user()
        .filter(|user| post.is_authored_by(user.id))
        .map(|_| PostRoute::Edit.path(&post.author.username, post.id));
    let comment_form = viewer
        .user()
        .map(|_| CommentFormView::new(post, "", &FormErrors::default()));

    let content = PostDetailView {
        card: PostCardView::from_record(post),
        author_post_count: detail.author_post_count,
        edit_href,
        comments: detail.comments.iter().map(CommentView::from_record).collect(),
        comment_form,
    };
    let title = post_title(post);
    let view = LayoutContext::new(viewer.chrome().with_title(title), content);
    render_template_response(PostTemplate { view }, StatusCode::OK)
}

pub(super) async fn post_edit_form(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
    Path((username, post_id)): Path<(String, String)>,
) -> Response {
    let post = match guard_edit(&state, &viewer, &uri, &username, &post_id).await {
        Ok(post) => post,
        Err(response) => return response,
    };

    match state.posts.group_choices().await {
        Ok(groups) => render_post_form(
            &viewer,
            PostFormView::initial(
                PostRoute::Edit.path(&post.author.username, post.id),
                Some(&post),
                &groups,
            ),
        ),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn post_edit(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
    Path((username, post_id)): Path<(String, String)>,
    PostFormInput(form): PostFormInput,
) -> Response {
    let post = match guard_edit(&state, &viewer, &uri, &username, &post_id).await {
        Ok(post) => post,
        Err(response) => return response,
    };

    match state.posts.update_post(&post, &form).await {
        Ok(updated) => found(&PostRoute::View.path(&updated.author.username, updated.id)),
        Err(PostError::Invalid(errors)) => {
            let action = PostRoute::Edit.path(&post.author.username, post.id);
            rerender_post_form(&state, &viewer, action, Some(&post), &form, &errors).await
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

/// The comment form lives on the post page; a plain visit goes back there.
pub(super) async fn comment_redirect(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
    Path((username, post_id)): Path<(String, String)>,
) -> Response {
    let post = match locate_post(&state, &username, &post_id, PostRoute::Comment).await {
        Ok(post) => post,
        Err(response) => return response,
    };
    if viewer.user().is_none() {
        return login_redirect(&uri);
    }
    found(&PostRoute::View.path(&post.author.username, post.id))
}

/// Add a comment. Every outcome except a server fault lands back on the
/// post page; an invalid comment is simply dropped.
pub(super) async fn add_comment(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
    Path((username, post_id)): Path<(String, String)>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Response {
    let post = match locate_post(&state, &username, &post_id, PostRoute::Comment).await {
        Ok(post) => post,
        Err(response) => return response,
    };
    let Some(user) = viewer.user() else {
        return login_redirect(&uri);
    };

    let form = form.map(|Form(form)| form).unwrap_or_default();
    match state.posts.add_comment(user, &post, &form).await {
        Ok(_) | Err(PostError::Invalid(_)) => {
            found(&PostRoute::View.path(&post.author.username, post.id))
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

/// Resolve `/{username}/{post_id}/` and check that the post belongs to
/// `username`, redirecting to the author's own URL for `route` otherwise.
async fn locate_post(
    state: &HttpState,
    username: &str,
    raw_post_id: &str,
    route: PostRoute,
) -> Result<PostRecord, Response> {
    let Ok(post_id) = raw_post_id.parse::<i64>() else {
        return Err(
            HttpError::not_found(SOURCE, format!("`{raw_post_id}` is not a post id"))
                .into_response(),
        );
    };

    let post = match state.posts.locate(username, post_id).await {
        Ok(Some(post)) => post,
        Ok(None) => {
            return Err(HttpError::not_found(
                SOURCE,
                format!("post {post_id} by `{username}` does not exist"),
            )
            .into_response());
        }
        Err(err) => return Err(HttpError::from(err).into_response()),
    };

    match check_author_username(username, &post, route) {
        Access::Granted => Ok(post),
        Access::Redirect(location) => Err(found(&location)),
    }
}

async fn guard_edit(
    state: &HttpState,
    viewer: &Viewer,
    uri: &Uri,
    username: &str,
    raw_post_id: &str,
) -> Result<PostRecord, Response> {
    let post = locate_post(state, username, raw_post_id, PostRoute::Edit).await?;
    let Some(user) = viewer.user() else {
        return Err(login_redirect(uri));
    };
    match author_access(user, &post) {
        Access::Granted => Ok(post),
        Access::Redirect(location) => Err(found(&location)),
    }
}

fn render_post_form(viewer: &Viewer, form: PostFormView) -> Response {
    let title = if form.is_edit { "Edit post" } else { "New post" };
    let view = LayoutContext::new(viewer.chrome().with_title(title), form);
    render_template_response(PostFormTemplate { view }, StatusCode::OK)
}

async fn rerender_post_form(
    state: &HttpState,
    viewer: &Viewer,
    action: String,
    existing: Option<&PostRecord>,
    form: &PostForm,
    errors: &FormErrors,
) -> Response {
    match state.posts.group_choices().await {
        Ok(groups) => render_post_form(
            viewer,
            PostFormView::new(
                action,
                existing,
                &form.text,
                form.group.as_deref(),
                &groups,
                errors,
            ),
        ),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn post_title(post: &PostRecord) -> String {
    let first_line = post.text.lines().next().unwrap_or_default();
    let mut title: String = first_line.chars().take(30).collect();
    if first_line.chars().count() > 30 {
        title.push('…');
    }
    title
}
