use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::{
    application::{error::HttpError, routes},
    infra::http::{Viewer, found},
    presentation::views::{
        FeedView, FollowButtonView, LayoutContext, ProfileTemplate, ProfileView,
        render_template_response,
    },
};

use super::{HttpState, feeds::PageQuery, login_redirect};

pub(super) async fn profile(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let feed = match state
        .feed
        .profile(&username, query.request(), viewer.user())
        .await
    {
        Ok(feed) => feed,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let follow_button = feed.can_follow.then(|| {
        if feed.viewer_follows {
            FollowButtonView {
                href: routes::unfollow(&feed.author.username),
                label: "Unfollow",
                following: true,
            }
        } else {
            FollowButtonView {
                href: routes::follow(&feed.author.username),
                label: "Follow",
                following: false,
            }
        }
    });

    let display_name = match feed.author.full_name() {
        name if name.trim().is_empty() => feed.author.username.clone(),
        name => name,
    };

    let content = ProfileView {
        username: feed.author.username.clone(),
        display_name: display_name.clone(),
        post_count: feed.page.total,
        followers: feed.followers,
        following: feed.following,
        follow_button,
        feed: FeedView::from_page(&feed.page),
    };
    let view = LayoutContext::new(viewer.chrome().with_title(display_name), content);
    render_template_response(ProfileTemplate { view }, StatusCode::OK)
}

pub(super) async fn profile_follow(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
    Path(username): Path<String>,
) -> Response {
    let Some(user) = viewer.user() else {
        return login_redirect(&uri);
    };

    match state.follows.follow(user, &username).await {
        Ok(_) => found(&routes::profile(&username)),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn profile_unfollow(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
    Path(username): Path<String>,
) -> Response {
    let Some(user) = viewer.user() else {
        return login_redirect(&uri);
    };

    match state.follows.unfollow(user, &username).await {
        Ok(_) => found(&routes::profile(&username)),
        Err(err) => HttpError::from(err).into_response(),
    }
}
