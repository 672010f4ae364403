use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    application::{error::HttpError, pagination::PageRequest},
    presentation::views::{
        FeedView, FollowTemplate, GroupTemplate, GroupView, IndexTemplate, LayoutContext,
        render_template_response,
    },
};

use super::{HttpState, login_redirect};
use crate::infra::http::Viewer;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub(super) fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

pub(super) async fn index(
    State(state): State<HttpState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.index(query.request()).await {
        Ok(page) => {
            let view = LayoutContext::new(
                viewer.chrome().with_title("Latest posts"),
                FeedView::from_page(&page),
            );
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn group_posts(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.group(&slug, query.request()).await {
        Ok(feed) => {
            let title = feed.group.title.clone();
            let view = LayoutContext::new(
                viewer.chrome().with_title(title),
                GroupView::new(&feed.group, &feed.page),
            );
            render_template_response(GroupTemplate { view }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn follow_index(
    State(state): State<HttpState>,
    viewer: Viewer,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(user) = viewer.user() else {
        return login_redirect(&uri);
    };

    match state.feed.followed(user, query.request()).await {
        Ok(page) => {
            let view = LayoutContext::new(
                viewer.chrome().with_title("Your subscriptions"),
                FeedView::from_page(&page),
            );
            render_template_response(FollowTemplate { view }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}
