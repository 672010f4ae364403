use axum::{
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::{
    application::error::{ErrorReport, HttpError},
    infra::{http::Viewer, uploads::UploadStorageError},
    presentation::views::{
        AboutTemplate, AboutView, LayoutContext, render_error_page, render_not_found_response,
        render_template_response,
    },
};

use super::HttpState;

const ABOUT_AUTHOR: AboutView = AboutView {
    heading: "About the author",
    paragraphs: &[
        "Yatube is written and maintained by a small team of people who like reading and \
         writing short posts.",
        "Every post belongs to its author; groups gather posts on a shared topic, and \
         subscriptions collect the authors you care about on a single page.",
    ],
};

const ABOUT_TECH: AboutView = AboutView {
    heading: "Technology",
    paragraphs: &[
        "The site is an axum application backed by PostgreSQL, with pages rendered from \
         askama templates.",
        "Feed pages are kept in a short-lived in-memory cache, so a new post may take a few \
         seconds to show up on the front page.",
    ],
};

pub(super) async fn about_author(viewer: Viewer) -> Response {
    let view = LayoutContext::new(viewer.chrome().with_title(ABOUT_AUTHOR.heading), ABOUT_AUTHOR);
    render_template_response(AboutTemplate { view }, StatusCode::OK)
}

pub(super) async fn about_tech(viewer: Viewer) -> Response {
    let view = LayoutContext::new(viewer.chrome().with_title(ABOUT_TECH.heading), ABOUT_TECH);
    render_template_response(AboutTemplate { view }, StatusCode::OK)
}

pub(super) async fn not_found_page(viewer: Viewer) -> Response {
    render_not_found_response(viewer.chrome())
}

pub(super) async fn server_error_page(viewer: Viewer) -> Response {
    let mut response = render_error_page(viewer.chrome(), StatusCode::INTERNAL_SERVER_ERROR);
    ErrorReport::from_message(
        "infra::http::public::server_error_page",
        StatusCode::INTERNAL_SERVER_ERROR,
        "server error page requested",
    )
    .attach(&mut response);
    response
}

pub(super) async fn fallback(viewer: Viewer) -> Response {
    render_not_found_response(viewer.chrome())
}

pub(super) async fn serve_media(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_media";

    match state.uploads.read(&path).await {
        Ok(bytes) => build_media_response(&path, bytes),
        Err(UploadStorageError::InvalidPath) => {
            HttpError::not_found(SOURCE, format!("invalid media path `{path}`")).into_response()
        }
        Err(UploadStorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            HttpError::not_found(SOURCE, format!("media `{path}` does not exist")).into_response()
        }
        Err(err) => HttpError::internal(SOURCE, &err).into_response(),
    }
}

fn build_media_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}
