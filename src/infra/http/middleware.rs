use std::{convert::Infallible, time::Instant};

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode, header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    application::error::ErrorReport,
    domain::entities::UserRecord,
    presentation::views::{LayoutChrome, render_error_page},
};

use super::public::HttpState;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let username = response
            .extensions()
            .get::<Viewer>()
            .and_then(|viewer| viewer.user.as_ref())
            .map(|user| user.username.clone())
            .unwrap_or_default();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "yatube::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                username = username,
                "request failed",
            );
        } else {
            warn!(
                target = "yatube::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                username = username,
                "client request error",
            );
        }
    }

    response
}

/// The signed-in user for the current request, if any.
#[derive(Clone, Debug, Default)]
pub struct Viewer {
    pub user: Option<UserRecord>,
}

impl Viewer {
    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub fn chrome(&self) -> LayoutChrome {
        LayoutChrome::new(self.user())
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Viewer>().cloned().unwrap_or_default())
    }
}

/// Resolve the session cookie into a [`Viewer`] request extension.
///
/// A failed lookup degrades to an anonymous viewer so that public pages stay
/// reachable while the session store is unhealthy.
pub async fn load_viewer(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let user = match jar.get(&state.session_cookie.name) {
        Some(cookie) => match state.auth.resolve(cookie.value()).await {
            Ok(user) => user,
            Err(err) => {
                warn!(
                    target = "yatube::http::session",
                    error = %err,
                    "failed to resolve session cookie"
                );
                None
            }
        },
        None => None,
    };

    let viewer = Viewer { user };
    request.extensions_mut().insert(viewer.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(viewer);
    response
}

/// Replace bare `404` and `500` bodies with the HTML error page, keeping the
/// diagnostic report for the response logger.
pub async fn render_error_pages(request: Request<Body>, next: Next) -> Response {
    let viewer = request
        .extensions()
        .get::<Viewer>()
        .cloned()
        .unwrap_or_default();

    let response = next.run(request).await;
    let status = response.status();
    if !matches!(
        status,
        StatusCode::NOT_FOUND | StatusCode::INTERNAL_SERVER_ERROR
    ) || is_html(&response)
    {
        return response;
    }

    let report = response.extensions().get::<ErrorReport>().cloned();
    let mut page = render_error_page(viewer.chrome(), status);
    if let Some(report) = report {
        report.attach(&mut page);
    }
    page
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"))
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware, response::IntoResponse, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::application::error::HttpError;

    async fn body_text(response: Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    fn router() -> Router {
        Router::new()
            .route(
                "/missing",
                get(|| async {
                    HttpError::not_found("tests::missing", "nothing here").into_response()
                }),
            )
            .route(
                "/teapot",
                get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout").into_response() }),
            )
            .layer(middleware::from_fn(render_error_pages))
    }

    #[tokio::test]
    async fn bare_not_found_becomes_html_page() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/missing")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(is_html(&response));
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .cloned()
            .expect("report kept");
        assert_eq!(report.source, "tests::missing");
        assert!(body_text(response).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn other_statuses_pass_through() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/teapot")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_text(response).await, "short and stout");
    }
}
