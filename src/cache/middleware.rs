//! Response cache middleware for the feed routes.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, instrument};

use super::{
    CacheConfig,
    keys::ResponseKey,
    store::{CachedResponse, ResponseStore},
};

/// Shared cache state for middleware and the admin clear endpoint.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub store: Arc<ResponseStore>,
    /// Name of the session cookie that partitions entries.
    pub session_cookie: String,
}

impl CacheState {
    pub fn new(config: CacheConfig, session_cookie: impl Into<String>) -> Self {
        let store = Arc::new(ResponseStore::new(&config));
        Self {
            config,
            store,
            session_cookie: session_cookie.into(),
        }
    }
}

/// Serve GET requests from the cache and store fresh `200 OK` pages.
///
/// Entries live until the TTL runs out or the cache is cleared explicitly;
/// writes to posts do not evict anything.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let jar = CookieJar::from_headers(request.headers());
    let key = ResponseKey::new(
        jar.get(&cache.session_cookie).map(|cookie| cookie.value()),
        request.uri().path(),
        request.uri().query().unwrap_or(""),
    );

    if let Some(cached) = cache.store.get(&key) {
        debug!(cache = "response", outcome = "hit", "serving cached response");
        return build_response(cached);
    }

    debug!(
        cache = "response",
        outcome = "miss",
        "cache miss, executing handler"
    );

    let response = next.run(request).await;
    if response.status() != StatusCode::OK || response.headers().contains_key(header::SET_COOKIE)
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let limit = cache.config.body_limit_bytes;
    if body
        .size_hint()
        .upper()
        .is_none_or(|size| size > limit as u64)
    {
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect(),
        body: bytes.clone(),
    };
    cache.store.set(key, cached);

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
