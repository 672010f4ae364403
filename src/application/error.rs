use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        auth::AuthError, feed::FeedError, follows::FollowError, groups::GroupError,
        posts::PostError, repos::RepoError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// An error response with a short public message and a diagnostic report.
///
/// The body is plain text; the error-page middleware swaps it for the HTML
/// error template on 404 and 500.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, "Page not found", detail)
    }

    pub fn internal(source: &'static str, error: &dyn StdError) -> Self {
        Self::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            error,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<RepoError> for HttpError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound => HttpError::not_found(
                "infra::http::repo_error_to_http",
                "Requested record does not exist",
            ),
            other => HttpError::internal("infra::http::repo_error_to_http", &other),
        }
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::UnknownGroup(slug) => HttpError::not_found(
                "infra::http::feed_error_to_http",
                format!("Group `{slug}` does not exist"),
            ),
            FeedError::UnknownAuthor(username) => HttpError::not_found(
                "infra::http::feed_error_to_http",
                format!("User `{username}` does not exist"),
            ),
            FeedError::Repo(err) => HttpError::internal("infra::http::feed_error_to_http", &err),
        }
    }
}

impl From<FollowError> for HttpError {
    fn from(error: FollowError) -> Self {
        match error {
            FollowError::UnknownAuthor(username) => HttpError::not_found(
                "infra::http::follow_error_to_http",
                format!("User `{username}` does not exist"),
            ),
            FollowError::Repo(err) => {
                HttpError::internal("infra::http::follow_error_to_http", &err)
            }
        }
    }
}

/// Form errors are rendered inline by the handlers; anything reaching this
/// conversion is a server fault.
impl From<PostError> for HttpError {
    fn from(error: PostError) -> Self {
        HttpError::internal("infra::http::post_error_to_http", &error)
    }
}

impl From<AuthError> for HttpError {
    fn from(error: AuthError) -> Self {
        HttpError::internal("infra::http::auth_error_to_http", &error)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code used when the CLI terminates with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Domain(_) | AppError::Validation(_) => 2,
            AppError::Infra(InfraError::Configuration { .. }) => 78,
            AppError::Infra(InfraError::Database { .. }) | AppError::Repo(_) => 69,
            AppError::Infra(_) | AppError::Unexpected(_) => 1,
        }
    }
}

impl From<GroupError> for AppError {
    fn from(error: GroupError) -> Self {
        match error {
            GroupError::Domain(err) => AppError::Domain(err),
            GroupError::Repo(err) => AppError::Repo(err),
        }
    }
}
