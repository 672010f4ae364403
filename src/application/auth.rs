//! Accounts and cookie sessions.
//!
//! Session tokens are random hex strings handed to the browser; only their
//! SHA-256 digest is persisted.

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString},
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    application::{
        forms::{FormErrors, LoginForm, SignupForm},
        repos::{CreateSessionParams, CreateUserParams, RepoError, SessionsRepo, UsersRepo},
    },
    domain::entities::UserRecord,
};

pub const INVALID_CREDENTIALS: &str =
    "Please enter a correct username and password. Both fields may be case-sensitive.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("submitted form is invalid")]
    Invalid(FormErrors),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A freshly issued session; `token` goes into the cookie.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        sessions: Arc<dyn SessionsRepo>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Register a new account; the caller is expected to sign it in afterwards.
    pub async fn signup(&self, form: &SignupForm) -> Result<UserRecord, AuthError> {
        let valid = form.validate().map_err(AuthError::Invalid)?;

        if self
            .users
            .find_user_by_username(&valid.username)
            .await?
            .is_some()
        {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            return Err(AuthError::Invalid(errors));
        }

        let password_hash = hash_password(valid.password).await?;
        let user = self
            .users
            .create_user(CreateUserParams {
                username: valid.username,
                first_name: valid.first_name,
                last_name: valid.last_name,
                email: valid.email,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => {
                    let mut errors = FormErrors::default();
                    errors.add("username", USERNAME_TAKEN);
                    AuthError::Invalid(errors)
                }
                other => AuthError::Repo(other),
            })?;

        info!(
            target = "yatube::auth",
            user_id = user.id,
            username = %user.username,
            "account created"
        );
        Ok(user)
    }

    /// Check credentials and return the matching user.
    pub async fn authenticate(&self, form: &LoginForm) -> Result<UserRecord, AuthError> {
        let username = form.username.trim();
        if username.is_empty() || form.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some((user, stored_hash)) = self.users.find_credentials(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if verify_password(form.password.clone(), stored_hash).await? {
            Ok(user)
        } else {
            warn!(
                target = "yatube::auth",
                username = %user.username,
                "rejected login with wrong password"
            );
            Err(AuthError::InvalidCredentials)
        }
    }

    pub async fn start_session(&self, user: &UserRecord) -> Result<IssuedSession, AuthError> {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + self.session_ttl;
        self.sessions
            .create_session(CreateSessionParams {
                token_hash: hash_token(&token),
                user_id: user.id,
                expires_at,
            })
            .await?;
        Ok(IssuedSession { token, expires_at })
    }

    /// Resolve a cookie token to its user; unknown or expired tokens yield `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<UserRecord>, RepoError> {
        if token.is_empty() {
            return Ok(None);
        }
        self.sessions
            .find_session_user(&hash_token(token), OffsetDateTime::now_utc())
            .await
    }

    pub async fn logout(&self, token: &str) -> Result<(), RepoError> {
        self.sessions.delete_session(&hash_token(token)).await
    }
}

fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
            .map_err(|err| AuthError::Hashing(err.to_string()))?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Hashing(err.to_string()))
    })
    .await
    .map_err(|err| AuthError::Hashing(err.to_string()))?
}

async fn verify_password(password: String, stored_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored_hash).map_err(|err| AuthError::Hashing(err.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|err| AuthError::Hashing(err.to_string()))?
}
