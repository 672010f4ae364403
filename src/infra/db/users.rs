use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateUserParams, RepoError, UsersRepo},
    domain::entities::UserRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    date_joined: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            date_joined: row.date_joined,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, first_name, last_name, email, date_joined
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(UserRecord, String)>, RepoError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, username, first_name, last_name, email, date_joined, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| (UserRecord::from(row.user), row.password_hash)))
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, first_name, last_name, email, date_joined
            "#,
        )
        .bind(&params.username)
        .bind(&params.first_name)
        .bind(&params.last_name)
        .bind(&params.email)
        .bind(&params.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }
}
