use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateSessionParams, RepoError, SessionsRepo},
    domain::entities::UserRecord,
};

use super::{PostgresRepositories, map_sqlx_error, users::UserRow};

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn create_session(&self, params: CreateSessionParams) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&params.token_hash)
        .bind(params.user_id)
        .bind(params.expires_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        // Expired rows are swept opportunistically on login.
        sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= now()")
            .bind(params.user_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_session_user(
        &self,
        token_hash: &[u8],
        now: OffsetDateTime,
    ) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name, u.email, u.date_joined
            FROM sessions s
            INNER JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
