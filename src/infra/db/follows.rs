use async_trait::async_trait;

use crate::{
    application::repos::{FollowsRepo, RepoError},
    domain::follows::FollowEdge,
};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl FollowsRepo for PostgresRepositories {
    async fn create_follow(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(edge.user_id())
        .bind(edge.author_id())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(edge.user_id())
            .bind(edge.author_id())
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_following(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(edge.user_id())
        .bind(edge.author_id())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT author_id FROM follows WHERE user_id = $1 ORDER BY author_id",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}
