use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreatePostParams, PostFilter, PostsRepo, RepoError, UpdatePostParams,
    },
    domain::entities::{GroupSummary, PostRecord, UserSummary},
};

use super::{PostgresRepositories, map_sqlx_error};

const POST_SELECT: &str = r#"
    SELECT
        p.id,
        p.text,
        p.pub_date,
        p.image,
        u.id AS author_id,
        u.username AS author_username,
        u.first_name AS author_first_name,
        u.last_name AS author_last_name,
        g.id AS group_id,
        g.title AS group_title,
        g.slug AS group_slug
    FROM posts p
    INNER JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    pub_date: OffsetDateTime,
    image: Option<String>,
    author_id: i64,
    author_username: String,
    author_first_name: String,
    author_last_name: String,
    group_id: Option<i64>,
    group_title: Option<String>,
    group_slug: Option<String>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        let group = match (row.group_id, row.group_title, row.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(GroupSummary { id, title, slug }),
            _ => None,
        };

        Self {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            author: UserSummary::new(
                row.author_id,
                row.author_username,
                &row.author_first_name,
                &row.author_last_name,
            ),
            group,
            image: row.image,
        }
    }
}

impl PostgresRepositories {
    fn apply_post_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
        qb.push(" WHERE TRUE ");
        match filter {
            PostFilter::All => {}
            PostFilter::Group(group_id) => {
                qb.push(" AND p.group_id = ");
                qb.push_bind(*group_id);
            }
            PostFilter::Author(author_id) => {
                qb.push(" AND p.author_id = ");
                qb.push_bind(*author_id);
            }
            PostFilter::Authors(author_ids) => {
                qb.push(" AND p.author_id = ANY(");
                qb.push_bind(author_ids.clone());
                qb.push(")");
            }
        }
    }

    async fn fetch_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        if matches!(filter, PostFilter::Authors(ids) if ids.is_empty()) {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        Self::apply_post_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        if matches!(filter, PostFilter::Authors(ids) if ids.is_empty()) {
            return Ok(Vec::new());
        }

        let offset = i64::try_from(offset)
            .map_err(|_| RepoError::InvalidInput {
                message: "offset exceeds supported range".to_string(),
            })?;
        let limit = i64::try_from(limit).map_err(|_| RepoError::InvalidInput {
            message: "limit exceeds supported range".to_string(),
        })?;

        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        Self::apply_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        self.fetch_post(id).await
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (text, author_id, group_id, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&params.text)
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(&params.image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.fetch_post(id).await?.ok_or(RepoError::NotFound)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET text = $2, group_id = $3, image = $4
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(&params.image)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let id = updated.ok_or(RepoError::NotFound)?;
        self.fetch_post(id).await?.ok_or(RepoError::NotFound)
    }
}
