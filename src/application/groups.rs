//! Group management used by the operator CLI.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    application::repos::{CreateGroupParams, GroupsRepo, RepoError},
    domain::{
        entities::{GROUP_SLUG_MAX_LEN, GROUP_TITLE_MAX_LEN, GroupRecord},
        error::DomainError,
        slug::{SlugAsyncError, SlugError, derive_slug, generate_unique_slug},
    },
};

#[derive(Debug, Error)]
pub enum GroupError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateGroupCommand {
    pub title: String,
    /// Explicit slug; derived from the title when absent or blank.
    pub slug: Option<String>,
    pub description: String,
}

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupsRepo>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupsRepo>) -> Self {
        Self { groups }
    }

    pub async fn create_group(&self, command: CreateGroupCommand) -> Result<GroupRecord, GroupError> {
        let CreateGroupCommand {
            title,
            slug,
            description,
        } = command;

        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty").into());
        }
        if title.chars().count() > GROUP_TITLE_MAX_LEN {
            return Err(DomainError::validation(
                "title",
                format!("must be at most {GROUP_TITLE_MAX_LEN} characters"),
            )
            .into());
        }

        let explicit = slug
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let slug = match explicit {
            Some(requested) => self.claim_explicit_slug(&requested).await?,
            None => self.derive_unique_slug(&title).await?,
        };

        let group = self
            .groups
            .create_group(CreateGroupParams {
                title,
                slug,
                description: description.trim().to_string(),
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => GroupError::Domain(DomainError::conflict(
                    "slug",
                    "requested slug",
                )),
                other => GroupError::Repo(other),
            })?;

        info!(
            target = "yatube::groups",
            group_id = group.id,
            slug = %group.slug,
            "group created"
        );
        Ok(group)
    }

    async fn claim_explicit_slug(&self, requested: &str) -> Result<String, GroupError> {
        let normalized = derive_slug(requested, GROUP_SLUG_MAX_LEN)
            .map_err(|err| DomainError::validation("slug", err.to_string()))?;
        if normalized != requested {
            return Err(DomainError::validation(
                "slug",
                "use only lowercase letters, digits and hyphens",
            )
            .into());
        }
        if self.groups.find_group_by_slug(requested).await?.is_some() {
            return Err(DomainError::conflict("slug", requested).into());
        }
        Ok(normalized)
    }

    async fn derive_unique_slug(&self, title: &str) -> Result<String, GroupError> {
        let groups = self.groups.clone();
        let result = generate_unique_slug(title, GROUP_SLUG_MAX_LEN, move |candidate| {
            let groups = groups.clone();
            async move {
                groups
                    .find_group_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await;

        match result {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(SlugError::Exhausted { base })) => {
                Err(DomainError::conflict("slug", base).into())
            }
            Err(SlugAsyncError::Slug(err)) => {
                Err(DomainError::validation("title", err.to_string()).into())
            }
            Err(SlugAsyncError::Predicate(err)) => Err(GroupError::Repo(err)),
        }
    }
}
