//! Slug generation for group URLs.
//!
//! `slug::slugify` transliterates non-Latin scripts (Cyrillic titles such as
//! "Путешествия" become `puteshestviia`), so only length capping and
//! uniqueness are handled here. Uniqueness is decided by a caller-supplied
//! async predicate, keeping the helpers free of persistence concerns.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors that can occur while generating a slug via an async uniqueness check.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a slug of at most `max_len` characters from human-readable text.
pub fn derive_slug(input: &str, max_len: usize) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = truncate_slug(&slugify(input), max_len);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug that the `is_unique` predicate accepts.
///
/// Collisions are retried with a monotonic suffix (`-2`, `-3`, …); the base is
/// shortened as needed so suffixed candidates still fit in `max_len`.
pub async fn generate_unique_slug<F, Fut, E>(
    input: &str,
    max_len: usize,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input, max_len)?;

    if is_unique(base.clone())
        .await
        .map_err(SlugAsyncError::Predicate)?
    {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let suffix = format!("-{attempt}");
        let stem = truncate_slug(&base, max_len.saturating_sub(suffix.len()));
        let candidate = format!("{stem}{suffix}");
        if is_unique(candidate.clone())
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

fn truncate_slug(slug: &str, max_len: usize) -> String {
    let truncated: String = slug.chars().take(max_len).collect();
    truncated.trim_end_matches('-').to_string()
}
