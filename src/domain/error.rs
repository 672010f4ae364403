use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain entity `{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("validation failed for `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("`{field}` value `{value}` is already taken")]
    Conflict { field: &'static str, value: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(field: &'static str, value: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            value: value.into(),
        }
    }
}
