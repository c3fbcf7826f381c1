//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

/// Domain errors - the closed taxonomy every operation reports through.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{entity_type} with id {id} not found")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn post_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "Post",
            id,
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) => DomainError::Conflict(msg),
            RepoError::NotFound => DomainError::Internal("Entity unexpectedly missing".to_string()),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                DomainError::Internal(format!("Database unavailable: {msg}"))
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                DomainError::Internal(format!("Database error: {msg}"))
            }
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let messages: Vec<String> = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();

        DomainError::Validation(messages.join("; "))
    }
}
