//! Resource services.
//!
//! Services own the SQL for their resource and enforce its invariants: project
//! names are unique, a member joins a project at most once, and deleting a
//! project removes its memberships in the same transaction. They return
//! [`ServiceError`] rather than HTTP errors; the routing layer maps one onto
//! the other.

pub mod memberships;
pub mod projects;

pub use memberships::MembershipService;
pub use projects::ProjectService;

use crate::errors::AppError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("store failure")]
    Store(#[from] sqlx::Error),
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound(what) => AppError::not_found(format!("{what} not found")),
            ServiceError::Conflict(message) => AppError::conflict(message),
            ServiceError::Corrupt(detail) => AppError::internal(detail),
            ServiceError::Store(err) => AppError::Database(err),
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}
