pub mod auth;
pub mod health;
pub mod members;
pub mod memberships;
pub mod projects;

use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::project::{Project, ProjectKey};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Looks a project up by the path segment shared by every project route.
pub(crate) async fn find_project(state: &AppState, raw: &str) -> AppResult<Project> {
    let key = ProjectKey::parse(raw);
    state
        .projects
        .get_project(&key)
        .await?
        .ok_or_else(|| AppError::not_found(format!("project `{key}` not found")))
}
