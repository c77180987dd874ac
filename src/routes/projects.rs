use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::find_project;
use crate::app::AppState;
use crate::authz::{Authorized, CreateProject, DeleteProject, EditProject, ReadProject};
use crate::errors::AppResult;
use crate::models::project::{Project, ProjectCreateRequest, ProjectUpdateRequest};
use crate::validation::{decode, schemas, validate, JsonPayload};

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub message: String,
    pub project: Project,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectDeletedResponse {
    pub message: String,
    pub id: i64,
}

#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "List projects", body = [Project]),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Missing read_project")
    )
)]
pub async fn list_projects(
    _auth: Authorized<ReadProject>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list_projects().await?))
}

#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    request_body = ProjectCreateRequest,
    responses(
        (status = 200, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Project name already in use")
    )
)]
pub async fn create_project(
    auth: Authorized<CreateProject>,
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload,
) -> AppResult<Json<ProjectResponse>> {
    let payload = validate(payload, &schemas::PROJECT_CREATE)?;
    let draft: ProjectCreateRequest = decode(payload)?;

    let project = state.projects.create_project(draft).await?;
    tracing::debug!(project_id = project.id, by = %auth.principal.username, "project created");

    Ok(Json(ProjectResponse {
        message: "Project created".to_string(),
        project,
    }))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id or name")),
    responses(
        (status = 200, description = "Project detail", body = Project),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(
    _auth: Authorized<ReadProject>,
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> AppResult<Json<Project>> {
    Ok(Json(find_project(&state, &project).await?))
}

#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id or name")),
    request_body = ProjectUpdateRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Project name already in use")
    )
)]
pub async fn update_project(
    auth: Authorized<EditProject>,
    State(state): State<AppState>,
    Path(project): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> AppResult<Json<ProjectResponse>> {
    let payload = validate(payload, &schemas::PROJECT_UPDATE)?;
    let patch: ProjectUpdateRequest = decode(payload)?;

    let existing = find_project(&state, &project).await?;
    let project = state.projects.update_project(existing.id, patch).await?;
    tracing::debug!(project_id = project.id, by = %auth.principal.username, "project updated");

    Ok(Json(ProjectResponse {
        message: "Project updated".to_string(),
        project,
    }))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id or name")),
    responses(
        (status = 200, description = "Project and its memberships deleted", body = ProjectDeletedResponse),
        (status = 404, description = "Project not found")
    )
)]
pub async fn delete_project(
    auth: Authorized<DeleteProject>,
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> AppResult<Json<ProjectDeletedResponse>> {
    let project = find_project(&state, &project).await?;
    state.projects.delete_project(project.id).await?;
    tracing::debug!(project_id = project.id, by = %auth.principal.username, "project deleted");

    Ok(Json(ProjectDeletedResponse {
        message: "Project deleted".to_string(),
        id: project.id,
    }))
}
