use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::find_project;
use crate::app::AppState;
use crate::authz::{Authorized, EditProject, ReadProject};
use crate::errors::{AppError, AppResult};
use crate::models::membership::{Membership, MembershipCreateRequest, ProjectMember};
use crate::validation::{decode, schemas, validate, JsonPayload};

#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipResponse {
    pub message: String,
    pub membership: Membership,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipDeletedResponse {
    pub message: String,
    pub project_id: i64,
    pub member_id: i64,
}

#[utoipa::path(
    get,
    path = "/projects/{id}/members",
    tag = "Memberships",
    params(("id" = String, Path, description = "Project id or name")),
    responses(
        (status = 200, description = "Members of the project", body = [ProjectMember]),
        (status = 404, description = "Project not found")
    )
)]
pub async fn list_project_members(
    _auth: Authorized<ReadProject>,
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> AppResult<Json<Vec<ProjectMember>>> {
    let project = find_project(&state, &project).await?;
    Ok(Json(state.memberships.list_members_for_project(project.id).await?))
}

#[utoipa::path(
    post,
    path = "/projects/{projName}/{username}",
    tag = "Memberships",
    params(
        ("projName" = String, Path, description = "Project name or id"),
        ("username" = String, Path, description = "Member username")
    ),
    request_body = MembershipCreateRequest,
    responses(
        (status = 200, description = "Member added to the project", body = MembershipResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Project or member not found"),
        (status = 409, description = "Already a member")
    )
)]
pub async fn add_member(
    auth: Authorized<EditProject>,
    State(state): State<AppState>,
    Path((project, username)): Path<(String, String)>,
    JsonPayload(payload): JsonPayload,
) -> AppResult<Json<MembershipResponse>> {
    let payload = validate(payload, &schemas::MEMBERSHIP_CREATE)?;
    let request: MembershipCreateRequest = decode(payload)?;

    let project = find_project(&state, &project).await?;
    let member = state
        .members
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("member `{username}` not found")))?;

    let membership = state.memberships.create_membership(&member, &project, request).await?;
    tracing::debug!(by = %auth.principal.username, project = %project.name, member = %member.username, "member added");

    Ok(Json(MembershipResponse {
        message: format!("{} added to {}", member.username, project.name),
        membership,
    }))
}

#[utoipa::path(
    delete,
    path = "/projects/{projName}/{username}",
    tag = "Memberships",
    params(
        ("projName" = String, Path, description = "Project name or id"),
        ("username" = String, Path, description = "Member username")
    ),
    responses(
        (status = 200, description = "Member removed from the project", body = MembershipDeletedResponse),
        (status = 404, description = "Project or membership not found")
    )
)]
pub async fn remove_member(
    auth: Authorized<EditProject>,
    State(state): State<AppState>,
    Path((project, username)): Path<(String, String)>,
) -> AppResult<Json<MembershipDeletedResponse>> {
    let project = find_project(&state, &project).await?;
    let member_id = state.memberships.delete_membership(&project, &username).await?;
    tracing::debug!(by = %auth.principal.username, project = %project.name, member = %username, "member removed");

    Ok(Json(MembershipDeletedResponse {
        message: format!("{username} removed from {}", project.name),
        project_id: project.id,
        member_id,
    }))
}
