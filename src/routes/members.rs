use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::authz::{Authorized, ReadProject};
use crate::errors::{AppError, AppResult};
use crate::models::membership::MemberProject;

#[utoipa::path(
    get,
    path = "/members/{username}/projects",
    tag = "Memberships",
    params(("username" = String, Path, description = "Member username")),
    responses(
        (status = 200, description = "Projects the member belongs to", body = [MemberProject]),
        (status = 404, description = "Member not found")
    )
)]
pub async fn list_member_projects(
    _auth: Authorized<ReadProject>,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<MemberProject>>> {
    let member = state
        .members
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("member `{username}` not found")))?;

    Ok(Json(state.memberships.list_projects_for_member(member.id).await?))
}
