use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::MessageResponse;
use crate::app::AppState;
use crate::authz::Authenticated;
use crate::errors::{AppError, AppResult};
use crate::models::member::{LoginRequest, Member};
use crate::roles::Permission;
use crate::utils::verify_password;
use crate::validation::{decode, schemas, validate, JsonPayload};

const INVALID_CREDENTIALS: &str = "invalid credentials";

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub member: Member,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub member: Member,
    pub roles: Vec<String>,
    /// Union of what the roles grant, sorted.
    pub permissions: Vec<Permission>,
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = LoginResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Invalid credentials")
    ),
    security(())
)]
pub async fn login(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload,
) -> AppResult<impl IntoResponse> {
    let payload = validate(payload, &schemas::LOGIN)?;
    let request: LoginRequest = decode(payload)?;

    let Some((member, password_hash)) = state.members.credentials(&request.username).await? else {
        tracing::warn!(username = %request.username, "login for unknown member");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&request.password, &password_hash)? {
        tracing::warn!(member_id = member.id, "login with wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = state.sessions.open(member.id).await?;
    let cookie = state.sessions.cookie(&token);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            message: "Logged in".to_string(),
            member,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Session closed and cookie expired", body = MessageResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn logout(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    if let Some(token) = state.sessions.token_from_headers(&headers) {
        state.sessions.close(token).await?;
    }
    tracing::info!(member_id = principal.member_id, "logged out");

    Ok((
        AppendHeaders([(SET_COOKIE, state.sessions.expired_cookie())]),
        Json(MessageResponse::new("Logged out")),
    ))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current member with roles and permissions", body = MeResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
) -> AppResult<Json<MeResponse>> {
    let member = state
        .members
        .find_by_id(principal.member_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("authentication required"))?;

    Ok(Json(MeResponse {
        permissions: state.roles.permissions_for(&principal.roles).into_iter().collect(),
        roles: principal.roles,
        member,
    }))
}
