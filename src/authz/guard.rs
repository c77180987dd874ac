use std::marker::PhantomData;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::principal::Principal;
use crate::app::AppState;
use crate::errors::AppError;
use crate::roles::{Permission, RoleRegistry};

/// A permission a route requires, named at the type level.
pub trait Guard: Send + Sync + 'static {
    const PERMISSION: Permission;
}

macro_rules! guards {
    ($($name:ident => $permission:expr),+ $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Guard for $name {
                const PERMISSION: Permission = $permission;
            }
        )+
    };
}

guards! {
    ReadProject => Permission::ReadProject,
    CreateProject => Permission::CreateProject,
    EditProject => Permission::EditProject,
    DeleteProject => Permission::DeleteProject,
}

/// Decides whether `principal` may act with `permission`.
///
/// A missing caller is `Unauthorized` before any permission is looked at.
pub fn authorize(
    registry: &RoleRegistry,
    principal: Option<&Principal>,
    permission: Permission,
) -> Result<(), AppError> {
    let principal = principal.ok_or_else(|| AppError::unauthorized("authentication required"))?;

    if registry.allows(&principal.roles, permission) {
        tracing::debug!(member_id = principal.member_id, %permission, "access granted");
        Ok(())
    } else {
        tracing::warn!(member_id = principal.member_id, %permission, "access denied");
        Err(AppError::Forbidden)
    }
}

/// Caller resolved from the session cookie; rejects with 401.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = resolve_principal(parts, state)
            .await?
            .ok_or_else(|| AppError::unauthorized("authentication required"))?;
        Ok(Self(principal))
    }
}

/// Caller holding the permission named by `G`; rejects with 401 or 403.
#[derive(Debug, Clone)]
pub struct Authorized<G: Guard> {
    pub principal: Principal,
    _guard: PhantomData<G>,
}

#[async_trait]
impl<G: Guard> FromRequestParts<AppState> for Authorized<G> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = resolve_principal(parts, state).await?;
        authorize(&state.roles, principal.as_ref(), G::PERMISSION)?;

        Ok(Self {
            principal: principal.ok_or_else(|| AppError::unauthorized("authentication required"))?,
            _guard: PhantomData,
        })
    }
}

async fn resolve_principal(parts: &Parts, state: &AppState) -> Result<Option<Principal>, AppError> {
    let Some(token) = state.sessions.token_from_headers(&parts.headers) else {
        return Ok(None);
    };
    let Some(member_id) = state.sessions.resolve(token).await? else {
        return Ok(None);
    };

    // Tags are read on every request so role changes apply immediately.
    let member = state.members.find_by_id(member_id).await?;
    Ok(member.as_ref().map(Principal::from))
}
