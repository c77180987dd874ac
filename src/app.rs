use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{SessionSettings, Settings};
use crate::errors::AppError;
use crate::members::{MemberDirectory, SqliteMemberDirectory};
use crate::roles::RoleRegistry;
use crate::routes::{auth, health, members, memberships, projects};
use crate::services::{MembershipService, ProjectService};
use crate::sessions::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub roles: Arc<RoleRegistry>,
    pub sessions: SessionStore,
    pub members: Arc<dyn MemberDirectory>,
    pub projects: ProjectService,
    pub memberships: MembershipService,
}

impl AppState {
    pub fn new(pool: SqlitePool, roles: RoleRegistry, session: SessionSettings) -> Self {
        Self {
            roles: Arc::new(roles),
            sessions: SessionStore::new(pool.clone(), session),
            members: Arc::new(SqliteMemberDirectory::new(pool.clone())),
            projects: ProjectService::new(pool.clone()),
            memberships: MembershipService::new(pool.clone()),
            pool,
        }
    }
}

/// Builds the router, loading the role registry from `settings.roles_path`.
///
/// Fails when the roles file is missing or invalid.
pub async fn create_app(pool: SqlitePool, settings: &Settings) -> Result<Router, AppError> {
    let roles = RoleRegistry::load(&settings.roles_path)
        .map_err(|err| AppError::configuration(err.to_string()))?;
    let state = AppState::new(pool, roles, settings.session.clone());

    Ok(router(state, settings.request_timeout))
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    // One parameter name for the second segment: it holds an id or a name.
    let project_routes = Router::new()
        .route("/", get(projects::list_projects).post(projects::create_project))
        .route(
            "/:project",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/:project/members", get(memberships::list_project_members))
        .route(
            "/:project/:username",
            post(memberships::add_member).delete(memberships::remove_member),
        );

    let member_routes = Router::new().route("/:username/projects", get(members::list_member_projects));

    Router::new()
        .merge(auth_routes)
        .route("/health", get(health::health))
        .nest("/projects", project_routes)
        .nest("/members", member_routes)
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
