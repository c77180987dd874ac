use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, models, roles, routes};

pub const SECURITY_SCHEME: &str = "sessionCookie";

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::auth::login,
		routes::auth::logout,
		routes::auth::me,
		routes::health::health,
		routes::projects::list_projects,
		routes::projects::create_project,
		routes::projects::get_project,
		routes::projects::update_project,
		routes::projects::delete_project,
		routes::memberships::list_project_members,
		routes::memberships::add_member,
		routes::memberships::remove_member,
		routes::members::list_member_projects
	),
	components(
		schemas(
			models::member::Member,
			models::member::LoginRequest,
			models::project::Project,
			models::project::ProjectState,
			models::project::ProjectCreateRequest,
			models::project::ProjectUpdateRequest,
			models::membership::Membership,
			models::membership::MembershipCreateRequest,
			models::membership::ProjectMember,
			models::membership::MemberProject,
			roles::Permission,
			authz::Principal,
			routes::MessageResponse,
			routes::auth::LoginResponse,
			routes::auth::MeResponse,
			routes::health::HealthResponse,
			routes::projects::ProjectResponse,
			routes::projects::ProjectDeletedResponse,
			routes::memberships::MembershipResponse,
			routes::memberships::MembershipDeletedResponse
		)
	),
	tags(
		(name = "Auth", description = "Session login and identity"),
		(name = "Projects", description = "Project management"),
		(name = "Memberships", description = "Members of projects"),
		(name = "Health", description = "Liveness")
	)
)]
pub struct ApiDoc;

/// OpenAPI document with the session cookie scheme and a local server entry.
pub fn build_openapi(port: u16, tls: bool, cookie_name: &str) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc, cookie_name);
	ensure_global_security(&mut doc);
	ensure_servers(&mut doc, port, tls);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn object_entry<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
	let entry = parent.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
	if !entry.is_object() {
		*entry = Value::Object(Map::new());
	}
	match entry {
		Value::Object(map) => map,
		_ => unreachable!("entry was just replaced by an object"),
	}
}

fn ensure_security_components(doc: &mut Value, cookie_name: &str) {
	let Some(root) = doc.as_object_mut() else {
		return;
	};
	let components = object_entry(root, "components");
	let schemes = object_entry(components, "securitySchemes");

	schemes.insert(
		SECURITY_SCHEME.to_string(),
		json!({
			"type": "apiKey",
			"in": "cookie",
			"name": cookie_name
		}),
	);
}

fn ensure_global_security(doc: &mut Value) {
	if let Some(root) = doc.as_object_mut() {
		root.entry("security")
			.or_insert_with(|| json!([{ SECURITY_SCHEME: [] }]));
	}
}

fn ensure_servers(doc: &mut Value, port: u16, tls: bool) {
	let scheme = if tls { "https" } else { "http" };
	let server_url = format!("{}://localhost:{}", scheme, port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
