use serde_json::Value;

#[test]
fn openapi_documents_projects_and_session_cookie() -> anyhow::Result<()> {
    // Build the OpenAPI document the same way the server does
    let doc = hs_projects::docs::build_openapi(5100, false, "hs_session")?;
    let v = serde_json::to_value(&doc)?;

    let props = v
        .pointer("/components/schemas/Project/properties")
        .and_then(Value::as_object)
        .expect("components.schemas.Project.properties must exist");
    for k in ["id", "name", "description", "start_date", "state"] {
        assert!(props.contains_key(k), "OpenAPI Project schema missing '{}'", k);
    }

    let paths = v.get("paths").and_then(Value::as_object).expect("paths");
    for path in [
        "/projects",
        "/projects/{id}",
        "/projects/{id}/members",
        "/projects/{projName}/{username}",
        "/members/{username}/projects",
        "/login",
    ] {
        assert!(paths.contains_key(path), "OpenAPI missing path {}", path);
    }

    let scheme = v
        .pointer("/components/securitySchemes/sessionCookie")
        .expect("sessionCookie security scheme");
    assert_eq!(scheme["in"], "cookie");
    assert_eq!(scheme["name"], "hs_session");

    Ok(())
}
