mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::TestApp;

fn membership_body() -> Value {
    json!({ "entry_date": "2024-10-08", "contributions": 3 })
}

#[tokio::test]
async fn add_list_and_remove_member() -> Result<()> {
    let t = TestApp::new().await?;
    let admin = t.login_as("admin", &["admin"]).await?;
    t.seed_member("alice", &["member"]).await?;
    let id = t.create_project(&admin, "Rover").await?;

    let (status, body) = t
        .send(Method::POST, "/projects/Rover/alice", Some(&admin), Some(membership_body()))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body.pointer("/membership/project_id").and_then(Value::as_i64), Some(id));
    assert_eq!(body.pointer("/membership/contributions").and_then(Value::as_i64), Some(3));

    let (status, _) = t
        .send(Method::POST, "/projects/Rover/alice", Some(&admin), Some(membership_body()))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, members) = t
        .send(Method::GET, &format!("/projects/{id}/members"), Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let members = members.as_array().expect("member list");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["username"], "alice");
    assert_eq!(members[0]["entry_date"], "2024-10-08");

    let (status, _) = t.send(Method::DELETE, "/projects/Rover/alice", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.send(Method::DELETE, "/projects/Rover/alice", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, members) = t
        .send(Method::GET, "/projects/Rover/members", Some(&admin), None)
        .await?;
    assert_eq!(members, json!([]));

    Ok(())
}

#[tokio::test]
async fn contributions_are_optional() -> Result<()> {
    let t = TestApp::new().await?;
    let admin = t.login_as("admin", &["admin"]).await?;
    t.seed_member("bob", &[]).await?;
    let id = t.create_project(&admin, "Rover").await?;

    let (status, body) = t
        .send(
            Method::POST,
            &format!("/projects/{id}/bob"),
            Some(&admin),
            Some(json!({ "entry_date": "2024-10-08" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.pointer("/membership/contributions").is_some_and(Value::is_null));

    Ok(())
}

#[tokio::test]
async fn membership_payload_is_validated() -> Result<()> {
    let t = TestApp::new().await?;
    let admin = t.login_as("admin", &["admin"]).await?;
    t.seed_member("alice", &[]).await?;
    t.create_project(&admin, "Rover").await?;

    let (status, body) = t
        .send(
            Method::POST,
            "/projects/Rover/alice",
            Some(&admin),
            Some(json!({ "contributions": -1, "role": "lead" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missing_fields"], json!(["entry_date"]));
    assert_eq!(body["invalid_fields"], json!(["role"]));
    assert_eq!(body["type_errors"][0]["field"], "contributions");
    assert_eq!(t.count("project_members").await?, 0);

    Ok(())
}

#[tokio::test]
async fn unknown_member_or_project_is_404() -> Result<()> {
    let t = TestApp::new().await?;
    let admin = t.login_as("admin", &["admin"]).await?;
    t.seed_member("alice", &[]).await?;
    t.create_project(&admin, "Rover").await?;

    let (status, _) = t
        .send(Method::POST, "/projects/Rover/ghost", Some(&admin), Some(membership_body()))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .send(Method::POST, "/projects/Ghost/alice", Some(&admin), Some(membership_body()))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.send(Method::GET, "/projects/Ghost/members", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn reader_cannot_change_memberships() -> Result<()> {
    let t = TestApp::new().await?;
    let admin = t.login_as("admin", &["admin"]).await?;
    let reader = t.login_as("reader", &["member"]).await?;
    t.create_project(&admin, "Rover").await?;

    let (status, _) = t
        .send(Method::POST, "/projects/Rover/reader", Some(&reader), Some(membership_body()))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.send(Method::GET, "/projects/Rover/members", Some(&reader), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(t.count("project_members").await?, 0);

    Ok(())
}

#[tokio::test]
async fn deleting_a_project_removes_its_memberships() -> Result<()> {
    let t = TestApp::new().await?;
    let admin = t.login_as("admin", &["admin"]).await?;
    t.seed_member("alice", &["member"]).await?;
    let rover = t.create_project(&admin, "Rover").await?;
    t.create_project(&admin, "Drone").await?;

    for project in ["Rover", "Drone"] {
        let (status, _) = t
            .send(
                Method::POST,
                &format!("/projects/{project}/alice"),
                Some(&admin),
                Some(membership_body()),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = t
        .send(Method::DELETE, &format!("/projects/{rover}"), Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], rover);

    let (status, _) = t
        .send(Method::GET, &format!("/projects/{rover}/members"), Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(t.count("project_members").await?, 1);

    let (status, projects) = t
        .send(Method::GET, "/members/alice/projects", Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = projects
        .as_array()
        .expect("project list")
        .iter()
        .filter_map(|row| row.pointer("/project/name").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["Drone"]);

    Ok(())
}

#[tokio::test]
async fn member_projects_for_unknown_member_is_404() -> Result<()> {
    let t = TestApp::new().await?;
    let admin = t.login_as("admin", &["admin"]).await?;

    let (status, _) = t.send(Method::GET, "/members/ghost/projects", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn membership_on_sign_prefixed_name_lands_on_that_project() -> Result<()> {
    let t = TestApp::new().await?;
    let admin = t.login_as("admin", &["admin"]).await?;
    t.seed_member("alice", &[]).await?;
    let alpha = t.create_project(&admin, "Alpha").await?;
    let named = t.create_project(&admin, "-1").await?;

    let (status, body) = t
        .send(Method::POST, "/projects/-1/alice", Some(&admin), Some(membership_body()))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body.pointer("/membership/project_id").and_then(Value::as_i64), Some(named));

    let (_, alpha_members) = t
        .send(Method::GET, &format!("/projects/{alpha}/members"), Some(&admin), None)
        .await?;
    assert_eq!(alpha_members, json!([]));

    let (status, _) = t.send(Method::DELETE, "/projects/-1/alice", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(t.count("project_members").await?, 0);

    Ok(())
}
