mod common;

use anyhow::Result;
use chrono::NaiveDate;
use tempfile::tempdir;

use common::migrated_pool;
use hs_projects::members::{MemberDirectory, SqliteMemberDirectory};
use hs_projects::models::member::NewMember;
use hs_projects::models::membership::MembershipCreateRequest;
use hs_projects::models::project::{ProjectCreateRequest, ProjectKey, ProjectState, ProjectUpdateRequest};
use hs_projects::services::{MembershipService, ProjectService, ServiceError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn draft(name: &str) -> ProjectCreateRequest {
    ProjectCreateRequest {
        name: name.to_string(),
        description: "desc".to_string(),
        start_date: date(2024, 10, 7),
        state: ProjectState::Planned,
    }
}

fn new_member(username: &str) -> NewMember {
    NewMember {
        username: username.to_string(),
        name: username.to_string(),
        course: String::new(),
        email: String::new(),
        join_date: date(2023, 9, 1),
        tags: vec!["member".to_string()],
        password: "password123".to_string(),
    }
}

#[tokio::test]
async fn project_lifecycle() -> Result<()> {
    let dir = tempdir()?;
    let pool = migrated_pool(&dir).await?;
    let projects = ProjectService::new(pool);

    let b = projects.create_project(draft("  Beta ")).await?;
    let a = projects.create_project(draft("Alpha")).await?;
    assert_eq!(b.name, "Beta");
    assert!(a.id > b.id);

    let listed: Vec<String> = projects.list_projects().await?.into_iter().map(|p| p.name).collect();
    assert_eq!(listed, vec!["Beta", "Alpha"]);

    let by_name = projects.get_project(&ProjectKey::Name("Alpha".to_string())).await?;
    assert_eq!(by_name.as_ref().map(|p| p.id), Some(a.id));
    assert!(projects.get_project(&ProjectKey::Id(9_999)).await?.is_none());

    let updated = projects
        .update_project(
            a.id,
            ProjectUpdateRequest {
                state: Some(ProjectState::Done),
                ..ProjectUpdateRequest::default()
            },
        )
        .await?;
    assert_eq!(updated.state, ProjectState::Done);
    assert_eq!(updated.name, "Alpha");
    assert_eq!(updated.description, "desc");

    // renaming to its own name is not a conflict
    projects
        .update_project(
            a.id,
            ProjectUpdateRequest {
                name: Some("Alpha".to_string()),
                ..ProjectUpdateRequest::default()
            },
        )
        .await?;

    let err = projects
        .update_project(
            a.id,
            ProjectUpdateRequest {
                name: Some("Beta".to_string()),
                ..ProjectUpdateRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    projects.delete_project(a.id).await?;
    assert!(projects.get_project(&ProjectKey::Id(a.id)).await?.is_none());
    assert!(matches!(projects.delete_project(a.id).await, Err(ServiceError::NotFound("project"))));
    assert!(matches!(
        projects.update_project(a.id, ProjectUpdateRequest::default()).await,
        Err(ServiceError::NotFound("project"))
    ));

    Ok(())
}

#[tokio::test]
async fn membership_lifecycle() -> Result<()> {
    let dir = tempdir()?;
    let pool = migrated_pool(&dir).await?;
    let projects = ProjectService::new(pool.clone());
    let memberships = MembershipService::new(pool.clone());
    let directory = SqliteMemberDirectory::new(pool);

    let alice = directory.insert(&new_member("alice")).await?;
    let bob = directory.insert(&new_member("bob")).await?;
    let rover = projects.create_project(draft("Rover")).await?;

    for (member, day) in [(&bob, 9), (&alice, 8)] {
        memberships
            .create_membership(
                member,
                &rover,
                MembershipCreateRequest {
                    entry_date: date(2024, 10, day),
                    contributions: None,
                },
            )
            .await?;
    }

    let duplicate = memberships
        .create_membership(
            &alice,
            &rover,
            MembershipCreateRequest {
                entry_date: date(2024, 10, 10),
                contributions: Some(1),
            },
        )
        .await;
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

    let members: Vec<String> = memberships
        .list_members_for_project(rover.id)
        .await?
        .into_iter()
        .map(|m| m.username)
        .collect();
    assert_eq!(members, vec!["alice", "bob"]);

    let alice_projects = memberships.list_projects_for_member(alice.id).await?;
    assert_eq!(alice_projects.len(), 1);
    assert_eq!(alice_projects[0].project, rover);

    assert_eq!(memberships.delete_membership(&rover, "alice").await?, alice.id);
    assert!(matches!(
        memberships.delete_membership(&rover, "alice").await,
        Err(ServiceError::NotFound("membership"))
    ));

    projects.delete_project(rover.id).await?;
    assert!(matches!(
        memberships.list_members_for_project(rover.id).await,
        Err(ServiceError::NotFound("project"))
    ));
    assert!(memberships.list_projects_for_member(bob.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn member_directory_lookups() -> Result<()> {
    let dir = tempdir()?;
    let pool = migrated_pool(&dir).await?;
    let directory = SqliteMemberDirectory::new(pool);

    let alice = directory.insert(&new_member("alice")).await?;
    assert_eq!(alice.tags, vec!["member"]);
    assert!(directory.insert(&new_member("alice")).await.is_err());
    assert!(!directory.ensure_member(&new_member("alice")).await?);
    assert!(directory.ensure_member(&new_member("carol")).await?);

    assert_eq!(directory.find_by_id(alice.id).await?, Some(alice.clone()));
    assert!(directory.find_by_username("ghost").await?.is_none());

    let (member, hash) = directory.credentials("alice").await?.expect("credentials");
    assert_eq!(member, alice);
    assert!(hash.starts_with("$argon2"));

    Ok(())
}
