use sqlx::SqlitePool;

use super::{is_foreign_key_violation, is_unique_violation, ServiceError, ServiceResult};
use crate::models::member::Member;
use crate::models::membership::{
    DbMemberProject, MemberProject, Membership, MembershipCreateRequest, ProjectMember,
};
use crate::models::project::{DbProject, Project};

#[derive(Debug, Clone)]
pub struct MembershipService {
    pool: SqlitePool,
}

impl MembershipService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Members of a project, oldest membership first.
    pub async fn list_members_for_project(&self, project_id: i64) -> ServiceResult<Vec<ProjectMember>> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Err(ServiceError::NotFound("project"));
        }

        let members = sqlx::query_as::<_, ProjectMember>(
            "SELECT m.id AS member_id, m.username, m.name, m.course, m.email, pm.entry_date, pm.contributions \
             FROM project_members pm JOIN members m ON m.id = pm.member_id \
             WHERE pm.project_id = ? ORDER BY pm.entry_date ASC, m.username ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    pub async fn list_projects_for_member(&self, member_id: i64) -> ServiceResult<Vec<MemberProject>> {
        let rows = sqlx::query_as::<_, DbMemberProject>(
            "SELECT p.id, p.name, p.description, p.start_date, p.state, pm.entry_date, pm.contributions \
             FROM project_members pm JOIN projects p ON p.id = pm.project_id \
             WHERE pm.member_id = ? ORDER BY p.id ASC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> ServiceResult<MemberProject> {
                let project = Project::try_from(DbProject {
                    id: row.id,
                    name: row.name,
                    description: row.description,
                    start_date: row.start_date,
                    state: row.state,
                })?;
                Ok(MemberProject {
                    project,
                    entry_date: row.entry_date,
                    contributions: row.contributions,
                })
            })
            .collect()
    }

    pub async fn create_membership(
        &self,
        member: &Member,
        project: &Project,
        request: MembershipCreateRequest,
    ) -> ServiceResult<Membership> {
        sqlx::query(
            "INSERT INTO project_members (project_id, member_id, entry_date, contributions) VALUES (?, ?, ?, ?)",
        )
        .bind(project.id)
        .bind(member.id)
        .bind(request.entry_date)
        .bind(request.contributions)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ServiceError::Conflict(format!(
                    "{} is already a member of {}",
                    member.username, project.name
                ))
            } else if is_foreign_key_violation(&err) {
                // the project or member vanished between lookup and insert
                ServiceError::NotFound("project or member")
            } else {
                ServiceError::Store(err)
            }
        })?;

        tracing::info!(project_id = project.id, member_id = member.id, "membership created");

        Ok(Membership {
            project_id: project.id,
            member_id: member.id,
            entry_date: request.entry_date,
            contributions: request.contributions,
        })
    }

    /// Removes `username` from `project` and returns the member id.
    pub async fn delete_membership(&self, project: &Project, username: &str) -> ServiceResult<i64> {
        let removed: Option<i64> = sqlx::query_scalar(
            "DELETE FROM project_members \
             WHERE project_id = ? AND member_id = (SELECT id FROM members WHERE username = ?) \
             RETURNING member_id",
        )
        .bind(project.id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let member_id = removed.ok_or(ServiceError::NotFound("membership"))?;
        tracing::info!(project_id = project.id, member_id, "membership deleted");
        Ok(member_id)
    }
}
