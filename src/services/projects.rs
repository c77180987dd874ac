use sqlx::SqlitePool;

use super::{is_unique_violation, ServiceError, ServiceResult};
use crate::models::project::{DbProject, Project, ProjectCreateRequest, ProjectKey, ProjectUpdateRequest};

const SELECT_PROJECT: &str = "SELECT id, name, description, start_date, state FROM projects";

#[derive(Debug, Clone)]
pub struct ProjectService {
    pool: SqlitePool,
}

impl ProjectService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_projects(&self) -> ServiceResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, DbProject>(&format!("{SELECT_PROJECT} ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Project::try_from).collect()
    }

    pub async fn create_project(&self, draft: ProjectCreateRequest) -> ServiceResult<Project> {
        let name = draft.name.trim().to_string();
        ensure_name_available(&self.pool, &name, None).await?;

        let result = sqlx::query(
            "INSERT INTO projects (name, description, start_date, state) VALUES (?, ?, ?, ?)",
        )
        .bind(&name)
        .bind(&draft.description)
        .bind(draft.start_date)
        .bind(draft.state.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| name_conflict(err, &name))?;

        let id = result.last_insert_rowid();
        tracing::info!(project_id = id, name = %name, "project created");

        self.fetch(id)
            .await?
            .ok_or_else(|| ServiceError::Corrupt(format!("project {id} missing after insert")))
    }

    /// Looks a project up by id or by name. Absence is not an error.
    pub async fn get_project(&self, key: &ProjectKey) -> ServiceResult<Option<Project>> {
        match key {
            ProjectKey::Id(id) => self.fetch(*id).await,
            ProjectKey::Name(name) => {
                let row = sqlx::query_as::<_, DbProject>(&format!("{SELECT_PROJECT} WHERE name = ?"))
                    .bind(name)
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(Project::try_from).transpose()
            }
        }
    }

    pub async fn update_project(&self, id: i64, patch: ProjectUpdateRequest) -> ServiceResult<Project> {
        let mut project = self.fetch(id).await?.ok_or(ServiceError::NotFound("project"))?;

        let patch = ProjectUpdateRequest {
            name: patch.name.map(|name| name.trim().to_string()),
            ..patch
        };
        if let Some(name) = patch.name.as_deref() {
            if name != project.name {
                ensure_name_available(&self.pool, name, Some(id)).await?;
            }
        }

        patch.apply(&mut project);

        let affected = sqlx::query(
            "UPDATE projects SET name = ?, description = ?, start_date = ?, state = ? WHERE id = ?",
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.start_date)
        .bind(project.state.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| name_conflict(err, &project.name))?;

        if affected.rows_affected() == 0 {
            return Err(ServiceError::NotFound("project"));
        }

        tracing::info!(project_id = id, "project updated");
        Ok(project)
    }

    /// Deletes the project and every membership that references it, atomically.
    pub async fn delete_project(&self, id: i64) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        let memberships = sqlx::query("DELETE FROM project_members WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let affected = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if affected.rows_affected() == 0 {
            // dropping `tx` rolls back
            return Err(ServiceError::NotFound("project"));
        }

        tx.commit().await?;

        tracing::info!(
            project_id = id,
            memberships_removed = memberships.rows_affected(),
            "project deleted"
        );
        Ok(())
    }

    async fn fetch(&self, id: i64) -> ServiceResult<Option<Project>> {
        let row = sqlx::query_as::<_, DbProject>(&format!("{SELECT_PROJECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Project::try_from).transpose()
    }
}

async fn ensure_name_available(pool: &SqlitePool, name: &str, except: Option<i64>) -> ServiceResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM projects WHERE name = ? AND id IS NOT ?")
        .bind(name)
        .bind(except)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Err(ServiceError::Conflict(format!("a project named `{name}` already exists")));
    }

    Ok(())
}

fn name_conflict(err: sqlx::Error, name: &str) -> ServiceError {
    if is_unique_violation(&err) {
        ServiceError::Conflict(format!("a project named `{name}` already exists"))
    } else {
        ServiceError::Store(err)
    }
}
