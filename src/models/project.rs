use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::services::ServiceError;

/// Lifecycle state of a project. The wire spelling is the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ProjectState {
    Planned,
    Active,
    Almost,
    Done,
    Archived,
}

impl ProjectState {
    pub const ALL: [ProjectState; 5] = [
        ProjectState::Planned,
        ProjectState::Active,
        ProjectState::Almost,
        ProjectState::Done,
        ProjectState::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectState::Planned => "Planned",
            ProjectState::Active => "Active",
            ProjectState::Almost => "Almost",
            ProjectState::Done => "Done",
            ProjectState::Archived => "Archived",
        }
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown project state `{0}`")]
pub struct UnknownProjectState(pub String);

impl FromStr for ProjectState {
    type Err = UnknownProjectState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownProjectState(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    #[schema(example = 3)]
    pub id: i64,
    #[schema(example = "Rover")]
    pub name: String,
    #[schema(example = "Autonomous rover for the robotics fair.")]
    pub description: String,
    pub start_date: NaiveDate,
    pub state: ProjectState,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbProject {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub state: String,
}

impl TryFrom<DbProject> for Project {
    type Error = ServiceError;

    fn try_from(value: DbProject) -> Result<Self, Self::Error> {
        let state = value
            .state
            .parse()
            .map_err(|err: UnknownProjectState| ServiceError::Corrupt(format!("project {}: {err}", value.id)))?;

        Ok(Project {
            id: value.id,
            name: value.name,
            description: value.description,
            start_date: value.start_date,
            state,
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ProjectCreateRequest {
    #[schema(example = "Rover")]
    pub name: String,
    #[schema(example = "Autonomous rover for the robotics fair.")]
    pub description: String,
    #[schema(example = "2024-10-07")]
    pub start_date: NaiveDate,
    pub state: ProjectState,
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ProjectUpdateRequest {
    #[schema(example = "Rover II")]
    pub name: Option<String>,
    #[schema(example = "Second iteration of the rover.")]
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub state: Option<ProjectState>,
}

impl ProjectUpdateRequest {
    /// Merges the present fields into `project`.
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = self.name.as_ref() {
            project.name = name.clone();
        }
        if let Some(description) = self.description.as_ref() {
            project.description = description.clone();
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(state) = self.state {
            project.state = state;
        }
    }
}

/// How a route names a project: digits are an id, anything else a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectKey {
    Id(i64),
    Name(String),
}

impl ProjectKey {
    /// Only plain ASCII digits name an id; signs, spaces and overflow fall back to a name.
    pub fn parse(raw: &str) -> Self {
        let digits = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
        match raw.parse::<i64>() {
            Ok(id) if digits => ProjectKey::Id(id),
            _ => ProjectKey::Name(raw.to_string()),
        }
    }

    pub fn is_id(&self) -> bool {
        matches!(self, ProjectKey::Id(_))
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectKey::Id(id) => write!(f, "{id}"),
            ProjectKey::Name(name) => f.write_str(name),
        }
    }
}
