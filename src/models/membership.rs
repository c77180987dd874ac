use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::project::Project;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Membership {
    pub project_id: i64,
    pub member_id: i64,
    pub entry_date: NaiveDate,
    pub contributions: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct MembershipCreateRequest {
    #[schema(example = "2024-01-01")]
    pub entry_date: NaiveDate,
    #[schema(example = 4)]
    pub contributions: Option<i64>,
}

/// A member of a project together with their membership attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct ProjectMember {
    pub member_id: i64,
    pub username: String,
    pub name: String,
    pub course: String,
    pub email: String,
    pub entry_date: NaiveDate,
    pub contributions: Option<i64>,
}

/// A project a member belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MemberProject {
    pub project: Project,
    pub entry_date: NaiveDate,
    pub contributions: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMemberProject {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub state: String,
    pub entry_date: NaiveDate,
    pub contributions: Option<i64>,
}
