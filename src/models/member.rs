use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A registered person, as seen by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Member {
    pub id: i64,
    #[schema(example = "fpicarras")]
    pub username: String,
    #[schema(example = "Filipe Correia")]
    pub name: String,
    #[schema(example = "LEEC")]
    pub course: String,
    #[schema(example = "filipe@example.com")]
    pub email: String,
    pub join_date: NaiveDate,
    /// Role tags, in the order they were assigned.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMember {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub course: String,
    pub email: String,
    pub join_date: NaiveDate,
    pub tags: String,
}

impl From<DbMember> for Member {
    fn from(value: DbMember) -> Self {
        Member {
            id: value.id,
            username: value.username,
            name: value.name,
            course: value.course,
            email: value.email,
            join_date: value.join_date,
            tags: split_tags(&value.tags),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMemberCredentials {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub course: String,
    pub email: String,
    pub join_date: NaiveDate,
    pub tags: String,
    pub password_hash: String,
}

impl DbMemberCredentials {
    pub fn into_parts(self) -> (Member, String) {
        let member = Member {
            id: self.id,
            username: self.username,
            name: self.name,
            course: self.course,
            email: self.email,
            join_date: self.join_date,
            tags: split_tags(&self.tags),
        };
        (member, self.password_hash)
    }
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub username: String,
    pub name: String,
    pub course: String,
    pub email: String,
    pub join_date: NaiveDate,
    pub tags: Vec<String>,
    pub password: String,
}

/// Tags are stored comma separated; blanks and duplicates are dropped.
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

pub fn join_tags(tags: &[String]) -> String {
    split_tags(&tags.join(",")).join(",")
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "fpicarras")]
    pub username: String,
    #[schema(example = "password")]
    pub password: String,
}
