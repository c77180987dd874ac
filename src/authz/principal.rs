use serde::Serialize;
use utoipa::ToSchema;

use crate::models::member::Member;

/// The authenticated caller, built per request from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    pub member_id: i64,
    pub username: String,
    /// Role tags in the order the member holds them.
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(member_id: i64, username: impl Into<String>) -> Self {
        Self {
            member_id,
            username: username.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = String>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }
}

impl From<&Member> for Principal {
    fn from(member: &Member) -> Self {
        Principal::new(member.id, member.username.clone()).with_roles(member.tags.iter().cloned())
    }
}
