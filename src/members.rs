//! Member lookups.
//!
//! Members are owned elsewhere; this service reads them through
//! [`MemberDirectory`]. The SQLite implementation can also insert rows, which
//! the admin bootstrap, the CLI and the tests rely on.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};
use crate::models::member::{join_tags, DbMember, DbMemberCredentials, Member, NewMember};
use crate::services::is_unique_violation;
use crate::utils::hash_password;

const MEMBER_COLUMNS: &str = "id, username, name, course, email, join_date, tags";

#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Member>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Member>>;

    /// Member and stored password hash, for login.
    async fn credentials(&self, username: &str) -> AppResult<Option<(Member, String)>>;
}

#[derive(Debug, Clone)]
pub struct SqliteMemberDirectory {
    pool: SqlitePool,
}

impl SqliteMemberDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, new_member: &NewMember) -> AppResult<Member> {
        let username = new_member.username.trim();
        if username.is_empty() {
            return Err(AppError::bad_request("username must not be empty"));
        }
        let password_hash = hash_password(&new_member.password)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO members (username, name, course, email, join_date, tags, password_hash) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(username)
        .bind(&new_member.name)
        .bind(&new_member.course)
        .bind(&new_member.email)
        .bind(new_member.join_date)
        .bind(join_tags(&new_member.tags))
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::conflict(format!("username `{username}` is already taken"))
            } else {
                AppError::Database(err)
            }
        })?;

        tracing::info!(member_id = id, username, "member created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("inserted member could not be read back"))
    }

    /// Inserts `new_member` unless the username already exists. Returns
    /// whether a row was created.
    pub async fn ensure_member(&self, new_member: &NewMember) -> AppResult<bool> {
        if self.find_by_username(&new_member.username).await?.is_some() {
            return Ok(false);
        }
        self.insert(new_member).await?;
        Ok(true)
    }
}

#[async_trait]
impl MemberDirectory for SqliteMemberDirectory {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, DbMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member.map(Member::from))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, DbMember>(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member.map(Member::from))
    }

    async fn credentials(&self, username: &str) -> AppResult<Option<(Member, String)>> {
        let row = sqlx::query_as::<_, DbMemberCredentials>(&format!(
            "SELECT {MEMBER_COLUMNS}, password_hash FROM members WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DbMemberCredentials::into_parts))
    }
}
