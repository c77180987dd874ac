#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`

use hs_projects::config::Settings;
use hs_projects::create_app;
use hs_projects::members::SqliteMemberDirectory;
use hs_projects::models::member::{Member, NewMember};

pub const PASSWORD: &str = "password123";

pub const ROLES: &str = r#"[
    {"name": "admin", "permissions": ["create_project", "edit_project", "delete_project", "read_project"]},
    {"name": "project_manager", "permissions": ["create_project", "edit_project", "read_project"]},
    {"name": "member", "permissions": ["read_project"]}
]"#;

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub settings: Settings,
    // keeps the database and roles file alive for the test
    pub dir: TempDir,
}

pub async fn migrated_pool(dir: &TempDir) -> Result<SqlitePool> {
    let db_path = dir.path().join("test.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;
    Ok(pool)
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_roles(ROLES).await
    }

    pub async fn with_roles(roles: &str) -> Result<Self> {
        let dir = tempdir().context("failed to create tempdir")?;
        let pool = migrated_pool(&dir).await?;

        let roles_path = dir.path().join("roles.json");
        std::fs::write(&roles_path, roles)?;
        let settings = Settings {
            roles_path,
            ..Settings::default()
        };

        let app = create_app(pool.clone(), &settings).await?;
        Ok(Self { app, pool, settings, dir })
    }

    pub async fn seed_member(&self, username: &str, tags: &[&str]) -> Result<Member> {
        let member = SqliteMemberDirectory::new(self.pool.clone())
            .insert(&NewMember {
                username: username.to_string(),
                name: format!("{username} name"),
                course: "LEEC".to_string(),
                email: format!("{username}@example.com"),
                join_date: NaiveDate::from_ymd_opt(2023, 9, 1).context("valid date")?,
                tags: tags.iter().map(|tag| tag.to_string()).collect(),
                password: PASSWORD.to_string(),
            })
            .await?;
        Ok(member)
    }

    /// Logs in and returns the `name=token` pair to send back as a cookie.
    pub async fn login(&self, username: &str) -> Result<String> {
        let (status, headers, body) = self
            .request(
                Method::POST,
                "/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await?;
        if status != StatusCode::OK {
            panic!("login failed: {} - {}", status, body);
        }

        let set_cookie = headers
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .context("login did not set a cookie")?;
        let pair = set_cookie.split(';').next().context("empty cookie")?;
        Ok(pair.trim().to_string())
    }

    pub async fn login_as(&self, username: &str, tags: &[&str]) -> Result<String> {
        self.seed_member(username, tags).await?;
        self.login(username).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, HeaderMap, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let req = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&body_bytes)))?
        };

        Ok((status, headers, value))
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let (status, _, value) = self.request(method, uri, cookie, body).await?;
        Ok((status, value))
    }

    /// Creates a project through the API and returns its id.
    pub async fn create_project(&self, cookie: &str, name: &str) -> Result<i64> {
        let (status, body) = self
            .send(Method::POST, "/projects", Some(cookie), Some(project_body(name)))
            .await?;
        if status != StatusCode::OK {
            panic!("project create failed: {} - {}", status, body);
        }
        body.pointer("/project/id")
            .and_then(Value::as_i64)
            .context("missing project id")
    }

    pub async fn count(&self, table: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub fn project_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "desc",
        "start_date": "2024-10-07",
        "state": "Active"
    })
}
