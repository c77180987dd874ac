//! Server-side sessions keyed by an opaque cookie token.
//!
//! The raw token only ever lives in the client's cookie. The store keeps its
//! hex SHA-256 digest.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::config::SessionSettings;
use crate::errors::AppResult;
use crate::utils::utc_now;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    settings: SessionSettings,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, settings: SessionSettings) -> Self {
        Self { pool, settings }
    }

    /// Starts a session for `member_id` and returns the raw token.
    pub async fn open(&self, member_id: i64) -> AppResult<String> {
        let token = new_token();
        let now = utc_now();
        let expires_at = now + Duration::seconds(self.settings.lifetime_secs);

        sqlx::query("INSERT INTO sessions (token_hash, member_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(digest(&token))
            .bind(member_id)
            .bind(now)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        tracing::info!(member_id, "session opened");
        Ok(token)
    }

    /// Member id behind `token`, if the session exists and has not expired.
    ///
    /// An expired row is deleted on sight.
    pub async fn resolve(&self, token: &str) -> AppResult<Option<i64>> {
        let token_hash = digest(token);
        let row: Option<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT member_id, expires_at FROM sessions WHERE token_hash = ?")
                .bind(&token_hash)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((member_id, expires_at)) if expires_at > utc_now() => Ok(Some(member_id)),
            Some((member_id, _)) => {
                sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
                    .bind(&token_hash)
                    .execute(&self.pool)
                    .await?;
                tracing::debug!(member_id, "expired session removed");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn close(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(digest(token))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `Set-Cookie` value carrying a fresh token.
    pub fn cookie(&self, token: &str) -> String {
        self.cookie_with(token, self.settings.lifetime_secs)
    }

    /// `Set-Cookie` value that makes the client drop its token.
    pub fn expired_cookie(&self) -> String {
        self.cookie_with("", 0)
    }

    fn cookie_with(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            self.settings.cookie_name, value, max_age
        );
        if self.settings.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        token_from_headers(headers, &self.settings.cookie_name)
    }
}

pub async fn purge_expired(pool: &SqlitePool) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE julianday(expires_at) <= julianday(?)")
        .bind(utc_now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Value of the cookie `name` across every `Cookie` header.
pub fn token_from_headers<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
