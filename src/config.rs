//! Process settings read from the environment (and `.env`, see `main`).
//!
//! Empty variables count as unset. A variable that is set but cannot be
//! parsed is a configuration error rather than a silent fallback.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

pub const DEFAULT_SESSION_COOKIE: &str = "hs_session";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/hackerschool.sqlite3?mode=rwc";
const DEFAULT_ROLES_PATH: &str = "data/roles.json";
const DEFAULT_SESSION_LIFETIME_SECS: i64 = 12 * 60 * 60;
const DEFAULT_PORT: u16 = 5100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub roles_path: PathBuf,
    pub port: u16,
    pub request_timeout: Duration,
    pub session: SessionSettings,
    pub admin: Option<AdminAccount>,
    pub tls: Option<TlsPaths>,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub lifetime_secs: i64,
    /// Adds the `Secure` attribute to the session cookie.
    pub secure: bool,
}

/// Account created at startup when it does not exist yet.
#[derive(Clone)]
pub struct AdminAccount {
    pub username: String,
    pub password: String,
    pub tags: Vec<String>,
}

impl std::fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAccount")
            .field("username", &self.username)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            lifetime_secs: DEFAULT_SESSION_LIFETIME_SECS,
            secure: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            roles_path: PathBuf::from(DEFAULT_ROLES_PATH),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            session: SessionSettings::default(),
            admin: None,
            tls: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        let session = SessionSettings {
            cookie_name: env_or("SESSION_COOKIE", DEFAULT_SESSION_COOKIE),
            lifetime_secs: env_parse("SESSION_LIFETIME", DEFAULT_SESSION_LIFETIME_SECS)?,
            secure: env_parse("SESSION_SECURE", false)?,
        };
        if session.lifetime_secs <= 0 {
            return Err(AppError::configuration("SESSION_LIFETIME must be positive"));
        }

        let admin = match (env_var("ADMIN_USERNAME"), env_var("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminAccount {
                username,
                password,
                tags: env_or("ADMIN_TAGS", "admin")
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(String::from)
                    .collect(),
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::configuration(
                    "ADMIN_USERNAME and ADMIN_PASSWORD must be set together",
                ))
            }
        };

        let tls = match (env_var("TLS_CERT_PATH"), env_var("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::configuration(
                    "TLS_CERT_PATH and TLS_KEY_PATH must be set together",
                ))
            }
        };

        Ok(Self {
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            roles_path: env_or("ROLES_PATH", DEFAULT_ROLES_PATH).into(),
            port: env_parse("APP_PORT", DEFAULT_PORT)?,
            request_timeout: Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?),
            session,
            admin,
            tls,
        })
    }
}

/// Directory for the daily rolling log file, from `LOGS_PATH`. Read before
/// [`Settings`] so logging is up while the rest of the config loads.
pub fn logs_dir() -> Option<PathBuf> {
    env_var("LOGS_PATH").map(PathBuf::from)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::configuration(format!("{key} has an invalid value: `{raw}`"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.port, 5100);
        assert_eq!(settings.session.cookie_name, "hs_session");
        assert_eq!(settings.session.lifetime_secs, 43_200);
        assert!(settings.admin.is_none());
    }

    #[test]
    fn env_parse_rejects_garbage() {
        std::env::set_var("HS_TEST_PARSE_GARBAGE", "twelve");
        let parsed = env_parse::<u16>("HS_TEST_PARSE_GARBAGE", 1);
        assert!(matches!(parsed, Err(AppError::Configuration(_))));

        std::env::set_var("HS_TEST_PARSE_EMPTY", "  ");
        assert_eq!(env_parse::<u16>("HS_TEST_PARSE_EMPTY", 7).unwrap(), 7);
    }

    #[test]
    fn blank_logs_path_disables_file_logging() {
        std::env::set_var("LOGS_PATH", "   ");
        assert_eq!(logs_dir(), None);

        std::env::set_var("LOGS_PATH", "var/log");
        assert_eq!(logs_dir(), Some(PathBuf::from("var/log")));
        std::env::remove_var("LOGS_PATH");
    }

    #[test]
    fn admin_debug_hides_password() {
        let admin = AdminAccount {
            username: "root".to_string(),
            password: "hunter22".to_string(),
            tags: vec!["admin".to_string()],
        };
        assert!(!format!("{admin:?}").contains("hunter22"));
    }
}
