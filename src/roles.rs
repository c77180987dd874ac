//! Static role (tag) registry.
//!
//! Roles are read once at startup from a JSON file and never change while the
//! process runs.
//!
//! Permission names are `snake_case` (`edit_project`). Older role files spelled
//! them as phrases (`edit project`); those are rejected at load time with a hint
//! naming the canonical form instead of being silently translated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateProject,
    EditProject,
    DeleteProject,
    ReadProject,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::CreateProject,
        Permission::EditProject,
        Permission::DeleteProject,
        Permission::ReadProject,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::CreateProject => "create_project",
            Permission::EditProject => "edit_project",
            Permission::DeleteProject => "delete_project",
            Permission::ReadProject => "read_project",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission `{0}`")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoleConfigError {
    #[error("failed to read roles file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed roles file: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("role name must not be empty")]
    EmptyRoleName,
    #[error("role `{0}` is defined more than once")]
    DuplicateRole(String),
    #[error("role `{role}` grants unknown permission `{permission}`{hint}")]
    UnknownPermission {
        role: String,
        permission: String,
        hint: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDefinition {
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: BTreeMap<String, BTreeSet<Permission>>,
}

impl RoleRegistry {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoleConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RoleConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let registry = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), roles = registry.len(), "role registry loaded");
        Ok(registry)
    }

    pub fn from_json(raw: &str) -> Result<Self, RoleConfigError> {
        let definitions: Vec<RoleDefinition> = serde_json::from_str(raw)?;
        Self::from_definitions(definitions)
    }

    pub fn from_definitions(
        definitions: impl IntoIterator<Item = RoleDefinition>,
    ) -> Result<Self, RoleConfigError> {
        let mut roles = BTreeMap::new();

        for definition in definitions {
            let name = definition.name.trim().to_string();
            if name.is_empty() {
                return Err(RoleConfigError::EmptyRoleName);
            }
            if roles.contains_key(&name) {
                return Err(RoleConfigError::DuplicateRole(name));
            }

            let permissions = definition
                .permissions
                .iter()
                .map(|raw| parse_granted(&name, raw))
                .collect::<Result<BTreeSet<_>, _>>()?;

            roles.insert(name, permissions);
        }

        Ok(Self { roles })
    }

    /// True iff at least one of `roles` grants `permission`.
    ///
    /// Unknown roles grant nothing; an unknown permission is never granted.
    pub fn can<I, R>(&self, roles: I, permission: &str) -> bool
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        match permission.parse::<Permission>() {
            Ok(permission) => self.allows(roles, permission),
            Err(_) => false,
        }
    }

    pub fn allows<I, R>(&self, roles: I, permission: Permission) -> bool
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        roles.into_iter().any(|role| self.grants(role.as_ref(), permission))
    }

    pub fn grants(&self, role: &str, permission: Permission) -> bool {
        self.roles
            .get(role)
            .is_some_and(|permissions| permissions.contains(&permission))
    }

    pub fn permissions_for<I, R>(&self, roles: I) -> BTreeSet<Permission>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        roles
            .into_iter()
            .filter_map(|role| self.roles.get(role.as_ref()))
            .flatten()
            .copied()
            .collect()
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

fn parse_granted(role: &str, raw: &str) -> Result<Permission, RoleConfigError> {
    raw.parse::<Permission>().map_err(|_| {
        let canonical = raw.trim().to_lowercase().replace(' ', "_");
        let hint = match canonical.parse::<Permission>() {
            Ok(permission) if canonical != raw => {
                format!(" (permissions are snake_case, use `{permission}`)")
            }
            _ => String::new(),
        };

        RoleConfigError::UnknownPermission {
            role: role.to_string(),
            permission: raw.to_string(),
            hint,
        }
    })
}
