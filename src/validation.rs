//! Request payload validation.
//!
//! Each resource declares a [`Schema`]: the fields it accepts, whether each is
//! required, and the type its value must have. [`validate`] checks a JSON
//! object against a schema and reports every violation at once: missing
//! required fields, fields the schema does not declare, and values of the
//! wrong type.
//!
//! Validation only inspects the payload. Turning it into a typed request is
//! done afterwards with [`decode`].

use std::fmt;

use axum::extract::{FromRequest, Request};
use axum::{async_trait, Json};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};
use crate::models::project::{ProjectKey, ProjectState};

pub type Payload = Map<String, Value>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Any string, empty included.
    Text,
    /// A string with at least one non-whitespace character.
    Name,
    /// A [`Name`](FieldType::Name) that a route could not mistake for a project id.
    ProjectName,
    /// A `YYYY-MM-DD` calendar date.
    Date,
    /// A non-negative integer.
    Count,
    /// One of the [`ProjectState`] names.
    ProjectState,
}

impl FieldType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Name => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            FieldType::ProjectName => value
                .as_str()
                .is_some_and(|s| !s.trim().is_empty() && !ProjectKey::parse(s.trim()).is_id()),
            FieldType::Date => value
                .as_str()
                .is_some_and(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok()),
            FieldType::Count => value.as_i64().is_some_and(|n| n >= 0),
            FieldType::ProjectState => value
                .as_str()
                .is_some_and(|s| s.parse::<ProjectState>().is_ok()),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Name => "non-empty string",
            FieldType::ProjectName => "non-empty string that is not only digits",
            FieldType::Date => "date (YYYY-MM-DD)",
            FieldType::Count => "non-negative integer",
            FieldType::ProjectState => "one of Planned, Active, Almost, Done, Archived",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldType,
    pub required: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldType) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: FieldType) -> Self {
        Self { name, kind, required: false }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub resource: &'static str,
    pub fields: &'static [FieldRule],
}

impl Schema {
    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == field)
    }
}

pub mod schemas {
    use super::{FieldRule, FieldType, Schema};

    pub const PROJECT_CREATE: Schema = Schema {
        resource: "project",
        fields: &[
            FieldRule::required("name", FieldType::ProjectName),
            FieldRule::required("start_date", FieldType::Date),
            FieldRule::required("state", FieldType::ProjectState),
            FieldRule::required("description", FieldType::Text),
        ],
    };

    pub const PROJECT_UPDATE: Schema = Schema {
        resource: "project",
        fields: &[
            FieldRule::optional("name", FieldType::ProjectName),
            FieldRule::optional("start_date", FieldType::Date),
            FieldRule::optional("state", FieldType::ProjectState),
            FieldRule::optional("description", FieldType::Text),
        ],
    };

    pub const MEMBERSHIP_CREATE: Schema = Schema {
        resource: "membership",
        fields: &[
            FieldRule::required("entry_date", FieldType::Date),
            FieldRule::optional("contributions", FieldType::Count),
        ],
    };

    pub const LOGIN: Schema = Schema {
        resource: "login",
        fields: &[
            FieldRule::required("username", FieldType::Name),
            FieldRule::required("password", FieldType::Text),
        ],
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeError {
    pub field: String,
    pub expected: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub missing_fields: Vec<String>,
    pub invalid_fields: Vec<String>,
    pub type_errors: Vec<TypeError>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.missing_fields.is_empty() && self.invalid_fields.is_empty() && self.type_errors.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_fields.is_empty() {
            parts.push("Missing required fields");
        }
        if !self.invalid_fields.is_empty() {
            parts.push("Invalid fields provided");
        }
        if !self.type_errors.is_empty() {
            parts.push("Fields with invalid values");
        }
        if parts.is_empty() {
            return f.write_str("Invalid request body");
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Checks `payload` against `schema`, collecting every violation.
pub fn validate(payload: Payload, schema: &Schema) -> Result<Payload, ValidationError> {
    let missing_fields = schema
        .fields
        .iter()
        .filter(|rule| rule.required && !payload.contains_key(rule.name))
        .map(|rule| rule.name.to_string())
        .collect();

    let invalid_fields = payload
        .keys()
        .filter(|key| schema.rule(key).is_none())
        .cloned()
        .collect();

    let type_errors = schema
        .fields
        .iter()
        .filter_map(|rule| {
            let value = payload.get(rule.name)?;
            (!rule.kind.accepts(value)).then(|| TypeError {
                field: rule.name.to_string(),
                expected: rule.kind.describe(),
            })
        })
        .collect();

    let error = ValidationError {
        missing_fields,
        invalid_fields,
        type_errors,
    };

    if error.is_empty() {
        Ok(payload)
    } else {
        tracing::debug!(resource = schema.resource, ?error, "payload rejected");
        Err(error)
    }
}

/// Converts an already validated payload into its typed request.
pub fn decode<T: DeserializeOwned>(payload: Payload) -> AppResult<T> {
    serde_path_to_error::deserialize(Value::Object(payload)).map_err(|err| {
        let path = err.path().to_string();
        AppError::bad_request(format!("{path}: {}", err.into_inner()))
    })
}

/// JSON request body that must be an object.
#[derive(Debug, Clone)]
pub struct JsonPayload(pub Payload);

#[async_trait]
impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(AppError::bad_request("request body must be a JSON object")),
        }
    }
}
