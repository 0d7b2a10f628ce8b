use serde::Deserialize;
use serde_json::Value;

use crate::services::{JsonObject, ServiceError};

pub const DEFAULT_LIMIT: u64 = 25;
pub const MAX_LIMIT: u64 = 100;

/// Per-item parameters, keyed in camelCase (`organizationName`, `returnAll`, ...).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Parameters(JsonObject);

impl Parameters {
    pub fn new(values: JsonObject) -> Self {
        Self(values)
    }

    fn present(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    /// Required scalar rendered as a string. Numbers are accepted for ids.
    pub fn string(&self, name: &str) -> Result<String, ServiceError> {
        match self.present(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(ServiceError::InvalidInput(format!(
                "Parameter \"{}\" must be a string",
                name
            ))),
            None => Err(ServiceError::MissingParameter(name.to_string())),
        }
    }

    /// Required, non-blank path identifier.
    pub fn identifier(&self, name: &str) -> Result<String, ServiceError> {
        let value = self.string(name)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::MissingParameter(name.to_string()));
        }
        Ok(trimmed.to_string())
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.present(name).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Page size for non-`returnAll` listings; 1 to 100, default 25.
    pub fn limit(&self) -> Result<u64, ServiceError> {
        let Some(value) = self.present("limit") else {
            return Ok(DEFAULT_LIMIT);
        };

        match value.as_u64() {
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
            _ => Err(ServiceError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            ))),
        }
    }

    /// Optional nested object such as `filters` or `additionalFields`.
    pub fn collection(&self, name: &str) -> Result<JsonObject, ServiceError> {
        match self.present(name) {
            None => Ok(JsonObject::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(ServiceError::InvalidInput(format!(
                "Parameter \"{}\" must be an object",
                name
            ))),
        }
    }

    /// Required list of strings. A comma-separated string is also accepted.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, ServiceError> {
        match self.present(name) {
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| {
                    value.as_str().map(str::to_string).ok_or_else(|| {
                        ServiceError::InvalidInput(format!(
                            "Parameter \"{}\" must contain only strings",
                            name
                        ))
                    })
                })
                .collect(),
            Some(Value::String(s)) => Ok(split_list(s)),
            Some(_) => Err(ServiceError::InvalidInput(format!(
                "Parameter \"{}\" must be a list",
                name
            ))),
            None => Err(ServiceError::MissingParameter(name.to_string())),
        }
    }
}

impl From<JsonObject> for Parameters {
    fn from(values: JsonObject) -> Self {
        Self(values)
    }
}

/// `"a, b,,c"` -> `["a", "b", "c"]`.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
