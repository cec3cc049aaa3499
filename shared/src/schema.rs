//! Schema validation for every payload that crosses the wire.
//!
//! Deserializing into a DTO and checking its schema are one step: a value of a
//! DTO type obtained through [`validate`] is always schema-valid and normalized.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A payload failed its schema. `path` points at the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Re-roots the path under `prefix`, e.g. `$.x` under `$.dto` becomes `$.dto.x`.
    pub fn under(mut self, prefix: &str) -> Self {
        self.path = match self.path.strip_prefix('$') {
            Some(rest) => format!("{}{}", prefix, rest),
            None => format!("{}.{}", prefix, self.path),
        };
        self
    }
}

/// JSONPath-like location used while walking a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath("$".to_string())
    }

    pub fn field(&self, name: &str) -> FieldPath {
        FieldPath(format!("{}.{}", self.0, name))
    }

    pub fn index(&self, index: usize) -> FieldPath {
        FieldPath(format!("{}[{}]", self.0, index))
    }

    pub fn fail(&self, reason: impl Into<String>) -> ValidationError {
        ValidationError::new(self.0.clone(), reason)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Implemented by every DTO: the schema of one request or response.
pub trait Schema: Sized {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError>;

    /// Canonical form of an accepted payload. Runs before `check`.
    fn normalize(self) -> Self {
        self
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        for (i, item) in self.iter().enumerate() {
            item.check(&at.index(i))?;
        }
        Ok(())
    }

    fn normalize(self) -> Self {
        self.into_iter().map(Schema::normalize).collect()
    }
}

/// Parses `payload` into `T`, normalizes it and checks it against its schema.
pub fn validate<T: Schema + DeserializeOwned>(payload: Value) -> Result<T, ValidationError> {
    let parsed: T = serde_json::from_value(payload)
        .map_err(|e| ValidationError::new("$", e.to_string()))?;
    validate_value(parsed)
}

/// Normalizes and checks a value that was built in-process.
pub fn validate_value<T: Schema>(value: T) -> Result<T, ValidationError> {
    let value = value.normalize();
    value.check(&FieldPath::root())?;
    Ok(value)
}

pub fn finite(at: &FieldPath, value: f32) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(at.fail(format!("expected a finite number, got {}", value)))
    }
}

pub fn non_negative(at: &FieldPath, value: f32) -> Result<(), ValidationError> {
    finite(at, value)?;
    if value < 0.0 {
        return Err(at.fail(format!("must not be negative, got {}", value)));
    }
    Ok(())
}

pub fn positive(at: &FieldPath, value: f32) -> Result<(), ValidationError> {
    finite(at, value)?;
    if value <= 0.0 {
        return Err(at.fail(format!("must be positive, got {}", value)));
    }
    Ok(())
}

pub fn non_empty(at: &FieldPath, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(at.fail("must not be empty"))
    } else {
        Ok(())
    }
}

pub fn max_chars(at: &FieldPath, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        Err(at.fail(format!("at most {} characters allowed, got {}", max, len)))
    } else {
        Ok(())
    }
}

/// Checks `0 <= current <= max` with `max > 0`.
pub fn health_pair(at: &FieldPath, current: f32, max: f32) -> Result<(), ValidationError> {
    positive(&at.field("maxHealth"), max)?;
    non_negative(&at.field("health"), current)?;
    if current > max {
        return Err(at
            .field("health")
            .fail(format!("{} exceeds maxHealth {}", current, max)));
    }
    Ok(())
}
