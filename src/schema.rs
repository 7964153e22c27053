//! Schema validation of decoded header and payload JSON
//!
//! The parser checks the structure of a token string first, then hands the
//! decoded JSON to a [`Schema`] for each segment. A schema either produces
//! the typed value or a [`ValidationError`] naming the offending field.
//! Any `Fn(&Value) -> Result<T, ValidationError>` is a schema.

use crate::algorithm::Algorithm;
use crate::config::{FieldSpec, TokenConfig};
use crate::error::Error;
use crate::token::{Header, Payload};

use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// A value that does not fit its schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render(.path, .message))]
pub struct ValidationError {
    /// Field the error refers to; empty for the whole value
    pub path: String,
    pub message: String,
}

fn render(path: &str, message: &str) -> String {
    if path.is_empty() {
        message.to_string()
    } else {
        format!("'{path}' {message}")
    }
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validates decoded JSON into a typed value
pub trait Schema<T>: Send + Sync {
    fn validate(&self, value: &Value) -> Result<T, ValidationError>;
}

impl<T, F> Schema<T> for F
where
    F: Fn(&Value) -> Result<T, ValidationError> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<T, ValidationError> {
        self(value)
    }
}

/// Header schema derived from a [`TokenConfig`]
///
/// `alg` must be in the configured algorithm set, `typ` (when present)
/// must equal the configured type ignoring ASCII case, and declared fields
/// must be present when required and of the declared kind.
#[derive(Debug, Clone)]
pub struct HeaderSchema {
    config: Arc<TokenConfig>,
}

impl HeaderSchema {
    pub fn new(config: Arc<TokenConfig>) -> Self {
        Self { config }
    }
}

impl Schema<Header> for HeaderSchema {
    fn validate(&self, value: &Value) -> Result<Header, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::new("", "header must be a JSON object"))?;

        let alg = match object.get("alg") {
            Some(Value::String(alg)) => alg,
            Some(_) => return Err(ValidationError::new("alg", "must be a string")),
            None => return Err(ValidationError::new("alg", "is required")),
        };
        let algorithm = alg
            .parse::<Algorithm>()
            .map_err(|_| ValidationError::new("alg", format!("unsupported algorithm '{alg}'")))?;
        let policy = self.config.algorithms();
        if !policy.is_allowed(&algorithm) {
            let allowed: Vec<&str> = policy.allowed_algorithms().iter().map(|a| a.as_str()).collect();
            return Err(ValidationError::new(
                "alg",
                format!("'{alg}' is not one of {allowed:?}"),
            ));
        }

        match object.get("typ") {
            None => {}
            Some(Value::String(typ)) if typ.eq_ignore_ascii_case(self.config.token_type()) => {}
            Some(Value::String(typ)) => {
                return Err(ValidationError::new(
                    "typ",
                    format!("expected '{}', found '{typ}'", self.config.token_type()),
                ));
            }
            Some(_) => return Err(ValidationError::new("typ", "must be a string")),
        }

        check_declared(object, self.config.header_fields())?;

        Header::from_json(value).map_err(into_validation_error)
    }
}

/// Payload schema derived from a [`TokenConfig`]
///
/// `exp` and every configured required claim must be present; standard
/// claims must have their standard types; declared claims must be present
/// when required and of the declared kind.
#[derive(Debug, Clone)]
pub struct PayloadSchema {
    config: Arc<TokenConfig>,
}

impl PayloadSchema {
    pub fn new(config: Arc<TokenConfig>) -> Self {
        Self { config }
    }
}

impl Schema<Payload> for PayloadSchema {
    fn validate(&self, value: &Value) -> Result<Payload, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::new("", "payload must be a JSON object"))?;

        for name in self.config.required_claims().names() {
            if !object.contains_key(name) {
                return Err(ValidationError::new(name, "is required"));
            }
        }

        for name in ["exp", "nbf", "iat"] {
            if let Some(value) = object.get(name) {
                if !value.is_number() {
                    return Err(ValidationError::new(name, "must be a number"));
                }
            }
        }

        check_declared(object, self.config.payload_fields())?;

        Payload::from_json(value).map_err(into_validation_error)
    }
}

fn check_declared(object: &Map<String, Value>, fields: &[FieldSpec]) -> Result<(), ValidationError> {
    for field in fields {
        match object.get(&field.name) {
            None if field.required => {
                return Err(ValidationError::new(&field.name, "is required"));
            }
            None => {}
            Some(value) if field.kind.accepts(value) => {}
            Some(_) => {
                return Err(ValidationError::new(
                    &field.name,
                    format!("must be {}", field.kind.as_str()),
                ));
            }
        }
    }
    Ok(())
}

fn into_validation_error(error: Error) -> ValidationError {
    match error {
        Error::ClaimSchema { source, .. } => source,
        Error::InvalidTimestamp { claim, .. } => {
            ValidationError::new(claim, "is not a valid timestamp")
        }
        other => ValidationError::new("", other.to_string()),
    }
}
