use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::schema::ValidationError;
use crate::utils::base64url;

use serde_json::{Map, Value};

/// Header field names owned by [`Header`] itself
pub const RESERVED_HEADER_NAMES: [&str; 2] = ["alg", "typ"];

/// Default `typ` value
pub const DEFAULT_TOKEN_TYPE: &str = "JWT";

/// Token header: algorithm, type and any additional fields
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    algorithm: Algorithm,
    token_type: String,
    additional: Map<String, Value>,
}

impl Header {
    /// Create a header for `algorithm` with `typ` set to `JWT`
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            additional: Map::new(),
        }
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    /// Add an additional header field
    ///
    /// `alg` and `typ` are rejected with [`Error::ReservedClaimName`].
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let name = name.into();
        if RESERVED_HEADER_NAMES.contains(&name.as_str()) {
            return Err(Error::ReservedClaimName(name));
        }
        self.additional.insert(name, value.into());
        Ok(self)
    }

    /// Add several additional header fields, in iteration order
    pub fn with_fields(self, fields: impl IntoIterator<Item = (String, Value)>) -> Result<Self> {
        fields
            .into_iter()
            .try_fold(self, |header, (name, value)| header.with_field(name, value))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Additional header fields, in insertion order
    pub fn additional(&self) -> &Map<String, Value> {
        &self.additional
    }

    /// Look up an additional header field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.additional.get(name)
    }

    /// JSON form: `alg`, `typ`, then additional fields
    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(self.additional.len() + 2);
        object.insert("alg".to_string(), Value::from(self.algorithm.as_str()));
        object.insert("typ".to_string(), Value::from(self.token_type.as_str()));
        for (name, value) in &self.additional {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }

    /// Base64URL segment of the compact JSON form
    pub fn encode(&self) -> String {
        base64url::encode(&self.to_json().to_string())
    }

    /// Build a header from its JSON form
    ///
    /// `alg` must name a supported algorithm; a missing `typ` defaults to `JWT`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| header_shape("", "header must be a JSON object"))?;

        let algorithm = match object.get("alg") {
            Some(Value::String(alg)) => alg.parse::<Algorithm>()?,
            Some(_) => return Err(header_shape("alg", "must be a string")),
            None => return Err(header_shape("alg", "is required")),
        };

        let token_type = match object.get("typ") {
            Some(Value::String(typ)) => typ.clone(),
            Some(_) => return Err(header_shape("typ", "must be a string")),
            None => DEFAULT_TOKEN_TYPE.to_string(),
        };

        let additional = object
            .iter()
            .filter(|(name, _)| !RESERVED_HEADER_NAMES.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            algorithm,
            token_type,
            additional,
        })
    }

    /// Decode a header from its Base64URL segment
    pub fn decode(segment: &str) -> Result<Self> {
        let json = base64url::decode(segment)?;
        let value: Value = serde_json::from_str(&json)
            .map_err(|e| Error::Decode(format!("Failed to parse header: {e}")))?;
        Self::from_json(&value)
    }
}

fn header_shape(path: &str, message: &str) -> Error {
    Error::ClaimSchema {
        segment: "header",
        source: ValidationError::new(path, message),
    }
}
