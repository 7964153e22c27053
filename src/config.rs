//! Token configuration
//!
//! A [`TokenConfig`] fixes, once, the shape every token handled by a
//! parser, verifier or issuer must have: which algorithms may appear in
//! `alg`, the expected `typ`, which optional standard claims are mandatory,
//! and which application-specific header fields and claims are declared.

use crate::algorithm::AlgorithmPolicy;
use crate::error::{Error, Result};
use crate::token::{DEFAULT_TOKEN_TYPE, RESERVED_CLAIM_NAMES, RESERVED_HEADER_NAMES};

use serde_json::Value;
use std::collections::HashSet;

/// JSON type expected for a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    /// A number without a fractional part
    Integer,
    Boolean,
    Array,
    Object,
    /// Any JSON value, including `null`
    Any,
}

impl FieldKind {
    /// Whether `value` has this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
            FieldKind::Any => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Integer => "an integer",
            FieldKind::Boolean => "a boolean",
            FieldKind::Array => "an array",
            FieldKind::Object => "an object",
            FieldKind::Any => "any value",
        }
    }
}

/// An application-specific header field or claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Optional standard claims that must be present
///
/// `exp` is always required and is not listed here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiredClaims {
    pub issuer: bool,
    pub subject: bool,
    pub audience: bool,
    pub not_before: bool,
    pub issued_at: bool,
    pub jwt_id: bool,
}

impl RequiredClaims {
    /// Require only `exp`
    pub fn new() -> Self {
        Self::default()
    }

    /// Require every standard claim
    pub fn all() -> Self {
        Self {
            issuer: true,
            subject: true,
            audience: true,
            not_before: true,
            issued_at: true,
            jwt_id: true,
        }
    }

    pub fn issuer(mut self) -> Self {
        self.issuer = true;
        self
    }

    pub fn subject(mut self) -> Self {
        self.subject = true;
        self
    }

    pub fn audience(mut self) -> Self {
        self.audience = true;
        self
    }

    pub fn not_before(mut self) -> Self {
        self.not_before = true;
        self
    }

    pub fn issued_at(mut self) -> Self {
        self.issued_at = true;
        self
    }

    pub fn jwt_id(mut self) -> Self {
        self.jwt_id = true;
        self
    }

    /// Claim names that must be present, `exp` included
    pub(crate) fn names(&self) -> Vec<&'static str> {
        let mut names = vec!["exp"];
        for (required, name) in [
            (self.issuer, "iss"),
            (self.subject, "sub"),
            (self.audience, "aud"),
            (self.not_before, "nbf"),
            (self.issued_at, "iat"),
            (self.jwt_id, "jti"),
        ] {
            if required {
                names.push(name);
            }
        }
        names
    }
}

/// Validated, immutable token configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TokenConfig {
    algorithms: AlgorithmPolicy,
    token_type: String,
    required_claims: RequiredClaims,
    header_fields: Vec<FieldSpec>,
    payload_fields: Vec<FieldSpec>,
}

impl TokenConfig {
    pub fn builder() -> TokenConfigBuilder {
        TokenConfigBuilder::new()
    }

    pub fn algorithms(&self) -> &AlgorithmPolicy {
        &self.algorithms
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn required_claims(&self) -> RequiredClaims {
        self.required_claims
    }

    pub fn header_fields(&self) -> &[FieldSpec] {
        &self.header_fields
    }

    pub fn payload_fields(&self) -> &[FieldSpec] {
        &self.payload_fields
    }
}

impl Default for TokenConfig {
    /// Every supported algorithm, `typ` `JWT`, only `exp` required
    fn default() -> Self {
        Self {
            algorithms: AlgorithmPolicy::allow_all(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            required_claims: RequiredClaims::default(),
            header_fields: Vec::new(),
            payload_fields: Vec::new(),
        }
    }
}

/// Builder for [`TokenConfig`]
#[derive(Debug, Clone)]
pub struct TokenConfigBuilder {
    algorithms: AlgorithmPolicy,
    token_type: String,
    required_claims: RequiredClaims,
    header_fields: Vec<FieldSpec>,
    payload_fields: Vec<FieldSpec>,
}

impl TokenConfigBuilder {
    /// Start from the defaults of [`TokenConfig::default`]
    pub fn new() -> Self {
        Self {
            algorithms: AlgorithmPolicy::allow_all(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            required_claims: RequiredClaims::default(),
            header_fields: Vec::new(),
            payload_fields: Vec::new(),
        }
    }

    /// Configure the algorithm policy
    pub fn algorithms(&mut self, policy: AlgorithmPolicy) -> &mut Self {
        self.algorithms = policy;
        self
    }

    /// Configure the expected `typ` (compared case-insensitively)
    pub fn token_type(&mut self, token_type: impl Into<String>) -> &mut Self {
        self.token_type = token_type.into();
        self
    }

    /// Configure which optional standard claims are mandatory
    pub fn require(&mut self, claims: RequiredClaims) -> &mut Self {
        self.required_claims = claims;
        self
    }

    /// Declare an additional header field
    pub fn header_field(&mut self, field: FieldSpec) -> &mut Self {
        self.header_fields.push(field);
        self
    }

    /// Declare an additional payload claim
    pub fn payload_field(&mut self, field: FieldSpec) -> &mut Self {
        self.payload_fields.push(field);
        self
    }

    /// Validate and freeze the configuration
    pub fn build(&self) -> Result<TokenConfig> {
        if self.algorithms.is_empty() {
            return Err(Error::Configuration(
                "at least one algorithm must be allowed".to_string(),
            ));
        }
        if self.token_type.trim().is_empty() {
            return Err(Error::Configuration("token type must not be empty".to_string()));
        }
        check_fields(&self.header_fields, &RESERVED_HEADER_NAMES)?;
        check_fields(&self.payload_fields, &RESERVED_CLAIM_NAMES)?;

        Ok(TokenConfig {
            algorithms: self.algorithms.clone(),
            token_type: self.token_type.clone(),
            required_claims: self.required_claims,
            header_fields: self.header_fields.clone(),
            payload_fields: self.payload_fields.clone(),
        })
    }
}

impl Default for TokenConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_fields(fields: &[FieldSpec], reserved: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if reserved.contains(&field.name.as_str()) {
            return Err(Error::ReservedClaimName(field.name.clone()));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(Error::DuplicateField(field.name.clone()));
        }
    }
    Ok(())
}
