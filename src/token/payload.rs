use super::numeric_date::NumericDate;
use crate::error::{Error, Result};
use crate::schema::ValidationError;
use crate::utils::base64url;

use serde_json::{Map, Value};
use std::time::SystemTime;

/// Claim names owned by [`Payload`] itself
pub const RESERVED_CLAIM_NAMES: [&str; 7] = ["iss", "sub", "aud", "exp", "nbf", "iat", "jti"];

/// Intended recipients of a token, given as one value or many
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// Normalize to a list
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Audience::One(audience) => vec![audience],
            Audience::Many(audiences) => audiences,
        }
    }
}

impl From<&str> for Audience {
    fn from(audience: &str) -> Self {
        Audience::One(audience.to_string())
    }
}

impl From<String> for Audience {
    fn from(audience: String) -> Self {
        Audience::One(audience)
    }
}

impl From<Vec<String>> for Audience {
    fn from(audiences: Vec<String>) -> Self {
        Audience::Many(audiences)
    }
}

impl From<Vec<&str>> for Audience {
    fn from(audiences: Vec<&str>) -> Self {
        Audience::Many(audiences.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Audience {
    fn from(audiences: [&str; N]) -> Self {
        Audience::Many(audiences.into_iter().map(str::to_string).collect())
    }
}

/// Token payload: the standard claim set plus additional claims
///
/// `exp` is mandatory. Absent optional claims are omitted from the JSON form
/// rather than written as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    issuer: Option<String>,
    subject: Option<String>,
    audience: Option<Vec<String>>,
    expiration: NumericDate,
    not_before: Option<NumericDate>,
    issued_at: Option<NumericDate>,
    jwt_id: Option<String>,
    additional: Map<String, Value>,
}

impl Payload {
    /// Create a payload that expires at `expiration`
    pub fn new(expiration: impl Into<NumericDate>) -> Self {
        Self {
            issuer: None,
            subject: None,
            audience: None,
            expiration: expiration.into(),
            not_before: None,
            issued_at: None,
            jwt_id: None,
            additional: Map::new(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<Audience>) -> Self {
        self.audience = Some(audience.into().into_vec());
        self
    }

    pub fn with_expiration(mut self, expiration: impl Into<NumericDate>) -> Self {
        self.expiration = expiration.into();
        self
    }

    pub fn with_not_before(mut self, not_before: impl Into<NumericDate>) -> Self {
        self.not_before = Some(not_before.into());
        self
    }

    pub fn with_issued_at(mut self, issued_at: impl Into<NumericDate>) -> Self {
        self.issued_at = Some(issued_at.into());
        self
    }

    pub fn with_jwt_id(mut self, jwt_id: impl Into<String>) -> Self {
        self.jwt_id = Some(jwt_id.into());
        self
    }

    /// Add an additional claim
    ///
    /// The seven standard claim names are rejected with [`Error::ReservedClaimName`].
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let name = name.into();
        if RESERVED_CLAIM_NAMES.contains(&name.as_str()) {
            return Err(Error::ReservedClaimName(name));
        }
        self.additional.insert(name, value.into());
        Ok(self)
    }

    /// Add several additional claims, in iteration order
    pub fn with_claims(self, claims: impl IntoIterator<Item = (String, Value)>) -> Result<Self> {
        claims
            .into_iter()
            .try_fold(self, |payload, (name, value)| payload.with_claim(name, value))
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Audience list, `None` when the claim is absent
    pub fn audience(&self) -> Option<&[String]> {
        self.audience.as_deref()
    }

    pub fn expiration(&self) -> NumericDate {
        self.expiration
    }

    pub fn not_before(&self) -> Option<NumericDate> {
        self.not_before
    }

    pub fn issued_at(&self) -> Option<NumericDate> {
        self.issued_at
    }

    pub fn jwt_id(&self) -> Option<&str> {
        self.jwt_id.as_deref()
    }

    /// Additional claims, in insertion order
    pub fn additional(&self) -> &Map<String, Value> {
        &self.additional
    }

    /// Look up an additional claim
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.additional.get(name)
    }

    /// Expiration as `SystemTime`
    pub fn expires_at(&self) -> SystemTime {
        self.expiration.to_system_time()
    }

    /// JSON form: `iss, sub, aud, exp, nbf, iat, jti`, then additional claims
    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(self.additional.len() + RESERVED_CLAIM_NAMES.len());
        if let Some(issuer) = &self.issuer {
            object.insert("iss".to_string(), Value::from(issuer.as_str()));
        }
        if let Some(subject) = &self.subject {
            object.insert("sub".to_string(), Value::from(subject.as_str()));
        }
        if let Some(audience) = &self.audience {
            object.insert(
                "aud".to_string(),
                Value::Array(audience.iter().map(|a| Value::from(a.as_str())).collect()),
            );
        }
        object.insert("exp".to_string(), self.expiration.to_json());
        if let Some(not_before) = &self.not_before {
            object.insert("nbf".to_string(), not_before.to_json());
        }
        if let Some(issued_at) = &self.issued_at {
            object.insert("iat".to_string(), issued_at.to_json());
        }
        if let Some(jwt_id) = &self.jwt_id {
            object.insert("jti".to_string(), Value::from(jwt_id.as_str()));
        }
        for (name, value) in &self.additional {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }

    /// Base64URL segment of the compact JSON form
    pub fn encode(&self) -> String {
        base64url::encode(&self.to_json().to_string())
    }

    /// Build a payload from its JSON form
    ///
    /// `aud` may be a single string or a list of strings.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| payload_shape("", "payload must be a JSON object"))?;

        let expiration = match object.get("exp") {
            Some(exp) => NumericDate::from_json_for("exp", exp)?,
            None => return Err(payload_shape("exp", "is required")),
        };

        Ok(Self {
            issuer: optional_string(object, "iss")?,
            subject: optional_string(object, "sub")?,
            audience: audience_claim(object)?,
            expiration,
            not_before: optional_date(object, "nbf")?,
            issued_at: optional_date(object, "iat")?,
            jwt_id: optional_string(object, "jti")?,
            additional: object
                .iter()
                .filter(|(name, _)| !RESERVED_CLAIM_NAMES.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        })
    }

    /// Decode a payload from its Base64URL segment
    pub fn decode(segment: &str) -> Result<Self> {
        let json = base64url::decode(segment)?;
        let value: Value = serde_json::from_str(&json)
            .map_err(|e| Error::Decode(format!("Failed to parse payload: {e}")))?;
        Self::from_json(&value)
    }
}

fn payload_shape(path: &str, message: &str) -> Error {
    Error::ClaimSchema {
        segment: "payload",
        source: ValidationError::new(path, message),
    }
}

fn optional_string(object: &Map<String, Value>, name: &str) -> Result<Option<String>> {
    match object.get(name) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(payload_shape(name, "must be a string")),
    }
}

fn optional_date(object: &Map<String, Value>, name: &str) -> Result<Option<NumericDate>> {
    object
        .get(name)
        .map(|value| NumericDate::from_json_for(name, value))
        .transpose()
}

fn audience_claim(object: &Map<String, Value>) -> Result<Option<Vec<String>>> {
    match object.get("aud") {
        None => Ok(None),
        Some(Value::String(audience)) => Ok(Some(vec![audience.clone()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(audience) => Ok(audience.clone()),
                _ => Err(payload_shape("aud", "must contain only strings")),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(payload_shape("aud", "must be a string or a list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};

    fn exp() -> NumericDate {
        NumericDate::from_seconds(1_700_000_000.0).unwrap()
    }

    #[test]
    fn test_expires_at() {
        let time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_007);
        assert_eq!(Payload::new(time).expires_at(), time);
    }

    #[test]
    fn test_absent_claims_are_omitted() {
        let payload = Payload::new(exp());
        assert_eq!(payload.to_json().to_string(), r#"{"exp":1700000000}"#);
    }

    #[test]
    fn test_claim_order() {
        let payload = Payload::new(exp())
            .with_jwt_id("id")
            .with_audience("svc")
            .with_subject("user")
            .with_issuer("auth")
            .with_claim("role", "admin")
            .unwrap();
        assert_eq!(
            payload.to_json().to_string(),
            r#"{"iss":"auth","sub":"user","aud":["svc"],"exp":1700000000,"jti":"id","role":"admin"}"#
        );
    }

    #[test]
    fn test_reserved_claims_rejected() {
        for name in RESERVED_CLAIM_NAMES {
            assert!(matches!(
                Payload::new(exp()).with_claim(name, 1),
                Err(Error::ReservedClaimName(_))
            ));
        }
    }

    #[test]
    fn test_scalar_audience_accepted() {
        let payload = Payload::from_json(&json!({"exp": 1, "aud": "svc"})).unwrap();
        assert_eq!(payload.audience(), Some(&["svc".to_string()][..]));
        assert_eq!(payload.to_json()["aud"], json!(["svc"]));
    }

    #[test]
    fn test_from_json_partitions_claims() {
        let payload = Payload::from_json(&json!({
            "iss": "auth",
            "exp": 1700000000.5,
            "iat": 1699999999,
            "tenant": "acme",
            "roles": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(payload.issuer(), Some("auth"));
        assert_eq!(payload.expiration().as_millis(), 1_700_000_000_500);
        assert_eq!(payload.issued_at().unwrap().as_seconds(), 1_699_999_999.0);
        assert_eq!(payload.additional().len(), 2);
        assert_eq!(payload.get("tenant"), Some(&json!("acme")));
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            Payload::from_json(&json!({"sub": "x"})),
            Err(Error::ClaimSchema { segment: "payload", .. })
        ));
        assert!(matches!(
            Payload::from_json(&json!({"exp": "tomorrow"})),
            Err(Error::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            Payload::from_json(&json!({"exp": 1, "aud": [1]})),
            Err(Error::ClaimSchema { .. })
        ));
        assert!(matches!(
            Payload::from_json(&json!({"exp": 1, "iss": 7})),
            Err(Error::ClaimSchema { .. })
        ));
    }

    #[test]
    fn test_audience_conversions() {
        assert_eq!(Audience::from("a").into_vec(), vec!["a".to_string()]);
        assert_eq!(
            Audience::from(["a", "b"]).into_vec(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(Audience::from(Vec::<String>::new()).into_vec().is_empty());
    }

    #[test]
    fn test_decode_round_trip() {
        let payload = Payload::new(exp())
            .with_not_before(NumericDate::from_seconds(1_600_000_000.25).unwrap())
            .with_audience(Vec::<String>::new())
            .with_claim("n", 1.5)
            .unwrap();
        assert_eq!(Payload::decode(&payload.encode()).unwrap(), payload);
    }
}
