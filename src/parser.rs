//! Token parsing
//!
//! Parsing runs in two steps. The structural step splits the string into
//! segments and decodes each one to JSON; failures there are
//! [`Error::MalformedToken`], [`Error::TokenTooLarge`] or [`Error::Decode`].
//! The schema step checks the decoded JSON against the header and payload
//! schemas; failures there are [`Error::ClaimSchema`].

use crate::config::TokenConfig;
use crate::error::{Error, Result};
use crate::schema::{HeaderSchema, PayloadSchema, Schema};
use crate::token::{Header, Payload, RawToken, Token};

use std::sync::Arc;

/// Whether parsed tokens must, or must not, carry a signature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureRequirement {
    /// Signed and unsigned tokens are both accepted
    #[default]
    Any,
    Signed,
    Unsigned,
}

/// Turns token strings into [`Token`]s
pub trait Parses: Send + Sync {
    /// Parse and schema-check a compact token string
    fn parse_token(&self, token: &str) -> Result<Token>;
}

/// Parser configured by a [`TokenConfig`]
#[derive(Clone)]
pub struct Parser {
    config: Arc<TokenConfig>,
    header_schema: Arc<dyn Schema<Header>>,
    payload_schema: Arc<dyn Schema<Payload>>,
    signature: SignatureRequirement,
}

impl Parser {
    /// Parser with the default schemas that accepts signed and unsigned tokens
    pub fn new(config: impl Into<Arc<TokenConfig>>) -> Self {
        ParserBuilder::new(config).build()
    }

    pub fn builder(config: impl Into<Arc<TokenConfig>>) -> ParserBuilder {
        ParserBuilder::new(config)
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn signature_requirement(&self) -> SignatureRequirement {
        self.signature
    }
}

impl Parses for Parser {
    fn parse_token(&self, token: &str) -> Result<Token> {
        let raw = RawToken::split(token)?;

        let header = self
            .header_schema
            .validate(&raw.header)
            .map_err(|source| Error::ClaimSchema {
                segment: "header",
                source,
            })?;
        let payload = self
            .payload_schema
            .validate(&raw.payload)
            .map_err(|source| Error::ClaimSchema {
                segment: "payload",
                source,
            })?;

        match (self.signature, raw.signature.is_some()) {
            (SignatureRequirement::Signed, false) => {
                return Err(Error::MalformedToken("token is not signed".to_string()));
            }
            (SignatureRequirement::Unsigned, true) => {
                return Err(Error::MalformedToken("token is signed".to_string()));
            }
            _ => {}
        }

        Ok(Token::from_raw(header, payload, raw))
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("config", &self.config)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Parser`]
#[derive(Clone)]
pub struct ParserBuilder {
    config: Arc<TokenConfig>,
    header_schema: Option<Arc<dyn Schema<Header>>>,
    payload_schema: Option<Arc<dyn Schema<Payload>>>,
    signature: SignatureRequirement,
}

impl ParserBuilder {
    pub fn new(config: impl Into<Arc<TokenConfig>>) -> Self {
        Self {
            config: config.into(),
            header_schema: None,
            payload_schema: None,
            signature: SignatureRequirement::Any,
        }
    }

    /// Replace the default header schema
    pub fn header_schema(&mut self, schema: impl Schema<Header> + 'static) -> &mut Self {
        self.header_schema = Some(Arc::new(schema));
        self
    }

    /// Replace the default payload schema
    pub fn payload_schema(&mut self, schema: impl Schema<Payload> + 'static) -> &mut Self {
        self.payload_schema = Some(Arc::new(schema));
        self
    }

    /// Configure whether tokens must be signed
    pub fn signature(&mut self, requirement: SignatureRequirement) -> &mut Self {
        self.signature = requirement;
        self
    }

    pub fn build(&self) -> Parser {
        let header_schema = self
            .header_schema
            .clone()
            .unwrap_or_else(|| Arc::new(HeaderSchema::new(Arc::clone(&self.config))));
        let payload_schema = self
            .payload_schema
            .clone()
            .unwrap_or_else(|| Arc::new(PayloadSchema::new(Arc::clone(&self.config))));

        Parser {
            config: Arc::clone(&self.config),
            header_schema,
            payload_schema,
            signature: self.signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{Algorithm, AlgorithmPolicy};
    use crate::schema::ValidationError;
    use crate::token::NumericDate;
    use crate::utils::base64url;
    use serde_json::{Value, json};

    fn segment(value: Value) -> String {
        base64url::encode(&value.to_string())
    }

    fn token_string(header: Value, payload: Value, signature: &str) -> String {
        format!("{}.{}.{}", segment(header), segment(payload), signature)
    }

    fn parser() -> Parser {
        Parser::new(TokenConfig::default())
    }

    #[test]
    fn test_parses_valid_token() {
        let text = token_string(
            json!({"alg": "HS256", "typ": "JWT"}),
            json!({"sub": "user", "exp": 1700000000}),
            "c2ln",
        );
        let token = parser().parse_token(&text).unwrap();
        assert_eq!(token.algorithm(), Algorithm::HS256);
        assert_eq!(token.payload().subject(), Some("user"));
        assert!(token.is_signed());
        assert_eq!(token.to_string(), text);
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            parser().parse_token("onlyonepart"),
            Err(Error::MalformedToken(_))
        ));
        let bad_header = base64url::encode("{oops");
        assert!(matches!(
            parser().parse_token(&format!("{bad_header}..sig")),
            Err(Error::Decode(_))
        ));
        assert!(matches!(
            parser().parse_token("!!!.eyJleHAiOjF9."),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_disallowed_algorithm_is_schema_error() {
        let parser = Parser::new(
            TokenConfig::builder()
                .algorithms(AlgorithmPolicy::allow_only([Algorithm::ES256]))
                .build()
                .unwrap(),
        );
        let text = token_string(json!({"alg": "HS256"}), json!({"exp": 1}), "");
        assert!(matches!(
            parser.parse_token(&text),
            Err(Error::ClaimSchema { segment: "header", source }) if source.path == "alg"
        ));

        let unknown = token_string(json!({"alg": "none"}), json!({"exp": 1}), "");
        assert!(matches!(
            parser.parse_token(&unknown),
            Err(Error::ClaimSchema { segment: "header", .. })
        ));
    }

    #[test]
    fn test_payload_schema_error() {
        let text = token_string(json!({"alg": "HS256"}), json!({"sub": "no-exp"}), "");
        assert!(matches!(
            parser().parse_token(&text),
            Err(Error::ClaimSchema { segment: "payload", source }) if source.path == "exp"
        ));
    }

    #[test]
    fn test_signature_requirement() {
        let unsigned = token_string(json!({"alg": "HS256"}), json!({"exp": 1}), "");
        let signed = token_string(json!({"alg": "HS256"}), json!({"exp": 1}), "c2ln");

        let mut builder = Parser::builder(TokenConfig::default());
        let must_sign = builder.signature(SignatureRequirement::Signed).build();
        assert!(matches!(
            must_sign.parse_token(&unsigned),
            Err(Error::MalformedToken(_))
        ));
        assert!(must_sign.parse_token(&signed).is_ok());

        let must_not_sign = builder.signature(SignatureRequirement::Unsigned).build();
        assert!(must_not_sign.parse_token(&unsigned).is_ok());
        assert!(matches!(
            must_not_sign.parse_token(&signed),
            Err(Error::MalformedToken(_))
        ));

        assert!(parser().parse_token(&unsigned).is_ok());
        assert!(parser().parse_token(&signed).is_ok());
    }

    #[test]
    fn test_custom_payload_schema() {
        let parser = Parser::builder(TokenConfig::default())
            .payload_schema(|value: &Value| -> std::result::Result<Payload, ValidationError> {
                let exp = value
                    .get("exp")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| ValidationError::new("exp", "is required"))?;
                if value.get("scope").is_none() {
                    return Err(ValidationError::new("scope", "is required"));
                }
                let exp = NumericDate::from_seconds(exp)
                    .map_err(|e| ValidationError::new("exp", e.to_string()))?;
                Payload::new(exp)
                    .with_claim("scope", value["scope"].clone())
                    .map_err(|e| ValidationError::new("", e.to_string()))
            })
            .build();

        let text = token_string(json!({"alg": "HS256"}), json!({"exp": 5}), "");
        assert!(matches!(
            parser.parse_token(&text),
            Err(Error::ClaimSchema { source, .. }) if source.path == "scope"
        ));

        let text = token_string(json!({"alg": "HS256"}), json!({"exp": 5, "scope": "read"}), "");
        let token = parser.parse_token(&text).unwrap();
        assert_eq!(token.payload().get("scope"), Some(&json!("read")));
    }
}
