//! The token value type
//!
//! A [`Token`] owns one [`Header`], one [`Payload`] and an optional
//! [`Signature`]. Tokens are immutable; signing produces a new token.
//!
//! A token decoded from a string remembers the exact header and payload
//! segments it was read from, so [`Token::signing_input`] and `to_string()`
//! reproduce the input byte for byte even when another library serialized
//! the JSON differently. Equality ignores those cached segments.

use super::{Header, Payload, Signature};
use crate::algorithm::{Algorithm, KeyVerifier, Signer};
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::limits::{MAX_DECODED_HEADER_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_TOKEN_LENGTH};
use crate::trust::IssuerTrust;
use crate::utils::base64url;

use serde_json::{Map, Value};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Safety margin applied before `exp` when none is given
pub const DEFAULT_EXPIRATION_RESERVE: Duration = Duration::from_millis(1000);

/// A signed or unsigned token
#[derive(Debug, Clone)]
pub struct Token {
    header: Header,
    payload: Payload,
    signature: Option<Signature>,
    encoded: Option<EncodedSegments>,
}

#[derive(Debug, Clone)]
struct EncodedSegments {
    header: String,
    payload: String,
}

/// A token string after the structural step: segments split, decoded and
/// parsed as JSON, but not yet checked against any schema
pub(crate) struct RawToken {
    pub(crate) header_segment: String,
    pub(crate) payload_segment: String,
    pub(crate) header: Value,
    pub(crate) payload: Value,
    pub(crate) signature: Option<Signature>,
}

impl RawToken {
    /// Split and decode a compact token string
    ///
    /// Segments are checked in order: header, payload, then signature. An
    /// empty third segment is an unsigned token; a missing one is malformed.
    pub(crate) fn split(token: &str) -> Result<Self> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(Error::TokenTooLarge {
                size: token.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        let parts: Vec<&str> = token.split('.').collect();
        let (header_segment, payload_segment, signature_segment) = match parts.as_slice() {
            [header, payload, signature] => (*header, *payload, *signature),
            [_, _] => {
                return Err(Error::MalformedToken(
                    "missing signature segment; unsigned tokens must end with '.'".to_string(),
                ));
            }
            _ => {
                return Err(Error::MalformedToken(format!(
                    "expected 3 segments, found {}",
                    parts.len()
                )));
            }
        };

        if header_segment.is_empty() {
            return Err(Error::MalformedToken("header segment is empty".to_string()));
        }
        let header = decode_segment(header_segment, MAX_DECODED_HEADER_SIZE, "header")?;

        if payload_segment.is_empty() {
            return Err(Error::MalformedToken("payload segment is empty".to_string()));
        }
        let payload = decode_segment(payload_segment, MAX_DECODED_PAYLOAD_SIZE, "payload")?;

        let signature = if signature_segment.is_empty() {
            None
        } else {
            Some(Signature::new(signature_segment)?)
        };

        Ok(Self {
            header_segment: header_segment.to_string(),
            payload_segment: payload_segment.to_string(),
            header,
            payload,
            signature,
        })
    }
}

fn decode_segment(segment: &str, max_size: usize, name: &str) -> Result<Value> {
    let json = base64url::decode_limited(segment, max_size)?;
    serde_json::from_str(&json).map_err(|e| Error::Decode(format!("Failed to parse {name}: {e}")))
}

fn millis_at(at: SystemTime) -> i128 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_millis() as i128,
        Err(before) => -(before.duration().as_millis() as i128),
    }
}

impl Token {
    /// Create an unsigned token
    pub fn new(header: Header, payload: Payload) -> Self {
        Self {
            header,
            payload,
            signature: None,
            encoded: None,
        }
    }

    /// Create a token carrying an existing signature
    pub fn with_parts(header: Header, payload: Payload, signature: Option<Signature>) -> Self {
        Self {
            header,
            payload,
            signature,
            encoded: None,
        }
    }

    /// Assemble a token from schema-checked parts and the segments they came from
    pub(crate) fn from_raw(header: Header, payload: Payload, raw: RawToken) -> Self {
        Self {
            header,
            payload,
            signature: raw.signature,
            encoded: Some(EncodedSegments {
                header: raw.header_segment,
                payload: raw.payload_segment,
            }),
        }
    }

    /// Decode a compact token string
    ///
    /// Unknown `alg` values fail with [`Error::InvalidAlgorithm`].
    pub fn from_string(token: &str) -> Result<Self> {
        let raw = RawToken::split(token)?;
        let header = Header::from_json(&raw.header)?;
        let payload = Payload::from_json(&raw.payload)?;
        Ok(Self::from_raw(header, payload, raw))
    }

    /// Build a token from `{"header": .., "payload": .., "signature"?: ..}`
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::MalformedToken("token JSON must be an object".to_string()))?;

        let header = object
            .get("header")
            .ok_or_else(|| Error::MalformedToken("token JSON has no header".to_string()))?;
        let payload = object
            .get("payload")
            .ok_or_else(|| Error::MalformedToken("token JSON has no payload".to_string()))?;
        let signature = match object.get("signature") {
            None | Some(Value::Null) => None,
            Some(Value::String(signature)) if signature.is_empty() => None,
            Some(Value::String(signature)) => Some(Signature::new(signature.as_str())?),
            Some(_) => {
                return Err(Error::MalformedToken(
                    "token signature must be a string".to_string(),
                ));
            }
        };

        Ok(Self::with_parts(
            Header::from_json(header)?,
            Payload::from_json(payload)?,
            signature,
        ))
    }

    /// JSON form; `signature` is omitted when the token is unsigned
    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(3);
        object.insert("header".to_string(), self.header.to_json());
        object.insert("payload".to_string(), self.payload.to_json());
        if let Some(signature) = &self.signature {
            object.insert("signature".to_string(), Value::from(signature.as_str()));
        }
        Value::Object(object)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.algorithm()
    }

    /// The string that is signed: `header.payload`
    pub fn signing_input(&self) -> String {
        match &self.encoded {
            Some(encoded) => format!("{}.{}", encoded.header, encoded.payload),
            None => format!("{}.{}", self.header.encode(), self.payload.encode()),
        }
    }

    /// Whether the token carries a signature (valid or not)
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// `exp` lies more than `reserve` after `at`
    pub fn is_not_expired(&self, reserve: Duration, at: SystemTime) -> bool {
        let remaining = self.payload.expiration().as_millis() as i128 - millis_at(at);
        remaining > reserve.as_millis() as i128
    }

    pub fn is_not_expired_now(&self) -> bool {
        self.is_not_expired(DEFAULT_EXPIRATION_RESERVE, SystemTime::now())
    }

    /// `nbf` is absent or not after `at`
    pub fn is_after_not_before(&self, at: SystemTime) -> bool {
        match self.payload.not_before() {
            None => true,
            Some(not_before) => not_before.as_millis() as i128 <= millis_at(at),
        }
    }

    pub fn is_after_not_before_now(&self) -> bool {
        self.is_after_not_before(SystemTime::now())
    }

    /// Both time checks hold at `at`
    pub fn is_time_valid(&self, reserve: Duration, at: SystemTime) -> bool {
        self.is_not_expired(reserve, at) && self.is_after_not_before(at)
    }

    pub fn is_time_valid_now(&self) -> bool {
        self.is_time_valid(DEFAULT_EXPIRATION_RESERVE, SystemTime::now())
    }

    /// Whether the token was issued at or before `at`; `None` without `iat`
    pub fn is_issued_before(&self, at: SystemTime) -> Option<bool> {
        self.payload
            .issued_at()
            .map(|issued_at| issued_at.as_millis() as i128 <= millis_at(at))
    }

    /// `aud` is absent or lists `candidate`
    pub fn is_correct_audience(&self, candidate: &str) -> bool {
        match self.payload.audience() {
            None => true,
            Some(audience) => audience.iter().any(|a| a == candidate),
        }
    }

    /// `iss` is present and trusted by `trust`
    pub async fn is_from_trusted_issuer(&self, trust: &IssuerTrust) -> bool {
        match self.payload.issuer() {
            None => false,
            Some(issuer) => trust.trusts(issuer).await,
        }
    }

    /// Sign the token, returning a new signed token
    ///
    /// Any signer failure, and an empty signature, is [`Error::Signing`].
    pub async fn sign(&self, signer: &dyn Signer, key: &Key) -> Result<Token> {
        let encoded = match &self.encoded {
            Some(encoded) => encoded.clone(),
            None => EncodedSegments {
                header: self.header.encode(),
                payload: self.payload.encode(),
            },
        };
        let signing_input = format!("{}.{}", encoded.header, encoded.payload);

        let signature = match signer.sign(&signing_input, self.algorithm(), key).await {
            Ok(signature) => signature,
            Err(e @ Error::Signing(_)) => return Err(e),
            Err(other) => return Err(Error::Signing(other.to_string())),
        };
        if signature.is_empty() {
            return Err(Error::Signing("signer returned an empty signature".to_string()));
        }
        let signature = Signature::new(signature)
            .map_err(|e| Error::Signing(format!("signer returned an unusable signature: {e}")))?;

        Ok(Self {
            header: self.header.clone(),
            payload: self.payload.clone(),
            signature: Some(signature),
            encoded: Some(encoded),
        })
    }

    /// Check the signature with `verifier`; unsigned tokens never verify
    pub async fn verify_signature(&self, verifier: &dyn KeyVerifier, key: &Key) -> bool {
        let Some(signature) = &self.signature else {
            return false;
        };
        verifier
            .verify(
                &self.signing_input(),
                signature.as_str(),
                self.algorithm(),
                key,
            )
            .await
    }

    /// Signature, time window, and optionally audience and issuer trust
    pub async fn verify_with(
        &self,
        verifier: &dyn KeyVerifier,
        key: &Key,
        reserve: Duration,
        at: SystemTime,
        audience: Option<&str>,
        trust: Option<&IssuerTrust>,
    ) -> bool {
        if !self.verify_signature(verifier, key).await || !self.is_time_valid(reserve, at) {
            return false;
        }
        if let Some(audience) = audience {
            if !self.is_correct_audience(audience) {
                return false;
            }
        }
        match trust {
            Some(trust) => self.is_from_trusted_issuer(trust).await,
            None => true,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.payload == other.payload
            && self.signature == other.signature
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let signature = self.signature.as_ref().map(Signature::as_str).unwrap_or("");
        write!(f, "{}.{}", self.signing_input(), signature)
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Token::from_string(s)
    }
}
