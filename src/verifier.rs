//! Token verification
//!
//! A [`Verifier`] parses tokens with a signed-only [`Parser`] and accepts a
//! token when every check passes, in this order:
//!
//! 1. the token is signed
//! 2. its `alg` is in the configured algorithm set
//! 3. the verification key fits `alg`
//! 4. the signature is valid
//! 5. `exp` lies beyond the expiration reserve and `nbf` has passed
//! 6. some `aud` entry matches the audience pattern, if one is configured
//! 7. `iss` is trusted, if a trust policy is configured
//!
//! Verification never errors; a rejected token is `false` and the reason is
//! logged at `debug`.

use crate::algorithm::{KeyVerifier, StandardCrypto};
use crate::config::TokenConfig;
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::matching::MatchingPattern;
use crate::parser::{Parser, ParserBuilder, Parses, SignatureRequirement};
use crate::schema::Schema;
use crate::token::{DEFAULT_EXPIRATION_RESERVE, Header, Payload, Token};
use crate::trust::IssuerTrust;

use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Parses and verifies tokens
pub trait Verifies: Parses {
    /// Whether `token` passes every configured check right now
    fn verify_token<'a>(&'a self, token: &'a Token) -> BoxFuture<'a, bool>;

    /// Parse, then verify
    ///
    /// Parse errors propagate; a token that parses but fails verification is `Ok(None)`.
    fn parse_then_verify_token<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Option<Token>>> {
        async move {
            let token = self.parse_token(token)?;
            let verified = self.verify_token(&token).await;
            Ok(verified.then_some(token))
        }
        .boxed()
    }

    /// Parse, then verify, treating every failure as `None`
    fn parse_then_verify_token_safe<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Option<Token>> {
        async move {
            match self.parse_then_verify_token(token).await {
                Ok(verified) => verified,
                Err(e) => {
                    tracing::debug!(error = %e, "token rejected");
                    None
                }
            }
        }
        .boxed()
    }
}

/// Verifier bound to one key
#[derive(Clone)]
pub struct Verifier {
    parser: Parser,
    key: Arc<Key>,
    crypto: Arc<dyn KeyVerifier>,
    audience: Option<MatchingPattern<String>>,
    trust: Option<IssuerTrust>,
    expiration_reserve: Duration,
}

impl Verifier {
    pub fn builder(config: impl Into<Arc<TokenConfig>>, key: Key) -> VerifierBuilder {
        VerifierBuilder::new(config, key)
    }

    pub fn config(&self) -> &TokenConfig {
        self.parser.config()
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn expiration_reserve(&self) -> Duration {
        self.expiration_reserve
    }

    /// Verify `token` as if the current time were `at`
    pub async fn verify_token_at(&self, token: &Token, at: SystemTime) -> bool {
        match self.rejection(token, at).await {
            None => true,
            Some(reason) => {
                tracing::debug!(reason, alg = token.algorithm().as_str(), "token rejected");
                false
            }
        }
    }

    async fn rejection(&self, token: &Token, at: SystemTime) -> Option<&'static str> {
        if !token.is_signed() {
            return Some("token is not signed");
        }

        let algorithm = token.algorithm();
        if !self.config().algorithms().is_allowed(&algorithm) {
            return Some("algorithm not allowed");
        }
        if self.key.check_verifies(algorithm).is_err() {
            return Some("key does not fit algorithm");
        }

        if !token.verify_signature(self.crypto.as_ref(), &self.key).await {
            return Some("invalid signature");
        }

        if !token.is_not_expired(self.expiration_reserve, at) {
            return Some("token expired");
        }
        if !token.is_after_not_before(at) {
            return Some("token not yet valid");
        }

        if let Some(pattern) = &self.audience {
            match token.payload().audience() {
                None => return Some("audience missing"),
                Some(audience) if !audience.iter().any(|a| pattern.matches(a)) => {
                    return Some("audience mismatch");
                }
                Some(_) => {}
            }
        }

        if let Some(trust) = &self.trust {
            if !token.is_from_trusted_issuer(trust).await {
                return Some("issuer not trusted");
            }
        }

        None
    }
}

impl Parses for Verifier {
    fn parse_token(&self, token: &str) -> Result<Token> {
        self.parser.parse_token(token)
    }
}

impl Verifies for Verifier {
    fn verify_token<'a>(&'a self, token: &'a Token) -> BoxFuture<'a, bool> {
        self.verify_token_at(token, SystemTime::now()).boxed()
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("parser", &self.parser)
            .field("key", &self.key)
            .field("audience", &self.audience)
            .field("trust", &self.trust)
            .field("expiration_reserve", &self.expiration_reserve)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Verifier`]
#[derive(Clone)]
pub struct VerifierBuilder {
    parser: ParserBuilder,
    config: Arc<TokenConfig>,
    key: Key,
    crypto: Arc<dyn KeyVerifier>,
    audience: Option<MatchingPattern<String>>,
    trust: Option<IssuerTrust>,
    expiration_reserve: Duration,
}

impl VerifierBuilder {
    /// Verify with `key` using the bundled crypto
    pub fn new(config: impl Into<Arc<TokenConfig>>, key: Key) -> Self {
        let config = config.into();
        let mut parser = ParserBuilder::new(Arc::clone(&config));
        parser.signature(SignatureRequirement::Signed);
        Self {
            parser,
            config,
            key,
            crypto: Arc::new(StandardCrypto),
            audience: None,
            trust: None,
            expiration_reserve: DEFAULT_EXPIRATION_RESERVE,
        }
    }

    /// Replace the verification key
    pub fn key(&mut self, key: Key) -> &mut Self {
        self.key = key;
        self
    }

    /// Check signatures with a custom [`KeyVerifier`]
    pub fn key_verifier(&mut self, verifier: impl KeyVerifier + 'static) -> &mut Self {
        self.crypto = Arc::new(verifier);
        self
    }

    /// Require an `aud` entry matching `pattern`
    pub fn audience(&mut self, pattern: impl Into<MatchingPattern<String>>) -> &mut Self {
        self.audience = Some(pattern.into());
        self
    }

    /// Require a trusted `iss`
    pub fn trust(&mut self, trust: impl Into<IssuerTrust>) -> &mut Self {
        self.trust = Some(trust.into());
        self
    }

    /// Margin before `exp` at which tokens already count as expired
    pub fn expiration_reserve(&mut self, reserve: Duration) -> &mut Self {
        self.expiration_reserve = reserve;
        self
    }

    pub fn header_schema(&mut self, schema: impl Schema<Header> + 'static) -> &mut Self {
        self.parser.header_schema(schema);
        self
    }

    pub fn payload_schema(&mut self, schema: impl Schema<Payload> + 'static) -> &mut Self {
        self.parser.payload_schema(schema);
        self
    }

    /// Build the verifier
    ///
    /// Fails when the key cannot verify any allowed algorithm.
    pub fn build(&self) -> Result<Verifier> {
        let usable = self
            .config
            .algorithms()
            .allowed_algorithms()
            .iter()
            .any(|algorithm| self.key.check_verifies(*algorithm).is_ok());
        if !usable {
            return Err(Error::Configuration(format!(
                "{} key cannot verify any allowed algorithm",
                self.key.key_type()
            )));
        }

        Ok(Verifier {
            parser: self.parser.build(),
            key: Arc::new(self.key.clone()),
            crypto: Arc::clone(&self.crypto),
            audience: self.audience.clone(),
            trust: self.trust.clone(),
            expiration_reserve: self.expiration_reserve,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{Algorithm, AlgorithmPolicy};
    use std::time::UNIX_EPOCH;

    const SECRET: &[u8] = b"verifier-secret";

    fn at(seconds: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(seconds)
    }

    fn key() -> Key {
        Key::symmetric(SECRET)
    }

    fn verifier() -> Verifier {
        Verifier::builder(TokenConfig::default(), key()).build().unwrap()
    }

    fn payload() -> Payload {
        Payload::new(at(2_000))
            .with_issuer("auth")
            .with_audience(["api", "web"])
            .with_not_before(at(1_000))
    }

    async fn signed(algorithm: Algorithm, payload: Payload) -> Token {
        Token::new(Header::new(algorithm), payload)
            .sign(&StandardCrypto, &key())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepts_valid_token() {
        let token = signed(Algorithm::HS256, payload()).await;
        assert!(verifier().verify_token_at(&token, at(1_500)).await);
    }

    #[tokio::test]
    async fn test_rejects_unsigned() {
        let token = Token::new(Header::new(Algorithm::HS256), payload());
        assert!(!verifier().verify_token_at(&token, at(1_500)).await);
    }

    #[tokio::test]
    async fn test_rejects_disallowed_algorithm() {
        let token = signed(Algorithm::HS512, payload()).await;
        let config = TokenConfig::builder()
            .algorithms(AlgorithmPolicy::allow_only([Algorithm::HS256]))
            .build()
            .unwrap();
        let verifier = Verifier::builder(config, key()).build().unwrap();
        assert!(!verifier.verify_token_at(&token, at(1_500)).await);
    }

    #[tokio::test]
    async fn test_rejects_wrong_key_and_time() {
        let token = signed(Algorithm::HS256, payload()).await;
        let other = Verifier::builder(TokenConfig::default(), Key::symmetric(b"other".to_vec()))
            .build()
            .unwrap();
        assert!(!other.verify_token_at(&token, at(1_500)).await);

        let verifier = verifier();
        assert!(!verifier.verify_token_at(&token, at(999)).await);
        assert!(!verifier.verify_token_at(&token, at(1_999)).await);
        assert!(verifier.verify_token_at(&token, at(1_998)).await);
    }

    #[tokio::test]
    async fn test_expiration_reserve() {
        let token = signed(Algorithm::HS256, payload()).await;
        let verifier = Verifier::builder(TokenConfig::default(), key())
            .expiration_reserve(Duration::from_secs(60))
            .build()
            .unwrap();
        assert!(!verifier.verify_token_at(&token, at(1_950)).await);
        assert!(verifier.verify_token_at(&token, at(1_930)).await);
    }

    #[tokio::test]
    async fn test_audience_pattern() {
        let token = signed(Algorithm::HS256, payload()).await;

        let matching = Verifier::builder(TokenConfig::default(), key())
            .audience("web")
            .build()
            .unwrap();
        assert!(matching.verify_token_at(&token, at(1_500)).await);

        let mismatched = Verifier::builder(TokenConfig::default(), key())
            .audience(MatchingPattern::<String>::regex("^admin-").unwrap())
            .build()
            .unwrap();
        assert!(!mismatched.verify_token_at(&token, at(1_500)).await);

        let no_aud = signed(Algorithm::HS256, Payload::new(at(2_000))).await;
        assert!(!matching.verify_token_at(&no_aud, at(1_500)).await);
        assert!(verifier().verify_token_at(&no_aud, at(1_500)).await);
    }

    #[tokio::test]
    async fn test_issuer_trust() {
        let token = signed(Algorithm::HS256, payload()).await;

        let trusting = Verifier::builder(TokenConfig::default(), key())
            .trust("auth")
            .build()
            .unwrap();
        assert!(trusting.verify_token_at(&token, at(1_500)).await);

        let distrusting = Verifier::builder(TokenConfig::default(), key())
            .trust(IssuerTrust::check(|_| async { false }))
            .build()
            .unwrap();
        assert!(!distrusting.verify_token_at(&token, at(1_500)).await);
    }

    #[tokio::test]
    async fn test_parse_then_verify() {
        let verifier = verifier();
        let fresh = Payload::new(SystemTime::now() + Duration::from_secs(600));
        let token = signed(Algorithm::HS256, fresh).await;

        let verified = verifier
            .parse_then_verify_token(&token.to_string())
            .await
            .unwrap();
        assert_eq!(verified, Some(token.clone()));

        let expired = signed(Algorithm::HS256, payload()).await;
        assert_eq!(
            verifier.parse_then_verify_token(&expired.to_string()).await,
            Ok(None)
        );

        assert!(matches!(
            verifier.parse_then_verify_token("garbage").await,
            Err(Error::MalformedToken(_))
        ));
        let unsigned = Token::new(Header::new(Algorithm::HS256), payload()).to_string();
        assert!(matches!(
            verifier.parse_then_verify_token(&unsigned).await,
            Err(Error::MalformedToken(_))
        ));

        assert!(verifier.parse_then_verify_token_safe("garbage").await.is_none());
        assert!(verifier.parse_then_verify_token_safe(&token.to_string()).await.is_some());
    }

    #[test]
    fn test_build_rejects_unusable_key() {
        let config = TokenConfig::builder()
            .algorithms(AlgorithmPolicy::ecdsa_any())
            .build()
            .unwrap();
        let result = Verifier::builder(config, key()).build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
