//! Token issuing
//!
//! An [`Issuer`] mints signed tokens for one algorithm and signing key, and
//! verifies tokens like the [`Verifier`] it wraps. Its configuration is
//! checked once in [`IssuerBuilder::build`]: the algorithm must be allowed,
//! the key must be able to sign with it, and additional header fields and
//! default claims must not shadow standard names.

use crate::algorithm::{Algorithm, KeyVerifier, Signer, StandardCrypto};
use crate::config::TokenConfig;
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::matching::MatchingPattern;
use crate::parser::Parses;
use crate::token::{Audience, Header, NumericDate, Payload, RESERVED_CLAIM_NAMES, Token};
use crate::trust::IssuerTrust;
use crate::verifier::{Verifier, VerifierBuilder, Verifies};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Validity period of issued tokens unless configured otherwise
pub const DEFAULT_VALID_TIME: Duration = Duration::from_secs(60 * 60);

/// Generates `jti` values
pub type JwtIdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Issues, parses and verifies tokens
pub trait Issues: Verifies {
    /// Mint a new signed token
    fn issue_token<'a>(&'a self, options: IssueOptions) -> BoxFuture<'a, Result<Token>>;
}

/// Per-token settings for [`Issues::issue_token`]
///
/// Unset values fall back to the issuer's defaults.
#[derive(Debug, Clone, Default)]
pub struct IssueOptions {
    subject: Option<String>,
    audience: Option<Audience>,
    claims: Map<String, Value>,
    valid_time: Option<Duration>,
    validity_delay: Option<Duration>,
}

impl IssueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<Audience>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Add a claim, overriding an issuer default of the same name
    pub fn claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    /// How long the token stays valid after issuing
    pub fn valid_time(mut self, valid_time: Duration) -> Self {
        self.valid_time = Some(valid_time);
        self
    }

    /// How long after issuing the token becomes valid (`nbf`)
    pub fn validity_delay(mut self, delay: Duration) -> Self {
        self.validity_delay = Some(delay);
        self
    }
}

/// Issuer bound to one algorithm and signing key
#[derive(Clone)]
pub struct Issuer {
    verifier: Verifier,
    header: Header,
    signing_key: Arc<Key>,
    signer: Arc<dyn Signer>,
    identity: Option<String>,
    default_claims: Map<String, Value>,
    valid_time: Duration,
    validity_delay: Duration,
    jwt_id: JwtIdGenerator,
}

impl Issuer {
    pub fn builder(
        config: impl Into<Arc<TokenConfig>>,
        algorithm: Algorithm,
        signing_key: Key,
    ) -> IssuerBuilder {
        IssuerBuilder::new(config, algorithm, signing_key)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.algorithm()
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    /// Issue a token; see [`Issues::issue_token`]
    pub async fn issue(&self, options: IssueOptions) -> Result<Token> {
        let issued_at = NumericDate::truncated(SystemTime::now());
        let valid_time = options.valid_time.unwrap_or(self.valid_time);
        let delay = options.validity_delay.unwrap_or(self.validity_delay);
        let audience = options
            .audience
            .unwrap_or_else(|| Audience::Many(Vec::new()));

        let mut payload = Payload::new(issued_at.saturating_add(valid_time).floored())
            .with_issued_at(issued_at)
            .with_not_before(issued_at.saturating_add(delay).floored())
            .with_audience(audience)
            .with_jwt_id((self.jwt_id)());
        if let Some(identity) = &self.identity {
            payload = payload.with_issuer(identity.clone());
        }
        if let Some(subject) = options.subject {
            payload = payload.with_subject(subject);
        }

        let mut claims = self.default_claims.clone();
        claims.extend(options.claims);
        let payload = payload.with_claims(claims)?;

        let token = Token::new(self.header.clone(), payload)
            .sign(self.signer.as_ref(), &self.signing_key)
            .await?;

        tracing::debug!(
            jti = token.payload().jwt_id().unwrap_or_default(),
            alg = token.algorithm().as_str(),
            "token issued"
        );
        Ok(token)
    }
}

impl Parses for Issuer {
    fn parse_token(&self, token: &str) -> Result<Token> {
        self.verifier.parse_token(token)
    }
}

impl Verifies for Issuer {
    fn verify_token<'a>(&'a self, token: &'a Token) -> BoxFuture<'a, bool> {
        self.verifier.verify_token(token)
    }
}

impl Issues for Issuer {
    fn issue_token<'a>(&'a self, options: IssueOptions) -> BoxFuture<'a, Result<Token>> {
        self.issue(options).boxed()
    }
}

impl std::fmt::Debug for Issuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Issuer")
            .field("verifier", &self.verifier)
            .field("header", &self.header)
            .field("signing_key", &self.signing_key)
            .field("identity", &self.identity)
            .field("default_claims", &self.default_claims)
            .field("valid_time", &self.valid_time)
            .field("validity_delay", &self.validity_delay)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Issuer`]
#[derive(Clone)]
pub struct IssuerBuilder {
    config: Arc<TokenConfig>,
    algorithm: Algorithm,
    signing_key: Key,
    verifier: VerifierBuilder,
    signer: Arc<dyn Signer>,
    identity: Option<String>,
    headers: Map<String, Value>,
    default_claims: Map<String, Value>,
    valid_time: Duration,
    validity_delay: Duration,
    jwt_id: JwtIdGenerator,
}

impl IssuerBuilder {
    /// Sign with `algorithm` and `signing_key`, verifying with the same key
    pub fn new(config: impl Into<Arc<TokenConfig>>, algorithm: Algorithm, signing_key: Key) -> Self {
        let config = config.into();
        Self {
            verifier: VerifierBuilder::new(Arc::clone(&config), signing_key.clone()),
            config,
            algorithm,
            signing_key,
            signer: Arc::new(StandardCrypto),
            identity: None,
            headers: Map::new(),
            default_claims: Map::new(),
            valid_time: DEFAULT_VALID_TIME,
            validity_delay: Duration::ZERO,
            jwt_id: Arc::new(|| uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Verify with a different key, e.g. a public key
    pub fn verification_key(&mut self, key: Key) -> &mut Self {
        self.verifier.key(key);
        self
    }

    /// Sign with a custom [`Signer`]
    pub fn signer(&mut self, signer: impl Signer + 'static) -> &mut Self {
        self.signer = Arc::new(signer);
        self
    }

    /// Verify with a custom [`KeyVerifier`]
    pub fn key_verifier(&mut self, verifier: impl KeyVerifier + 'static) -> &mut Self {
        self.verifier.key_verifier(verifier);
        self
    }

    /// Value of `iss` in issued tokens
    pub fn identity(&mut self, identity: impl Into<String>) -> &mut Self {
        self.identity = Some(identity.into());
        self
    }

    /// Additional header field for issued tokens
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Claim added to every issued token unless overridden per call
    pub fn default_claim(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.default_claims.insert(name.into(), value.into());
        self
    }

    pub fn valid_time(&mut self, valid_time: Duration) -> &mut Self {
        self.valid_time = valid_time;
        self
    }

    pub fn validity_delay(&mut self, delay: Duration) -> &mut Self {
        self.validity_delay = delay;
        self
    }

    /// Replace the random UUID v4 `jti` generator
    pub fn jwt_id_generator(&mut self, generator: impl Fn() -> String + Send + Sync + 'static) -> &mut Self {
        self.jwt_id = Arc::new(generator);
        self
    }

    /// Audience pattern applied when verifying
    pub fn audience(&mut self, pattern: impl Into<MatchingPattern<String>>) -> &mut Self {
        self.verifier.audience(pattern);
        self
    }

    /// Issuer trust applied when verifying
    pub fn trust(&mut self, trust: impl Into<IssuerTrust>) -> &mut Self {
        self.verifier.trust(trust);
        self
    }

    pub fn expiration_reserve(&mut self, reserve: Duration) -> &mut Self {
        self.verifier.expiration_reserve(reserve);
        self
    }

    /// Validate and build the issuer
    pub fn build(&self) -> Result<Issuer> {
        self.config.algorithms().validate(&self.algorithm)?;
        self.signing_key.check_signs(self.algorithm)?;

        let header = Header::new(self.algorithm)
            .with_token_type(self.config.token_type())
            .with_fields(self.headers.clone())?;

        if let Some(name) = self
            .default_claims
            .keys()
            .find(|name| RESERVED_CLAIM_NAMES.contains(&name.as_str()))
        {
            return Err(Error::ReservedClaimName(name.clone()));
        }

        Ok(Issuer {
            verifier: self.verifier.build()?,
            header,
            signing_key: Arc::new(self.signing_key.clone()),
            signer: Arc::clone(&self.signer),
            identity: self.identity.clone(),
            default_claims: self.default_claims.clone(),
            valid_time: self.valid_time,
            validity_delay: self.validity_delay,
            jwt_id: Arc::clone(&self.jwt_id),
        })
    }
}
