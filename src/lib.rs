//! # jaks - Signed, Claims-Based Tokens
//!
//! > Parse, verify and issue JSON Web Tokens with a configuration-driven schema.
//!
//! **jaks** handles compact JWS-style tokens: `header.payload.signature`, each segment
//! Base64URL-encoded JSON (the signature raw bytes). A single [`TokenConfig`] describes the
//! tokens an application accepts; a [`Parser`], [`Verifier`] or [`Issuer`] built from it then
//! parses, verifies or mints tokens of exactly that shape.
//!
//! ## Quick Start
//!
//! ```ignore
//! use jaks::*;
//!
//! let config = TokenConfig::builder()
//!     .algorithms(AlgorithmPolicy::hmac_any())
//!     .require(RequiredClaims::new().issuer())
//!     .build()?;
//!
//! let issuer = Issuer::builder(config, Algorithm::HS256, Key::symmetric(b"secret".to_vec()))
//!     .identity("https://auth.example.com")
//!     .audience("my-api")
//!     .build()?;
//!
//! let token = issuer
//!     .issue_token(IssueOptions::new().subject("user-1").audience("my-api"))
//!     .await?;
//!
//! let verified = issuer.parse_then_verify_token(&token.to_string()).await?;
//! assert!(verified.is_some());
//! ```
//!
//! ## Components
//!
//! ```text
//! Parser    string -> Token             (structure, then header/payload schemas)
//!   │
//! Verifier  Token  -> bool              (signature, time window, audience, issuer trust)
//!   │
//! Issuer    IssueOptions -> Token       (claims, validity window, signing)
//! ```
//!
//! Each layer wraps the previous one and is exposed through a trait: [`Parses`],
//! [`Verifies`] and [`Issues`].
//!
//! ## Errors
//!
//! Parsing fails loudly: malformed structure, bad Base64URL or JSON, and schema violations
//! surface as [`Error`]. Verification never errors; a token either verifies or it does not, and
//! the reason for a rejection is logged at `debug` through `tracing`.
//!
//! ## Algorithms
//!
//! - **HMAC**: HS256, HS384, HS512 (`hmac` + `sha2`)
//! - **RSA** PKCS#1 v1.5: RS256, RS384, RS512 (`aws-lc-rs`)
//! - **ECDSA**: ES256, ES384, ES512 (`aws-lc-rs`)
//!
//! Custom backends plug in through [`Signer`] and [`KeyVerifier`].
//!
//! ## Security
//!
//! ### Algorithm Confusion Prevention
//!
//! The configured [`AlgorithmPolicy`] is enforced by the header schema and again during
//! verification, and a key only verifies algorithms of its own family. `"none"` is not an
//! algorithm and never parses.
//!
//! ### Timing Attack Protection
//!
//! HMAC signature verification uses constant-time comparison via the [`constant_time_eq`](https://crates.io/crates/constant_time_eq)
//! crate.
//!
//! ### Resource Limits
//!
//! Token length, decoded header and payload size, and signature length are bounded before
//! any JSON is parsed.
//!
//! ## References
//!
//! - [RFC 7515](https://datatracker.ietf.org/doc/html/rfc7515) — JSON Web Signature (JWS)
//! - [RFC 7519](https://datatracker.ietf.org/doc/html/rfc7519) — JSON Web Token (JWT)
//! - [RFC 8725](https://datatracker.ietf.org/doc/html/rfc8725) — JSON Web Signature Best Practices

// Core modules
pub mod error;
mod limits;
pub mod utils;

// Algorithm system
pub mod algorithm;
pub mod keys;

// Token model
pub mod token;

// Configuration and schemas
pub mod config;
pub mod matching;
pub mod schema;
pub mod trust;

// Parse, verify, issue (main public API)
pub mod issuer;
pub mod parser;
pub mod verifier;

// ============================================================================
// PUBLIC API
// ============================================================================

// Main flow types
pub use issuer::{IssueOptions, Issuer, IssuerBuilder, Issues};
pub use parser::{Parser, ParserBuilder, Parses, SignatureRequirement};
pub use verifier::{Verifier, VerifierBuilder, Verifies};

// Configuration types
pub use config::{FieldKind, FieldSpec, RequiredClaims, TokenConfig, TokenConfigBuilder};
pub use matching::MatchingPattern;
pub use trust::IssuerTrust;

// Token model
pub use token::{Audience, Header, NumericDate, Payload, Signature, Token};

// Supporting types for advanced usage
pub use algorithm::{Algorithm, AlgorithmFamily, AlgorithmPolicy, KeyVerifier, Signer, StandardCrypto};
pub use error::{Error, Result};
pub use keys::Key;
pub use limits::{MAX_TIMESTAMP, MIN_TIMESTAMP};
pub use schema::{Schema, ValidationError};
