//! Errors for jaks
//!
//! Every fallible operation in the crate returns [`Result`]. Structural,
//! decoding and schema errors are reported here; signature and claim check
//! failures during verification are not errors and resolve to `false`/`None`.

use crate::schema::ValidationError;
use thiserror::Error;

/// JAKS Errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Format Errors
    // ============================================================================
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Token too large: {size} bytes (maximum: {max} bytes)")]
    TokenTooLarge { size: usize, max: usize },

    #[error("Decoding failed: {0}")]
    Decode(String),

    // ============================================================================
    // Claim Errors
    // ============================================================================
    #[error("Token {segment} does not match its schema: {source}")]
    ClaimSchema {
        segment: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("Timestamp '{claim}' out of bounds: {value} (valid range: {min} to {max} seconds)")]
    InvalidTimestamp {
        claim: String,
        value: f64,
        min: i64,
        max: i64,
    },

    #[error("Claim name '{0}' is reserved for a standard field")]
    ReservedClaimName(String),

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    // ============================================================================
    // Algorithm Errors
    // ============================================================================
    #[error("Algorithm '{0}' is not supported")]
    InvalidAlgorithm(String),

    #[error("Algorithm '{found}' not allowed. Allowed: {allowed:?}")]
    AlgorithmNotAllowed { found: String, allowed: Vec<String> },

    #[error(
        "Key type mismatch for algorithm '{algorithm}': expected {expected_key_type}, got {actual_key_type}"
    )]
    KeyTypeMismatch {
        algorithm: String,
        expected_key_type: String,
        actual_key_type: String,
    },

    // ============================================================================
    // Issuing Errors
    // ============================================================================
    #[error("Signing failed: {0}")]
    Signing(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Result type alias for JAKS operations
pub type Result<T> = std::result::Result<T, Error>;
