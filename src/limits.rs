//! Size limit constants for input validation

/// Maximum length for a token string (64KB)
pub(crate) const MAX_TOKEN_LENGTH: usize = 64 * 1024;

/// Maximum size for decoded header JSON (8KB)
/// Headers are typically small (< 1KB), but additional header fields are allowed
pub(crate) const MAX_DECODED_HEADER_SIZE: usize = 8 * 1024;

/// Maximum size for decoded payload JSON (64KB)
pub(crate) const MAX_DECODED_PAYLOAD_SIZE: usize = 64 * 1024;

/// Maximum size for a Base64URL-encoded signature string (1.5KB)
/// RSA-8192 signatures are 1024 bytes, which encode to ~1366 characters
pub(crate) const MAX_SIGNATURE_B64_SIZE: usize = 1536;

// ============================================================================
// Timestamp bounds
// ============================================================================

/// Minimum valid timestamp in seconds (1970-01-01 00:00:00 UTC)
pub const MIN_TIMESTAMP: i64 = 0;

/// Maximum valid timestamp in seconds (9999-12-31 23:59:59 UTC)
pub const MAX_TIMESTAMP: i64 = 253_402_300_799;
