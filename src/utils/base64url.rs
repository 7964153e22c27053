//! Base64URL encoding/decoding per RFC 4648
//!
//! Output is always unpadded and URL-safe. Input may carry trailing `=`
//! padding, which is stripped before decoding.

use crate::error::{Error, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Encode bytes to Base64URL string
pub fn encode_bytes(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Encode UTF-8 text to Base64URL
pub fn encode(input: &str) -> String {
    encode_bytes(input.as_bytes())
}

/// Decode Base64URL string to bytes
pub fn decode_bytes(input: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(strip_padding(input))
        .map_err(|e| Error::Decode(format!("Base64URL decode failed: {e}")))
}

/// Decode Base64URL string to UTF-8 text
pub fn decode(input: &str) -> Result<String> {
    into_utf8(decode_bytes(input)?)
}

/// Decode Base64URL string to bytes, rejecting results larger than `max_size`
pub(crate) fn decode_bytes_limited(input: &str, max_size: usize) -> Result<Vec<u8>> {
    let result = decode_bytes(input)?;

    if result.len() > max_size {
        return Err(Error::Decode(format!(
            "Decoded size exceeds limit: {} bytes (max: {})",
            result.len(),
            max_size
        )));
    }

    Ok(result)
}

/// Decode Base64URL string to UTF-8 text with size limit
pub(crate) fn decode_limited(input: &str, max_size: usize) -> Result<String> {
    into_utf8(decode_bytes_limited(input, max_size)?)
}

/// Check that `input` only uses the Base64URL alphabet (plus trailing padding)
pub(crate) fn is_base64url(input: &str) -> bool {
    strip_padding(input)
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn strip_padding(input: &str) -> &str {
    input.trim_end_matches('=')
}

fn into_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::Decode(format!("Invalid UTF-8: {e}")))
}
