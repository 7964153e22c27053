use crate::error::{Error, Result};
use crate::limits::MAX_SIGNATURE_B64_SIZE;
use crate::utils::base64url;

/// Base64URL-encoded signature segment
///
/// Always non-empty; an unsigned token has no `Signature` at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Wrap an encoded signature, checking its alphabet and length
    pub fn new(encoded: impl Into<String>) -> Result<Self> {
        let encoded = encoded.into();
        if encoded.is_empty() {
            return Err(Error::Decode("signature segment is empty".to_string()));
        }
        if encoded.len() > MAX_SIGNATURE_B64_SIZE {
            return Err(Error::Decode(format!(
                "signature segment too long: {} bytes (max: {})",
                encoded.len(),
                MAX_SIGNATURE_B64_SIZE
            )));
        }
        if !base64url::is_base64url(&encoded) {
            return Err(Error::Decode(
                "signature segment is not valid Base64URL".to_string(),
            ));
        }
        Ok(Self(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw signature bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        base64url::decode_bytes(&self.0)
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
