//! HMAC signatures (HS256, HS384, HS512)

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::keys::SymmetricKey;
use crate::utils::base64url;

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

/// Compute the raw MAC of `signing_input`
fn compute(algorithm: Algorithm, signing_input: &str, secret: &[u8]) -> Result<Vec<u8>> {
    let tag = match algorithm {
        Algorithm::HS256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| invalid_key())?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::HS384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(secret).map_err(|_| invalid_key())?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::HS512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(secret).map_err(|_| invalid_key())?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        other => return Err(Error::InvalidAlgorithm(format!("{other} is not an HMAC algorithm"))),
    };

    Ok(tag)
}

fn invalid_key() -> Error {
    Error::Signing("HMAC key rejected".to_string())
}

/// Sign with an HMAC algorithm, returning the Base64URL signature
pub fn sign(algorithm: Algorithm, signing_input: &str, key: &SymmetricKey) -> Result<String> {
    compute(algorithm, signing_input, key.as_bytes()).map(|tag| base64url::encode_bytes(&tag))
}

/// Verify an HMAC signature with constant-time comparison
pub fn verify(algorithm: Algorithm, signing_input: &str, signature: &str, key: &SymmetricKey) -> bool {
    let Ok(provided_signature) = base64url::decode_bytes(signature) else {
        return false;
    };
    let Ok(expected_signature) = compute(algorithm, signing_input, key.as_bytes()) else {
        return false;
    };

    if provided_signature.len() != expected_signature.len() {
        return false;
    }

    constant_time_eq(&provided_signature, &expected_signature)
}
