use super::{Algorithm, AlgorithmFamily, KeyVerifier, Signer, ecdsa, hmac, rsa};
use crate::error::{Error, Result};
use crate::keys::Key;

use futures::future::{self, BoxFuture, FutureExt};

/// Bundled [`Signer`] and [`KeyVerifier`] for every supported algorithm
///
/// HMAC runs on `hmac`/`sha2`; RSA and ECDSA run on `aws-lc-rs`. All work
/// is synchronous, so the returned futures are immediately ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCrypto;

impl StandardCrypto {
    fn sign_now(signing_input: &str, algorithm: Algorithm, key: &Key) -> Result<String> {
        key.check_signs(algorithm)?;
        match (algorithm.family(), key) {
            (AlgorithmFamily::Hmac, Key::Symmetric(secret)) => {
                hmac::sign(algorithm, signing_input, secret)
            }
            (AlgorithmFamily::Rsa, Key::Private(private)) => {
                rsa::sign(algorithm, signing_input, private)
            }
            (AlgorithmFamily::Ecdsa, Key::Private(private)) => {
                ecdsa::sign(algorithm, signing_input, private)
            }
            _ => Err(Error::KeyTypeMismatch {
                algorithm: algorithm.to_string(),
                expected_key_type: "compatible key".to_string(),
                actual_key_type: key.key_type().to_string(),
            }),
        }
    }

    fn verify_now(signing_input: &str, signature: &str, algorithm: Algorithm, key: &Key) -> bool {
        match (algorithm.family(), key) {
            (AlgorithmFamily::Hmac, Key::Symmetric(secret)) => {
                hmac::verify(algorithm, signing_input, signature, secret)
            }
            (AlgorithmFamily::Rsa, _) => rsa::verify(algorithm, signing_input, signature, key),
            (AlgorithmFamily::Ecdsa, _) => ecdsa::verify(algorithm, signing_input, signature, key),
            _ => false,
        }
    }
}

impl Signer for StandardCrypto {
    fn sign<'a>(
        &'a self,
        signing_input: &'a str,
        algorithm: Algorithm,
        key: &'a Key,
    ) -> BoxFuture<'a, Result<String>> {
        future::ready(Self::sign_now(signing_input, algorithm, key)).boxed()
    }
}

impl KeyVerifier for StandardCrypto {
    fn verify<'a>(
        &'a self,
        signing_input: &'a str,
        signature: &'a str,
        algorithm: Algorithm,
        key: &'a Key,
    ) -> BoxFuture<'a, bool> {
        future::ready(Self::verify_now(signing_input, signature, algorithm, key)).boxed()
    }
}
