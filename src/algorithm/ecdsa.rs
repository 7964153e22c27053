//! ECDSA signatures (ES256, ES384, ES512)
//!
//! Token signatures use the fixed-length `R || S` form (IEEE P1363), not ASN.1 DER.

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::keys::{Key, PrivateKey};
use crate::utils::base64url;

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{self, EcdsaKeyPair, EcdsaSigningAlgorithm, KeyPair, UnparsedPublicKey};

fn signing_algorithm(algorithm: Algorithm) -> Result<&'static EcdsaSigningAlgorithm> {
    match algorithm {
        Algorithm::ES256 => Ok(&signature::ECDSA_P256_SHA256_FIXED_SIGNING),
        Algorithm::ES384 => Ok(&signature::ECDSA_P384_SHA384_FIXED_SIGNING),
        Algorithm::ES512 => Ok(&signature::ECDSA_P521_SHA512_FIXED_SIGNING),
        other => Err(Error::InvalidAlgorithm(format!("{other} is not an ECDSA algorithm"))),
    }
}

fn verification_algorithm(
    algorithm: Algorithm,
) -> Option<&'static dyn signature::VerificationAlgorithm> {
    match algorithm {
        Algorithm::ES256 => Some(&signature::ECDSA_P256_SHA256_FIXED),
        Algorithm::ES384 => Some(&signature::ECDSA_P384_SHA384_FIXED),
        Algorithm::ES512 => Some(&signature::ECDSA_P521_SHA512_FIXED),
        _ => None,
    }
}

/// Sign with a PKCS#8 EC private key, returning the Base64URL signature
///
/// The key's curve must match the algorithm.
pub fn sign(algorithm: Algorithm, signing_input: &str, key: &PrivateKey) -> Result<String> {
    let signing = signing_algorithm(algorithm)?;
    let keypair = EcdsaKeyPair::from_pkcs8(signing, key.as_der())
        .map_err(|e| Error::Signing(format!("{algorithm} private key rejected: {e}")))?;

    let rng = SystemRandom::new();
    let signature = keypair
        .sign(&rng, signing_input.as_bytes())
        .map_err(|_| Error::Signing(format!("{algorithm} signing failed")))?;

    Ok(base64url::encode_bytes(signature.as_ref()))
}

/// Verify an ECDSA signature
///
/// A private key verifies through its derived public point.
pub fn verify(algorithm: Algorithm, signing_input: &str, signature: &str, key: &Key) -> bool {
    let Some(verification) = verification_algorithm(algorithm) else {
        return false;
    };
    let Ok(signature_bytes) = base64url::decode_bytes(signature) else {
        return false;
    };

    let public_key = match key {
        Key::Public(public) => public.as_bytes().to_vec(),
        Key::Private(private) => {
            let Ok(signing) = signing_algorithm(algorithm) else {
                return false;
            };
            match EcdsaKeyPair::from_pkcs8(signing, private.as_der()) {
                Ok(keypair) => keypair.public_key().as_ref().to_vec(),
                Err(_) => return false,
            }
        }
        Key::Symmetric(_) => return false,
    };

    UnparsedPublicKey::new(verification, &public_key)
        .verify(signing_input.as_bytes(), &signature_bytes)
        .is_ok()
}
