//! RSASSA-PKCS1-v1_5 signatures (RS256, RS384, RS512)

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::keys::{Key, PrivateKey};
use crate::utils::base64url;

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{self, KeyPair, RsaKeyPair, UnparsedPublicKey};

fn signing_encoding(algorithm: Algorithm) -> Result<&'static dyn signature::RsaEncoding> {
    match algorithm {
        Algorithm::RS256 => Ok(&signature::RSA_PKCS1_SHA256),
        Algorithm::RS384 => Ok(&signature::RSA_PKCS1_SHA384),
        Algorithm::RS512 => Ok(&signature::RSA_PKCS1_SHA512),
        other => Err(Error::InvalidAlgorithm(format!("{other} is not an RSA algorithm"))),
    }
}

fn verification_algorithm(
    algorithm: Algorithm,
) -> Option<&'static dyn signature::VerificationAlgorithm> {
    match algorithm {
        Algorithm::RS256 => Some(&signature::RSA_PKCS1_2048_8192_SHA256),
        Algorithm::RS384 => Some(&signature::RSA_PKCS1_2048_8192_SHA384),
        Algorithm::RS512 => Some(&signature::RSA_PKCS1_2048_8192_SHA512),
        _ => None,
    }
}

/// Sign with a PKCS#8 RSA private key, returning the Base64URL signature
pub fn sign(algorithm: Algorithm, signing_input: &str, key: &PrivateKey) -> Result<String> {
    let encoding = signing_encoding(algorithm)?;
    let keypair = RsaKeyPair::from_pkcs8(key.as_der())
        .map_err(|e| Error::Signing(format!("RSA private key rejected: {e}")))?;

    let rng = SystemRandom::new();
    let mut signature_bytes = vec![0u8; keypair.public_modulus_len()];
    keypair
        .sign(encoding, &rng, signing_input.as_bytes(), &mut signature_bytes)
        .map_err(|_| Error::Signing(format!("{algorithm} signing failed")))?;

    Ok(base64url::encode_bytes(&signature_bytes))
}

/// Verify an RSA signature
///
/// A private key verifies through its derived public key.
pub fn verify(algorithm: Algorithm, signing_input: &str, signature: &str, key: &Key) -> bool {
    let Some(verification) = verification_algorithm(algorithm) else {
        return false;
    };
    let Ok(signature_bytes) = base64url::decode_bytes(signature) else {
        return false;
    };

    let public_key_der = match key {
        Key::Public(public) => public.as_bytes().to_vec(),
        Key::Private(private) => match RsaKeyPair::from_pkcs8(private.as_der()) {
            Ok(keypair) => keypair.public_key().as_ref().to_vec(),
            Err(_) => return false,
        },
        Key::Symmetric(_) => return false,
    };

    UnparsedPublicKey::new(verification, &public_key_der)
        .verify(signing_input.as_bytes(), &signature_bytes)
        .is_ok()
}
