/// Key material for signing and signature verification
///
/// This module provides a type-safe abstraction over the key kinds the
/// bundled crypto understands:
/// - Symmetric secrets (for HMAC algorithms)
/// - PKCS#8 private keys (for RSA/ECDSA signing, and verification)
/// - Public keys (for RSA/ECDSA verification only)
///
/// Parsing of key formats such as JWK or PEM is left to the caller.
use crate::algorithm::{Algorithm, AlgorithmFamily};
use crate::error::{Error, Result};

/// A key that can be used to sign or verify a token
#[derive(Clone, PartialEq, Eq)]
pub enum Key {
    /// Symmetric key for HMAC algorithms
    Symmetric(SymmetricKey),

    /// PKCS#8 v1/v2 DER-encoded private key for RSA/ECDSA algorithms
    Private(PrivateKey),

    /// Public key for RSA/ECDSA algorithms
    ///
    /// RSA keys are DER-encoded (PKCS#1 `RSAPublicKey` or SubjectPublicKeyInfo);
    /// ECDSA keys are uncompressed SEC1 points.
    Public(PublicKey),
}

impl Key {
    /// Create a symmetric key from bytes
    pub fn symmetric(secret: impl Into<Vec<u8>>) -> Self {
        Key::Symmetric(SymmetricKey::new(secret.into()))
    }

    /// Create a private key from PKCS#8 DER bytes
    pub fn private_pkcs8(der: impl Into<Vec<u8>>) -> Self {
        Key::Private(PrivateKey::from_der(der))
    }

    /// Create a public key from its encoded bytes
    pub fn public(bytes: impl Into<Vec<u8>>) -> Self {
        Key::Public(PublicKey {
            bytes: bytes.into(),
        })
    }

    /// Get key type name for error messages
    pub fn key_type(&self) -> &'static str {
        match self {
            Key::Symmetric(_) => "Symmetric",
            Key::Private(_) => "Private",
            Key::Public(_) => "Public",
        }
    }

    /// Get as symmetric key or return error
    pub fn as_symmetric(&self) -> Result<&SymmetricKey> {
        match self {
            Key::Symmetric(key) => Ok(key),
            _ => Err(Error::KeyTypeMismatch {
                algorithm: "HMAC".to_string(),
                expected_key_type: "Symmetric".to_string(),
                actual_key_type: self.key_type().to_string(),
            }),
        }
    }

    /// Check that this key can verify signatures made with `algorithm`
    pub fn check_verifies(&self, algorithm: Algorithm) -> Result<()> {
        match (algorithm.family(), self) {
            (AlgorithmFamily::Hmac, Key::Symmetric(_)) => Ok(()),
            (AlgorithmFamily::Rsa | AlgorithmFamily::Ecdsa, Key::Private(_) | Key::Public(_)) => {
                Ok(())
            }
            (AlgorithmFamily::Hmac, _) => Err(self.mismatch(algorithm, "Symmetric")),
            _ => Err(self.mismatch(algorithm, "Private or Public")),
        }
    }

    /// Check that this key can sign with `algorithm`
    pub fn check_signs(&self, algorithm: Algorithm) -> Result<()> {
        match (algorithm.family(), self) {
            (AlgorithmFamily::Hmac, Key::Symmetric(_)) => Ok(()),
            (AlgorithmFamily::Rsa | AlgorithmFamily::Ecdsa, Key::Private(_)) => Ok(()),
            (AlgorithmFamily::Hmac, _) => Err(self.mismatch(algorithm, "Symmetric")),
            _ => Err(self.mismatch(algorithm, "Private")),
        }
    }

    fn mismatch(&self, algorithm: Algorithm, expected: &str) -> Error {
        Error::KeyTypeMismatch {
            algorithm: algorithm.to_string(),
            expected_key_type: expected.to_string(),
            actual_key_type: self.key_type().to_string(),
        }
    }
}

// Key bytes never end up in logs
impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Symmetric(key) => f
                .debug_struct("Symmetric")
                .field("len", &key.secret.len())
                .finish_non_exhaustive(),
            Key::Private(key) => f
                .debug_struct("Private")
                .field("len", &key.der.len())
                .finish_non_exhaustive(),
            Key::Public(key) => f.debug_tuple("Public").field(&key.bytes.len()).finish(),
        }
    }
}

/// Symmetric key for HMAC algorithms
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    secret: Vec<u8>,
}

impl SymmetricKey {
    /// Create a new symmetric key
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Get the secret bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl From<Vec<u8>> for SymmetricKey {
    fn from(secret: Vec<u8>) -> Self {
        Self::new(secret)
    }
}

impl From<&str> for SymmetricKey {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes().to_vec())
    }
}

/// PKCS#8 DER-encoded private key
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    der: Vec<u8>,
}

impl PrivateKey {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self { der: der.into() }
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
}

/// Encoded public key
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_key() {
        let key = Key::symmetric(b"secret".to_vec());
        assert_eq!(key.key_type(), "Symmetric");
        assert_eq!(key.as_symmetric().unwrap().as_bytes(), b"secret");
        assert!(key.check_signs(Algorithm::HS256).is_ok());
        assert!(key.check_verifies(Algorithm::HS512).is_ok());
    }

    #[test]
    fn test_key_type_mismatch() {
        let public = Key::public(vec![4u8; 65]);
        assert!(matches!(
            public.as_symmetric(),
            Err(Error::KeyTypeMismatch { .. })
        ));
        assert!(public.check_verifies(Algorithm::ES256).is_ok());
        assert!(matches!(
            public.check_signs(Algorithm::ES256),
            Err(Error::KeyTypeMismatch { .. })
        ));

        let secret = Key::symmetric("secret".as_bytes());
        assert!(matches!(
            secret.check_verifies(Algorithm::RS256),
            Err(Error::KeyTypeMismatch { algorithm, .. }) if algorithm == "RS256"
        ));

        let private = Key::private_pkcs8(vec![0u8; 8]);
        assert!(private.check_signs(Algorithm::RS384).is_ok());
        assert!(private.check_verifies(Algorithm::RS384).is_ok());
        assert!(private.check_signs(Algorithm::HS256).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = Key::symmetric(b"top-secret-value".to_vec());
        let debug = format!("{key:?}");
        assert!(!debug.contains("top-secret-value"));
        assert!(debug.contains("len: 16"));
    }
}
