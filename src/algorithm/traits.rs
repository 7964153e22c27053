use super::Algorithm;
use crate::error::Result;
use crate::keys::Key;

use futures::future::BoxFuture;

/// Produces signatures over a signable string
///
/// Implementations may be asynchronous (an HSM, a remote KMS). The returned
/// signature is the Base64URL-encoded signature segment.
pub trait Signer: Send + Sync {
    /// Sign `signing_input` (`header.payload`) with `algorithm` and `key`
    fn sign<'a>(
        &'a self,
        signing_input: &'a str,
        algorithm: Algorithm,
        key: &'a Key,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Checks signatures produced by a [`Signer`]
///
/// Any internal failure (bad key, malformed signature) resolves to `false`.
pub trait KeyVerifier: Send + Sync {
    /// Verify a Base64URL-encoded `signature` over `signing_input`
    fn verify<'a>(
        &'a self,
        signing_input: &'a str,
        signature: &'a str,
        algorithm: Algorithm,
        key: &'a Key,
    ) -> BoxFuture<'a, bool>;
}
