//! Issue-then-verify tests
//!
//! Exercises the full flow for HMAC and ECDSA keys: issuing, parsing,
//! verifying, tamper detection, audience and issuer checks, and failures
//! of pluggable signers.

use aws_lc_rs::encoding::{AsDer, Pkcs8V1Der};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::rsa::{KeyPair as RsaKeyPair, KeySize};
use aws_lc_rs::signature::{ECDSA_P256_SHA256_FIXED_SIGNING, EcdsaKeyPair, KeyPair};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use jaks::*;
use std::time::Duration;

const SECRET: &[u8] = b"integration-secret";

fn hmac_issuer() -> Issuer {
    Issuer::builder(TokenConfig::default(), Algorithm::HS256, Key::symmetric(SECRET))
        .identity("https://auth.example.com")
        .build()
        .unwrap()
}

fn ecdsa_keys() -> (Key, Key) {
    let rng = SystemRandom::new();
    let document = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng).unwrap();
    let keypair =
        EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, document.as_ref()).unwrap();
    (
        Key::private_pkcs8(document.as_ref().to_vec()),
        Key::public(keypair.public_key().as_ref().to_vec()),
    )
}

fn rsa_keys() -> (Key, Key) {
    let pair = RsaKeyPair::generate(KeySize::Rsa2048).unwrap();
    let document: Pkcs8V1Der<'static> = pair.as_der().unwrap();
    (
        Key::private_pkcs8(document.as_ref().to_vec()),
        Key::public(pair.public_key().as_ref().to_vec()),
    )
}

fn registry_lookup(_issuer: &str) -> bool {
    panic!("registry offline")
}

/// Replace one character of the payload segment
fn tamper(token: &str) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let payload = &mut parts[1];
    let last = payload.pop().unwrap();
    payload.push(if last == 'A' { 'B' } else { 'A' });
    parts.join(".")
}

// ============================================================================
// Round Trips
// ============================================================================

#[tokio::test]
async fn test_hmac_round_trip() {
    let issuer = hmac_issuer();
    let token = issuer
        .issue_token(IssueOptions::new().subject("u1").audience("svc"))
        .await
        .unwrap();

    let verified = issuer
        .parse_then_verify_token(&token.to_string())
        .await
        .unwrap();
    assert_eq!(verified, Some(token));
}

#[tokio::test]
async fn test_ecdsa_round_trip_with_public_key() {
    let (private, public) = ecdsa_keys();
    let config = TokenConfig::builder()
        .algorithms(AlgorithmPolicy::ecdsa_any())
        .build()
        .unwrap();

    let issuer = Issuer::builder(config.clone(), Algorithm::ES256, private)
        .verification_key(public.clone())
        .build()
        .unwrap();
    let token = issuer
        .issue_token(IssueOptions::new().subject("u1").audience("svc"))
        .await
        .unwrap();
    assert_eq!(token.signature().unwrap().to_bytes().unwrap().len(), 64);

    // A standalone verifier holding only the public key
    let verifier = Verifier::builder(config, public)
        .audience("svc")
        .build()
        .unwrap();
    let verified = verifier
        .parse_then_verify_token(&token.to_string())
        .await
        .unwrap();
    assert_eq!(verified, Some(token));
}

#[tokio::test]
async fn test_rsa_round_trip_with_public_key() {
    let (private, public) = rsa_keys();
    let config = TokenConfig::builder()
        .algorithms(AlgorithmPolicy::rsa_any())
        .build()
        .unwrap();

    for algorithm in [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512] {
        let issuer = Issuer::builder(config.clone(), algorithm, private.clone())
            .verification_key(public.clone())
            .build()
            .unwrap();
        let token = issuer
            .issue_token(IssueOptions::new().subject("u1"))
            .await
            .unwrap();
        assert_eq!(token.algorithm(), algorithm);
        assert_eq!(token.signature().unwrap().to_bytes().unwrap().len(), 256);

        let verifier = Verifier::builder(config.clone(), public.clone()).build().unwrap();
        let verified = verifier
            .parse_then_verify_token(&token.to_string())
            .await
            .unwrap();
        assert_eq!(verified, Some(token.clone()));

        let forged = Token::with_parts(
            token.header().clone(),
            token.payload().clone().with_subject("mallory"),
            token.signature().cloned(),
        );
        assert!(!verifier.verify_token(&forged).await);
    }
}

#[tokio::test]
async fn test_issuer_cannot_sign_with_public_key() {
    let (_, public) = ecdsa_keys();
    let result = Issuer::builder(TokenConfig::default(), Algorithm::ES256, public).build();
    assert!(matches!(result, Err(Error::KeyTypeMismatch { .. })));
}

// ============================================================================
// Rejections
// ============================================================================

#[tokio::test]
async fn test_tampered_payload_is_rejected() {
    let issuer = hmac_issuer();
    let token = issuer.issue_token(IssueOptions::new()).await.unwrap();
    let tampered = tamper(&token.to_string());

    match issuer.parse_token(&tampered) {
        Ok(parsed) => assert!(!issuer.verify_token(&parsed).await),
        Err(e) => assert!(matches!(e, Error::Decode(_) | Error::ClaimSchema { .. })),
    }
    assert!(issuer.parse_then_verify_token_safe(&tampered).await.is_none());

    // Same signature over a different payload
    let forged = Token::with_parts(
        token.header().clone(),
        token.payload().clone().with_subject("mallory"),
        token.signature().cloned(),
    );
    assert!(!issuer.verify_token(&forged).await);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let issuer = hmac_issuer();
    let token = issuer
        .issue_token(IssueOptions::new().valid_time(Duration::from_millis(500)))
        .await
        .unwrap();
    // The default reserve of one second already covers the whole window
    assert!(!issuer.verify_token(&token).await);
}

#[tokio::test]
async fn test_delayed_token_is_not_yet_valid() {
    let issuer = hmac_issuer();
    let token = issuer
        .issue_token(IssueOptions::new().validity_delay(Duration::from_secs(60)))
        .await
        .unwrap();
    assert!(!issuer.verify_token(&token).await);
}

#[tokio::test]
async fn test_audience_patterns() {
    let issuer = Issuer::builder(TokenConfig::default(), Algorithm::HS256, Key::symmetric(SECRET))
        .audience(MatchingPattern::<String>::one_of([
            MatchingPattern::literal("a"),
            MatchingPattern::regex("^z").unwrap(),
        ]))
        .build()
        .unwrap();

    let for_b = issuer
        .issue_token(IssueOptions::new().audience(["b", "zeta"]))
        .await
        .unwrap();
    assert!(issuer.verify_token(&for_b).await);

    let for_c = issuer
        .issue_token(IssueOptions::new().audience("c"))
        .await
        .unwrap();
    assert!(!issuer.verify_token(&for_c).await);

    let without = issuer.issue_token(IssueOptions::new()).await.unwrap();
    assert!(!issuer.verify_token(&without).await);
}

#[tokio::test]
async fn test_issuer_trust_policies() {
    let token = hmac_issuer().issue_token(IssueOptions::new()).await.unwrap();
    let text = token.to_string();

    let trusted = [
        IssuerTrust::issuer("https://auth.example.com"),
        IssuerTrust::any_of(["https://other.example.com", "https://auth.example.com"]),
        IssuerTrust::pattern(MatchingPattern::<String>::regex(r"\.example\.com$").unwrap()),
        IssuerTrust::check(|issuer| async move { issuer.starts_with("https://") }),
    ];
    for trust in trusted {
        let verifier = Verifier::builder(TokenConfig::default(), Key::symmetric(SECRET))
            .trust(trust)
            .build()
            .unwrap();
        assert!(verifier.parse_then_verify_token(&text).await.unwrap().is_some());
    }

    let verifier = Verifier::builder(TokenConfig::default(), Key::symmetric(SECRET))
        .trust(IssuerTrust::check(|issuer| async move { registry_lookup(&issuer) }))
        .build()
        .unwrap();
    assert_eq!(verifier.parse_then_verify_token(&text).await, Ok(None));
}

#[tokio::test]
async fn test_algorithm_confusion_is_rejected() {
    // A token signed with HS256 using the ECDSA public key bytes as the secret
    let (_, public) = ecdsa_keys();
    let Key::Public(public_bytes) = &public else {
        unreachable!()
    };
    let forged = Token::new(
        Header::new(Algorithm::HS256),
        Payload::new(std::time::SystemTime::now() + Duration::from_secs(600)),
    )
    .sign(&StandardCrypto, &Key::symmetric(public_bytes.as_bytes()))
    .await
    .unwrap();

    let verifier = Verifier::builder(TokenConfig::default(), public).build().unwrap();
    assert!(!verifier.verify_token(&forged).await);
}

// ============================================================================
// Pluggable Signers
// ============================================================================

struct FailingSigner;

impl Signer for FailingSigner {
    fn sign<'a>(&'a self, _: &'a str, _: Algorithm, _: &'a Key) -> BoxFuture<'a, Result<String>> {
        future::ready(Err(Error::Configuration("hsm unavailable".to_string()))).boxed()
    }
}

struct EmptySigner;

impl Signer for EmptySigner {
    fn sign<'a>(&'a self, _: &'a str, _: Algorithm, _: &'a Key) -> BoxFuture<'a, Result<String>> {
        future::ready(Ok(String::new())).boxed()
    }
}

#[tokio::test]
async fn test_signer_failures_surface_as_signing_errors() {
    let failing = Issuer::builder(TokenConfig::default(), Algorithm::HS256, Key::symmetric(SECRET))
        .signer(FailingSigner)
        .build()
        .unwrap();
    assert!(matches!(
        failing.issue_token(IssueOptions::new()).await,
        Err(Error::Signing(_))
    ));

    let empty = Issuer::builder(TokenConfig::default(), Algorithm::HS256, Key::symmetric(SECRET))
        .signer(EmptySigner)
        .build()
        .unwrap();
    assert!(matches!(
        empty.issue_token(IssueOptions::new()).await,
        Err(Error::Signing(_))
    ));
}
