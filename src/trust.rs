//! Issuer trust policies
//!
//! An [`IssuerTrust`] decides whether a token's `iss` claim names an issuer
//! the caller accepts. Besides fixed names and patterns it can defer to an
//! asynchronous check, for example a lookup in a tenant registry.

use crate::matching::MatchingPattern;

use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Asynchronous issuer check used by [`IssuerTrust::Check`]
pub type TrustCheck = Arc<dyn Fn(String) -> BoxFuture<'static, bool> + Send + Sync>;

/// Which issuers are trusted
#[derive(Clone)]
pub enum IssuerTrust {
    /// Exactly this issuer
    Issuer(String),

    /// Any issuer in the list
    AnyOf(Vec<String>),

    /// Any issuer matching the pattern
    Pattern(MatchingPattern<String>),

    /// Issuers for which the check resolves to `true`
    ///
    /// A check that panics, or whose future panics, means "not trusted".
    Check(TrustCheck),
}

impl IssuerTrust {
    pub fn issuer(issuer: impl Into<String>) -> Self {
        IssuerTrust::Issuer(issuer.into())
    }

    pub fn any_of<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IssuerTrust::AnyOf(issuers.into_iter().map(Into::into).collect())
    }

    pub fn pattern(pattern: impl Into<MatchingPattern<String>>) -> Self {
        IssuerTrust::Pattern(pattern.into())
    }

    /// Trust issuers accepted by an asynchronous check
    pub fn check<F, Fut>(check: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        IssuerTrust::Check(Arc::new(move |issuer| check(issuer).boxed()))
    }

    /// Whether `issuer` is trusted
    pub async fn trusts(&self, issuer: &str) -> bool {
        match self {
            IssuerTrust::Issuer(trusted) => trusted == issuer,
            IssuerTrust::AnyOf(trusted) => trusted.iter().any(|t| t == issuer),
            IssuerTrust::Pattern(pattern) => pattern.matches(&issuer.to_string()),
            IssuerTrust::Check(check) => {
                let future = match catch_unwind(AssertUnwindSafe(|| check(issuer.to_string()))) {
                    Ok(future) => future,
                    Err(_) => {
                        tracing::warn!(issuer, "issuer trust check panicked");
                        return false;
                    }
                };
                match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(trusted) => trusted,
                    Err(_) => {
                        tracing::warn!(issuer, "issuer trust check panicked");
                        false
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for IssuerTrust {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssuerTrust::Issuer(issuer) => f.debug_tuple("Issuer").field(issuer).finish(),
            IssuerTrust::AnyOf(issuers) => f.debug_tuple("AnyOf").field(issuers).finish(),
            IssuerTrust::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            IssuerTrust::Check(_) => f.write_str("Check(..)"),
        }
    }
}

impl From<&str> for IssuerTrust {
    fn from(issuer: &str) -> Self {
        IssuerTrust::issuer(issuer)
    }
}

impl From<Vec<String>> for IssuerTrust {
    fn from(issuers: Vec<String>) -> Self {
        IssuerTrust::AnyOf(issuers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_issuers() {
        assert!(IssuerTrust::issuer("a").trusts("a").await);
        assert!(!IssuerTrust::issuer("a").trusts("b").await);
        assert!(IssuerTrust::any_of(["a", "b"]).trusts("b").await);
        assert!(!IssuerTrust::any_of(Vec::<String>::new()).trusts("b").await);
    }

    #[tokio::test]
    async fn test_pattern() {
        let trust = IssuerTrust::pattern(
            MatchingPattern::<String>::regex(r"^https://auth\.example\.com/").unwrap(),
        );
        assert!(trust.trusts("https://auth.example.com/tenant-1").await);
        assert!(!trust.trusts("https://evil.example.com/").await);
    }

    #[tokio::test]
    async fn test_async_check() {
        let trust = IssuerTrust::check(|issuer| async move { issuer.starts_with("tenant-") });
        assert!(trust.trusts("tenant-42").await);
        assert!(!trust.trusts("stranger").await);
    }

    #[tokio::test]
    async fn test_panicking_check_is_untrusted() {
        let trust = IssuerTrust::check(|issuer| async move {
            if issuer == "boom" {
                panic!("registry unavailable");
            }
            true
        });
        assert!(!trust.trusts("boom").await);
        assert!(trust.trusts("fine").await);
    }
}
