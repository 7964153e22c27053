//! Value matching
//!
//! A [`MatchingPattern`] describes the set of acceptable values for a check
//! such as "is this audience one of ours". Patterns are built once and can be
//! shared freely between threads.
//!
//! ```
//! use jaks::matching::MatchingPattern;
//!
//! let audience = MatchingPattern::one_of([
//!     MatchingPattern::literal("billing".to_string()),
//!     MatchingPattern::regex(r"^https://api\.example\.com/").unwrap(),
//! ]);
//!
//! assert!(audience.matches(&"billing".to_string()));
//! assert!(audience.matches(&"https://api.example.com/v2".to_string()));
//! assert!(!audience.matches(&"reporting".to_string()));
//! ```

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Values a [`MatchingPattern`] can be evaluated against
///
/// `as_match_str` exposes a string view for [`MatchingPattern::Regex`];
/// values without one never match a regex.
pub trait MatchValue: Eq + Hash {
    fn as_match_str(&self) -> Option<&str> {
        None
    }
}

impl MatchValue for String {
    fn as_match_str(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl MatchValue for &str {
    fn as_match_str(&self) -> Option<&str> {
        Some(*self)
    }
}

impl MatchValue for i64 {}
impl MatchValue for u64 {}
impl MatchValue for bool {}

/// Predicate function used by [`MatchingPattern::Predicate`]
pub type MatchFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A reusable matcher built from a pattern
pub type Matcher<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Description of acceptable values
pub enum MatchingPattern<T> {
    /// Matches a value equal to this one
    Literal(T),

    /// Matches when any of the nested patterns matches, tested in order
    OneOf(Vec<MatchingPattern<T>>),

    /// Matches any member of the set
    SetOf(HashSet<T>),

    /// Matches when the function returns `true`
    ///
    /// A predicate that panics counts as a non-match.
    Predicate(MatchFn<T>),

    /// Matches when the value's string view matches the expression
    Regex(Regex),
}

impl<T: MatchValue> MatchingPattern<T> {
    pub fn literal(value: impl Into<T>) -> Self {
        MatchingPattern::Literal(value.into())
    }

    pub fn one_of(patterns: impl IntoIterator<Item = MatchingPattern<T>>) -> Self {
        MatchingPattern::OneOf(patterns.into_iter().collect())
    }

    pub fn set_of(values: impl IntoIterator<Item = T>) -> Self {
        MatchingPattern::SetOf(values.into_iter().collect())
    }

    pub fn predicate(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        MatchingPattern::Predicate(Arc::new(f))
    }

    /// Compile a regular expression pattern
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(MatchingPattern::Regex)
            .map_err(|e| Error::Configuration(format!("invalid regex pattern: {e}")))
    }

    /// Check whether `value` matches this pattern
    ///
    /// Never panics and never fails.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            MatchingPattern::Literal(expected) => expected == value,
            MatchingPattern::OneOf(patterns) => patterns.iter().any(|p| p.matches(value)),
            MatchingPattern::SetOf(set) => set.contains(value),
            MatchingPattern::Predicate(f) => {
                match catch_unwind(AssertUnwindSafe(|| f(value))) {
                    Ok(matched) => matched,
                    Err(_) => {
                        tracing::warn!("matching predicate panicked; treating as no match");
                        false
                    }
                }
            }
            MatchingPattern::Regex(regex) => value
                .as_match_str()
                .is_some_and(|text| regex.is_match(text)),
        }
    }
}

impl<T: MatchValue + Clone + Send + Sync + 'static> MatchingPattern<T> {
    /// Turn the pattern into a standalone matching function
    pub fn matcher(&self) -> Matcher<T> {
        let pattern = self.clone();
        Box::new(move |value| pattern.matches(value))
    }
}

/// Check whether `value` matches `pattern`
pub fn matches<T: MatchValue>(pattern: &MatchingPattern<T>, value: &T) -> bool {
    pattern.matches(value)
}

impl<T: Clone> Clone for MatchingPattern<T> {
    fn clone(&self) -> Self {
        match self {
            MatchingPattern::Literal(value) => MatchingPattern::Literal(value.clone()),
            MatchingPattern::OneOf(patterns) => MatchingPattern::OneOf(patterns.clone()),
            MatchingPattern::SetOf(set) => MatchingPattern::SetOf(set.clone()),
            MatchingPattern::Predicate(f) => MatchingPattern::Predicate(Arc::clone(f)),
            MatchingPattern::Regex(regex) => MatchingPattern::Regex(regex.clone()),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MatchingPattern<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchingPattern::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            MatchingPattern::OneOf(patterns) => f.debug_tuple("OneOf").field(patterns).finish(),
            MatchingPattern::SetOf(set) => f.debug_tuple("SetOf").field(set).finish(),
            MatchingPattern::Predicate(_) => f.write_str("Predicate(..)"),
            MatchingPattern::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
        }
    }
}

impl From<&str> for MatchingPattern<String> {
    fn from(value: &str) -> Self {
        MatchingPattern::Literal(value.to_string())
    }
}

impl From<String> for MatchingPattern<String> {
    fn from(value: String) -> Self {
        MatchingPattern::Literal(value)
    }
}

impl From<Vec<String>> for MatchingPattern<String> {
    fn from(values: Vec<String>) -> Self {
        MatchingPattern::OneOf(values.into_iter().map(MatchingPattern::Literal).collect())
    }
}

impl From<Regex> for MatchingPattern<String> {
    fn from(regex: Regex) -> Self {
        MatchingPattern::Regex(regex)
    }
}
