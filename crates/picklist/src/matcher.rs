#![forbid(unsafe_code)]

//! Query matching.
//!
//! Item text and query are both trimmed and lower-cased; the query is split
//! on whitespace into words. [`MatchPolicy::AllWords`] keeps items whose
//! text contains every word, [`MatchPolicy::AnyWord`] keeps items containing
//! at least one, and [`MatchPolicy::Custom`] hands the decision to the host.
//!
//! An empty query matches every item under every policy.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::capabilities::ItemCapabilities;

/// Host predicate `(item, raw_query) -> keep`.
pub type QueryFilter<T> = Arc<dyn Fn(&T, &str) -> bool + Send + Sync>;

/// Lower-case and trim.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A search query with its normalized form and words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    raw: String,
    normalized: String,
    words: Vec<String>,
}

impl Query {
    /// Build a query from user input.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        let words = normalized.split_whitespace().map(str::to_string).collect();
        Self {
            raw,
            normalized,
            words,
        }
    }

    /// The text as typed.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed, lower-cased text.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Whitespace-separated words of the normalized text.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// True when nothing but whitespace was typed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// ---------------------------------------------------------------------------
// MatchPolicy
// ---------------------------------------------------------------------------

/// How items are tested against a query.
pub enum MatchPolicy<T> {
    /// Every query word must appear in the item text.
    AllWords,
    /// At least one query word must appear in the item text.
    AnyWord,
    /// Host predicate; replaces the word policies entirely.
    Custom(QueryFilter<T>),
}

impl<T> MatchPolicy<T> {
    /// Wrap a host predicate.
    pub fn custom(filter: impl Fn(&T, &str) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(filter))
    }

    /// Whether `item` matches `query`.
    pub fn matches<K>(&self, item: &T, caps: &ItemCapabilities<T, K>, query: &Query) -> bool
    where
        K: Clone + Eq + Hash + fmt::Debug,
    {
        if query.is_empty() {
            return true;
        }
        match self {
            Self::AllWords => all_words_match(&normalize(&caps.text(item)), query),
            Self::AnyWord => any_word_matches(&normalize(&caps.text(item)), query),
            Self::Custom(filter) => filter(item, query.raw()),
        }
    }
}

impl<T> Default for MatchPolicy<T> {
    fn default() -> Self {
        Self::AllWords
    }
}

impl<T> Clone for MatchPolicy<T> {
    fn clone(&self) -> Self {
        match self {
            Self::AllWords => Self::AllWords,
            Self::AnyWord => Self::AnyWord,
            Self::Custom(filter) => Self::Custom(Arc::clone(filter)),
        }
    }
}

impl<T> fmt::Debug for MatchPolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllWords => write!(f, "AllWords"),
            Self::AnyWord => write!(f, "AnyWord"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// AND semantics over already-normalized text.
#[must_use]
pub fn all_words_match(text: &str, query: &Query) -> bool {
    query.words().iter().all(|word| text.contains(word.as_str()))
}

/// OR semantics over already-normalized text.
#[must_use]
pub fn any_word_matches(text: &str, query: &Query) -> bool {
    query.is_empty() || query.words().iter().any(|word| text.contains(word.as_str()))
}
