#![forbid(unsafe_code)]

//! Relevance ranking for matched items.
//!
//! Every item starts at [`BASELINE_WEIGHT`] and loses weight for each piece
//! of evidence that it fits the query. Lower weight ranks first; ties keep
//! their source order.
//!
//! | Evidence | Decrement |
//! |----------|-----------|
//! | Searchable text starts with the whole query | 4 |
//! | Searchable text starts with a query word (per word) | 3 |
//! | A text word equals a query word (per pair) | 3 |
//! | A text word starts with a query word (per pair) | 2 |
//! | A text word contains a query word (per pair) | 1 |
//!
//! The per-pair checks are cumulative: an exact word match also counts as a
//! prefix and a substring match.
//!
//! # Example
//!
//! ```
//! use picklist::matcher::Query;
//! use picklist::relevance::weight;
//!
//! let query = Query::new("apple");
//! assert!(weight("Apple pie", &[], &query) < weight("Pineapple", &[], &query));
//! ```

use std::fmt;
use std::hash::Hash;

use crate::capabilities::ItemCapabilities;
use crate::matcher::{Query, normalize};

/// Starting weight before any evidence is applied.
pub const BASELINE_WEIGHT: u32 = 999;

const FULL_PREFIX: u32 = 4;
const WORD_START: u32 = 3;
const EXACT_WORD: u32 = 3;
const PREFIX_WORD: u32 = 2;
const SUBSTRING_WORD: u32 = 1;

/// Breakdown of the evidence behind a weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeightBreakdown {
    /// Searchable text started with the whole query.
    pub full_prefix: bool,
    /// Query words the searchable text starts with.
    pub word_starts: u32,
    /// Exact (query word, text word) pairs.
    pub exact: u32,
    /// Prefix (query word, text word) pairs.
    pub prefix: u32,
    /// Substring (query word, text word) pairs.
    pub substring: u32,
}

impl WeightBreakdown {
    /// Combined weight, saturating at zero.
    #[must_use]
    pub fn weight(&self) -> u32 {
        let bonus = if self.full_prefix { FULL_PREFIX } else { 0 }
            + self.word_starts * WORD_START
            + self.exact * EXACT_WORD
            + self.prefix * PREFIX_WORD
            + self.substring * SUBSTRING_WORD;
        BASELINE_WEIGHT.saturating_sub(bonus)
    }
}

impl fmt::Display for WeightBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "weight {} (full_prefix={}, word_starts={}, exact={}, prefix={}, substring={})",
            self.weight(),
            self.full_prefix,
            self.word_starts,
            self.exact,
            self.prefix,
            self.substring
        )
    }
}

/// Collect the evidence for `text` plus `extra` fields against `query`.
#[must_use]
pub fn explain(text: &str, extra: &[String], query: &Query) -> WeightBreakdown {
    let mut breakdown = WeightBreakdown::default();
    if query.is_empty() {
        return breakdown;
    }

    let mut searchable = normalize(text);
    for field in extra {
        let field = normalize(field);
        if !field.is_empty() {
            searchable.push(' ');
            searchable.push_str(&field);
        }
    }

    breakdown.full_prefix = searchable.starts_with(query.normalized());
    for word in query.words() {
        if searchable.starts_with(word.as_str()) {
            breakdown.word_starts += 1;
        }
        for text_word in searchable.split_whitespace() {
            if text_word == word {
                breakdown.exact += 1;
            }
            if text_word.starts_with(word.as_str()) {
                breakdown.prefix += 1;
            }
            if text_word.contains(word.as_str()) {
                breakdown.substring += 1;
            }
        }
    }
    breakdown
}

/// Lower-is-better weight for `text` plus `extra` fields against `query`.
#[must_use]
pub fn weight(text: &str, extra: &[String], query: &Query) -> u32 {
    explain(text, extra, query).weight()
}

/// Stable-sort item indices by ascending weight.
pub fn rank<T, K>(candidates: &mut Vec<usize>, items: &[T], caps: &ItemCapabilities<T, K>, query: &Query)
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    if query.is_empty() || candidates.len() < 2 {
        return;
    }
    let mut weighted: Vec<(u32, usize)> = candidates
        .iter()
        .map(|&index| {
            let item = &items[index];
            (weight(&caps.text(item), &caps.search_fields(item), query), index)
        })
        .collect();
    weighted.sort_by_key(|&(w, _)| w);
    candidates.clear();
    candidates.extend(weighted.into_iter().map(|(_, index)| index));
}
