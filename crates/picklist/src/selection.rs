#![forbid(unsafe_code)]

//! Selection state.
//!
//! Single-select holds at most one item and compares through the host's
//! equator. Multi-select holds keys in a hash set for O(1) membership plus
//! an ordered vector mirroring insertion order, which is what hosts see as
//! the value.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use crate::capabilities::ItemCapabilities;

// ---------------------------------------------------------------------------
// SingleSelection
// ---------------------------------------------------------------------------

/// At most one selected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSelection<T> {
    value: Option<T>,
}

impl<T> Default for SingleSelection<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> SingleSelection<T> {
    /// The selected item.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Whether `item` is the selected value under the host's equator.
    pub fn is_selected<K>(&self, item: &T, caps: &ItemCapabilities<T, K>) -> bool
    where
        K: Clone + Eq + Hash + fmt::Debug,
    {
        self.value
            .as_ref()
            .is_some_and(|current| caps.equals(current, item))
    }

    /// Replace the value. Returns whether it changed.
    pub fn select<K>(&mut self, item: T, caps: &ItemCapabilities<T, K>) -> bool
    where
        K: Clone + Eq + Hash + fmt::Debug,
    {
        if self.is_selected(&item, caps) {
            return false;
        }
        self.value = Some(item);
        true
    }

    /// Set or clear the value without comparison.
    pub fn set(&mut self, value: Option<T>) {
        self.value = value;
    }

    /// Clear the value. Returns whether there was one.
    pub fn clear(&mut self) -> bool {
        self.value.take().is_some()
    }
}

// ---------------------------------------------------------------------------
// MultiSelection
// ---------------------------------------------------------------------------

/// Outcome of [`MultiSelection::select_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllOutcome {
    /// Every key is now selected.
    Selected,
    /// The selection already covered everything and was cleared.
    Cleared,
}

/// A set of selected keys in insertion order.
///
/// # Invariants
///
/// `keys` and `order` always hold the same keys, each exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSelection<K: Eq + Hash> {
    keys: HashSet<K>,
    order: Vec<K>,
}

impl<K: Eq + Hash> Default for MultiSelection<K> {
    fn default() -> Self {
        Self {
            keys: HashSet::new(),
            order: Vec::new(),
        }
    }
}

impl<K> MultiSelection<K>
where
    K: Clone + Eq + Hash,
{
    /// Whether `key` is selected.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    /// Number of selected keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Selected keys in insertion order.
    #[must_use]
    pub fn values(&self) -> &[K] {
        &self.order
    }

    /// Membership index.
    #[must_use]
    pub fn key_set(&self) -> &HashSet<K> {
        &self.keys
    }

    /// Add `key` if absent. Returns whether it was added.
    pub fn insert(&mut self, key: K) -> bool {
        if self.keys.insert(key.clone()) {
            self.order.push(key);
            true
        } else {
            false
        }
    }

    /// Remove `key` if present. Returns whether it was removed.
    pub fn remove(&mut self, key: &K) -> bool {
        if self.keys.remove(key) {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    /// Remove `key` if present, append it otherwise.
    ///
    /// Returns whether the key is selected afterwards.
    pub fn toggle(&mut self, key: K) -> bool {
        if self.remove(&key) {
            false
        } else {
            self.insert(key);
            true
        }
    }

    /// Whether the selection is exactly `universe`.
    pub fn covers<'a>(&self, universe: impl IntoIterator<Item = &'a K>) -> bool
    where
        K: 'a,
    {
        let mut count = 0;
        for key in universe {
            if !self.keys.contains(key) {
                return false;
            }
            count += 1;
        }
        count == self.keys.len()
    }

    /// Clear if everything in `universe` is already selected, otherwise
    /// select all of it in the given order.
    pub fn select_all(&mut self, universe: Vec<K>) -> SelectAllOutcome {
        if self.covers(universe.iter()) {
            self.clear();
            return SelectAllOutcome::Cleared;
        }
        self.replace(universe);
        SelectAllOutcome::Selected
    }

    /// Replace the selection, dropping duplicate keys.
    pub fn replace(&mut self, keys: impl IntoIterator<Item = K>) {
        self.clear();
        for key in keys {
            self.insert(key);
        }
    }

    /// Drop every key. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.order.is_empty();
        self.keys.clear();
        self.order.clear();
        had_any
    }
}

// ---------------------------------------------------------------------------
// SelectionState / SelectionValue
// ---------------------------------------------------------------------------

/// Selection for either mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState<T, K: Eq + Hash> {
    /// One value.
    Single(SingleSelection<T>),
    /// A set of keys.
    Multiple(MultiSelection<K>),
}

/// Host-visible selection value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionValue<T, K> {
    /// The single-select value.
    Single(Option<T>),
    /// Multi-select keys in insertion order.
    Multiple(Vec<K>),
}

impl<T, K> SelectionState<T, K>
where
    T: Clone,
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Whether `item` is selected.
    pub fn is_selected(&self, item: &T, caps: &ItemCapabilities<T, K>) -> bool {
        match self {
            Self::Single(single) => single.is_selected(item, caps),
            Self::Multiple(multi) => multi.contains(&caps.key(item)),
        }
    }

    /// Snapshot for the host.
    #[must_use]
    pub fn value(&self) -> SelectionValue<T, K> {
        match self {
            Self::Single(single) => SelectionValue::Single(single.value().cloned()),
            Self::Multiple(multi) => SelectionValue::Multiple(multi.values().to_vec()),
        }
    }

    /// Clear either kind. Returns whether anything changed.
    pub fn clear(&mut self) -> bool {
        match self {
            Self::Single(single) => single.clear(),
            Self::Multiple(multi) => multi.clear(),
        }
    }

    /// Selected keys when multi-select.
    #[must_use]
    pub fn key_set(&self) -> Option<&HashSet<K>> {
        match self {
            Self::Single(_) => None,
            Self::Multiple(multi) => Some(multi.key_set()),
        }
    }
}
