#![forbid(unsafe_code)]

//! Render-list construction.
//!
//! [`build`] is the single recompute function: it filters items through the
//! active [`MatchPolicy`], optionally ranks them, pins selected items to the
//! top, and flattens the rest into group sections. The output is a
//! [`RenderList`] of [`RenderEntry`] values that point back into the
//! controller's owned item and group collections by index.
//!
//! # Invariants
//!
//! 1. Every `Item` entry satisfies the match policy for the query.
//! 2. With exactly one group no `Group` entry is emitted and the group is
//!    never collapsed.
//! 3. A collapsed collapsible group contributes its header but no items.
//! 4. Items whose group name is missing or unknown are dropped when groups
//!    are configured.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Duplicate group names | [`GroupSet::new`] returns `DuplicateGroup` |
//! | Item without a known group | Dropped, logged at trace level |
//! | Empty item collection | Empty render list |

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use crate::capabilities::ItemCapabilities;
use crate::config::ResultOrdering;
use crate::error::PicklistError;
use crate::matcher::{MatchPolicy, Query};
use crate::relevance;

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A named partition of items.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Group {
    /// Unique name matched against each item's group.
    pub name: String,
    /// Header text.
    pub label: String,
    /// Whether the header can collapse its items.
    pub collapsible: bool,
    /// Whether the items are currently hidden.
    pub collapsed: bool,
    /// Optional icon identifier for the host.
    pub icon: Option<String>,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            name: String::new(),
            label: String::new(),
            collapsible: false,
            collapsed: false,
            icon: None,
        }
    }
}

impl Group {
    /// Create an expanded, non-collapsible group.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// Set whether the group can collapse.
    #[must_use]
    pub fn with_collapsible(mut self, collapsible: bool) -> Self {
        self.collapsible = collapsible;
        self
    }

    /// Set the initial collapse state.
    #[must_use]
    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    /// Set the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Whether the group currently hides its items.
    #[must_use]
    pub fn is_folded(&self) -> bool {
        self.collapsible && self.collapsed
    }
}

// ---------------------------------------------------------------------------
// GroupSet
// ---------------------------------------------------------------------------

/// The controller's working copy of the host's groups.
///
/// Collapse toggles mutate this copy only; the host's collection is never
/// aliased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSet {
    groups: Vec<Group>,
}

impl GroupSet {
    /// Copy and validate the host's groups.
    ///
    /// A single group is forced expanded.
    ///
    /// # Errors
    ///
    /// Returns [`PicklistError::DuplicateGroup`] when two groups share a name.
    pub fn new(groups: &[Group]) -> Result<Self, PicklistError> {
        let mut seen = HashSet::with_capacity(groups.len());
        for group in groups {
            if !seen.insert(group.name.as_str()) {
                return Err(PicklistError::DuplicateGroup {
                    name: group.name.clone(),
                });
            }
        }
        let mut groups = groups.to_vec();
        if let [only] = groups.as_mut_slice() {
            only.collapsed = false;
        }
        Ok(Self { groups })
    }

    /// No groups.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no groups are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Whether group headers are shown at all.
    #[must_use]
    pub fn shows_headers(&self) -> bool {
        self.groups.len() > 1
    }

    /// Group at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    /// Position of the group called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.name == name)
    }

    /// Flip the collapse flag of a collapsible group.
    ///
    /// Returns the new flag, or `None` when the group does not exist, is not
    /// collapsible, or is the only group.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        if !self.shows_headers() {
            return None;
        }
        let group = self.groups.get_mut(index)?;
        if !group.collapsible {
            return None;
        }
        group.collapsed = !group.collapsed;
        Some(group.collapsed)
    }

    /// Iterate groups in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Groups as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Group] {
        &self.groups
    }
}

// ---------------------------------------------------------------------------
// RenderEntry / RenderList
// ---------------------------------------------------------------------------

/// One row of the render list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderEntry {
    /// An item, by index into the controller's items.
    Item {
        /// Item index.
        index: usize,
        /// Shown in the pinned section at the top.
        pinned: bool,
    },
    /// A group header, by index into the group set.
    Group {
        /// Group index.
        index: usize,
        /// Header can collapse its items.
        collapsible: bool,
        /// Items are hidden.
        collapsed: bool,
        /// Matching items in the group, hidden ones included.
        matched: usize,
    },
}

impl RenderEntry {
    /// True for `Item` entries.
    #[must_use]
    pub const fn is_item(&self) -> bool {
        matches!(self, Self::Item { .. })
    }

    /// True for `Group` entries.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    /// Item index for `Item` entries.
    #[must_use]
    pub const fn item_index(&self) -> Option<usize> {
        match self {
            Self::Item { index, .. } => Some(*index),
            Self::Group { .. } => None,
        }
    }

    /// Group index for `Group` entries.
    #[must_use]
    pub const fn group_index(&self) -> Option<usize> {
        match self {
            Self::Group { index, .. } => Some(*index),
            Self::Item { .. } => None,
        }
    }

    /// True for headers that can collapse.
    #[must_use]
    pub const fn is_collapsible_group(&self) -> bool {
        matches!(
            self,
            Self::Group {
                collapsible: true,
                ..
            }
        )
    }
}

/// The flattened, filtered list presented for navigation and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderList {
    entries: Vec<RenderEntry>,
    matched: usize,
}

impl RenderList {
    /// Number of entries, headers included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of items that passed the filter and have a place in the list.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Position of the first `Item` entry.
    #[must_use]
    pub fn first_item_position(&self) -> Option<usize> {
        self.entries.iter().position(RenderEntry::is_item)
    }

    /// Entry at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&RenderEntry> {
        self.entries.get(position)
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, RenderEntry> {
        self.entries.iter()
    }

    /// Entries as a slice.
    #[must_use]
    pub fn entries(&self) -> &[RenderEntry] {
        &self.entries
    }

    /// Item indices in display order.
    pub fn item_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().filter_map(RenderEntry::item_index)
    }
}

impl<'a> IntoIterator for &'a RenderList {
    type Item = &'a RenderEntry;
    type IntoIter = std::slice::Iter<'a, RenderEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

/// Everything the render list depends on.
pub struct BuildInput<'a, T, K> {
    /// All items.
    pub items: &'a [T],
    /// Host capabilities.
    pub caps: &'a ItemCapabilities<T, K>,
    /// Working group copy.
    pub groups: &'a GroupSet,
    /// Active match policy.
    pub policy: &'a MatchPolicy<T>,
    /// Current query.
    pub query: &'a Query,
    /// Source order or best match first.
    pub ordering: ResultOrdering,
    /// Selected keys to pin to the top, if pinning is on.
    pub pins: Option<&'a HashSet<K>>,
}

impl<T, K> fmt::Debug for BuildInput<'_, T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildInput")
            .field("items", &self.items.len())
            .field("groups", &self.groups.len())
            .field("policy", self.policy)
            .field("query", &self.query.raw())
            .field("ordering", &self.ordering)
            .field("pins", &self.pins.map(HashSet::len))
            .finish()
    }
}

/// Compute the render list.
#[must_use]
pub fn build<T, K>(input: &BuildInput<'_, T, K>) -> RenderList
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    let BuildInput {
        items,
        caps,
        groups,
        policy,
        query,
        ordering,
        pins,
    } = *input;

    let mut candidates: Vec<usize> = (0..items.len())
        .filter(|&index| policy.matches(&items[index], caps, query))
        .collect();

    if ordering == ResultOrdering::Relevance {
        relevance::rank(&mut candidates, items, caps, query);
    }

    let mut entries = Vec::with_capacity(candidates.len());
    let mut matched = 0;

    if let Some(selected) = pins.filter(|selected| !all_selected(items, caps, selected)) {
        let mut rest = Vec::with_capacity(candidates.len());
        for index in candidates {
            if selected.contains(&caps.key(&items[index])) {
                entries.push(RenderEntry::Item {
                    index,
                    pinned: true,
                });
                matched += 1;
            } else {
                rest.push(index);
            }
        }
        candidates = rest;
    }

    if groups.is_empty() {
        matched += candidates.len();
        entries.extend(candidates.into_iter().map(|index| RenderEntry::Item {
            index,
            pinned: false,
        }));
        return RenderList { entries, matched };
    }

    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
    for index in candidates {
        let position = caps
            .group_of(&items[index])
            .and_then(|name| groups.position(&name));
        match position {
            Some(position) => buckets[position].push(index),
            None => {
                picklist_core::trace!(item = index, "item dropped: no matching group");
            }
        }
    }

    let headers = groups.shows_headers();
    for (group_index, (group, bucket)) in groups.iter().zip(buckets).enumerate() {
        if bucket.is_empty() {
            continue;
        }
        matched += bucket.len();
        if headers {
            entries.push(RenderEntry::Group {
                index: group_index,
                collapsible: group.collapsible,
                collapsed: group.is_folded(),
                matched: bucket.len(),
            });
            if group.is_folded() {
                continue;
            }
        }
        entries.extend(bucket.into_iter().map(|index| RenderEntry::Item {
            index,
            pinned: false,
        }));
    }

    RenderList { entries, matched }
}

fn all_selected<T, K>(items: &[T], caps: &ItemCapabilities<T, K>, selected: &HashSet<K>) -> bool
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    selected.len() >= items.len() && items.iter().all(|item| selected.contains(&caps.key(item)))
}
