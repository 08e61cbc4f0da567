#![forbid(unsafe_code)]

//! Keyboard navigation over a render list.
//!
//! The cursor tracks one [`ActiveIndex`]. Which entries it may rest on, and
//! what happens at the ends of the list, depend on the [`NavigationPolicy`]:
//!
//! | | `Clamped` (multi-select) | `Wrapping` (single-select) |
//! |-|--------------------------|----------------------------|
//! | Stops | items | items and collapsible group headers |
//! | Past the last stop | stays | wraps to the first |
//! | Before the first stop | select-all row if offered, else stays | wraps to the last |
//!
//! Page moves never wrap under either policy.
//!
//! # Invariants
//!
//! After any move the active index is `None`, `SelectAll`, or an entry that
//! is a stop under the policy. Non-collapsible group headers are never
//! active.

use picklist_core::InputMode;

use crate::group_index::{RenderEntry, RenderList};

/// Where the cursor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActiveIndex {
    /// Nothing is active.
    #[default]
    None,
    /// The multi-select "select all" pseudo-row above the list.
    SelectAll,
    /// A position in the render list.
    Entry(usize),
}

impl ActiveIndex {
    /// The render-list position, if any.
    #[must_use]
    pub const fn entry(self) -> Option<usize> {
        match self {
            Self::Entry(position) => Some(position),
            Self::None | Self::SelectAll => None,
        }
    }
}

/// Boundary and stop rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationPolicy {
    /// Items only, no wrap, optional select-all row above the first item.
    Clamped,
    /// Items and collapsible headers, wraps at both ends.
    Wrapping,
}

impl NavigationPolicy {
    /// Whether the cursor may rest on `entry`.
    #[must_use]
    pub const fn is_stop(self, entry: &RenderEntry) -> bool {
        match entry {
            RenderEntry::Item { .. } => true,
            RenderEntry::Group { collapsible, .. } => {
                matches!(self, Self::Wrapping) && *collapsible
            }
        }
    }
}

/// A cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    /// One stop up.
    Up,
    /// One stop down.
    Down,
    /// First stop.
    Home,
    /// Last stop.
    End,
    /// Up to `n` stops up.
    PageUp(usize),
    /// Up to `n` stops down.
    PageDown(usize),
}

/// What Enter or Space on the active entry should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    /// Nothing is active.
    None,
    /// Toggle select-all.
    SelectAll,
    /// Select or toggle the item at this index.
    Item(usize),
    /// Flip the collapse state of the group at this index.
    ToggleGroup(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Active-entry tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationCursor {
    active: ActiveIndex,
    policy: NavigationPolicy,
    select_all: bool,
}

impl NavigationCursor {
    /// A cursor with nothing active.
    #[must_use]
    pub fn new(policy: NavigationPolicy) -> Self {
        Self {
            active: ActiveIndex::None,
            policy,
            select_all: false,
        }
    }

    /// The active index.
    #[must_use]
    pub fn active(&self) -> ActiveIndex {
        self.active
    }

    /// The policy.
    #[must_use]
    pub fn policy(&self) -> NavigationPolicy {
        self.policy
    }

    /// Whether the select-all row is currently a stop.
    #[must_use]
    pub fn select_all_available(&self) -> bool {
        self.select_all
    }

    /// Offer or withdraw the select-all row.
    ///
    /// Only the clamped policy ever offers it. Withdrawing it while it is
    /// active leaves nothing active.
    pub fn set_select_all_available(&mut self, available: bool) {
        self.select_all = available && self.policy == NavigationPolicy::Clamped;
        if !self.select_all && self.active == ActiveIndex::SelectAll {
            self.active = ActiveIndex::None;
        }
    }

    /// Jump to the first item, or nothing under touch input.
    pub fn reset(&mut self, list: &RenderList, input_mode: InputMode) {
        self.active = if input_mode.auto_activates() {
            list.first_item_position()
                .map_or(ActiveIndex::None, ActiveIndex::Entry)
        } else {
            ActiveIndex::None
        };
    }

    /// Set the active index if it is a valid stop. Returns whether it was set.
    pub fn set_active(&mut self, active: ActiveIndex, list: &RenderList) -> bool {
        let valid = match active {
            ActiveIndex::None => true,
            ActiveIndex::SelectAll => self.select_all,
            ActiveIndex::Entry(position) => self.is_stop_at(list, position),
        };
        if valid {
            self.active = active;
        }
        valid
    }

    /// Keep the active entry valid after the list changed shape.
    ///
    /// A still-valid entry stays put; otherwise the nearest stop at or above
    /// it wins, then the nearest below, then nothing.
    pub fn clamp(&mut self, list: &RenderList) {
        let ActiveIndex::Entry(position) = self.active else {
            return;
        };
        if self.is_stop_at(list, position) {
            return;
        }
        let start = position.min(list.len());
        self.active = (0..start)
            .rev()
            .find(|&p| self.is_stop_at(list, p))
            .or_else(|| (start..list.len()).find(|&p| self.is_stop_at(list, p)))
            .map_or(ActiveIndex::None, ActiveIndex::Entry);
    }

    /// Apply a movement. Returns whether the active index changed.
    pub fn apply(&mut self, movement: Move, list: &RenderList) -> bool {
        let before = self.active;
        let wrap = self.policy == NavigationPolicy::Wrapping;
        match movement {
            Move::Up => {
                if let Some(next) = self.step(list, Direction::Up, wrap) {
                    self.active = next;
                }
            }
            Move::Down => {
                if let Some(next) = self.step(list, Direction::Down, wrap) {
                    self.active = next;
                }
            }
            Move::Home => {
                if let Some(first) = self.first_stop(list) {
                    self.active = ActiveIndex::Entry(first);
                }
            }
            Move::End => {
                if let Some(last) = self.last_stop(list) {
                    self.active = ActiveIndex::Entry(last);
                }
            }
            Move::PageUp(n) => {
                for _ in 0..n.max(1) {
                    match self.step(list, Direction::Up, false) {
                        Some(next) => self.active = next,
                        None => break,
                    }
                }
            }
            Move::PageDown(n) => {
                for _ in 0..n.max(1) {
                    match self.step(list, Direction::Down, false) {
                        Some(next) => self.active = next,
                        None => break,
                    }
                }
            }
        }
        self.active != before
    }

    /// Move one stop up.
    pub fn move_up(&mut self, list: &RenderList) -> bool {
        self.apply(Move::Up, list)
    }

    /// Move one stop down.
    pub fn move_down(&mut self, list: &RenderList) -> bool {
        self.apply(Move::Down, list)
    }

    /// What activating the current entry should do.
    #[must_use]
    pub fn activation(&self, list: &RenderList) -> Activation {
        match self.active {
            ActiveIndex::None => Activation::None,
            ActiveIndex::SelectAll => Activation::SelectAll,
            ActiveIndex::Entry(position) => match list.get(position) {
                Some(RenderEntry::Item { index, .. }) => Activation::Item(*index),
                Some(RenderEntry::Group {
                    index,
                    collapsible: true,
                    ..
                }) => Activation::ToggleGroup(*index),
                Some(RenderEntry::Group { .. }) | None => Activation::None,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn is_stop_at(&self, list: &RenderList, position: usize) -> bool {
        list.get(position)
            .is_some_and(|entry| self.policy.is_stop(entry))
    }

    fn first_stop(&self, list: &RenderList) -> Option<usize> {
        (0..list.len()).find(|&p| self.is_stop_at(list, p))
    }

    fn last_stop(&self, list: &RenderList) -> Option<usize> {
        (0..list.len()).rev().find(|&p| self.is_stop_at(list, p))
    }

    /// The next active index one stop away, or `None` to stay put.
    fn step(&self, list: &RenderList, direction: Direction, wrap: bool) -> Option<ActiveIndex> {
        let len = list.len();
        match (self.active, direction) {
            (ActiveIndex::None, Direction::Up) => {
                if self.select_all {
                    Some(ActiveIndex::SelectAll)
                } else if wrap {
                    self.last_stop(list).map(ActiveIndex::Entry)
                } else {
                    self.first_stop(list).map(ActiveIndex::Entry)
                }
            }
            (ActiveIndex::None | ActiveIndex::SelectAll, Direction::Down) => {
                self.first_stop(list).map(ActiveIndex::Entry)
            }
            (ActiveIndex::SelectAll, Direction::Up) => None,
            (ActiveIndex::Entry(position), direction) => {
                if len == 0 {
                    return None;
                }
                let position = position.min(len - 1);
                if wrap {
                    (1..=len)
                        .map(|offset| match direction {
                            Direction::Down => (position + offset) % len,
                            Direction::Up => (position + len - offset % len) % len,
                        })
                        .find(|&p| self.is_stop_at(list, p))
                        .filter(|&p| p != position || !self.is_stop_at(list, position))
                        .map(ActiveIndex::Entry)
                } else {
                    let found = match direction {
                        Direction::Down => (position + 1..len).find(|&p| self.is_stop_at(list, p)),
                        Direction::Up => (0..position).rev().find(|&p| self.is_stop_at(list, p)),
                    };
                    match found {
                        Some(p) => Some(ActiveIndex::Entry(p)),
                        None if direction == Direction::Up && self.select_all => {
                            Some(ActiveIndex::SelectAll)
                        }
                        None => None,
                    }
                }
            }
        }
    }
}
