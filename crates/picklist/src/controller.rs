#![forbid(unsafe_code)]

//! The picklist controller.
//!
//! [`Picklist`] owns the items, the working group copy, the query, the
//! selection, the navigation cursor and the new-value resolver. Every input
//! change funnels through one private `recompute` that rebuilds the render
//! list, repositions the cursor and re-evaluates whether a new value should
//! be requested. Hosts observe the outcome through [`Picklist::drain_events`]
//! and the return value of [`Picklist::handle_key`].
//!
//! # Example
//!
//! ```
//! use picklist::{ItemCapabilities, KeyCode, KeyEvent, Picklist, PicklistAction, PicklistConfig};
//!
//! let mut list = Picklist::new(
//!     PicklistConfig::default().with_debounce_ms(0),
//!     ItemCapabilities::<&str, &str>::new(|s| *s, |s| s.to_string()),
//! )
//! .unwrap()
//! .with_items(vec!["Apple", "Banana", "Cherry"]);
//!
//! list.set_query("an");
//! assert_eq!(list.render_list().len(), 1);
//! let action = list.handle_key(KeyEvent::new(KeyCode::Enter));
//! assert_eq!(action, Some(PicklistAction::Close));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use picklist_core::{Debouncer, KeyCode, KeyEvent};

use crate::capabilities::ItemCapabilities;
use crate::config::{PicklistConfig, Presentation, SelectionMode};
use crate::error::{NewValueError, PicklistError, PicklistResult};
use crate::group_index::{self, BuildInput, Group, GroupSet, RenderEntry, RenderList};
use crate::matcher::{MatchPolicy, Query};
use crate::navigation::{Activation, ActiveIndex, Move, NavigationCursor};
use crate::new_value::{
    NewValueProvider, NewValueResolver, NewValueResult, NewValueStatus, Provided, RequestToken,
    ResolutionTrace, Settlement,
};
use crate::selection::{
    MultiSelection, SelectAllOutcome, SelectionState, SelectionValue, SingleSelection,
};

// ---------------------------------------------------------------------------
// Host-facing signals
// ---------------------------------------------------------------------------

/// What the host dialog should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PicklistAction {
    /// A single-select value was committed.
    Close,
    /// Escape with an empty query: close without committing.
    Cancel,
}

/// State changes for hosts that observe the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PicklistEvent<T, K> {
    /// The selection changed through user interaction.
    SelectionChanged(SelectionValue<T, K>),
    /// The render list was rebuilt with different contents.
    RenderListChanged {
        /// Entries, headers included.
        entries: usize,
        /// Matched items.
        matched: usize,
    },
    /// New-value resolution moved to another status.
    NewValueStatusChanged(NewValueStatus),
    /// A resolved new value was committed.
    NewValueSelected(T),
}

// ---------------------------------------------------------------------------
// Picklist
// ---------------------------------------------------------------------------

/// Selectable-list controller.
pub struct Picklist<T, K: Eq + Hash> {
    config: PicklistConfig,
    caps: ItemCapabilities<T, K>,
    policy: MatchPolicy<T>,
    items: Vec<T>,
    groups: GroupSet,
    query: Query,
    debouncer: Debouncer<String>,
    selection: SelectionState<T, K>,
    render: RenderList,
    cursor: NavigationCursor,
    resolver: NewValueResolver<T>,
    provider: Option<Arc<dyn NewValueProvider<T>>>,
    /// Request whose value was last committed; each resolves into the selection once.
    committed: RequestToken,
    events: Vec<PicklistEvent<T, K>>,
    generation: u64,
}

impl<T, K: Eq + Hash> fmt::Debug for Picklist<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picklist")
            .field("mode", &self.config.mode)
            .field("items", &self.items.len())
            .field("groups", &self.groups.len())
            .field("query", &self.query.raw())
            .field("entries", &self.render.len())
            .field("active", &self.cursor.active())
            .field("new_value", &self.resolver.status())
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T, K> Picklist<T, K>
where
    T: Clone,
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Create an empty controller.
    ///
    /// # Errors
    ///
    /// Returns [`PicklistError::InvalidConfig`] when the configuration fails
    /// validation.
    pub fn new(config: PicklistConfig, caps: ItemCapabilities<T, K>) -> PicklistResult<Self> {
        config.validate()?;
        let selection = match config.mode {
            SelectionMode::Single => SelectionState::Single(SingleSelection::default()),
            SelectionMode::Multiple => SelectionState::Multiple(MultiSelection::default()),
        };
        let mut list = Self {
            cursor: NavigationCursor::new(config.navigation_policy()),
            debouncer: Debouncer::new(config.debounce_config()),
            config,
            caps,
            policy: MatchPolicy::default(),
            items: Vec::new(),
            groups: GroupSet::empty(),
            query: Query::default(),
            selection,
            render: RenderList::default(),
            resolver: NewValueResolver::new(),
            provider: None,
            committed: RequestToken::NONE,
            events: Vec::new(),
            generation: 0,
        };
        list.recompute(true);
        list.events.clear();
        Ok(list)
    }

    /// Set the initial items.
    #[must_use]
    pub fn with_items(mut self, items: Vec<T>) -> Self {
        self.set_items(items);
        self.events.clear();
        self
    }

    /// Replace the match policy.
    #[must_use]
    pub fn with_match_policy(mut self, policy: MatchPolicy<T>) -> Self {
        self.set_match_policy(policy);
        self.events.clear();
        self
    }

    /// Install the new-value provider.
    #[must_use]
    pub fn with_new_value_provider(mut self, provider: impl NewValueProvider<T> + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &PicklistConfig {
        &self.config
    }

    /// The host capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &ItemCapabilities<T, K> {
        &self.caps
    }

    /// All items.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Item at `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Display text of the item at `index`.
    #[must_use]
    pub fn item_text(&self, index: usize) -> Option<String> {
        self.items.get(index).map(|item| self.caps.text(item))
    }

    /// The working group copy.
    #[must_use]
    pub fn groups(&self) -> &GroupSet {
        &self.groups
    }

    /// The applied query.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Typed text still inside its debounce window.
    #[must_use]
    pub fn pending_query(&self) -> Option<&str> {
        self.debouncer.pending().map(String::as_str)
    }

    /// When the pending query becomes due, for host timers.
    #[must_use]
    pub fn query_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// The current render list.
    #[must_use]
    pub fn render_list(&self) -> &RenderList {
        &self.render
    }

    /// The active index.
    #[must_use]
    pub fn active(&self) -> ActiveIndex {
        self.cursor.active()
    }

    /// The active render entry.
    #[must_use]
    pub fn active_entry(&self) -> Option<&RenderEntry> {
        self.cursor
            .active()
            .entry()
            .and_then(|position| self.render.get(position))
    }

    /// Whether the select-all row is offered.
    #[must_use]
    pub fn select_all_available(&self) -> bool {
        self.config.mode == SelectionMode::Multiple
            && (!self.config.searchable
                || (self.query.is_empty() && self.items.len() >= self.config.select_all_min_items))
    }

    /// Whether the item at `index` is selected.
    #[must_use]
    pub fn is_item_selected(&self, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|item| self.selection.is_selected(item, &self.caps))
    }

    /// The selection.
    #[must_use]
    pub fn selection(&self) -> &SelectionState<T, K> {
        &self.selection
    }

    /// Snapshot of the selection for the host.
    #[must_use]
    pub fn value(&self) -> SelectionValue<T, K> {
        self.selection.value()
    }

    /// New-value resolution status.
    #[must_use]
    pub fn new_value_status(&self) -> NewValueStatus {
        self.resolver.status()
    }

    /// The resolved new value.
    #[must_use]
    pub fn new_value(&self) -> Option<&T> {
        self.resolver.value()
    }

    /// The provider failure.
    #[must_use]
    pub fn new_value_error(&self) -> Option<&NewValueError> {
        self.resolver.error()
    }

    /// The current new-value request token.
    #[must_use]
    pub fn new_value_token(&self) -> RequestToken {
        self.resolver.current_token()
    }

    /// The new-value lifecycle trace.
    #[must_use]
    pub fn resolution_trace(&self) -> &ResolutionTrace {
        self.resolver.trace()
    }

    /// Forget recorded resolution events.
    pub fn clear_resolution_trace(&mut self) {
        self.resolver.clear_trace();
    }

    /// Whether the host should window the list.
    #[must_use]
    pub fn should_virtualize(&self) -> bool {
        self.config
            .virtualization_policy()
            .should_virtualize(self.items.len())
    }

    /// The placeholder message for an empty list, if the list is empty.
    #[must_use]
    pub fn empty_message(&self) -> Option<&str> {
        if !self.render.is_empty() {
            return None;
        }
        let messages = &self.config.messages;
        Some(if self.items.is_empty() {
            &messages.no_records
        } else if self.resolver.status() == NewValueStatus::InProgress {
            &messages.loading
        } else {
            &messages.no_matching
        })
    }

    /// Number of recomputes so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Take the queued events.
    pub fn drain_events(&mut self) -> Vec<PicklistEvent<T, K>> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Replace the items. The cursor returns to the first item.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.recompute(true);
    }

    /// Replace the groups with a fresh working copy.
    ///
    /// # Errors
    ///
    /// Returns [`PicklistError::DuplicateGroup`] and keeps the old groups
    /// when two groups share a name.
    pub fn set_groups(&mut self, groups: &[Group]) -> PicklistResult<()> {
        self.groups = GroupSet::new(groups)?;
        self.recompute(true);
        Ok(())
    }

    /// Remove all groups.
    pub fn clear_groups(&mut self) {
        self.groups = GroupSet::empty();
        self.recompute(true);
    }

    /// Replace the match policy.
    pub fn set_match_policy(&mut self, policy: MatchPolicy<T>) {
        self.policy = policy;
        self.recompute(true);
    }

    /// Apply a query immediately, dropping any debounced input.
    pub fn set_query(&mut self, text: &str) {
        self.debouncer.cancel();
        self.apply_query(text);
    }

    /// Stage typed text; it applies once input has been quiet long enough.
    pub fn input_query(&mut self, text: &str, now: Instant) {
        if let Some(text) = self.debouncer.push_at(text.to_string(), now) {
            self.apply_query(&text);
        }
    }

    /// Apply a due query and collect settled new-value work.
    pub fn tick(&mut self, now: Instant) {
        if let Some(text) = self.debouncer.poll_at(now) {
            self.apply_query(&text);
        }
        self.poll_new_value();
    }

    fn apply_query(&mut self, text: &str) {
        if text == self.query.raw() {
            return;
        }
        picklist_core::debug!(query = text, "query applied");
        self.query = Query::new(text);
        self.recompute(true);
    }

    // -----------------------------------------------------------------------
    // Keyboard
    // -----------------------------------------------------------------------

    /// Handle a navigation or activation key.
    ///
    /// Text entry belongs to the host's input element; only arrows, paging,
    /// Enter, Space and Escape are consumed here.
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<PicklistAction> {
        if !event.is_actionable() {
            return None;
        }
        let page = self.config.page_size;
        let movement = match event.code {
            KeyCode::Up => Move::Up,
            KeyCode::Down => Move::Down,
            KeyCode::Home => Move::Home,
            KeyCode::End => Move::End,
            KeyCode::PageUp => Move::PageUp(page),
            KeyCode::PageDown => Move::PageDown(page),
            KeyCode::Enter => return self.activate(),
            KeyCode::Char(' ') if event.is_plain() => return self.activate(),
            KeyCode::Escape => return self.escape(),
            KeyCode::Char(_) => return None,
        };
        self.move_cursor(movement);
        None
    }

    /// Move the cursor. Returns whether the active index changed.
    pub fn move_cursor(&mut self, movement: Move) -> bool {
        self.cursor.apply(movement, &self.render)
    }

    /// Set the active index directly, e.g. on pointer hover.
    ///
    /// Returns `false` for positions the cursor may not rest on.
    pub fn set_active(&mut self, active: ActiveIndex) -> bool {
        self.cursor.set_active(active, &self.render)
    }

    /// Act on the active entry, as Enter does.
    pub fn activate(&mut self) -> Option<PicklistAction> {
        match self.cursor.activation(&self.render) {
            Activation::None => {
                // Inline values are committed on arrival; only full-screen waits for Enter.
                if self.render.is_empty()
                    && self.config.presentation == Presentation::FullScreen
                    && self.resolver.status() == NewValueStatus::NewValue
                {
                    return match self.confirm_new_value() {
                        Ok(_) if self.config.mode == SelectionMode::Single => {
                            Some(PicklistAction::Close)
                        }
                        _ => None,
                    };
                }
                None
            }
            Activation::SelectAll => {
                if self.select_all().is_err() {
                    picklist_core::debug!(mode = ?self.config.mode, "select-all row ignored");
                }
                None
            }
            Activation::Item(index) => match self.config.mode {
                SelectionMode::Single => self
                    .select_item(index)
                    .ok()
                    .map(|()| PicklistAction::Close),
                SelectionMode::Multiple => {
                    if self.toggle_item(index).is_err() {
                        picklist_core::debug!(index, mode = ?self.config.mode, "toggle ignored");
                    }
                    None
                }
            },
            Activation::ToggleGroup(group) => {
                self.toggle_group(group);
                None
            }
        }
    }

    fn escape(&mut self) -> Option<PicklistAction> {
        let pending = self.debouncer.cancel();
        if !self.query.raw().is_empty() {
            self.apply_query("");
            None
        } else if pending.is_some_and(|text| !text.is_empty()) {
            None
        } else {
            Some(PicklistAction::Cancel)
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Select the item at `index` (single-select click path).
    ///
    /// # Errors
    ///
    /// [`PicklistError::NotSingleSelect`] in multi-select mode,
    /// [`PicklistError::UnknownKey`] for an out-of-range index.
    pub fn select_item(&mut self, index: usize) -> PicklistResult<()> {
        let item = self.items.get(index).cloned().ok_or(PicklistError::UnknownKey)?;
        let SelectionState::Single(single) = &mut self.selection else {
            return Err(PicklistError::NotSingleSelect);
        };
        if single.select(item, &self.caps) {
            self.selection_changed(true);
        }
        Ok(())
    }

    /// Toggle the item at `index` (multi-select click path).
    ///
    /// Returns whether the item is selected afterwards.
    ///
    /// # Errors
    ///
    /// [`PicklistError::NotMultiSelect`] in single-select mode,
    /// [`PicklistError::UnknownKey`] for an out-of-range index.
    pub fn toggle_item(&mut self, index: usize) -> PicklistResult<bool> {
        let key = self
            .items
            .get(index)
            .map(|item| self.caps.key(item))
            .ok_or(PicklistError::UnknownKey)?;
        let SelectionState::Multiple(multi) = &mut self.selection else {
            return Err(PicklistError::NotMultiSelect);
        };
        let selected = multi.toggle(key);
        self.selection_changed(true);
        Ok(selected)
    }

    /// Select the item carrying `key` without toggling.
    ///
    /// # Errors
    ///
    /// [`PicklistError::UnknownKey`] when no item has the key.
    pub fn select_key(&mut self, key: &K) -> PicklistResult<()> {
        let index = self
            .items
            .iter()
            .position(|item| self.caps.key(item) == *key)
            .ok_or(PicklistError::UnknownKey)?;
        if let SelectionState::Multiple(multi) = &mut self.selection {
            if multi.insert(key.clone()) {
                self.selection_changed(true);
            }
            return Ok(());
        }
        self.select_item(index)
    }

    /// Select every item, or clear when everything is already selected.
    ///
    /// # Errors
    ///
    /// [`PicklistError::NotMultiSelect`] in single-select mode.
    pub fn select_all(&mut self) -> PicklistResult<SelectAllOutcome> {
        let universe: Vec<K> = self.items.iter().map(|item| self.caps.key(item)).collect();
        let SelectionState::Multiple(multi) = &mut self.selection else {
            return Err(PicklistError::NotMultiSelect);
        };
        let outcome = multi.select_all(universe);
        self.selection_changed(true);
        Ok(outcome)
    }

    /// Clear the selection. Returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear();
        if changed {
            self.selection_changed(true);
        }
        changed
    }

    /// Set the multi-select value from the host. No event is emitted.
    ///
    /// # Errors
    ///
    /// [`PicklistError::NotMultiSelect`] in single-select mode.
    pub fn set_values(&mut self, keys: Vec<K>) -> PicklistResult<()> {
        let SelectionState::Multiple(multi) = &mut self.selection else {
            return Err(PicklistError::NotMultiSelect);
        };
        multi.replace(keys);
        self.selection_changed(false);
        Ok(())
    }

    /// Set the single-select value from the host. No event is emitted.
    ///
    /// # Errors
    ///
    /// [`PicklistError::NotSingleSelect`] in multi-select mode.
    pub fn set_value(&mut self, value: Option<T>) -> PicklistResult<()> {
        let SelectionState::Single(single) = &mut self.selection else {
            return Err(PicklistError::NotSingleSelect);
        };
        single.set(value);
        Ok(())
    }

    /// Flip a collapsible group. Returns the new collapsed flag.
    pub fn toggle_group(&mut self, group: usize) -> Option<bool> {
        let collapsed = self.groups.toggle(group)?;
        self.recompute(false);
        Some(collapsed)
    }

    fn selection_changed(&mut self, notify: bool) {
        if notify {
            self.events
                .push(PicklistEvent::SelectionChanged(self.selection.value()));
        }
        if self.config.pins_selection() {
            self.recompute(false);
        }
    }

    // -----------------------------------------------------------------------
    // New values
    // -----------------------------------------------------------------------

    /// Collect results from pending provider work.
    ///
    /// Returns how many results arrived, stale ones included.
    pub fn poll_new_value(&mut self) -> usize {
        let settled = self.resolver.poll();
        let count = settled.len();
        for (_, settlement) in settled {
            self.on_settlement(settlement);
        }
        count
    }

    /// Deliver a result for work the host ran itself.
    pub fn complete_new_value(
        &mut self,
        token: RequestToken,
        result: NewValueResult<T>,
    ) -> Settlement {
        let settlement = self.resolver.complete(token, result);
        self.on_settlement(settlement);
        settlement
    }

    /// Commit a resolved new value (full-screen presentation).
    ///
    /// # Errors
    ///
    /// [`PicklistError::NewValueDisabled`] when new values are off,
    /// [`PicklistError::NoPendingNewValue`] when nothing is resolved or the
    /// resolved value was already committed.
    pub fn confirm_new_value(&mut self) -> PicklistResult<T> {
        if !self.config.allow_new_value {
            return Err(PicklistError::NewValueDisabled);
        }
        if self.resolver.status() != NewValueStatus::NewValue {
            return Err(PicklistError::NoPendingNewValue);
        }
        self.commit_new_value().ok_or(PicklistError::NoPendingNewValue)
    }

    fn on_settlement(&mut self, settlement: Settlement) {
        let Settlement::Applied(status) = settlement else {
            return;
        };
        self.events.push(PicklistEvent::NewValueStatusChanged(status));
        if status == NewValueStatus::NewValue && self.config.presentation == Presentation::Inline {
            self.commit_new_value();
        }
    }

    fn commit_new_value(&mut self) -> Option<T> {
        let token = self.resolver.current_token();
        if !token.is_none() && token == self.committed {
            picklist_core::debug!(token = token.raw(), "new value already committed");
            return None;
        }
        let value = self.resolver.value().cloned()?;
        self.committed = token;
        self.events
            .push(PicklistEvent::NewValueSelected(value.clone()));
        match &mut self.selection {
            SelectionState::Single(single) => single.set(Some(value.clone())),
            SelectionState::Multiple(multi) => {
                multi.insert(self.caps.key(&value));
            }
        }
        self.selection_changed(true);
        Some(value)
    }

    fn sync_new_value(&mut self) {
        let wanted = self.config.allow_new_value
            && self.render.matched() == 0
            && !self.query.is_empty();

        if !wanted {
            if self.resolver.reset() {
                self.events
                    .push(PicklistEvent::NewValueStatusChanged(NewValueStatus::Idle));
            }
            return;
        }

        let text = self.query.raw().trim();
        if self.resolver.requested_query() == Some(text) {
            return;
        }
        let Some(provider) = self.provider.clone() else {
            return;
        };
        let text = text.to_string();
        let token = self.resolver.begin(&text);
        self.events
            .push(PicklistEvent::NewValueStatusChanged(NewValueStatus::InProgress));
        match provider.provide(&text) {
            Provided::Ready(result) => {
                self.complete_new_value(token, result);
            }
            Provided::Pending(receiver) => self.resolver.track(token, receiver),
        }
    }

    // -----------------------------------------------------------------------
    // Recompute
    // -----------------------------------------------------------------------

    /// Rebuild the render list from the current inputs.
    ///
    /// `reset_cursor` sends the cursor back to the first item; otherwise the
    /// active entry follows its item or group into the new list.
    fn recompute(&mut self, reset_cursor: bool) {
        let span = picklist_core::debug_span!(
            "picklist.recompute",
            items = self.items.len(),
            groups = self.groups.len(),
            query = self.query.raw(),
            generation = self.generation + 1
        );
        let _guard = span.enter();

        let previous = self.active_entry().copied();
        let pins = if self.config.pins_selection() {
            self.selection.key_set()
        } else {
            None
        };
        let list = group_index::build(&BuildInput {
            items: &self.items,
            caps: &self.caps,
            groups: &self.groups,
            policy: &self.policy,
            query: &self.query,
            ordering: self.config.ordering,
            pins,
        });
        self.generation += 1;

        let changed = list != self.render;
        self.render = list;
        if changed {
            self.events.push(PicklistEvent::RenderListChanged {
                entries: self.render.len(),
                matched: self.render.matched(),
            });
        }

        let select_all = self.select_all_available();
        self.cursor.set_select_all_available(select_all);
        if reset_cursor {
            self.cursor.reset(&self.render, self.config.input_mode);
        } else {
            self.follow(previous);
        }

        self.sync_new_value();
    }

    fn follow(&mut self, previous: Option<RenderEntry>) {
        let same = previous.and_then(|previous| {
            self.render.iter().position(|entry| match (previous, entry) {
                (RenderEntry::Item { index: a, .. }, RenderEntry::Item { index: b, .. }) => a == *b,
                (RenderEntry::Group { index: a, .. }, RenderEntry::Group { index: b, .. }) => {
                    a == *b
                }
                _ => false,
            })
        });
        match same {
            Some(position) if self.cursor.set_active(ActiveIndex::Entry(position), &self.render) => {}
            _ => self.cursor.clamp(&self.render),
        }
    }
}

#[cfg(feature = "json")]
impl<K> Picklist<serde_json::Value, K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Replace the items from a JSON document. Anything but an array reads
    /// as no items.
    pub fn set_items_json(&mut self, document: &serde_json::Value) {
        let items = match document {
            serde_json::Value::Array(items) => items.clone(),
            _ => Vec::new(),
        };
        self.set_items(items);
    }
}
