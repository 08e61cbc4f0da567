#![forbid(unsafe_code)]

//! Controller configuration.
//!
//! # Example
//!
//! ```
//! use picklist::config::{PicklistConfig, ResultOrdering, SelectionMode};
//!
//! let config = PicklistConfig::default()
//!     .with_mode(SelectionMode::Multiple)
//!     .with_ordering(ResultOrdering::Relevance)
//!     .with_pin_selected(true);
//! assert!(config.validate().is_ok());
//! ```

use picklist_core::InputMode;
use picklist_core::debounce::{DEFAULT_DEBOUNCE_MS, DebounceConfig};

use crate::error::ConfigError;
use crate::navigation::NavigationPolicy;
use crate::virtualization::{DEFAULT_VIRTUALIZATION_THRESHOLD, VirtualizationPolicy};

/// Minimum item count before the select-all row is offered while searchable.
pub const DEFAULT_SELECT_ALL_MIN_ITEMS: usize = 10;

/// Default PageUp/PageDown distance.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One value or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionMode {
    /// At most one value; activation closes the host dialog.
    #[default]
    Single,
    /// A set of keys; activation toggles.
    Multiple,
}

impl SelectionMode {
    /// The navigation rules that go with the mode.
    #[must_use]
    pub const fn navigation_policy(self) -> NavigationPolicy {
        match self {
            Self::Single => NavigationPolicy::Wrapping,
            Self::Multiple => NavigationPolicy::Clamped,
        }
    }
}

/// How the host presents the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Presentation {
    /// Dropdown or popover. Resolved new values are committed at once.
    #[default]
    Inline,
    /// Full-screen dialog. Resolved new values wait for confirmation.
    FullScreen,
}

/// Order of matched items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultOrdering {
    /// Keep the host's order.
    #[default]
    Source,
    /// Best match first while a query is active.
    Relevance,
}

/// Display strings. The controller only decides which one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Messages {
    /// There are no items at all.
    pub no_records: String,
    /// Items exist but none match.
    pub no_matching: String,
    /// A new value is being resolved.
    pub loading: String,
    /// Placeholder for the search input.
    pub search_placeholder: String,
    /// Label of the select-all row.
    pub select_all: String,
    /// Label of the create-new action.
    pub create_new: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            no_records: "No records".into(),
            no_matching: "No matching records".into(),
            loading: "Loading...".into(),
            search_placeholder: "Search".into(),
            select_all: "Select all".into(),
            create_new: "Create new".into(),
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct PicklistConfig {
    /// Single or multi-select. Also picks the navigation policy.
    pub mode: SelectionMode,
    /// Whether a query input is offered.
    pub searchable: bool,
    /// Offer to create a value when nothing matches.
    pub allow_new_value: bool,
    /// Where the list is shown; decides whether new values need confirming.
    pub presentation: Presentation,
    /// Touch hosts start with no active entry.
    pub input_mode: InputMode,
    /// Order of matched items.
    pub ordering: ResultOrdering,
    /// Pin selected items to the top (multi-select only).
    pub pin_selected: bool,
    /// Quiet window before typed queries apply (ms).
    pub debounce_ms: u64,
    /// Item count at which the select-all row appears while searchable.
    pub select_all_min_items: usize,
    /// Item count above which the list is virtualized.
    pub virtualization_threshold: usize,
    /// Stops moved by PageUp/PageDown.
    pub page_size: usize,
    /// User-facing strings.
    pub messages: Messages,
}

impl Default for PicklistConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Single,
            searchable: true,
            allow_new_value: false,
            presentation: Presentation::Inline,
            input_mode: InputMode::Keyboard,
            ordering: ResultOrdering::Source,
            pin_selected: false,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            select_all_min_items: DEFAULT_SELECT_ALL_MIN_ITEMS,
            virtualization_threshold: DEFAULT_VIRTUALIZATION_THRESHOLD,
            page_size: DEFAULT_PAGE_SIZE,
            messages: Messages::default(),
        }
    }
}

impl PicklistConfig {
    /// Set the selection mode.
    #[must_use]
    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Turn the query input on or off.
    ///
    /// Without search, multi-select always offers the select-all row.
    #[must_use]
    pub fn with_searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Let unmatched queries become values.
    #[must_use]
    pub fn with_allow_new_value(mut self, allow: bool) -> Self {
        self.allow_new_value = allow;
        self
    }

    /// Choose inline or full-screen presentation.
    ///
    /// ```
    /// use picklist::{PicklistConfig, Presentation};
    ///
    /// let config = PicklistConfig::default().with_presentation(Presentation::FullScreen);
    /// assert_eq!(config.presentation, Presentation::FullScreen);
    /// ```
    #[must_use]
    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    /// Set the input mode.
    #[must_use]
    pub fn with_input_mode(mut self, input_mode: InputMode) -> Self {
        self.input_mode = input_mode;
        self
    }

    /// Rank matches by relevance or keep source order.
    #[must_use]
    pub fn with_ordering(mut self, ordering: ResultOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Pin selected items. Ignored in single-select mode.
    #[must_use]
    pub fn with_pin_selected(mut self, pin: bool) -> Self {
        self.pin_selected = pin;
        self
    }

    /// Quiet window for typed queries; 0 applies every keystroke.
    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Minimum items for the select-all row while searchable.
    #[must_use]
    pub fn with_select_all_min_items(mut self, min_items: usize) -> Self {
        self.select_all_min_items = min_items;
        self
    }

    /// Item count above which hosts should virtualize.
    #[must_use]
    pub fn with_virtualization_threshold(mut self, threshold: usize) -> Self {
        self.virtualization_threshold = threshold;
        self
    }

    /// Stops moved per page. Must be non-zero.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Replace the message table.
    #[must_use]
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.virtualization_threshold == 0 {
            return Err(ConfigError::ZeroVirtualizationThreshold);
        }
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        Ok(())
    }

    /// Navigation rules for the configured mode.
    #[must_use]
    pub fn navigation_policy(&self) -> NavigationPolicy {
        self.mode.navigation_policy()
    }

    /// Virtualization rule for the configured threshold.
    #[must_use]
    pub fn virtualization_policy(&self) -> VirtualizationPolicy {
        VirtualizationPolicy::new(self.virtualization_threshold)
    }

    /// Debouncer settings for query input.
    #[must_use]
    pub fn debounce_config(&self) -> DebounceConfig {
        DebounceConfig::with_delay_ms(self.debounce_ms)
    }

    /// Whether pinning applies (multi-select with pinning on).
    #[must_use]
    pub fn pins_selection(&self) -> bool {
        self.pin_selected && self.mode == SelectionMode::Multiple
    }

    /// Read a configuration document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields,
    /// or the validation error for out-of-range values.
    #[cfg(feature = "json")]
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_their_field() {
        let messages = Messages {
            loading: "Working".into(),
            ..Messages::default()
        };
        let config = PicklistConfig::default()
            .with_mode(SelectionMode::Multiple)
            .with_searchable(false)
            .with_allow_new_value(true)
            .with_presentation(Presentation::FullScreen)
            .with_input_mode(InputMode::Touch)
            .with_ordering(ResultOrdering::Relevance)
            .with_pin_selected(true)
            .with_debounce_ms(0)
            .with_select_all_min_items(3)
            .with_virtualization_threshold(50)
            .with_page_size(4)
            .with_messages(messages.clone());
        assert_eq!(config.mode, SelectionMode::Multiple);
        assert!(!config.searchable);
        assert!(config.allow_new_value);
        assert_eq!(config.presentation, Presentation::FullScreen);
        assert_eq!(config.input_mode, InputMode::Touch);
        assert_eq!(config.ordering, ResultOrdering::Relevance);
        assert!(config.pins_selection());
        assert_eq!(config.debounce_ms, 0);
        assert_eq!(config.select_all_min_items, 3);
        assert_eq!(config.virtualization_threshold, 50);
        assert_eq!(config.page_size, 4);
        assert_eq!(config.messages, messages);
        assert_eq!(config.navigation_policy(), NavigationPolicy::Clamped);
    }

    #[test]
    fn defaults() {
        let config = PicklistConfig::default();
        assert_eq!(config.mode, SelectionMode::Single);
        assert!(config.searchable);
        assert!(!config.allow_new_value);
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.select_all_min_items, 10);
        assert_eq!(config.virtualization_threshold, 500);
        assert_eq!(config.navigation_policy(), NavigationPolicy::Wrapping);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zeroes() {
        let config = PicklistConfig::default().with_page_size(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPageSize));
        let config = PicklistConfig::default().with_virtualization_threshold(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroVirtualizationThreshold));
    }

    #[test]
    fn pinning_is_multi_only() {
        let config = PicklistConfig::default().with_pin_selected(true);
        assert!(!config.pins_selection());
        assert!(config.with_mode(SelectionMode::Multiple).pins_selection());
    }

    #[cfg(feature = "json")]
    #[test]
    fn from_json_fills_defaults() {
        let config = PicklistConfig::from_json(
            r#"{ "mode": "Multiple", "debounce_ms": 0, "messages": { "loading": "Wait" } }"#,
        )
        .unwrap();
        assert_eq!(config.mode, SelectionMode::Multiple);
        assert_eq!(config.debounce_ms, 0);
        assert_eq!(config.messages.loading, "Wait");
        assert_eq!(config.messages.no_records, "No records");
        assert_eq!(config.page_size, 10);
    }

    #[cfg(feature = "json")]
    #[test]
    fn from_json_rejects_unknown_fields_and_bad_ranges() {
        assert!(matches!(
            PicklistConfig::from_json(r#"{ "colour": "red" }"#),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            PicklistConfig::from_json(r#"{ "page_size": 0 }"#),
            Err(ConfigError::ZeroPageSize)
        );
    }
}
