#![forbid(unsafe_code)]

//! Host capability interface.
//!
//! Every question the controller asks about a host item goes through an
//! [`ItemCapabilities`] value injected at construction: the item's key, its
//! display text, its group, whether two items are "the same" value, and
//! any extra text to search. Optional capabilities have a documented
//! default, so there are no run-time "was a callback supplied" checks
//! sprinkled through the controller.
//!
//! Callbacks are not sandboxed. A panicking callback propagates to the
//! caller of the controller method that invoked it.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

#[cfg(feature = "json")]
use crate::error::PathError;
#[cfg(feature = "json")]
use crate::path::PathExpression;
#[cfg(feature = "json")]
use serde_json::Value;

/// Item → key.
pub type ValueFn<T, K> = Arc<dyn Fn(&T) -> K + Send + Sync>;
/// Item → display and search text.
pub type TextFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
/// Item → group name.
pub type GroupFn<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;
/// Value equality between two items.
pub type EquatorFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;
/// Item → extra search text.
pub type SearchFieldsFn<T> = Arc<dyn Fn(&T) -> Vec<String> + Send + Sync>;

/// Default key field for JSON items.
pub const DEFAULT_VALUE_EXPRESSION: &str = "_id";

/// Host callbacks describing items of type `T` keyed by `K`.
///
/// | Capability | Default when absent |
/// |------------|---------------------|
/// | `value` | required |
/// | `text` | required |
/// | `group` | every item is ungrouped |
/// | `equator` | keys compare equal |
/// | `search_fields` | no extra text |
pub struct ItemCapabilities<T, K> {
    value: ValueFn<T, K>,
    text: TextFn<T>,
    group: Option<GroupFn<T>>,
    equator: Option<EquatorFn<T>>,
    search_fields: Option<SearchFieldsFn<T>>,
}

impl<T, K> Clone for ItemCapabilities<T, K> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            text: Arc::clone(&self.text),
            group: self.group.clone(),
            equator: self.equator.clone(),
            search_fields: self.search_fields.clone(),
        }
    }
}

impl<T, K> fmt::Debug for ItemCapabilities<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemCapabilities")
            .field("group", &self.group.is_some())
            .field("equator", &self.equator.is_some())
            .field("search_fields", &self.search_fields.is_some())
            .finish_non_exhaustive()
    }
}

impl<T, K> ItemCapabilities<T, K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Capabilities from a key function and a text function.
    pub fn new(
        value: impl Fn(&T) -> K + Send + Sync + 'static,
        text: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            value: Arc::new(value),
            text: Arc::new(text),
            group: None,
            equator: None,
            search_fields: None,
        }
    }

    /// Assign items to groups by name.
    #[must_use]
    pub fn with_group(mut self, group: impl Fn(&T) -> Option<String> + Send + Sync + 'static) -> Self {
        self.group = Some(Arc::new(group));
        self
    }

    /// Override value equality for single-select comparisons.
    #[must_use]
    pub fn with_equator(mut self, equator: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        self.equator = Some(Arc::new(equator));
        self
    }

    /// Extra text considered by relevance ranking.
    #[must_use]
    pub fn with_search_fields(
        mut self,
        fields: impl Fn(&T) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.search_fields = Some(Arc::new(fields));
        self
    }

    /// The item's key.
    #[must_use]
    pub fn key(&self, item: &T) -> K {
        (self.value)(item)
    }

    /// The item's display text.
    #[must_use]
    pub fn text(&self, item: &T) -> String {
        (self.text)(item)
    }

    /// The item's group name, if grouping is configured and the item has one.
    #[must_use]
    pub fn group_of(&self, item: &T) -> Option<String> {
        self.group.as_ref().and_then(|group| group(item))
    }

    /// Whether a group capability is configured.
    #[must_use]
    pub fn has_group(&self) -> bool {
        self.group.is_some()
    }

    /// Whether `a` and `b` denote the same value.
    #[must_use]
    pub fn equals(&self, a: &T, b: &T) -> bool {
        match &self.equator {
            Some(equator) => equator(a, b),
            None => self.key(a) == self.key(b),
        }
    }

    /// Extra search text for the item.
    #[must_use]
    pub fn search_fields(&self, item: &T) -> Vec<String> {
        self.search_fields
            .as_ref()
            .map(|fields| fields(item))
            .unwrap_or_default()
    }
}

impl<T> ItemCapabilities<T, T>
where
    T: Clone + Eq + Hash + fmt::Debug + fmt::Display + 'static,
{
    /// Items that are their own key and display through [`fmt::Display`].
    #[must_use]
    pub fn identity() -> Self {
        Self::new(T::clone, T::to_string)
    }
}

#[cfg(feature = "json")]
impl ItemCapabilities<Value, String> {
    /// Capabilities for JSON records addressed by dotted paths.
    ///
    /// Missing or non-scalar fields read as the empty string.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if either expression fails to parse.
    pub fn json(value_expression: &str, text_expression: &str) -> Result<Self, PathError> {
        let value_path = PathExpression::parse(value_expression)?;
        let text_path = PathExpression::parse(text_expression)?;
        Ok(Self::new(
            move |item: &Value| value_path.resolve_string(item).unwrap_or_default(),
            move |item: &Value| text_path.resolve_string(item).unwrap_or_default(),
        ))
    }

    /// JSON records keyed by [`DEFAULT_VALUE_EXPRESSION`].
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if `text_expression` fails to parse.
    pub fn json_labelled(text_expression: &str) -> Result<Self, PathError> {
        Self::json(DEFAULT_VALUE_EXPRESSION, text_expression)
    }

    /// Group JSON records by the scalar at `expression`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the expression fails to parse.
    pub fn with_group_expression(self, expression: &str) -> Result<Self, PathError> {
        let path = PathExpression::parse(expression)?;
        Ok(self.with_group(move |item: &Value| path.resolve_string(item)))
    }
}
