#![forbid(unsafe_code)]

//! Selectable-list controller.
//!
//! Filters host items against a query, groups them under optional
//! collapsible headers, tracks single or multi selection, moves an active
//! cursor for keyboard navigation and, when nothing matches, resolves a new
//! value through a host provider while discarding stale answers.
//!
//! Rendering stays with the host: the controller hands out a flat
//! [`RenderList`] of item and header entries plus the active position.

pub mod capabilities;
pub mod config;
pub mod controller;
pub mod error;
pub mod group_index;
pub mod matcher;
pub mod navigation;
pub mod new_value;
#[cfg(feature = "json")]
pub mod path;
pub mod relevance;
pub mod selection;
pub mod virtualization;

pub use capabilities::ItemCapabilities;
pub use config::{Messages, PicklistConfig, Presentation, ResultOrdering, SelectionMode};
pub use controller::{Picklist, PicklistAction, PicklistEvent};
pub use error::{ConfigError, NewValueError, PathError, PicklistError, PicklistResult};
pub use group_index::{Group, GroupSet, RenderEntry, RenderList};
pub use matcher::{MatchPolicy, Query};
pub use navigation::{Activation, ActiveIndex, Move, NavigationPolicy};
pub use new_value::{
    NewValueProvider, NewValueResult, NewValueStatus, Provided, RequestToken, ResolutionEvent,
    Settlement,
};
#[cfg(feature = "json")]
pub use path::PathExpression;
pub use selection::{SelectAllOutcome, SelectionValue};
pub use virtualization::{DEFAULT_VIRTUALIZATION_THRESHOLD, should_virtualize};

pub use picklist_core::{InputMode, KeyCode, KeyEvent, Modifiers};
