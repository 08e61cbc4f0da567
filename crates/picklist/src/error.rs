#![forbid(unsafe_code)]

//! Error types for the picklist controller.

use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// PathError
// ─────────────────────────────────────────────────────────────────────────────

/// A dotted path expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The expression was empty or whitespace.
    Empty,
    /// A segment between dots was empty (`"a..b"`, `".a"`, `"a."`).
    EmptySegment {
        /// The full expression.
        expression: String,
        /// Zero-based segment position.
        position: usize,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "path expression is empty"),
            PathError::EmptySegment {
                expression,
                position,
            } => write!(
                f,
                "path expression {expression:?} has an empty segment at position {position}"
            ),
        }
    }
}

impl std::error::Error for PathError {}

// ─────────────────────────────────────────────────────────────────────────────
// ConfigError
// ─────────────────────────────────────────────────────────────────────────────

/// Invalid controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `virtualization_threshold` must be at least 1.
    ZeroVirtualizationThreshold,
    /// `page_size` must be at least 1.
    ZeroPageSize,
    /// A JSON configuration document could not be read.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroVirtualizationThreshold => {
                write!(f, "virtualization_threshold must be greater than zero")
            }
            ConfigError::ZeroPageSize => write!(f, "page_size must be greater than zero"),
            ConfigError::Parse(msg) => write!(f, "invalid configuration document: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ─────────────────────────────────────────────────────────────────────────────
// NewValueError
// ─────────────────────────────────────────────────────────────────────────────

/// A new-value provider failed to produce a value.
///
/// Never propagated out of the controller; it is surfaced through
/// [`NewValueStatus::Error`](crate::new_value::NewValueStatus::Error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewValueError {
    message: String,
}

impl NewValueError {
    /// Create an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The provider's failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NewValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "new value could not be created: {}", self.message)
    }
}

impl std::error::Error for NewValueError {}

impl From<&str> for NewValueError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for NewValueError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PicklistError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors returned by controller operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PicklistError {
    /// Two groups share a name.
    DuplicateGroup {
        /// The repeated name.
        name: String,
    },
    /// No item carries the requested key, or an index is out of range.
    UnknownKey,
    /// The operation needs a multi-select controller.
    NotMultiSelect,
    /// The operation needs a single-select controller.
    NotSingleSelect,
    /// There is no resolved new value waiting for confirmation.
    NoPendingNewValue,
    /// New-value creation is not enabled.
    NewValueDisabled,
    /// The configuration failed validation.
    InvalidConfig(ConfigError),
    /// A path expression failed to parse.
    InvalidPath(PathError),
}

impl fmt::Display for PicklistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PicklistError::DuplicateGroup { name } => write!(f, "duplicate group name {name:?}"),
            PicklistError::UnknownKey => write!(f, "no item matches the given key or index"),
            PicklistError::NotMultiSelect => write!(f, "operation requires multi-select mode"),
            PicklistError::NotSingleSelect => write!(f, "operation requires single-select mode"),
            PicklistError::NoPendingNewValue => write!(f, "no resolved new value to confirm"),
            PicklistError::NewValueDisabled => write!(f, "new value creation is disabled"),
            PicklistError::InvalidConfig(e) => write!(f, "invalid configuration: {e}"),
            PicklistError::InvalidPath(e) => write!(f, "invalid path: {e}"),
        }
    }
}

impl std::error::Error for PicklistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PicklistError::InvalidConfig(e) => Some(e),
            PicklistError::InvalidPath(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for PicklistError {
    fn from(e: ConfigError) -> Self {
        PicklistError::InvalidConfig(e)
    }
}

impl From<PathError> for PicklistError {
    fn from(e: PathError) -> Self {
        PicklistError::InvalidPath(e)
    }
}

/// Result type for controller operations.
pub type PicklistResult<T> = Result<T, PicklistError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_messages() {
        let err = PicklistError::DuplicateGroup {
            name: "fruit".into(),
        };
        assert_eq!(err.to_string(), "duplicate group name \"fruit\"");

        let err = PathError::EmptySegment {
            expression: "a..b".into(),
            position: 1,
        };
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn wrapped_errors_expose_source() {
        let err: PicklistError = ConfigError::ZeroPageSize.into();
        assert!(err.source().is_some());
        assert!(PicklistError::UnknownKey.source().is_none());
    }

    #[test]
    fn new_value_error_from_str() {
        let err: NewValueError = "offline".into();
        assert_eq!(err.message(), "offline");
        assert_eq!(err.to_string(), "new value could not be created: offline");
    }
}
