#![forbid(unsafe_code)]

//! Dotted path expressions over JSON items.
//!
//! Hosts that feed plain JSON records into a picklist name the key, label
//! and group fields by path (`"_id"`, `"owner.name"`, `"tags.0"`) instead of
//! writing closures.

use std::fmt;

use serde_json::Value;

use crate::error::PathError;

/// A parsed `a.b.0.c` path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    segments: Vec<String>,
}

impl PathExpression {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for blank input and
    /// [`PathError::EmptySegment`] when two dots are adjacent or the path
    /// starts or ends with a dot.
    pub fn parse(expression: &str) -> Result<Self, PathError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for (position, segment) in trimmed.split('.').enumerate() {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(PathError::EmptySegment {
                    expression: trimmed.to_string(),
                    position,
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// The path segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Walk `value` along the path.
    ///
    /// Objects are indexed by key and arrays by numeric segment. Any other
    /// step yields `None`.
    #[must_use]
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            })
    }

    /// Resolve and render a scalar as text.
    ///
    /// Strings come back unquoted; numbers and booleans use their JSON
    /// form. `null`, containers and missing values give `None`.
    #[must_use]
    pub fn resolve_string(&self, value: &Value) -> Option<String> {
        match self.resolve(value)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::str::FromStr for PathExpression {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_rejects_empty_segments() {
        assert_eq!(PathExpression::parse("  "), Err(PathError::Empty));
        assert!(matches!(
            PathExpression::parse("a..b"),
            Err(PathError::EmptySegment { position: 1, .. })
        ));
        assert!(matches!(
            PathExpression::parse(".a"),
            Err(PathError::EmptySegment { position: 0, .. })
        ));
        assert!(PathExpression::parse("a.").is_err());
    }

    #[test]
    fn resolves_objects_and_arrays() {
        let doc = json!({ "owner": { "name": "Ada", "tags": ["x", "y"] } });
        let name = PathExpression::parse("owner.name").unwrap();
        assert_eq!(name.resolve(&doc), Some(&json!("Ada")));

        let tag = PathExpression::parse("owner.tags.1").unwrap();
        assert_eq!(tag.resolve_string(&doc).as_deref(), Some("y"));

        let missing = PathExpression::parse("owner.tags.9").unwrap();
        assert!(missing.resolve(&doc).is_none());

        let through_scalar = PathExpression::parse("owner.name.first").unwrap();
        assert!(through_scalar.resolve(&doc).is_none());
    }

    #[test]
    fn resolve_string_renders_scalars() {
        let doc = json!({ "n": 42, "b": true, "z": null, "o": {} });
        let get = |p: &str| PathExpression::parse(p).unwrap().resolve_string(&doc);
        assert_eq!(get("n").as_deref(), Some("42"));
        assert_eq!(get("b").as_deref(), Some("true"));
        assert_eq!(get("z"), None);
        assert_eq!(get("o"), None);
    }

    #[test]
    fn display_round_trips_normalized_form() {
        let path: PathExpression = " a . b ".parse().unwrap();
        assert_eq!(path.to_string(), "a.b");
        assert_eq!(path.segments().len(), 2);
    }
}
