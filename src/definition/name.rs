//! Hierarchical component names.
//!
//! A component name is a slash-delimited path like `api`, `api/db` or
//! `api/db/backup`. The name alone encodes the component's position in the
//! definition tree; parent/child/sibling relations are pure functions over
//! the name string and never consult a registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NameError;

/// Separator between name segments.
pub const NAME_SEPARATOR: char = '/';

/// An immutable, validated, path-like component name.
///
/// Segments consist of ASCII letters, digits, underscores and hyphens; the
/// first character of the name is alphanumeric; segments are never empty and
/// the name never ends with a separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentName(String);

impl ComponentName {
    /// Creates a validated component name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::Invalid`] if the name violates the naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the parent name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::NoParent`] for a root name.
    pub fn parent(&self) -> Result<Self, NameError> {
        self.0.rfind(NAME_SEPARATOR).map_or_else(
            || {
                Err(NameError::NoParent {
                    name: self.0.clone(),
                })
            },
            |idx| Ok(Self(self.0[..idx].to_string())),
        )
    }

    /// Returns the last segment of the name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.0
            .rfind(NAME_SEPARATOR)
            .map_or(self.0.as_str(), |idx| &self.0[idx + 1..])
    }

    /// Returns true if the name has no separator (top of the tree).
    #[must_use]
    pub fn is_root_name(&self) -> bool {
        !self.0.contains(NAME_SEPARATOR)
    }

    /// Returns true if `self` is a direct child of `parent`.
    #[must_use]
    pub fn is_direct_child_of(&self, parent: &Self) -> bool {
        self.0
            .strip_prefix(parent.as_str())
            .and_then(|rest| rest.strip_prefix(NAME_SEPARATOR))
            .is_some_and(|local| !local.is_empty() && !local.contains(NAME_SEPARATOR))
    }

    /// Returns true if `self` is a descendant of `parent`, at any depth.
    #[must_use]
    pub fn is_child_of(&self, parent: &Self) -> bool {
        self.0
            .strip_prefix(parent.as_str())
            .and_then(|rest| rest.strip_prefix(NAME_SEPARATOR))
            .is_some_and(|local| !local.is_empty())
    }

    /// Returns true if `self` and `other` share a parent.
    ///
    /// A root name's parent is treated as the empty string, so two distinct
    /// root names are siblings.
    #[must_use]
    pub fn is_sibling_of(&self, other: &Self) -> bool {
        fn parent_str(name: &ComponentName) -> &str {
            name.0
                .rfind(NAME_SEPARATOR)
                .map_or("", |idx| &name.0[..idx])
        }

        parent_str(self) == parent_str(other)
    }

    /// Appends `tail` (one or more segments) beneath this name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::Invalid`] if the combined name is not valid.
    pub fn join(&self, tail: &str) -> Result<Self, NameError> {
        Self::new(format!("{}{}{}", self.0, NAME_SEPARATOR, tail))
    }

    /// Number of segments in the name.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.matches(NAME_SEPARATOR).count() + 1
    }
}

/// Validates a raw name string against the component naming rules.
fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::invalid(name, "name must not be empty"));
    }

    if name.ends_with(NAME_SEPARATOR) {
        return Err(NameError::invalid(name, "name must not end with a separator"));
    }

    // First character of the whole name must be alphanumeric
    if let Some(first) = name.chars().next()
        && !first.is_ascii_alphanumeric()
    {
        return Err(NameError::invalid(
            name,
            "name must start with an alphanumeric character",
        ));
    }

    for segment in name.split(NAME_SEPARATOR) {
        if segment.is_empty() {
            return Err(NameError::invalid(name, "name must not contain empty segments"));
        }

        let mut has_alphanumeric = false;
        for c in segment.chars() {
            if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
                return Err(NameError::invalid(
                    name,
                    format!("segment '{segment}' contains invalid character '{c}'"),
                ));
            }
            if c.is_ascii_alphanumeric() {
                has_alphanumeric = true;
            }
        }

        if !has_alphanumeric {
            return Err(NameError::invalid(
                name,
                format!("segment '{segment}' must contain at least one alphanumeric character"),
            ));
        }
    }

    Ok(())
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ComponentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ComponentName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ComponentName {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ComponentName> for String {
    fn from(name: ComponentName) -> Self {
        name.0
    }
}
