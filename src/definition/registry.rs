//! The component registry: a flat ordered map from name to definition.
//!
//! The registry is the sole source of truth for all hierarchy and graph
//! queries. Parent/child relations are derived on demand from the name
//! strings of the keys actually present; no separate tree structure is
//! maintained. Insertion order is preserved so that discovery order is
//! deterministic across validation and ordering passes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::name::ComponentName;
use super::spec::ComponentDefinition;

/// A parsed application definition document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppDefinition {
    /// Application name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The component tree, keyed by hierarchical name.
    pub components: ComponentDefinitions,
}

/// Mapping from component name to component definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ComponentDefinitions {
    definitions: IndexMap<ComponentName, ComponentDefinition>,
}

impl ComponentDefinitions {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: IndexMap::new(),
        }
    }

    /// Inserts a definition, replacing any previous definition for the name.
    pub fn insert(
        &mut self,
        name: ComponentName,
        definition: ComponentDefinition,
    ) -> Option<ComponentDefinition> {
        self.definitions.insert(name, definition)
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn get(&self, name: &ComponentName) -> Option<&ComponentDefinition> {
        self.definitions.get(name)
    }

    /// Looks up a definition by name, mutably.
    #[must_use]
    pub fn get_mut(&mut self, name: &ComponentName) -> Option<&mut ComponentDefinition> {
        self.definitions.get_mut(name)
    }

    /// Looks up a definition by name, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFound`] for an unknown name.
    pub fn by_name(&self, name: &ComponentName) -> Result<&ComponentDefinition, ValidationError> {
        self.definitions
            .get(name)
            .ok_or_else(|| ValidationError::not_found("component", name.as_str()))
    }

    /// Returns true if the registry contains the name.
    #[must_use]
    pub fn contains(&self, name: &ComponentName) -> bool {
        self.definitions.contains_key(name)
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates over names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &ComponentName> {
        self.definitions.keys()
    }

    /// Iterates over (name, definition) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentName, &ComponentDefinition)> {
        self.definitions.iter()
    }

    /// Iterates over (name, definition) pairs mutably, in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ComponentName, &mut ComponentDefinition)> {
        self.definitions.iter_mut()
    }

    /// Returns the names matching a predicate, in insertion order.
    pub fn filter_by(
        &self,
        predicate: impl Fn(&ComponentName, &ComponentDefinition) -> bool,
    ) -> Vec<&ComponentName> {
        self.definitions
            .iter()
            .filter(|(name, def)| predicate(name, def))
            .map(|(name, _)| name)
            .collect()
    }

    /// Returns the direct children of `name` present in the registry.
    #[must_use]
    pub fn children_of(&self, name: &ComponentName) -> Vec<&ComponentName> {
        self.filter_by(|candidate, _| candidate.is_direct_child_of(name))
    }

    /// Returns all descendants of `name` present in the registry.
    #[must_use]
    pub fn descendants_of(&self, name: &ComponentName) -> Vec<&ComponentName> {
        self.filter_by(|candidate, _| candidate.is_child_of(name))
    }

    /// Returns true if no descendant of `name` exists in the registry.
    #[must_use]
    pub fn is_leaf(&self, name: &ComponentName) -> bool {
        !self
            .definitions
            .keys()
            .any(|candidate| candidate.is_child_of(name))
    }

    /// Returns true if no ancestor of `name` exists in the registry.
    ///
    /// This is about the keys actually present, not the name string: a
    /// component named `a/b` is a root when no `a` entry exists.
    #[must_use]
    pub fn is_root(&self, name: &ComponentName) -> bool {
        !self
            .definitions
            .keys()
            .any(|candidate| name.is_child_of(candidate))
    }

    /// Returns the closest existing ancestor of `name`.
    ///
    /// Walks the name chain upward (`name -> parent -> grandparent -> ...`)
    /// until a key present in the registry is found. A deeply nested name
    /// with no intermediate entries still resolves to its nearest defined
    /// ancestor.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFound`] when no ancestor exists.
    pub fn parent_of(&self, name: &ComponentName) -> Result<ComponentName, ValidationError> {
        let mut current = name.clone();
        while let Ok(parent) = current.parent() {
            if self.contains(&parent) {
                return Ok(parent);
            }
            current = parent;
        }
        Err(ValidationError::not_found("parent of component", name.as_str()))
    }
}

impl FromIterator<(ComponentName, ComponentDefinition)> for ComponentDefinitions {
    fn from_iter<T: IntoIterator<Item = (ComponentName, ComponentDefinition)>>(iter: T) -> Self {
        Self {
            definitions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ComponentName {
        ComponentName::new(s).unwrap()
    }

    fn registry(names: &[&str]) -> ComponentDefinitions {
        names
            .iter()
            .map(|n| (name(n), ComponentDefinition::default()))
            .collect()
    }

    #[test]
    fn test_children_and_descendants() {
        let defs = registry(&["a", "a/b", "a/b/c", "a/d", "e"]);
        let a = name("a");

        let children: Vec<_> = defs.children_of(&a).iter().map(|n| n.as_str()).collect();
        assert_eq!(children, vec!["a/b", "a/d"]);

        let descendants: Vec<_> = defs.descendants_of(&a).iter().map(|n| n.as_str()).collect();
        assert_eq!(descendants, vec!["a/b", "a/b/c", "a/d"]);
    }

    #[test]
    fn test_leaf_and_root() {
        let defs = registry(&["a", "a/b", "c/d"]);

        assert!(!defs.is_leaf(&name("a")));
        assert!(defs.is_leaf(&name("a/b")));
        assert!(defs.is_leaf(&name("c/d")));

        assert!(defs.is_root(&name("a")));
        assert!(!defs.is_root(&name("a/b")));
        // `c` itself is absent, so `c/d` has no ancestor in the registry.
        assert!(defs.is_root(&name("c/d")));
    }

    #[test]
    fn test_parent_of_closest_existing_ancestor() {
        let defs = registry(&["a", "a/b/c/d"]);

        // Intermediate entries `a/b` and `a/b/c` are absent; resolution
        // falls through to the nearest defined ancestor.
        assert_eq!(defs.parent_of(&name("a/b/c/d")).unwrap(), name("a"));

        let err = defs.parent_of(&name("a")).unwrap_err();
        assert!(matches!(err, ValidationError::NotFound { .. }));
    }

    #[test]
    fn test_by_name_not_found() {
        let defs = registry(&["a"]);
        assert!(defs.by_name(&name("a")).is_ok());
        assert!(matches!(
            defs.by_name(&name("missing")),
            Err(ValidationError::NotFound { .. })
        ));
    }

    #[test]
    fn test_deserialize_rejects_invalid_keys() {
        let ok: Result<ComponentDefinitions, _> = serde_json::from_str(r#"{"a/b": {}}"#);
        assert!(ok.is_ok());

        let bad: Result<ComponentDefinitions, _> = serde_json::from_str(r#"{"a//b": {}}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let defs = registry(&["z", "a", "m"]);
        let names: Vec<_> = defs.names().map(ComponentName::as_str).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }
}
