//! Error types for the appdef validation engine.
//!
//! This module provides the error hierarchy for all operations in the
//! definition lifecycle: loading, name handling, and validation. Every
//! failure is an ordinary typed result; nothing here panics.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for appdef operations.
#[derive(Debug, Error)]
pub enum AppdefError {
    /// Definition loading/parsing errors.
    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Validation errors.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors produced while loading or parsing a definition document.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The definition file was not found.
    #[error("Definition file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The definition document could not be parsed.
    #[error("Failed to parse definition: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },
}

/// Errors produced by component name handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    /// The name does not follow the component naming rules.
    #[error("Invalid component name '{name}': {reason}")]
    Invalid {
        /// The offending name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// A root name has no parent.
    #[error("Component name '{name}' has no parent")]
    NoParent {
        /// The root name.
        name: String,
    },
}

/// Validation errors, typed by kind.
///
/// Each variant carries enough context (component name, offending
/// name/port/path) to render a human-readable message. Validation is
/// fail-fast: callers receive the first error encountered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Malformed component name.
    #[error(transparent)]
    Name(#[from] NameError),

    /// A referenced component/parent/mount-source does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// What kind of thing is missing (component, parent, mount point).
        kind: String,
        /// The name that failed to resolve.
        name: String,
    },

    /// A link or expose chain revisits a component.
    #[error("Link cycle detected: {chain}")]
    LinkCycle {
        /// The revisiting chain, rendered as `a -> b -> a`.
        chain: String,
    },

    /// A volumes-from chain revisits a component.
    #[error("Volume cycle detected: {chain}")]
    VolumeCycle {
        /// The revisiting chain, rendered as `a -> b -> a`.
        chain: String,
    },

    /// Disallowed link direction, ambiguous target spec, or duplicate
    /// link identifier.
    #[error("Invalid link on component '{component}': {reason}")]
    InvalidLink {
        /// The component owning the offending link.
        component: String,
        /// Why the link was rejected.
        reason: String,
    },

    /// A component definition is semantically invalid.
    #[error("Invalid definition for component '{component}': {reason}")]
    InvalidComponent {
        /// The offending component.
        component: String,
        /// Why the definition was rejected.
        reason: String,
    },

    /// Pod configuration violation.
    #[error("Invalid pod configuration at '{pod}': {reason}")]
    InvalidPod {
        /// The pod root (or offending member).
        pod: String,
        /// Why the pod was rejected.
        reason: String,
    },

    /// Conflicting or out-of-bounds scaling configuration.
    #[error("Invalid scaling configuration for '{scope}': {reason}")]
    InvalidScaling {
        /// The component or pod the conflict applies to.
        scope: String,
        /// Why the scaling configuration was rejected.
        reason: String,
    },

    /// Pod members share an external dependency with disagreeing settings.
    #[error("Invalid dependency in pod '{pod}': {reason}")]
    InvalidDependency {
        /// The pod root.
        pod: String,
        /// Why the shared dependency was rejected.
        reason: String,
    },

    /// Malformed volume field combination or unresolvable volume path.
    #[error("Invalid volume on component '{component}': {reason}")]
    InvalidVolume {
        /// The component owning the offending volume entry.
        component: String,
        /// Why the volume entry was rejected.
        reason: String,
    },

    /// Two volume entries resolve to the same mount path.
    #[error("Duplicate volume path '{path}' on component '{component}'")]
    DuplicateVolumePath {
        /// The component with the colliding mounts.
        component: String,
        /// The duplicated mount path.
        path: String,
    },
}

/// Result type alias for appdef operations.
pub type Result<T> = std::result::Result<T, AppdefError>;

impl AppdefError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl NameError {
    /// Creates an invalid-name error.
    #[must_use]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl ValidationError {
    /// Creates a not-found error for a named thing of the given kind.
    #[must_use]
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates an invalid-link error.
    #[must_use]
    pub fn link(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLink {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-component error.
    #[must_use]
    pub fn component(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidComponent {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-pod error.
    #[must_use]
    pub fn pod(pod: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPod {
            pod: pod.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-scaling error.
    #[must_use]
    pub fn scaling(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidScaling {
            scope: scope.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-volume error.
    #[must_use]
    pub fn volume(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVolume {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Renders a visited chain plus the revisited node as `a -> b -> a`.
    #[must_use]
    pub fn render_chain(path: &[impl std::fmt::Display], revisit: &impl std::fmt::Display) -> String {
        let mut chain = path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        if !chain.is_empty() {
            chain.push_str(" -> ");
        }
        chain.push_str(&revisit.to_string());
        chain
    }
}

impl DefinitionError {
    /// Creates a parse error with an optional source location.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }
}
