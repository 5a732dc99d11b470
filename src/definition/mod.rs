//! Definition model for the appdef validation engine.
//!
//! This module holds everything that describes an application definition:
//! - The hierarchical [`ComponentName`] value type
//! - The descriptor structs ([`ComponentDefinition`] and friends)
//! - The [`ComponentDefinitions`] registry with its hierarchy queries
//! - Document loading and deterministic hashing

mod hash;
mod name;
mod parser;
mod registry;
mod spec;

pub use hash::DefinitionHasher;
pub use name::{ComponentName, NAME_SEPARATOR};
pub use parser::{find_definition_file, DefinitionParser, DEFAULT_DEFINITION_FILES};
pub use registry::{AppDefinition, ComponentDefinitions};
pub use spec::{
    ByteSize, ComponentDefinition, ExposeDefinition, ImageRef, LinkDefinition, Placement, PodMode,
    PortSpec, Protocol, ScaleDefinition, VolumeSize, VolumeSpec,
};
