// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Appdef
//!
//! A validation and normalization engine for declarative multi-component
//! application definitions run on a container-orchestration platform.
//!
//! ## Overview
//!
//! An application definition is a tree of named components (image, ports,
//! volumes, env, links, scaling, pod membership) expressed as JSON or YAML.
//! Appdef checks it for structural and semantic correctness before
//! acceptance:
//!
//! - Hierarchical component names and their parent/child/sibling relations
//! - Pod grouping with `children`/`inherit` modes and `none` boundaries
//! - The inter-component link graph: direction policy, cycle detection,
//!   and deployment ordering
//! - Expose indirection chains down to the terminal implementer
//! - Volume mount resolution across `volumes-from` references
//!
//! Validation is a pure, synchronous, in-memory pass; applying defaults is
//! an explicit second phase so validation itself never mutates anything.
//!
//! ## Modules
//!
//! - [`definition`]: the descriptor model, registry, loading, and hashing
//! - [`validate`]: the validation passes and their orchestrator
//! - [`planner`]: deployment grouping and ordering
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```json
//! {
//!   "name": "shop",
//!   "components": {
//!     "api": {
//!       "image": "acme/api:1.0.0",
//!       "ports": [8080],
//!       "links": [{ "component": "db", "target-port": 5432 }]
//!     },
//!     "db": {
//!       "image": "postgres:16",
//!       "ports": [5432],
//!       "volumes": [{ "path": "/var/lib/postgresql/data", "size": "20 GB" }]
//!     }
//!   }
//! }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod definition;
pub mod error;
pub mod planner;
pub mod validate;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use definition::{
    AppDefinition, ComponentDefinition, ComponentDefinitions, ComponentName, DefinitionHasher,
    DefinitionParser,
};
pub use error::{AppdefError, Result};
pub use planner::{DeploymentGroup, DeploymentOrder, DeploymentOrderer};
pub use validate::{ValidationContext, Validator};
