//! Validation passes for application definitions.
//!
//! The [`Validator`] sequences the individual passes over a registry:
//! per-component semantic checks, the link graph, expose chains, volume
//! mounts, pod invariants, and finally leaf checks. Validation is pure and
//! fail-fast: the registry is never touched and the first error wins.
//! Applying defaults is an explicit second phase
//! ([`validate_and_default`](Validator::validate_and_default)), so later
//! readers see effective values only when asked for.
//!
//! Component name validation is carried by construction: registry keys are
//! [`ComponentName`](crate::definition::ComponentName) values, which cannot
//! exist in malformed shape, so the hierarchy pass the pipeline starts with
//! is enforced before any definition enters the registry.

mod component;
mod context;
mod defaults;
mod expose;
mod links;
mod pods;
mod volumes;

use tracing::debug;

use crate::definition::ComponentDefinitions;
use crate::error::ValidationError;

pub use component::{validate_components, validate_leaves};
pub use context::{MemoryBounds, ValidationContext};
pub use defaults::{apply_defaults, strip_defaults};
pub use expose::{resolve_expose, validate_expose, ResolvedExpose};
pub use links::{direction_allowed, resolve_link, validate_links, LinkTarget};
pub use pods::{
    effective_pod_scale, is_part_of_pod, pod_members, pod_root_of, pod_roots, validate_pods,
    ScalePolicy,
};
pub use volumes::{mount_points, validate_volumes};

/// Runs the validation passes over a registry with a fixed context.
#[derive(Debug, Default)]
pub struct Validator {
    ctx: ValidationContext,
}

impl Validator {
    /// Creates a validator for the given context.
    #[must_use]
    pub const fn new(ctx: ValidationContext) -> Self {
        Self { ctx }
    }

    /// The context this validator applies.
    #[must_use]
    pub const fn context(&self) -> &ValidationContext {
        &self.ctx
    }

    /// Validates a registry without mutating it.
    ///
    /// # Errors
    ///
    /// Returns the first error found by the pass sequence; later passes
    /// assume earlier passes succeeded and are not run after a failure.
    pub fn validate(&self, definitions: &ComponentDefinitions) -> Result<(), ValidationError> {
        component::validate_components(&self.ctx, definitions)?;
        links::validate_links(definitions)?;
        expose::validate_expose(definitions)?;
        volumes::validate_volumes(&self.ctx, definitions)?;
        pods::validate_pods(&self.ctx, definitions)?;
        component::validate_leaves(definitions)?;

        debug!("Definition with {} components validated", definitions.len());
        Ok(())
    }

    /// Validates a registry, then fills in defaulted values.
    ///
    /// # Errors
    ///
    /// Returns the first validation error; the registry is only mutated
    /// after validation has fully passed.
    pub fn validate_and_default(
        &self,
        definitions: &mut ComponentDefinitions,
    ) -> Result<(), ValidationError> {
        self.validate(definitions)?;
        defaults::apply_defaults(&self.ctx, definitions)
    }
}
