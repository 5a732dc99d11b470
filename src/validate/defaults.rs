//! Defaulting as an explicit second phase.
//!
//! Validation never mutates the registry; once it has passed, this pass
//! fills the defaulted values in so every component carries its effective
//! configuration. [`strip_defaults`] is the inverse, removing values equal
//! to the effective defaults so minimal descriptors can be rendered.

use std::collections::HashSet;
use tracing::debug;

use crate::definition::{ComponentDefinitions, ComponentName, ScaleDefinition};
use crate::error::ValidationError;

use super::context::ValidationContext;
use super::pods::{effective_pod_scale, pod_members, pod_roots, ScalePolicy};

/// Populates defaults on a validated registry.
///
/// Pod members receive the pod-wide effective scaling policy; standalone
/// components receive the context defaults; expose entries get their
/// target port filled with the published port.
///
/// # Errors
///
/// Returns an error when pod resolution fails; on a registry that already
/// passed validation this does not happen.
pub fn apply_defaults(
    ctx: &ValidationContext,
    definitions: &mut ComponentDefinitions,
) -> Result<(), ValidationError> {
    // Resolve every pod before mutating anything.
    let mut pod_policies: Vec<(Vec<ComponentName>, ScalePolicy)> = Vec::new();
    for root in pod_roots(definitions) {
        let members = pod_members(definitions, &root)?;
        let policy = effective_pod_scale(ctx, definitions, &root, &members)?;
        pod_policies.push((members, policy));
    }

    let pod_member_names: HashSet<ComponentName> = pod_policies
        .iter()
        .flat_map(|(members, _)| members.iter().cloned())
        .collect();

    for (members, policy) in &pod_policies {
        for member in members {
            if let Some(definition) = definitions.get_mut(member) {
                definition.scale = Some(ScaleDefinition {
                    min: Some(policy.min),
                    max: Some(policy.max),
                    placement: Some(policy.placement),
                });
            }
        }
    }

    for (name, definition) in definitions.iter_mut() {
        if !pod_member_names.contains(name) {
            let mut scale = definition.scale.unwrap_or_default();
            scale.min = scale.min.or(Some(ctx.min_scale));
            scale.max = scale.max.or(Some(ctx.max_scale));
            scale.placement = scale.placement.or(Some(ctx.default_placement));
            definition.scale = Some(scale);
        }

        for expose in &mut definition.expose {
            if expose.target_port.is_none() {
                expose.target_port = Some(expose.port);
            }
        }
    }

    debug!("Defaults applied to {} components", definitions.len());
    Ok(())
}

/// Removes values equal to the context defaults, leaving only what the
/// definition author has to say.
pub fn strip_defaults(ctx: &ValidationContext, definitions: &mut ComponentDefinitions) {
    for (_, definition) in definitions.iter_mut() {
        if let Some(scale) = &mut definition.scale {
            if scale.min == Some(ctx.min_scale) {
                scale.min = None;
            }
            if scale.max == Some(ctx.max_scale) {
                scale.max = None;
            }
            if scale.placement == Some(ctx.default_placement) {
                scale.placement = None;
            }
            if scale.is_empty() {
                definition.scale = None;
            }
        }

        for expose in &mut definition.expose {
            if expose.target_port == Some(expose.port) {
                expose.target_port = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ComponentDefinition, ExposeDefinition, Placement, PodMode, PortSpec};

    fn name(s: &str) -> ComponentName {
        ComponentName::new(s).unwrap()
    }

    fn registry(entries: Vec<(&str, ComponentDefinition)>) -> ComponentDefinitions {
        entries.into_iter().map(|(n, d)| (name(n), d)).collect()
    }

    #[test]
    fn test_standalone_component_gets_context_defaults() {
        let ctx = ValidationContext::default();
        let mut defs = registry(vec![("api", ComponentDefinition::default())]);

        apply_defaults(&ctx, &mut defs).unwrap();

        let scale = defs.get(&name("api")).unwrap().scale.unwrap();
        assert_eq!(scale.min, Some(ctx.min_scale));
        assert_eq!(scale.max, Some(ctx.max_scale));
        assert_eq!(scale.placement, Some(Placement::Simple));
    }

    #[test]
    fn test_pod_members_converge_on_explicit_minimum() {
        let ctx = ValidationContext::default();
        let mut defs = registry(vec![
            (
                "a",
                ComponentDefinition {
                    pod: Some(PodMode::Children),
                    ..Default::default()
                },
            ),
            (
                "a/b",
                ComponentDefinition {
                    scale: Some(ScaleDefinition {
                        min: Some(3),
                        max: None,
                        placement: None,
                    }),
                    ..Default::default()
                },
            ),
            ("a/c", ComponentDefinition::default()),
        ]);

        apply_defaults(&ctx, &mut defs).unwrap();

        let b = defs.get(&name("a/b")).unwrap().scale.unwrap();
        let c = defs.get(&name("a/c")).unwrap().scale.unwrap();
        assert_eq!(b.min, Some(3));
        assert_eq!(c.min, Some(3));
        assert_eq!(b.max, c.max);
    }

    #[test]
    fn test_expose_target_port_filled() {
        let ctx = ValidationContext::default();
        let mut defs = registry(vec![(
            "api",
            ComponentDefinition {
                expose: vec![ExposeDefinition {
                    port: PortSpec::tcp(80),
                    component: None,
                    target_port: None,
                }],
                ports: vec![PortSpec::tcp(80)],
                ..Default::default()
            },
        )]);

        apply_defaults(&ctx, &mut defs).unwrap();
        let expose = &defs.get(&name("api")).unwrap().expose[0];
        assert_eq!(expose.target_port, Some(PortSpec::tcp(80)));
    }

    #[test]
    fn test_apply_defaults_is_idempotent() {
        let ctx = ValidationContext::default();
        let mut defs = registry(vec![
            (
                "a",
                ComponentDefinition {
                    pod: Some(PodMode::Inherit),
                    ..Default::default()
                },
            ),
            ("a/b", ComponentDefinition::default()),
            ("a/c", ComponentDefinition::default()),
        ]);

        apply_defaults(&ctx, &mut defs).unwrap();
        let once = defs.clone();
        apply_defaults(&ctx, &mut defs).unwrap();
        assert_eq!(once, defs);
    }

    #[test]
    fn test_strip_inverts_apply_for_untouched_definitions() {
        let ctx = ValidationContext::default();
        let original = registry(vec![("api", ComponentDefinition::default())]);

        let mut defs = original.clone();
        apply_defaults(&ctx, &mut defs).unwrap();
        assert_ne!(original, defs);

        strip_defaults(&ctx, &mut defs);
        assert_eq!(original, defs);
    }
}
