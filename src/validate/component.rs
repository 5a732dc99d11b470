//! Per-component semantic checks.
//!
//! These checks look at one definition at a time; everything that relates
//! components to each other (links, expose chains, volumes, pods) lives in
//! its own pass.

use std::collections::HashSet;
use tracing::debug;

use crate::definition::{ComponentDefinition, ComponentDefinitions, ComponentName};
use crate::error::ValidationError;

use super::context::ValidationContext;

/// Validates every component definition in isolation.
///
/// # Errors
///
/// Returns the first violation encountered, in registry order.
pub fn validate_components(
    ctx: &ValidationContext,
    definitions: &ComponentDefinitions,
) -> Result<(), ValidationError> {
    for (name, definition) in definitions.iter() {
        validate_link_specs(name, definition)?;
        validate_ports(ctx, name, definition)?;
        validate_domains(name, definition)?;
        validate_memory_limit(ctx, name, definition)?;
        validate_scale_bounds(ctx, name, definition)?;
        validate_image(ctx, name, definition)?;
    }
    debug!("Per-component checks passed for {} components", definitions.len());
    Ok(())
}

/// Every leaf component must be backed by an image; components without
/// descendants have nothing else to run.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidComponent`] for an imageless leaf.
pub fn validate_leaves(definitions: &ComponentDefinitions) -> Result<(), ValidationError> {
    for (name, definition) in definitions.iter() {
        if definitions.is_leaf(name) && definition.image.is_none() {
            return Err(ValidationError::component(
                name.as_str(),
                "leaf component must define an image",
            ));
        }
    }
    Ok(())
}

/// A link must name exactly one target: an in-application component or an
/// external service.
fn validate_link_specs(
    name: &ComponentName,
    definition: &ComponentDefinition,
) -> Result<(), ValidationError> {
    for link in &definition.links {
        match (&link.component, &link.service) {
            (Some(_), Some(_)) => {
                return Err(ValidationError::link(
                    name.as_str(),
                    "link must set either 'component' or 'service', not both",
                ));
            }
            (None, None) => {
                return Err(ValidationError::link(
                    name.as_str(),
                    "link must set one of 'component' or 'service'",
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_ports(
    ctx: &ValidationContext,
    name: &ComponentName,
    definition: &ComponentDefinition,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for port in &definition.ports {
        if !ctx.allows_protocol(port.protocol) {
            return Err(ValidationError::component(
                name.as_str(),
                format!("protocol '{}' is not allowed", port.protocol.as_str()),
            ));
        }
        if !seen.insert(*port) {
            return Err(ValidationError::component(
                name.as_str(),
                format!("duplicate port {port}"),
            ));
        }
    }

    Ok(())
}

/// Domain bindings must refer to ports the component actually exports.
fn validate_domains(
    name: &ComponentName,
    definition: &ComponentDefinition,
) -> Result<(), ValidationError> {
    for (domain, port) in &definition.domains {
        if domain.is_empty() {
            return Err(ValidationError::component(
                name.as_str(),
                "domain name must not be empty",
            ));
        }
        if !definition.exports_port(*port) {
            return Err(ValidationError::component(
                name.as_str(),
                format!("domain '{domain}' is bound to port {port} which the component does not export"),
            ));
        }
    }
    Ok(())
}

fn validate_memory_limit(
    ctx: &ValidationContext,
    name: &ComponentName,
    definition: &ComponentDefinition,
) -> Result<(), ValidationError> {
    if !ctx.memory.enforce {
        return Ok(());
    }

    if let Some(limit) = definition.memory_limit
        && (limit < ctx.memory.min || limit > ctx.memory.max)
    {
        return Err(ValidationError::component(
            name.as_str(),
            format!(
                "memory limit {limit} outside allowed range {}..{}",
                ctx.memory.min, ctx.memory.max
            ),
        ));
    }

    Ok(())
}

/// Explicitly set scale values must be internally consistent and within the
/// context bounds. Pod-wide agreement is checked separately by the pod pass.
fn validate_scale_bounds(
    ctx: &ValidationContext,
    name: &ComponentName,
    definition: &ComponentDefinition,
) -> Result<(), ValidationError> {
    let Some(scale) = &definition.scale else {
        return Ok(());
    };

    if let Some(min) = scale.min {
        if min < ctx.min_scale {
            return Err(ValidationError::scaling(
                name.as_str(),
                format!("scale minimum {min} is below the allowed minimum {}", ctx.min_scale),
            ));
        }
        if min > ctx.max_scale {
            return Err(ValidationError::scaling(
                name.as_str(),
                format!("scale minimum {min} exceeds the allowed maximum {}", ctx.max_scale),
            ));
        }
    }

    if let Some(max) = scale.max {
        if max > ctx.max_scale {
            return Err(ValidationError::scaling(
                name.as_str(),
                format!("scale maximum {max} exceeds the allowed maximum {}", ctx.max_scale),
            ));
        }
        if max < ctx.min_scale {
            return Err(ValidationError::scaling(
                name.as_str(),
                format!("scale maximum {max} is below the allowed minimum {}", ctx.min_scale),
            ));
        }
    }

    if let (Some(min), Some(max)) = (scale.min, scale.max)
        && min > max
    {
        return Err(ValidationError::scaling(
            name.as_str(),
            format!("scale minimum {min} exceeds scale maximum {max}"),
        ));
    }

    Ok(())
}

/// Images on the organization's private registry must live under the
/// organization's namespace.
fn validate_image(
    ctx: &ValidationContext,
    name: &ComponentName,
    definition: &ComponentDefinition,
) -> Result<(), ValidationError> {
    let Some(image) = &definition.image else {
        return Ok(());
    };

    if let (Some(registry), Some(private)) = (&image.registry, &ctx.private_registry)
        && registry == private
        && image.namespace.as_deref() != Some(ctx.org.as_str())
    {
        return Err(ValidationError::component(
            name.as_str(),
            format!(
                "image '{image}' on private registry '{private}' must use namespace '{}'",
                ctx.org
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ByteSize, ImageRef, LinkDefinition, PortSpec, ScaleDefinition};

    fn name(s: &str) -> ComponentName {
        ComponentName::new(s).unwrap()
    }

    fn single(defs: ComponentDefinition) -> ComponentDefinitions {
        [(name("api"), defs)].into_iter().collect()
    }

    fn imaged() -> ComponentDefinition {
        ComponentDefinition {
            image: Some(ImageRef::parse("acme/api:1.0").unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let defs = single(ComponentDefinition {
            ports: vec![PortSpec::tcp(8080), PortSpec::tcp(8080)],
            ..imaged()
        });
        let err = validate_components(&ValidationContext::default(), &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidComponent { .. }));
    }

    #[test]
    fn test_disallowed_protocol_rejected() {
        let defs = single(ComponentDefinition {
            ports: vec![PortSpec::parse("53/udp").unwrap()],
            ..imaged()
        });
        let err = validate_components(&ValidationContext::default(), &defs).unwrap_err();
        assert!(err.to_string().contains("udp"));
    }

    #[test]
    fn test_ambiguous_link_target_rejected() {
        let defs = single(ComponentDefinition {
            links: vec![LinkDefinition {
                component: Some(name("db")),
                service: Some(String::from("shared/db")),
                alias: None,
                target_port: PortSpec::tcp(5432),
            }],
            ..imaged()
        });
        let err = validate_components(&ValidationContext::default(), &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidLink { .. }));
    }

    #[test]
    fn test_domain_must_bind_exported_port() {
        let defs = single(ComponentDefinition {
            ports: vec![PortSpec::tcp(8080)],
            domains: [(String::from("shop.example.com"), PortSpec::tcp(80))]
                .into_iter()
                .collect(),
            ..imaged()
        });
        let err = validate_components(&ValidationContext::default(), &defs).unwrap_err();
        assert!(err.to_string().contains("shop.example.com"));
    }

    #[test]
    fn test_memory_limit_bounds() {
        let defs = single(ComponentDefinition {
            memory_limit: Some(ByteSize::from_gib(128)),
            ..imaged()
        });
        let err = validate_components(&ValidationContext::default(), &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidComponent { .. }));

        let mut ctx = ValidationContext::default();
        ctx.memory.enforce = false;
        let defs = single(ComponentDefinition {
            memory_limit: Some(ByteSize::from_gib(128)),
            ..imaged()
        });
        assert!(validate_components(&ctx, &defs).is_ok());
    }

    #[test]
    fn test_scale_outside_bounds() {
        let defs = single(ComponentDefinition {
            scale: Some(ScaleDefinition {
                min: Some(3),
                max: Some(2),
                placement: None,
            }),
            ..imaged()
        });
        let err = validate_components(&ValidationContext::default(), &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidScaling { .. }));

        let defs = single(ComponentDefinition {
            scale: Some(ScaleDefinition {
                min: None,
                max: Some(99),
                placement: None,
            }),
            ..imaged()
        });
        let err = validate_components(&ValidationContext::default(), &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidScaling { .. }));
    }

    #[test]
    fn test_private_registry_requires_org_namespace() {
        let mut ctx = ValidationContext::for_org("acme");
        ctx.private_registry = Some(String::from("registry.acme.io"));

        let defs = single(ComponentDefinition {
            image: Some(ImageRef::parse("registry.acme.io/other/api:1.0").unwrap()),
            ..Default::default()
        });
        let err = validate_components(&ctx, &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidComponent { .. }));

        let defs = single(ComponentDefinition {
            image: Some(ImageRef::parse("registry.acme.io/acme/api:1.0").unwrap()),
            ..Default::default()
        });
        assert!(validate_components(&ctx, &defs).is_ok());
    }

    #[test]
    fn test_leaf_requires_image() {
        let defs: ComponentDefinitions = [
            (name("api"), ComponentDefinition::default()),
            (name("api/db"), ComponentDefinition::default()),
        ]
        .into_iter()
        .collect();

        let err = validate_leaves(&defs).unwrap_err();
        assert!(err.to_string().contains("api/db"));

        let defs: ComponentDefinitions = [
            (name("api"), ComponentDefinition::default()),
            (name("api/db"), imaged()),
        ]
        .into_iter()
        .collect();
        assert!(validate_leaves(&defs).is_ok());
    }
}
