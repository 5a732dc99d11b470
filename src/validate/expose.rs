//! Expose chain resolution.
//!
//! An expose entry publishes a stable port, implemented either by the
//! owning component itself or by a descendant whose own expose list may
//! indirect further. Resolution follows the chain to the terminal
//! implementer; a revisit along the way is treated as a link cycle.

use std::collections::HashSet;
use tracing::debug;

use crate::definition::{ComponentDefinitions, ComponentName, ExposeDefinition, PortSpec};
use crate::error::ValidationError;

/// The terminal implementer of an expose chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExpose {
    /// Component that concretely implements the published port.
    pub implementer: ComponentName,
    /// Port on the implementer.
    pub port: PortSpec,
}

/// Resolves an expose entry owned by `owner` to its terminal implementer.
///
/// # Errors
///
/// Returns [`ValidationError::NotFound`] for an unresolvable implementer
/// and [`ValidationError::LinkCycle`] when the chain revisits a component.
pub fn resolve_expose(
    definitions: &ComponentDefinitions,
    owner: &ComponentName,
    entry: &ExposeDefinition,
) -> Result<ResolvedExpose, ValidationError> {
    let mut path = Vec::new();
    resolve_inner(definitions, owner, entry, &mut path)
}

fn resolve_inner(
    definitions: &ComponentDefinitions,
    owner: &ComponentName,
    entry: &ExposeDefinition,
    path: &mut Vec<ComponentName>,
) -> Result<ResolvedExpose, ValidationError> {
    let target_port = entry.effective_target_port();

    let Some(component) = &entry.component else {
        return Ok(ResolvedExpose {
            implementer: owner.clone(),
            port: target_port,
        });
    };

    let implementer = resolve_implementer_name(definitions, owner, component)?;

    if path.contains(&implementer) {
        return Err(ValidationError::LinkCycle {
            chain: ValidationError::render_chain(path, &implementer),
        });
    }
    path.push(implementer.clone());

    let definition = definitions.by_name(&implementer)?;
    definition
        .expose
        .iter()
        .find(|next| next.port == target_port)
        .map_or_else(
            || {
                Ok(ResolvedExpose {
                    implementer: implementer.clone(),
                    port: target_port,
                })
            },
            |next| resolve_inner(definitions, &implementer, next, path),
        )
}

/// Expose implementers resolve owner-relative first: an entry on `a` naming
/// `b` means `a/b` when that component exists.
fn resolve_implementer_name(
    definitions: &ComponentDefinitions,
    owner: &ComponentName,
    target: &ComponentName,
) -> Result<ComponentName, ValidationError> {
    if let Ok(joined) = owner.join(target.as_str())
        && definitions.contains(&joined)
    {
        return Ok(joined);
    }

    if definitions.contains(target) {
        return Ok(target.clone());
    }

    Err(ValidationError::not_found("expose implementer", target.as_str()))
}

/// Validates every expose list in the registry.
///
/// # Errors
///
/// Returns the first violation found: a port published twice by one
/// component, a port published by more than one root component, an
/// unresolvable chain, or a terminal implementer that does not provide the
/// port.
pub fn validate_expose(definitions: &ComponentDefinitions) -> Result<(), ValidationError> {
    for (owner, definition) in definitions.iter() {
        let mut published = HashSet::new();

        for entry in &definition.expose {
            if !published.insert(entry.port) {
                return Err(ValidationError::component(
                    owner.as_str(),
                    format!("port {} exposed more than once", entry.port),
                ));
            }

            let resolved = resolve_expose(definitions, owner, entry)?;
            if !definitions.by_name(&resolved.implementer)?.declares_port(resolved.port) {
                return Err(ValidationError::component(
                    resolved.implementer.to_string(),
                    format!(
                        "does not export port {} exposed by '{owner}'",
                        resolved.port
                    ),
                ));
            }
        }
    }

    validate_root_exposure(definitions)?;
    debug!("Expose checks passed");
    Ok(())
}

/// A published port belongs to exactly one root component; two unrelated
/// roots publishing the same port would be indistinguishable to consumers.
fn validate_root_exposure(definitions: &ComponentDefinitions) -> Result<(), ValidationError> {
    let mut by_port: std::collections::HashMap<u16, &ComponentName> = std::collections::HashMap::new();

    for (owner, definition) in definitions.iter() {
        if !definitions.is_root(owner) {
            continue;
        }
        for entry in &definition.expose {
            if let Some(previous) = by_port.insert(entry.port.number, owner) {
                return Err(ValidationError::component(
                    owner.as_str(),
                    format!(
                        "port {} already exposed by unrelated root '{previous}'",
                        entry.port
                    ),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ComponentDefinition;

    fn name(s: &str) -> ComponentName {
        ComponentName::new(s).unwrap()
    }

    fn expose(port: u16, component: Option<&str>, target_port: Option<u16>) -> ExposeDefinition {
        ExposeDefinition {
            port: PortSpec::tcp(port),
            component: component.map(name),
            target_port: target_port.map(PortSpec::tcp),
        }
    }

    fn component(expose: Vec<ExposeDefinition>, ports: Vec<u16>) -> ComponentDefinition {
        ComponentDefinition {
            expose,
            ports: ports.into_iter().map(PortSpec::tcp).collect(),
            ..Default::default()
        }
    }

    fn registry(entries: Vec<(&str, ComponentDefinition)>) -> ComponentDefinitions {
        entries.into_iter().map(|(n, d)| (name(n), d)).collect()
    }

    #[test]
    fn test_self_expose_defaults() {
        let defs = registry(vec![(
            "api",
            component(vec![expose(80, None, Some(8080))], vec![8080]),
        )]);

        let entry = expose(80, None, Some(8080));
        let resolved = resolve_expose(&defs, &name("api"), &entry).unwrap();
        assert_eq!(resolved.implementer, name("api"));
        assert_eq!(resolved.port, PortSpec::tcp(8080));

        assert!(validate_expose(&defs).is_ok());
    }

    #[test]
    fn test_chain_resolves_to_terminal_implementer() {
        let defs = registry(vec![
            ("a", component(vec![expose(80, Some("b"), None)], vec![])),
            (
                "a/b",
                component(vec![expose(80, Some("c"), Some(8080))], vec![]),
            ),
            ("a/b/c", component(vec![], vec![8080])),
        ]);

        let entry = expose(80, Some("b"), None);
        let resolved = resolve_expose(&defs, &name("a"), &entry).unwrap();
        assert_eq!(resolved.implementer, name("a/b/c"));
        assert_eq!(resolved.port, PortSpec::tcp(8080));

        assert!(validate_expose(&defs).is_ok());
    }

    #[test]
    fn test_chain_revisit_is_a_cycle() {
        let defs = registry(vec![
            ("a", component(vec![expose(80, Some("b"), None)], vec![])),
            ("a/b", component(vec![expose(80, Some("a"), None)], vec![])),
        ]);

        let err = validate_expose(&defs).unwrap_err();
        assert!(matches!(err, ValidationError::LinkCycle { .. }));
    }

    #[test]
    fn test_duplicate_exposed_port_rejected() {
        let defs = registry(vec![(
            "api",
            component(
                vec![expose(80, None, Some(8080)), expose(80, None, Some(9090))],
                vec![8080, 9090],
            ),
        )]);

        let err = validate_expose(&defs).unwrap_err();
        assert!(err.to_string().contains("exposed more than once"));
    }

    #[test]
    fn test_terminal_must_declare_port() {
        let defs = registry(vec![
            ("a", component(vec![expose(80, Some("b"), None)], vec![])),
            ("a/b", component(vec![], vec![9999])),
        ]);

        let err = validate_expose(&defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidComponent { .. }));
    }

    #[test]
    fn test_two_roots_must_not_expose_same_port() {
        let defs = registry(vec![
            ("a", component(vec![expose(80, None, None)], vec![80])),
            ("b", component(vec![expose(80, None, None)], vec![80])),
        ]);

        let err = validate_expose(&defs).unwrap_err();
        assert!(err.to_string().contains("already exposed"));
    }

    #[test]
    fn test_unknown_implementer_not_found() {
        let defs = registry(vec![(
            "a",
            component(vec![expose(80, Some("ghost"), None)], vec![]),
        )]);

        let err = validate_expose(&defs).unwrap_err();
        assert!(matches!(err, ValidationError::NotFound { .. }));
    }
}
