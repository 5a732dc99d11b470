//! Link graph validation: target resolution, direction policy, uniqueness,
//! port reachability, and cycle detection.
//!
//! Only in-application links participate in the graph; links to external
//! services are opaque endpoints and cannot cycle back.

use tracing::debug;

use crate::definition::{ComponentDefinitions, ComponentName, LinkDefinition, PortSpec};
use crate::error::ValidationError;

/// A resolved link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// An in-application component, by absolute name.
    Component {
        /// Absolute name of the target component.
        name: ComponentName,
        /// Port the target is expected to export.
        port: PortSpec,
    },
    /// An opaque external service.
    Service {
        /// Name of the external service.
        name: String,
        /// Port the service is expected to export.
        port: PortSpec,
    },
}

/// Resolves a link owned by `owner` to its target.
///
/// Service links resolve without consulting the registry. Component names
/// resolve as given first, then relative to the owner's namespace.
///
/// # Errors
///
/// Returns [`ValidationError::NotFound`] for an unresolvable component
/// target and [`ValidationError::InvalidLink`] for a link naming no target.
pub fn resolve_link(
    definitions: &ComponentDefinitions,
    owner: &ComponentName,
    link: &LinkDefinition,
) -> Result<LinkTarget, ValidationError> {
    if let Some(service) = &link.service {
        return Ok(LinkTarget::Service {
            name: service.clone(),
            port: link.target_port,
        });
    }

    let Some(component) = &link.component else {
        return Err(ValidationError::link(
            owner.as_str(),
            "link must set one of 'component' or 'service'",
        ));
    };

    let name = resolve_target_name(definitions, owner, component)?;
    Ok(LinkTarget::Component {
        name,
        port: link.target_port,
    })
}

/// Resolves a possibly owner-relative component name.
fn resolve_target_name(
    definitions: &ComponentDefinitions,
    owner: &ComponentName,
    target: &ComponentName,
) -> Result<ComponentName, ValidationError> {
    if definitions.contains(target) {
        return Ok(target.clone());
    }

    if let Ok(joined) = owner.join(target.as_str())
        && definitions.contains(&joined)
    {
        return Ok(joined);
    }

    Err(ValidationError::not_found("link target", target.as_str()))
}

/// Validates all links in the registry, then checks the graph for cycles.
///
/// # Errors
///
/// Returns the first violation found: duplicate identifiers, unresolvable
/// targets, disallowed directions, unexported ports, or a cycle.
pub fn validate_links(definitions: &ComponentDefinitions) -> Result<(), ValidationError> {
    for (owner, definition) in definitions.iter() {
        let mut identifiers = std::collections::HashSet::new();

        for link in &definition.links {
            match resolve_link(definitions, owner, link)? {
                LinkTarget::Service { name, .. } => {
                    let identifier = link.alias.clone().unwrap_or(name);
                    if !identifiers.insert(identifier.clone()) {
                        return Err(ValidationError::link(
                            owner.as_str(),
                            format!("duplicate link identifier '{identifier}'"),
                        ));
                    }
                }
                LinkTarget::Component { name, port } => {
                    let identifier = link
                        .alias
                        .clone()
                        .unwrap_or_else(|| name.to_string());
                    if !identifiers.insert(identifier.clone()) {
                        return Err(ValidationError::link(
                            owner.as_str(),
                            format!("duplicate link identifier '{identifier}'"),
                        ));
                    }

                    if !direction_allowed(owner, &name) {
                        return Err(ValidationError::link(
                            owner.as_str(),
                            format!("link to '{name}' leaves the component's branch"),
                        ));
                    }

                    if !definitions.by_name(&name)?.exports_port(port) {
                        return Err(ValidationError::component(
                            name.as_str(),
                            format!("does not export port {port} linked from '{owner}'"),
                        ));
                    }
                }
            }
        }
    }

    detect_cycles(definitions)?;
    debug!("Link graph checks passed");
    Ok(())
}

/// Direction policy over the node-name model: a component may link down
/// into its own subtree, or up-and-over: walking upward from itself, each
/// step may land on the current node's parent or one of its siblings (two
/// roots count as siblings). Arbitrary unrelated branches are rejected.
#[must_use]
pub fn direction_allowed(source: &ComponentName, target: &ComponentName) -> bool {
    if target.is_child_of(source) {
        return true;
    }

    let mut current = source.clone();
    loop {
        if target == &current || target.is_sibling_of(&current) {
            return true;
        }
        match current.parent() {
            Ok(parent) => current = parent,
            Err(_) => return false,
        }
    }
}

/// Depth-first search from every component; a link chain revisiting a
/// component already on the current path is a cycle. A self-link is the
/// degenerate one-node cycle.
fn detect_cycles(definitions: &ComponentDefinitions) -> Result<(), ValidationError> {
    let mut path = Vec::new();
    for name in definitions.names() {
        visit(definitions, name, &mut path)?;
    }
    Ok(())
}

fn visit(
    definitions: &ComponentDefinitions,
    current: &ComponentName,
    path: &mut Vec<ComponentName>,
) -> Result<(), ValidationError> {
    if path.contains(current) {
        return Err(ValidationError::LinkCycle {
            chain: ValidationError::render_chain(path, current),
        });
    }

    path.push(current.clone());

    if let Some(definition) = definitions.get(current) {
        for link in &definition.links {
            if link.is_service_link() {
                continue;
            }
            if let LinkTarget::Component { name, .. } = resolve_link(definitions, current, link)? {
                visit(definitions, &name, path)?;
            }
        }
    }

    path.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ComponentDefinition;

    fn name(s: &str) -> ComponentName {
        ComponentName::new(s).unwrap()
    }

    fn component_link(target: &str, port: u16) -> LinkDefinition {
        LinkDefinition {
            component: Some(name(target)),
            service: None,
            alias: None,
            target_port: PortSpec::tcp(port),
        }
    }

    fn with_links(links: Vec<LinkDefinition>, ports: Vec<u16>) -> ComponentDefinition {
        ComponentDefinition {
            links,
            ports: ports.into_iter().map(PortSpec::tcp).collect(),
            ..Default::default()
        }
    }

    fn registry(entries: Vec<(&str, ComponentDefinition)>) -> ComponentDefinitions {
        entries
            .into_iter()
            .map(|(n, d)| (name(n), d))
            .collect()
    }

    #[test]
    fn test_chain_without_cycle_validates() {
        let defs = registry(vec![
            ("one", with_links(vec![component_link("two", 80)], vec![])),
            ("two", with_links(vec![component_link("three", 81)], vec![80])),
            ("three", with_links(vec![], vec![81])),
        ]);
        assert!(validate_links(&defs).is_ok());
    }

    #[test]
    fn test_closing_edge_forms_cycle() {
        let defs = registry(vec![
            ("one", with_links(vec![component_link("two", 80)], vec![82])),
            ("two", with_links(vec![component_link("three", 81)], vec![80])),
            ("three", with_links(vec![component_link("one", 82)], vec![81])),
        ]);
        let err = validate_links(&defs).unwrap_err();
        assert!(matches!(err, ValidationError::LinkCycle { .. }));
    }

    #[test]
    fn test_self_link_is_a_cycle() {
        let defs = registry(vec![(
            "a",
            with_links(vec![component_link("a", 80)], vec![80]),
        )]);
        let err = validate_links(&defs).unwrap_err();
        assert!(matches!(err, ValidationError::LinkCycle { .. }));
        assert!(err.to_string().contains("a -> a"));
    }

    #[test]
    fn test_service_links_do_not_cycle() {
        let service_link = LinkDefinition {
            component: None,
            service: Some(String::from("other-app/db")),
            alias: None,
            target_port: PortSpec::tcp(5432),
        };
        let defs = registry(vec![("a", with_links(vec![service_link], vec![]))]);
        assert!(validate_links(&defs).is_ok());
    }

    #[test]
    fn test_direction_policy() {
        // Down into own subtree
        assert!(direction_allowed(&name("a"), &name("a/b/c")));
        // Own sibling
        assert!(direction_allowed(&name("a/b"), &name("a/c")));
        // Ancestor
        assert!(direction_allowed(&name("a/b/c"), &name("a")));
        // Sibling of ancestor
        assert!(direction_allowed(&name("a/b/c"), &name("a/x")));
        // Two roots are siblings
        assert!(direction_allowed(&name("a"), &name("b")));
        // Child of an ancestor's sibling is an unrelated branch
        assert!(!direction_allowed(&name("a/b"), &name("c/d")));
        assert!(!direction_allowed(&name("a/b/c"), &name("a/x/y")));
    }

    #[test]
    fn test_disallowed_direction_rejected() {
        let defs = registry(vec![
            ("a", with_links(vec![], vec![])),
            ("a/b", with_links(vec![component_link("c/d", 80)], vec![])),
            ("c", with_links(vec![], vec![])),
            ("c/d", with_links(vec![], vec![80])),
        ]);
        let err = validate_links(&defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidLink { .. }));
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut aliased = component_link("b", 80);
        aliased.alias = Some(String::from("dep"));
        let mut aliased_again = component_link("c", 81);
        aliased_again.alias = Some(String::from("dep"));

        let defs = registry(vec![
            ("a", with_links(vec![aliased, aliased_again], vec![])),
            ("b", with_links(vec![], vec![80])),
            ("c", with_links(vec![], vec![81])),
        ]);
        let err = validate_links(&defs).unwrap_err();
        assert!(err.to_string().contains("dep"));
    }

    #[test]
    fn test_target_must_export_port() {
        let defs = registry(vec![
            ("a", with_links(vec![component_link("b", 80)], vec![])),
            ("b", with_links(vec![], vec![9000])),
        ]);
        let err = validate_links(&defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidComponent { .. }));
        assert!(err.to_string().contains("does not export port"));
    }

    #[test]
    fn test_unknown_target_not_found() {
        let defs = registry(vec![(
            "a",
            with_links(vec![component_link("ghost", 80)], vec![]),
        )]);
        let err = validate_links(&defs).unwrap_err();
        assert!(matches!(err, ValidationError::NotFound { .. }));
    }

    #[test]
    fn test_owner_relative_resolution() {
        let defs = registry(vec![
            ("app", with_links(vec![component_link("db", 5432)], vec![])),
            ("app/db", with_links(vec![], vec![5432])),
        ]);
        // `db` is not a registry key, but `app/db` is.
        assert!(validate_links(&defs).is_ok());
    }

    #[test]
    fn test_target_port_via_expose_counts_as_exported() {
        use crate::definition::ExposeDefinition;

        let exposer = ComponentDefinition {
            expose: vec![ExposeDefinition {
                port: PortSpec::tcp(80),
                component: None,
                target_port: Some(PortSpec::tcp(8080)),
            }],
            ports: vec![PortSpec::tcp(8080)],
            ..Default::default()
        };
        let defs = registry(vec![
            ("a", with_links(vec![component_link("b", 80)], vec![])),
            ("b", exposer),
        ]);
        assert!(validate_links(&defs).is_ok());
    }
}
