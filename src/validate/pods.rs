//! Pod membership resolution and pod-wide invariants.
//!
//! A component declaring pod mode `children` or `inherit` is a pod root.
//! `children` pulls in its direct children, `inherit` all descendants; a
//! descendant declaring `none` acts as a boundary that detaches its whole
//! subtree from the pod, even under `inherit`.

use std::collections::HashMap;
use tracing::debug;

use crate::definition::{
    ComponentDefinition, ComponentDefinitions, ComponentName, Placement, PodMode, ScaleDefinition,
};
use crate::error::ValidationError;

use super::context::ValidationContext;

/// The effective scaling policy of a pod or standalone component after
/// explicit values and context defaults are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalePolicy {
    /// Effective minimum instance count.
    pub min: u32,
    /// Effective maximum instance count.
    pub max: u32,
    /// Effective placement strategy.
    pub placement: Placement,
}

/// Returns the names declaring a pod, in registry order.
#[must_use]
pub fn pod_roots(definitions: &ComponentDefinitions) -> Vec<ComponentName> {
    definitions
        .filter_by(|_, def| def.is_pod_root())
        .into_iter()
        .cloned()
        .collect()
}

/// Resolves the members of the pod rooted at `root`.
///
/// The root itself is not a member. Members are the qualifying children
/// (mode `children`) or descendants (mode `inherit`) that neither opt out
/// themselves nor sit beneath an opting-out boundary.
///
/// # Errors
///
/// Returns [`ValidationError::NotFound`] for an unknown root and
/// [`ValidationError::InvalidPod`] when `root` does not declare a pod.
pub fn pod_members(
    definitions: &ComponentDefinitions,
    root: &ComponentName,
) -> Result<Vec<ComponentName>, ValidationError> {
    let definition = definitions.by_name(root)?;

    let members = match definition.pod {
        Some(PodMode::Children) => definitions
            .children_of(root)
            .into_iter()
            .filter(|child| {
                definitions
                    .get(child)
                    .is_some_and(|def| !def.detaches_from_pod())
            })
            .cloned()
            .collect(),
        Some(PodMode::Inherit) => definitions
            .descendants_of(root)
            .into_iter()
            .filter(|descendant| {
                definitions
                    .get(descendant)
                    .is_some_and(|def| !def.detaches_from_pod())
                    && !beneath_none_boundary(definitions, root, descendant)
            })
            .cloned()
            .collect(),
        _ => {
            return Err(ValidationError::pod(
                root.as_str(),
                "component does not declare a pod",
            ));
        }
    };

    Ok(members)
}

/// True if a component strictly between `root` and `descendant` opts out,
/// detaching the subtree `descendant` belongs to.
fn beneath_none_boundary(
    definitions: &ComponentDefinitions,
    root: &ComponentName,
    descendant: &ComponentName,
) -> bool {
    definitions.iter().any(|(candidate, def)| {
        def.detaches_from_pod()
            && candidate.is_child_of(root)
            && descendant.is_child_of(candidate)
    })
}

/// Walks ancestors of `name` until one declaring a pod is found.
///
/// A pod root is not its own pod root; the walk starts at the closest
/// existing ancestor.
///
/// # Errors
///
/// Returns [`ValidationError::NotFound`] when no ancestor declares a pod.
pub fn pod_root_of(
    definitions: &ComponentDefinitions,
    name: &ComponentName,
) -> Result<ComponentName, ValidationError> {
    let mut current = name.clone();
    loop {
        let parent = definitions.parent_of(&current).map_err(|_| {
            ValidationError::not_found("pod root for component", name.as_str())
        })?;
        if definitions.get(&parent).is_some_and(ComponentDefinition::is_pod_root) {
            return Ok(parent);
        }
        current = parent;
    }
}

/// Returns true if an ancestor of `name` declares a pod.
#[must_use]
pub fn is_part_of_pod(definitions: &ComponentDefinitions, name: &ComponentName) -> bool {
    pod_root_of(definitions, name).is_ok()
}

/// Computes the effective scaling policy of a pod.
///
/// Members that explicitly set `min` must agree, likewise `max` and
/// `placement`. The agreed explicit values are broadcast pod-wide through a
/// pod-local copy of the context, so unset fields on all members converge
/// on the same effective value.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidScaling`] on disagreement or when the
/// effective bounds are inconsistent.
pub fn effective_pod_scale(
    ctx: &ValidationContext,
    definitions: &ComponentDefinitions,
    root: &ComponentName,
    members: &[ComponentName],
) -> Result<ScalePolicy, ValidationError> {
    let mut agreed = ScaleDefinition::default();

    for member in members {
        let Some(scale) = definitions.by_name(member)?.scale else {
            continue;
        };

        if let Some(min) = scale.min {
            match agreed.min {
                Some(previous) if previous != min => {
                    return Err(ValidationError::scaling(
                        root.as_str(),
                        format!("pod members disagree on scale minimum ({previous} vs {min})"),
                    ));
                }
                _ => agreed.min = Some(min),
            }
        }

        if let Some(max) = scale.max {
            match agreed.max {
                Some(previous) if previous != max => {
                    return Err(ValidationError::scaling(
                        root.as_str(),
                        format!("pod members disagree on scale maximum ({previous} vs {max})"),
                    ));
                }
                _ => agreed.max = Some(max),
            }
        }

        if let Some(placement) = scale.placement {
            match agreed.placement {
                Some(previous) if previous != placement => {
                    return Err(ValidationError::scaling(
                        root.as_str(),
                        format!("pod members disagree on placement ({previous} vs {placement})"),
                    ));
                }
                _ => agreed.placement = Some(placement),
            }
        }
    }

    let local = ctx.pod_local(&agreed);
    let policy = ScalePolicy {
        min: local.min_scale,
        max: local.max_scale,
        placement: local.default_placement,
    };

    if policy.min > policy.max {
        return Err(ValidationError::scaling(
            root.as_str(),
            format!(
                "effective scale minimum {} exceeds effective maximum {}",
                policy.min, policy.max
            ),
        ));
    }

    Ok(policy)
}

/// Validates every pod in the registry.
///
/// # Errors
///
/// Returns the first pod violation found: nested pod roots, too few
/// members, scaling disagreement, duplicate exported ports, or disagreeing
/// shared dependencies.
pub fn validate_pods(
    ctx: &ValidationContext,
    definitions: &ComponentDefinitions,
) -> Result<(), ValidationError> {
    let roots = pod_roots(definitions);

    for root in &roots {
        validate_not_nested(definitions, root)?;
    }

    for root in &roots {
        let members = pod_members(definitions, root)?;
        debug!("Pod '{root}' resolved to {} members", members.len());

        if members.len() < 2 {
            return Err(ValidationError::pod(
                root.as_str(),
                format!("pod must have at least 2 members, found {}", members.len()),
            ));
        }

        effective_pod_scale(ctx, definitions, root, &members)?;
        validate_unique_ports(definitions, root, &members)?;
        validate_shared_dependencies(definitions, root, &members)?;
    }

    Ok(())
}

/// A pod root must not sit inside another pod.
fn validate_not_nested(
    definitions: &ComponentDefinitions,
    root: &ComponentName,
) -> Result<(), ValidationError> {
    if let Ok(enclosing) = pod_root_of(definitions, root) {
        return Err(ValidationError::pod(
            root.as_str(),
            format!("pod root is nested inside pod '{enclosing}'"),
        ));
    }
    Ok(())
}

/// No two pod members may export the same TCP port.
fn validate_unique_ports(
    definitions: &ComponentDefinitions,
    root: &ComponentName,
    members: &[ComponentName],
) -> Result<(), ValidationError> {
    let mut exported: HashMap<u16, &ComponentName> = HashMap::new();

    for member in members {
        for port in &definitions.by_name(member)?.ports {
            if let Some(previous) = exported.insert(port.number, member) {
                return Err(ValidationError::pod(
                    root.as_str(),
                    format!("port {port} exported by both '{previous}' and '{member}'"),
                ));
            }
        }
    }

    Ok(())
}

/// Two pod members may depend on the same target only if their local alias
/// and target port agree exactly.
fn validate_shared_dependencies(
    definitions: &ComponentDefinitions,
    root: &ComponentName,
    members: &[ComponentName],
) -> Result<(), ValidationError> {
    let mut seen: HashMap<String, (Option<String>, u16)> = HashMap::new();

    for member in members {
        for link in &definitions.by_name(member)?.links {
            let target = link
                .component
                .as_ref()
                .map_or_else(|| link.service.clone().unwrap_or_default(), ToString::to_string);

            let current = (link.alias.clone(), link.target_port.number);
            if let Some(previous) = seen.get(&target) {
                if *previous != current {
                    return Err(ValidationError::InvalidDependency {
                        pod: root.to_string(),
                        reason: format!(
                            "members depend on '{target}' with conflicting alias or port"
                        ),
                    });
                }
            } else {
                seen.insert(target, current);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ComponentDefinition, LinkDefinition, PortSpec};

    fn name(s: &str) -> ComponentName {
        ComponentName::new(s).unwrap()
    }

    fn with_pod(pod: Option<PodMode>) -> ComponentDefinition {
        ComponentDefinition {
            pod,
            ..Default::default()
        }
    }

    fn registry(entries: &[(&str, ComponentDefinition)]) -> ComponentDefinitions {
        entries
            .iter()
            .map(|(n, d)| (name(n), d.clone()))
            .collect()
    }

    #[test]
    fn test_children_members_exclude_opt_outs() {
        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Children))),
            ("a/b", with_pod(None)),
            ("a/c", with_pod(Some(PodMode::None))),
            ("a/d", with_pod(None)),
            ("a/d/e", with_pod(None)),
        ]);

        let members = pod_members(&defs, &name("a")).unwrap();
        // Direct children only; `a/c` opted out; `a/d/e` is not direct.
        assert_eq!(members, vec![name("a/b"), name("a/d")]);
    }

    #[test]
    fn test_inherit_members_stop_at_none_boundary() {
        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Inherit))),
            ("a/b", with_pod(None)),
            ("a/c", with_pod(Some(PodMode::None))),
            ("a/c/d", with_pod(None)),
            ("a/c/d/e", with_pod(None)),
            ("a/f", with_pod(None)),
        ]);

        let members = pod_members(&defs, &name("a")).unwrap();
        // The whole subtree under the `none` boundary `a/c` is detached,
        // even though `a/c/d` and `a/c/d/e` do not opt out themselves.
        assert_eq!(members, vec![name("a/b"), name("a/f")]);
    }

    #[test]
    fn test_pod_root_of_walks_ancestors() {
        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Inherit))),
            ("a/b/c", with_pod(None)),
        ]);

        assert_eq!(pod_root_of(&defs, &name("a/b/c")).unwrap(), name("a"));
        assert!(is_part_of_pod(&defs, &name("a/b/c")));
        // A pod root is not its own pod root.
        assert!(!is_part_of_pod(&defs, &name("a")));
    }

    #[test]
    fn test_pod_requires_two_members() {
        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Children))),
            ("a/b", with_pod(None)),
        ]);

        let err = validate_pods(&ValidationContext::default(), &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPod { .. }));
    }

    #[test]
    fn test_nested_pod_root_rejected() {
        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Inherit))),
            ("a/b", with_pod(Some(PodMode::Children))),
            ("a/b/c", with_pod(None)),
            ("a/b/d", with_pod(None)),
            ("a/e", with_pod(None)),
        ]);

        let err = validate_pods(&ValidationContext::default(), &defs).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn test_scaling_disagreement_rejected() {
        let scaled = |min: Option<u32>| ComponentDefinition {
            scale: min.map(|m| ScaleDefinition {
                min: Some(m),
                max: None,
                placement: None,
            }),
            pod: None,
            ..Default::default()
        };

        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Children))),
            ("a/b", scaled(Some(2))),
            ("a/c", scaled(Some(3))),
        ]);
        let err = validate_pods(&ValidationContext::default(), &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidScaling { .. }));

        // Only one member sets min: the explicit value becomes the
        // pod-wide effective minimum.
        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Children))),
            ("a/b", scaled(Some(2))),
            ("a/c", scaled(None)),
        ]);
        let members = pod_members(&defs, &name("a")).unwrap();
        let policy =
            effective_pod_scale(&ValidationContext::default(), &defs, &name("a"), &members)
                .unwrap();
        assert_eq!(policy.min, 2);
        assert_eq!(policy.max, ValidationContext::default().max_scale);
    }

    #[test]
    fn test_duplicate_port_in_pod_rejected() {
        let ported = || ComponentDefinition {
            ports: vec![PortSpec::tcp(8080)],
            ..Default::default()
        };

        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Children))),
            ("a/b", ported()),
            ("a/c", ported()),
        ]);

        let err = validate_pods(&ValidationContext::default(), &defs).unwrap_err();
        assert!(err.to_string().contains("8080"));
    }

    #[test]
    fn test_shared_dependency_must_agree() {
        let linked = |alias: &str| ComponentDefinition {
            links: vec![LinkDefinition {
                component: None,
                service: Some(String::from("shared/db")),
                alias: Some(String::from(alias)),
                target_port: PortSpec::tcp(5432),
            }],
            ..Default::default()
        };

        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Children))),
            ("a/b", linked("db")),
            ("a/c", linked("db")),
        ]);
        assert!(validate_pods(&ValidationContext::default(), &defs).is_ok());

        let defs = registry(&[
            ("a", with_pod(Some(PodMode::Children))),
            ("a/b", linked("db")),
            ("a/c", linked("database")),
        ]);
        let err = validate_pods(&ValidationContext::default(), &defs).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDependency { .. }));
    }
}
