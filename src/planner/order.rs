//! Deployment ordering.
//!
//! Requested components are grouped into independent deployment units (a
//! standalone component, or the full pod it belongs to) and the groups are
//! reordered so that a group linking into another group is deployed
//! strictly after it. The reorder is a bubble-to-fixpoint: scan from the
//! front, move a group to the furthest-right group it depends on, restart.
//! Ties keep discovery order.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::definition::{ComponentDefinition, ComponentDefinitions, ComponentName};
use crate::error::ValidationError;
use crate::validate::{pod_members, pod_root_of, resolve_link, LinkTarget};

/// One deployment unit: a standalone component, or a pod root followed by
/// its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentGroup {
    /// The names in this group, in discovery order.
    pub names: Vec<ComponentName>,
}

impl DeploymentGroup {
    /// Returns true if the group contains the name.
    #[must_use]
    pub fn contains(&self, name: &ComponentName) -> bool {
        self.names.contains(name)
    }
}

impl std::fmt::Display for DeploymentGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<&str> = self.names.iter().map(ComponentName::as_str).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

/// An ordered deployment plan over groups.
#[derive(Debug)]
pub struct DeploymentOrder {
    /// When the order was computed.
    pub created_at: DateTime<Utc>,
    /// Groups in deployment order.
    pub groups: Vec<DeploymentGroup>,
}

impl DeploymentOrder {
    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of components across all groups.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.groups.iter().map(|g| g.names.len()).sum()
    }
}

impl std::fmt::Display for DeploymentOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.groups.is_empty() {
            return write!(f, "Nothing to deploy");
        }

        writeln!(f, "Deployment order ({} groups):", self.groups.len())?;
        for (i, group) in self.groups.iter().enumerate() {
            writeln!(f, "  {}. {group}", i + 1)?;
        }
        Ok(())
    }
}

/// Computes deployment groups and their order over a registry.
#[derive(Debug)]
pub struct DeploymentOrderer<'a> {
    definitions: &'a ComponentDefinitions,
}

impl<'a> DeploymentOrderer<'a> {
    /// Creates an orderer over the given registry.
    #[must_use]
    pub const fn new(definitions: &'a ComponentDefinitions) -> Self {
        Self { definitions }
    }

    /// Groups the requested names into deployment units, deduplicating so
    /// no name appears in two groups.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFound`] for a requested name missing
    /// from the registry.
    pub fn group(
        &self,
        requested: &[ComponentName],
    ) -> Result<Vec<DeploymentGroup>, ValidationError> {
        let mut groups = Vec::new();
        let mut seen: HashSet<ComponentName> = HashSet::new();

        for name in requested {
            if seen.contains(name) {
                continue;
            }
            if !self.definitions.contains(name) {
                return Err(ValidationError::not_found("component", name.as_str()));
            }

            let names = self.pod_group_of(name)?;
            seen.extend(names.iter().cloned());
            groups.push(DeploymentGroup { names });
        }

        Ok(groups)
    }

    /// The full pod a component belongs to, or just the component itself.
    fn pod_group_of(&self, name: &ComponentName) -> Result<Vec<ComponentName>, ValidationError> {
        let root = if self.definitions.get(name).is_some_and(ComponentDefinition::is_pod_root) {
            Some(name.clone())
        } else {
            pod_root_of(self.definitions, name).ok()
        };

        if let Some(root) = root {
            let members = pod_members(self.definitions, &root)?;
            if *name == root || members.contains(name) {
                let mut names = vec![root];
                names.extend(members);
                return Ok(names);
            }
        }

        Ok(vec![name.clone()])
    }

    /// Reorders groups so dependents come strictly after their
    /// dependencies.
    ///
    /// Scans from the front; for each group the furthest-right index among
    /// the groups it links into is computed, the group is swapped there,
    /// and the scan restarts. Service links and targets outside the
    /// requested set are ignored. Groups with no dependency between them
    /// keep their discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::LinkCycle`] when the scan fails to reach
    /// a fixpoint, which only happens for cyclic group dependencies.
    pub fn order(
        &self,
        mut groups: Vec<DeploymentGroup>,
    ) -> Result<Vec<DeploymentGroup>, ValidationError> {
        // Every productive swap moves a group strictly to the right, so a
        // converging scan needs at most one pass per pair.
        let max_scans = groups.len() * groups.len() + 1;
        let mut scans = 0;

        'scan: loop {
            scans += 1;
            if scans > max_scans {
                return Err(ValidationError::LinkCycle {
                    chain: format!("deployment order did not converge after {max_scans} passes"),
                });
            }

            for i in 0..groups.len() {
                let furthest = self.furthest_dependency(&groups, i)?;
                if let Some(j) = furthest
                    && j > i
                {
                    debug!("Moving group {} after its dependency at {}", i, j);
                    groups.swap(i, j);
                    continue 'scan;
                }
            }
            break;
        }

        Ok(groups)
    }

    /// Groups the requested names and orders the result.
    ///
    /// # Errors
    ///
    /// Propagates grouping and ordering failures.
    pub fn group_and_order(
        &self,
        requested: &[ComponentName],
    ) -> Result<DeploymentOrder, ValidationError> {
        let groups = self.order(self.group(requested)?)?;
        Ok(DeploymentOrder {
            created_at: Utc::now(),
            groups,
        })
    }

    /// The rightmost index of a group that `groups[i]` links into.
    fn furthest_dependency(
        &self,
        groups: &[DeploymentGroup],
        i: usize,
    ) -> Result<Option<usize>, ValidationError> {
        let mut furthest = None;

        for name in &groups[i].names {
            let definition = self.definitions.by_name(name)?;
            for link in &definition.links {
                let Ok(LinkTarget::Component { name: target, .. }) =
                    resolve_link(self.definitions, name, link)
                else {
                    // Service links and unresolvable targets are outside
                    // the ordering problem.
                    continue;
                };

                if groups[i].contains(&target) {
                    continue;
                }
                if let Some(j) = groups.iter().position(|g| g.contains(&target)) {
                    furthest = Some(furthest.map_or(j, |f: usize| f.max(j)));
                }
            }
        }

        Ok(furthest)
    }
}
