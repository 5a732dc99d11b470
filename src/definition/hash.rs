//! Definition hashing for change detection.
//!
//! This module provides deterministic hashing of definitions so external
//! tooling can detect changes between revisions without diffing the whole
//! document.

use sha2::{Digest, Sha256};

use super::name::ComponentName;
use super::registry::ComponentDefinitions;
use super::spec::ComponentDefinition;

/// Hasher for computing definition hashes.
#[derive(Debug, Default)]
pub struct DefinitionHasher;

impl DefinitionHasher {
    /// Creates a new definition hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of an entire registry.
    ///
    /// Components are hashed in name order, so the result is independent of
    /// insertion order.
    #[must_use]
    pub fn hash_definition(&self, definitions: &ComponentDefinitions) -> String {
        let mut hasher = Sha256::new();

        let mut entries: Vec<_> = definitions.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (name, definition) in entries {
            hasher.update(self.hash_component(name, definition).as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a hash for a single component definition.
    #[must_use]
    pub fn hash_component(&self, name: &ComponentName, definition: &ComponentDefinition) -> String {
        let mut hasher = Sha256::new();

        hasher.update(name.as_str().as_bytes());

        if let Some(image) = &definition.image {
            hasher.update(image.to_string().as_bytes());
        }
        if let Some(entrypoint) = &definition.entrypoint {
            hasher.update(entrypoint.as_bytes());
        }
        for arg in &definition.args {
            hasher.update(arg.as_bytes());
        }

        // Ports (sorted for determinism)
        let mut ports: Vec<_> = definition.ports.iter().map(|p| p.number).collect();
        ports.sort_unstable();
        for port in ports {
            hasher.update(port.to_be_bytes());
        }

        // Environment variables (sorted for determinism)
        let mut env_vars: Vec<_> = definition.env.iter().collect();
        env_vars.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in env_vars {
            hasher.update(key.as_bytes());
            hasher.update(value.as_bytes());
        }

        for volume in &definition.volumes {
            if let Some(path) = &volume.path {
                hasher.update(path.as_bytes());
            }
            if let Some(size) = &volume.size {
                hasher.update(u64::from(size.gigabytes()).to_be_bytes());
            }
            if let Some(source) = &volume.volumes_from {
                hasher.update(source.as_str().as_bytes());
            }
            if let Some(source) = &volume.volume_from {
                hasher.update(source.as_str().as_bytes());
            }
            if let Some(path) = &volume.volume_path {
                hasher.update(path.as_bytes());
            }
        }

        // Domains (sorted for determinism)
        let mut domains: Vec<_> = definition.domains.iter().collect();
        domains.sort_by(|a, b| a.0.cmp(b.0));
        for (domain, port) in domains {
            hasher.update(domain.as_bytes());
            hasher.update(port.number.to_be_bytes());
        }

        for link in &definition.links {
            hasher.update(link.identifier().as_bytes());
            hasher.update(link.target_port.number.to_be_bytes());
        }

        for expose in &definition.expose {
            hasher.update(expose.port.number.to_be_bytes());
            if let Some(component) = &expose.component {
                hasher.update(component.as_str().as_bytes());
            }
            hasher.update(expose.effective_target_port().number.to_be_bytes());
        }

        if let Some(scale) = &definition.scale {
            if let Some(min) = scale.min {
                hasher.update(min.to_be_bytes());
            }
            if let Some(max) = scale.max {
                hasher.update(max.to_be_bytes());
            }
            if let Some(placement) = scale.placement {
                hasher.update(placement.to_string().as_bytes());
            }
        }

        if let Some(pod) = definition.pod {
            hasher.update(pod.to_string().as_bytes());
        }

        hasher.update(if definition.signal_ready { [1u8] } else { [0u8] });

        if let Some(limit) = definition.memory_limit {
            hasher.update(limit.bytes().to_be_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }

    /// Compares two hashes for equality.
    #[must_use]
    pub fn hashes_match(hash1: &str, hash2: &str) -> bool {
        if hash1.len() != hash2.len() {
            return false;
        }

        hash1
            .bytes()
            .zip(hash2.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}
