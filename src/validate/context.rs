//! Validation context: externally supplied policy bounds.
//!
//! The context is constructed once per validation call and never mutated by
//! the validation passes; pod-wide default broadcasting works on a derived
//! local copy.

use serde::{Deserialize, Serialize};

use crate::definition::{ByteSize, Placement, Protocol, ScaleDefinition, VolumeSize};

/// Externally supplied configuration for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ValidationContext {
    /// Organization the definition belongs to.
    pub org: String,
    /// Protocols components may export.
    pub allowed_protocols: Vec<Protocol>,
    /// Lowest allowed scale, also the default minimum.
    pub min_scale: u32,
    /// Highest allowed scale, also the default maximum.
    pub max_scale: u32,
    /// Placement applied when a component does not set one.
    pub default_placement: Placement,
    /// Smallest allowed volume size.
    pub min_volume_size: VolumeSize,
    /// Largest allowed volume size.
    pub max_volume_size: VolumeSize,
    /// Memory limit policy.
    pub memory: MemoryBounds,
    /// Registry hostnames considered public.
    pub public_registries: Vec<String>,
    /// The organization's private registry hostname, if any.
    pub private_registry: Option<String>,
}

/// Memory limit bounds and enablement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct MemoryBounds {
    /// Whether memory limits are checked at all.
    pub enforce: bool,
    /// Smallest allowed limit.
    pub min: ByteSize,
    /// Largest allowed limit.
    pub max: ByteSize,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            org: String::new(),
            allowed_protocols: vec![Protocol::Tcp],
            min_scale: 1,
            max_scale: 10,
            default_placement: Placement::Simple,
            min_volume_size: VolumeSize::from_gb(1),
            max_volume_size: VolumeSize::from_gb(100),
            memory: MemoryBounds::default(),
            public_registries: vec![String::from("registry-1.docker.io"), String::from("quay.io")],
            private_registry: None,
        }
    }
}

impl Default for MemoryBounds {
    fn default() -> Self {
        Self {
            enforce: true,
            min: ByteSize::from_mib(4),
            max: ByteSize::from_gib(64),
        }
    }
}

impl ValidationContext {
    /// Creates a context for the given organization with default bounds.
    #[must_use]
    pub fn for_org(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            ..Self::default()
        }
    }

    /// Returns true if the protocol may be exported.
    #[must_use]
    pub fn allows_protocol(&self, protocol: Protocol) -> bool {
        self.allowed_protocols.contains(&protocol)
    }

    /// Derives a pod-local copy with the pod's explicit scaling overrides
    /// applied as the new defaults. The receiver is left untouched.
    #[must_use]
    pub fn pod_local(&self, overrides: &ScaleDefinition) -> Self {
        let mut local = self.clone();
        if let Some(min) = overrides.min {
            local.min_scale = min;
        }
        if let Some(max) = overrides.max {
            local.max_scale = max;
        }
        if let Some(placement) = overrides.placement {
            local.default_placement = placement;
        }
        local
    }
}
