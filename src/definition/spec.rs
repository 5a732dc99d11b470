//! Definition types for multi-component application descriptors.
//!
//! This module defines the structs that map to an application definition
//! document. Primitive values (ports, byte sizes, volume sizes, image
//! references) arrive here already parsed into dedicated value types; the
//! semantic rules that relate components to each other live in the
//! validation passes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::name::ComponentName;

/// A single node in the component tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentDefinition {
    /// Container image backing this component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Optional entrypoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    /// Arguments passed to the entrypoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// TCP ports this component exports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortSpec>,
    /// Environment variables.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    /// Volume mounts and volume references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeSpec>,
    /// Domain name to exported port bindings.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub domains: HashMap<String, PortSpec>,
    /// Outgoing dependency edges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkDefinition>,
    /// Published stable-API ports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expose: Vec<ExposeDefinition>,
    /// Scaling policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleDefinition>,
    /// Declared pod mode. Unset means the component neither roots a pod nor
    /// opts out of one; an explicit `none` detaches the component (and its
    /// subtree) from any enclosing pod.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodMode>,
    /// Whether the component signals readiness itself instead of being
    /// considered ready on start.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub signal_ready: bool,
    /// Memory limit for the component's container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<ByteSize>,
}

impl ComponentDefinition {
    /// Returns true if this component declares a pod (`children` or
    /// `inherit`).
    #[must_use]
    pub const fn is_pod_root(&self) -> bool {
        matches!(self.pod, Some(PodMode::Children | PodMode::Inherit))
    }

    /// Returns true if this component explicitly opts out of any enclosing
    /// pod (`pod: none`), detaching its whole subtree.
    #[must_use]
    pub const fn detaches_from_pod(&self) -> bool {
        matches!(self.pod, Some(PodMode::None))
    }

    /// Returns true if the port appears in the component's port list.
    #[must_use]
    pub fn declares_port(&self, port: PortSpec) -> bool {
        self.ports.contains(&port)
    }

    /// Returns true if the component exports the port, either directly via
    /// its port list or via an expose entry publishing it.
    #[must_use]
    pub fn exports_port(&self, port: PortSpec) -> bool {
        self.declares_port(port) || self.expose.iter().any(|e| e.port == port)
    }
}

/// Pod grouping mode declared on a component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PodMode {
    /// Explicit opt-out: the component and its subtree never join a pod.
    None,
    /// The component's direct children form a pod.
    Children,
    /// All descendants form a pod, down to (but not past) a `none` boundary.
    Inherit,
}

impl fmt::Display for PodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Children => "children",
            Self::Inherit => "inherit",
        };
        write!(f, "{s}")
    }
}

/// A directed dependency edge from the owning component to a target.
///
/// Exactly one of `component` (same application) or `service` (opaque
/// external reference) must be set; validation enforces this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LinkDefinition {
    /// In-application target component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentName>,
    /// Cross-application service target, treated as opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Local alias for the linked target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Port the target is expected to export.
    pub target_port: PortSpec,
}

impl LinkDefinition {
    /// Returns true if the link points at an external service.
    #[must_use]
    pub const fn is_service_link(&self) -> bool {
        self.service.is_some()
    }

    /// The identifier the link is known by inside its owning component:
    /// the alias if set, otherwise the raw target name.
    #[must_use]
    pub fn identifier(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        if let Some(component) = &self.component {
            return component.to_string();
        }
        self.service.clone().unwrap_or_default()
    }
}

/// Publishes `port` as implemented by `component` (defaulting to the owner
/// itself) at `target_port` (defaulting to `port`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ExposeDefinition {
    /// The published port.
    pub port: PortSpec,
    /// Implementing component; the owner itself when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentName>,
    /// Port on the implementer; the published port when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<PortSpec>,
}

impl ExposeDefinition {
    /// The port the implementer is expected to provide.
    #[must_use]
    pub fn effective_target_port(&self) -> PortSpec {
        self.target_port.unwrap_or(self.port)
    }
}

/// A single volume entry: either an owned mount path, a recursive
/// `volumes-from` reference, or a single-path `volume-from` reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct VolumeSpec {
    /// Mount path owned by this component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Size of the volume backing `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<VolumeSize>,
    /// Pull in all mount points of the referenced component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes_from: Option<ComponentName>,
    /// Pull in exactly one mount point of the referenced component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_from: Option<ComponentName>,
    /// The mount point to pull in via `volume-from`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_path: Option<String>,
}

/// Scaling policy for a component: instance count bounds and placement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ScaleDefinition {
    /// Minimum number of instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    /// Maximum number of instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    /// Placement strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
}

impl ScaleDefinition {
    /// Returns true if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.placement.is_none()
    }
}

/// Placement strategy for scaled instances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    /// No placement constraint.
    #[default]
    Simple,
    /// At most one instance per machine.
    OnePerMachine,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Simple => "simple",
            Self::OnePerMachine => "one-per-machine",
        };
        write!(f, "{s}")
    }
}

/// Network protocol of an exported port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP.
    #[default]
    Tcp,
    /// UDP. Parsed but rejected by validation unless the context allows it.
    Udp,
}

impl Protocol {
    /// The protocol's lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// A parsed port: number plus protocol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "PortRepr", into = "String")]
pub struct PortSpec {
    /// Port number.
    pub number: u16,
    /// Protocol.
    pub protocol: Protocol,
}

impl PortSpec {
    /// Creates a TCP port.
    #[must_use]
    pub const fn tcp(number: u16) -> Self {
        Self {
            number,
            protocol: Protocol::Tcp,
        }
    }

    /// Parses a port from a string like `8080` or `8080/tcp`.
    ///
    /// # Errors
    ///
    /// Returns an error string if the format or protocol is invalid.
    pub fn parse(s: &str) -> Result<Self, String> {
        let (number, protocol) = match s.split_once('/') {
            Some((num, proto)) => (num, Some(proto)),
            None => (s, None),
        };

        let number = number
            .trim()
            .parse::<u16>()
            .map_err(|_| format!("invalid port number: {number}"))?;

        let protocol = match protocol.map(str::trim).map(str::to_lowercase).as_deref() {
            None | Some("tcp") => Protocol::Tcp,
            Some("udp") => Protocol::Udp,
            Some(other) => return Err(format!("invalid protocol: {other}")),
        };

        Ok(Self { number, protocol })
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol.as_str())
    }
}

/// Serde intermediate: ports are written as numbers or `PORT/PROTOCOL`
/// strings in descriptor documents.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    /// Bare port number, protocol defaults to TCP.
    Number(u16),
    /// `PORT/PROTOCOL` text.
    Text(String),
}

impl TryFrom<PortRepr> for PortSpec {
    type Error = String;

    fn try_from(repr: PortRepr) -> Result<Self, Self::Error> {
        match repr {
            PortRepr::Number(number) => Ok(Self::tcp(number)),
            PortRepr::Text(s) => Self::parse(&s),
        }
    }
}

impl From<PortSpec> for String {
    fn from(port: PortSpec) -> Self {
        port.to_string()
    }
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// A byte quantity, e.g. a memory limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "SizeRepr", into = "String")]
pub struct ByteSize(u64);

impl ByteSize {
    /// Creates a size from a raw byte count.
    #[must_use]
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Creates a size from whole mebibytes.
    #[must_use]
    pub const fn from_mib(mib: u64) -> Self {
        Self(mib * MIB)
    }

    /// Creates a size from whole gibibytes.
    #[must_use]
    pub const fn from_gib(gib: u64) -> Self {
        Self(gib * GIB)
    }

    /// The raw byte count.
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        let value = digits
            .parse::<u64>()
            .map_err(|_| format!("invalid byte size: {s}"))?;

        let factor = match unit.trim().to_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" => KIB,
            "M" | "MB" => MIB,
            "G" | "GB" => GIB,
            other => return Err(format!("invalid byte size unit: {other}")),
        };

        Ok(Self(value * factor))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= GIB && self.0 % GIB == 0 {
            write!(f, "{}G", self.0 / GIB)
        } else if self.0 >= MIB && self.0 % MIB == 0 {
            write!(f, "{}M", self.0 / MIB)
        } else if self.0 >= KIB && self.0 % KIB == 0 {
            write!(f, "{}K", self.0 / KIB)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A volume size in whole gigabytes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "SizeRepr", into = "String")]
pub struct VolumeSize(u32);

impl VolumeSize {
    /// Creates a volume size from whole gigabytes.
    #[must_use]
    pub const fn from_gb(gb: u32) -> Self {
        Self(gb)
    }

    /// The size in whole gigabytes.
    #[must_use]
    pub const fn gigabytes(self) -> u32 {
        self.0
    }
}

impl FromStr for VolumeSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        let value = digits
            .parse::<u32>()
            .map_err(|_| format!("invalid volume size: {s}"))?;

        match unit.trim().to_uppercase().as_str() {
            "" | "G" | "GB" => Ok(Self(value)),
            other => Err(format!("invalid volume size unit: {other}")),
        }
    }
}

impl fmt::Display for VolumeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} GB", self.0)
    }
}

/// Serde intermediate: sizes are written as numbers (base unit) or strings
/// with a unit suffix.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    /// Raw value in the type's base unit.
    Number(u64),
    /// Value with unit suffix, e.g. `512M` or `5 GB`.
    Text(String),
}

impl TryFrom<SizeRepr> for ByteSize {
    type Error = String;

    fn try_from(repr: SizeRepr) -> Result<Self, Self::Error> {
        match repr {
            SizeRepr::Number(bytes) => Ok(Self(bytes)),
            SizeRepr::Text(s) => s.parse(),
        }
    }
}

impl From<ByteSize> for String {
    fn from(size: ByteSize) -> Self {
        size.to_string()
    }
}

impl TryFrom<SizeRepr> for VolumeSize {
    type Error = String;

    fn try_from(repr: SizeRepr) -> Result<Self, Self::Error> {
        match repr {
            SizeRepr::Number(gb) => {
                let gb = u32::try_from(gb).map_err(|_| format!("volume size too large: {gb}"))?;
                Ok(Self(gb))
            }
            SizeRepr::Text(s) => s.parse(),
        }
    }
}

impl From<VolumeSize> for String {
    fn from(size: VolumeSize) -> Self {
        size.to_string()
    }
}

/// A parsed container image reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef {
    /// Registry host, e.g. `registry.example.com` or `quay.io`.
    pub registry: Option<String>,
    /// Namespace (organization) part.
    pub namespace: Option<String>,
    /// Repository name.
    pub repository: String,
    /// Version tag.
    pub version: Option<String>,
}

impl ImageRef {
    /// Parses an image reference of the usual
    /// `[registry/][namespace/]repository[:version]` shape.
    ///
    /// # Errors
    ///
    /// Returns an error string if the reference is empty or malformed.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err(String::from("image reference must not be empty"));
        }

        let mut parts: Vec<&str> = s.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(format!("malformed image reference: {s}"));
        }

        // A first part containing a dot or port is a registry host.
        let registry = if parts.len() > 1 && (parts[0].contains('.') || parts[0].contains(':')) {
            Some(parts.remove(0).to_string())
        } else {
            None
        };

        let last = parts.pop().map_or_else(String::new, str::to_string);
        let (repository, version) = match last.split_once(':') {
            Some((repo, tag)) if !repo.is_empty() && !tag.is_empty() => {
                (repo.to_string(), Some(tag.to_string()))
            }
            Some(_) => return Err(format!("malformed image reference: {s}")),
            None => (last, None),
        };

        let namespace = if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        };

        Ok(Self {
            registry,
            namespace,
            repository,
            version,
        })
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}/")?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

impl FromStr for ImageRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageRef {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        image.to_string()
    }
}
