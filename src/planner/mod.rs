//! Deployment planning over validated definitions.
//!
//! Turns a set of requested components into ordered deployment groups:
//! pods deploy as one unit, and groups that link into other groups deploy
//! strictly after them.

mod order;

pub use order::{DeploymentGroup, DeploymentOrder, DeploymentOrderer};
