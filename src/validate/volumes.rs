//! Volume mount resolution.
//!
//! A component's effective mount points combine its own `path` entries with
//! volumes pulled in from other components: `volumes-from` pulls the
//! source's full resolution recursively, `volume-from`/`volume-path` pulls
//! exactly one mount point. Resolution keeps a visited path of component
//! names, so reference cycles fail instead of recursing forever.

use std::collections::HashSet;
use tracing::debug;

use crate::definition::{ComponentDefinition, ComponentDefinitions, ComponentName};
use crate::error::ValidationError;

use super::context::ValidationContext;

/// Validates every volume entry and every component's resolved mounts.
///
/// # Errors
///
/// Returns the first violation found: a malformed field combination, a
/// size outside the context bounds, an unresolvable reference, a reference
/// cycle, or duplicate effective mount paths.
pub fn validate_volumes(
    ctx: &ValidationContext,
    definitions: &ComponentDefinitions,
) -> Result<(), ValidationError> {
    for (name, definition) in definitions.iter() {
        validate_entries(ctx, name, definition)?;
    }

    for (name, _) in definitions.iter() {
        let points = mount_points(definitions, name)?;

        let mut seen = HashSet::new();
        for point in points {
            if !seen.insert(point.clone()) {
                return Err(ValidationError::DuplicateVolumePath {
                    component: name.to_string(),
                    path: point,
                });
            }
        }
    }

    debug!("Volume checks passed");
    Ok(())
}

/// Checks the field combination of each volume entry in isolation.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidVolume`] for a malformed entry.
pub fn validate_entries(
    ctx: &ValidationContext,
    name: &ComponentName,
    definition: &ComponentDefinition,
) -> Result<(), ValidationError> {
    for volume in &definition.volumes {
        match (&volume.path, &volume.volumes_from, &volume.volume_from) {
            (Some(path), None, None) => {
                if volume.volume_path.is_some() {
                    return Err(ValidationError::volume(
                        name.as_str(),
                        "'volume-path' requires 'volume-from'",
                    ));
                }
                if !path.starts_with('/') {
                    return Err(ValidationError::volume(
                        name.as_str(),
                        format!("mount path '{path}' must be absolute"),
                    ));
                }
                if let Some(size) = volume.size
                    && (size < ctx.min_volume_size || size > ctx.max_volume_size)
                {
                    return Err(ValidationError::volume(
                        name.as_str(),
                        format!(
                            "volume size {size} outside allowed range {}..{}",
                            ctx.min_volume_size, ctx.max_volume_size
                        ),
                    ));
                }
            }
            (None, Some(source), None) => {
                if volume.size.is_some() || volume.volume_path.is_some() {
                    return Err(ValidationError::volume(
                        name.as_str(),
                        "'volumes-from' must not set 'size' or 'volume-path'",
                    ));
                }
                if source == name {
                    return Err(ValidationError::volume(
                        name.as_str(),
                        "'volumes-from' must not reference the component itself",
                    ));
                }
            }
            (None, None, Some(source)) => {
                if volume.size.is_some() {
                    return Err(ValidationError::volume(
                        name.as_str(),
                        "'volume-from' must not set 'size'",
                    ));
                }
                if volume.volume_path.is_none() {
                    return Err(ValidationError::volume(
                        name.as_str(),
                        "'volume-from' requires 'volume-path'",
                    ));
                }
                if source == name {
                    return Err(ValidationError::volume(
                        name.as_str(),
                        "'volume-from' must not reference the component itself",
                    ));
                }
            }
            (None, None, None) => {
                return Err(ValidationError::volume(
                    name.as_str(),
                    "volume must set one of 'path', 'volumes-from' or 'volume-from'",
                ));
            }
            _ => {
                return Err(ValidationError::volume(
                    name.as_str(),
                    "'path', 'volumes-from' and 'volume-from' are mutually exclusive",
                ));
            }
        }
    }

    Ok(())
}

/// Resolves all effective mount points of a component, in entry order.
///
/// # Errors
///
/// Returns [`ValidationError::VolumeCycle`] when a reference chain
/// revisits a component and [`ValidationError::NotFound`] for unknown
/// sources or mount points.
pub fn mount_points(
    definitions: &ComponentDefinitions,
    name: &ComponentName,
) -> Result<Vec<String>, ValidationError> {
    let mut path_stack = Vec::new();
    collect(definitions, name, &mut path_stack)
}

fn collect(
    definitions: &ComponentDefinitions,
    current: &ComponentName,
    path_stack: &mut Vec<ComponentName>,
) -> Result<Vec<String>, ValidationError> {
    if path_stack.contains(current) {
        return Err(ValidationError::VolumeCycle {
            chain: ValidationError::render_chain(path_stack, current),
        });
    }
    path_stack.push(current.clone());

    let definition = definitions.by_name(current)?;
    let mut points = Vec::new();

    for volume in &definition.volumes {
        if let Some(path) = &volume.path {
            points.push(normalize_mount_path(path));
        } else if let Some(source) = &volume.volumes_from {
            points.extend(collect(definitions, source, path_stack)?);
        } else if let Some(source) = &volume.volume_from {
            let Some(volume_path) = &volume.volume_path else {
                return Err(ValidationError::volume(
                    current.as_str(),
                    "'volume-from' requires 'volume-path'",
                ));
            };
            let wanted = normalize_mount_path(volume_path);

            let source_points = collect(definitions, source, path_stack)?;
            if !source_points.contains(&wanted) {
                return Err(ValidationError::not_found(
                    "mount point",
                    format!("{wanted} in '{source}'"),
                ));
            }
            points.push(wanted);
        }
    }

    path_stack.pop();
    Ok(points)
}

/// Folds trailing separators so `/data/` and `/data` collide.
fn normalize_mount_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::from("/")
    } else {
        trimmed.to_string()
    }
}
