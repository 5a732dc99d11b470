//! Definition document loading.
//!
//! This module loads application definition documents from JSON (the
//! primary wire format) or YAML files, with located parse errors.

use crate::error::{AppdefError, DefinitionError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::registry::AppDefinition;

/// Parser for application definition documents.
#[derive(Debug, Default)]
pub struct DefinitionParser;

impl DefinitionParser {
    /// Creates a new definition parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads a definition from a file, selecting the format by extension
    /// (`.yaml`/`.yml` parse as YAML, everything else as JSON).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<AppDefinition> {
        let path = path.as_ref();
        info!("Loading definition from: {}", path.display());

        if !path.exists() {
            return Err(AppdefError::Definition(DefinitionError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppdefError::Definition(DefinitionError::parse(
                format!("Failed to read file: {e}"),
                Some(path.display().to_string()),
            ))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            self.parse_yaml(&content, Some(path))
        } else {
            self.parse_json(&content, Some(path))
        }
    }

    /// Parses a definition from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn parse_json(&self, content: &str, source: Option<&Path>) -> Result<AppDefinition> {
        debug!("Parsing JSON definition");

        let definition: AppDefinition = serde_json::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            AppdefError::Definition(DefinitionError::parse(format!("JSON parse error: {e}"), location))
        })?;

        debug!(
            "Successfully parsed definition with {} components",
            definition.components.len()
        );
        Ok(definition)
    }

    /// Parses a definition from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<AppDefinition> {
        debug!("Parsing YAML definition");

        let definition: AppDefinition = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            AppdefError::Definition(DefinitionError::parse(format!("YAML parse error: {e}"), location))
        })?;

        debug!(
            "Successfully parsed definition with {} components",
            definition.components.len()
        );
        Ok(definition)
    }
}

/// Default definition file names to search for.
pub const DEFAULT_DEFINITION_FILES: &[&str] = &[
    "appdef.json",
    "appdef.yaml",
    "appdef.yml",
    "app.json",
    "app.yaml",
];

/// Finds the definition file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no definition file is found.
pub fn find_definition_file(start_dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_DEFINITION_FILES {
            let candidate = current.join(filename);
            if candidate.exists() {
                info!("Found definition file: {}", candidate.display());
                return Ok(candidate);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(AppdefError::Definition(DefinitionError::FileNotFound {
        path: start.join(DEFAULT_DEFINITION_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_definition() {
        let json = r#"{ "components": {} }"#;
        let parser = DefinitionParser::new();
        let definition = parser.parse_json(json, None).unwrap();
        assert!(definition.components.is_empty());
        assert_eq!(definition.name, None);
    }

    #[test]
    fn test_parse_full_definition() {
        let json = r#"{
            "name": "shop",
            "components": {
                "api": {
                    "image": "acme/api:1.0.0",
                    "ports": [8080],
                    "links": [
                        { "component": "api/db", "target-port": 5432 }
                    ]
                },
                "api/db": {
                    "image": "postgres:16",
                    "ports": [5432],
                    "volumes": [
                        { "path": "/var/lib/postgresql/data", "size": "20 GB" }
                    ]
                }
            }
        }"#;
        let parser = DefinitionParser::new();
        let definition = parser.parse_json(json, None).unwrap();
        assert_eq!(definition.name.as_deref(), Some("shop"));
        assert_eq!(definition.components.len(), 2);
    }

    #[test]
    fn test_parse_yaml_definition() {
        let yaml = r"
name: shop
components:
  api:
    image: acme/api:1.0.0
    ports:
      - 8080
";
        let parser = DefinitionParser::new();
        let definition = parser.parse_yaml(yaml, None).unwrap();
        assert_eq!(definition.components.len(), 1);
    }

    #[test]
    fn test_parse_error_carries_location() {
        let parser = DefinitionParser::new();
        let err = parser
            .parse_json("{", Some(Path::new("broken.json")))
            .unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_load_file_missing() {
        let parser = DefinitionParser::new();
        let err = parser.load_file("/nonexistent/appdef.json").unwrap_err();
        assert!(matches!(
            err,
            AppdefError::Definition(DefinitionError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_find_definition_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sub/dir");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("appdef.json"), r#"{ "components": {} }"#).unwrap();

        let found = find_definition_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("appdef.json"));
    }
}
