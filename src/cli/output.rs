//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying validation
//! results, deployment orders, and resolved component views in text or
//! JSON form.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::planner::DeploymentOrder;

use super::commands::OutputFormat;

/// Summary of a validation run.
#[derive(Debug, serde::Serialize)]
pub struct ValidationReport {
    /// Application name, when the definition carries one.
    pub app: Option<String>,
    /// Number of components in the definition.
    pub components: usize,
    /// Definition hash for change detection.
    pub hash: String,
    /// Whether validation passed.
    pub valid: bool,
    /// The first validation error, when validation failed.
    pub error: Option<String>,
}

/// One pod and its resolved members.
#[derive(Debug, serde::Serialize)]
pub struct PodSummary {
    /// Pod root component.
    pub name: String,
    /// Declared pod mode.
    pub mode: String,
    /// Resolved member names.
    pub members: Vec<String>,
}

/// Resolved view of a single component.
#[derive(Debug, serde::Serialize)]
pub struct ComponentView {
    /// Component name.
    pub name: String,
    /// Image reference, if any.
    pub image: Option<String>,
    /// Exported ports.
    pub ports: Vec<String>,
    /// Effective mount points after volume resolution.
    pub mount_points: Vec<String>,
    /// Resolved link targets.
    pub links: Vec<String>,
    /// Resolved expose chains.
    pub expose: Vec<String>,
}

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Pod row for table display.
#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Pod")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Members")]
    members: String,
}

/// Deployment group row for table display.
#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Components")]
    components: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a validation report.
    #[must_use]
    pub fn format_validation(&self, report: &ValidationReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_validation_text(report),
        }
    }

    fn format_validation_text(report: &ValidationReport) -> String {
        let mut output = String::new();

        if report.valid {
            let _ = writeln!(output, "{} Definition is valid.", "✓".green());
        } else {
            let _ = writeln!(output, "{} Definition is invalid.", "✗".red());
        }

        if let Some(app) = &report.app {
            let _ = writeln!(output, "   App: {app}");
        }
        let _ = writeln!(output, "   Components: {}", report.components);
        let _ = writeln!(output, "   Hash: {}", &report.hash[..8.min(report.hash.len())]);

        if let Some(error) = &report.error {
            let _ = writeln!(output, "\n{} {error}", "✗".red());
        }

        output
    }

    /// Formats a deployment order.
    #[must_use]
    pub fn format_order(&self, order: &DeploymentOrder) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&OrderJson::from(order)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_order_text(order),
        }
    }

    fn format_order_text(order: &DeploymentOrder) -> String {
        if order.groups.is_empty() {
            return format!("{} Nothing to deploy.\n", "✓".green());
        }

        let rows: Vec<GroupRow> = order
            .groups
            .iter()
            .enumerate()
            .map(|(i, group)| GroupRow {
                index: i + 1,
                components: group
                    .names
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect();

        let mut output = String::from("\nDeployment order (earlier groups deploy first):\n");
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = write!(
            output,
            "\n{} groups, {} components\n",
            order.group_count().to_string().green(),
            order.component_count()
        );

        output
    }

    /// Formats the pod listing.
    #[must_use]
    pub fn format_pods(&self, pods: &[PodSummary]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(pods).unwrap_or_default(),
            OutputFormat::Text => {
                if pods.is_empty() {
                    return format!("{} No pods declared.\n", "✓".green());
                }

                let rows: Vec<PodRow> = pods
                    .iter()
                    .map(|pod| PodRow {
                        name: pod.name.clone(),
                        mode: pod.mode.clone(),
                        members: pod.members.join(", "),
                    })
                    .collect();

                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }

    /// Formats a resolved component view.
    #[must_use]
    pub fn format_component(&self, view: &ComponentView) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(view).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "\nComponent: {}", view.name.bold());
                let _ = writeln!(
                    output,
                    "   Image: {}",
                    view.image.as_deref().unwrap_or("(none)")
                );

                Self::write_list(&mut output, "Ports", &view.ports);
                Self::write_list(&mut output, "Mount points", &view.mount_points);
                Self::write_list(&mut output, "Links", &view.links);
                Self::write_list(&mut output, "Expose", &view.expose);

                output
            }
        }
    }

    fn write_list(output: &mut String, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        let _ = writeln!(output, "   {title}:");
        for item in items {
            let _ = writeln!(output, "     - {item}");
        }
    }

    /// Formats an error message.
    #[must_use]
    pub fn format_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "error", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct OrderJson {
    group_count: usize,
    component_count: usize,
    groups: Vec<Vec<String>>,
}

impl From<&DeploymentOrder> for OrderJson {
    fn from(order: &DeploymentOrder) -> Self {
        Self {
            group_count: order.group_count(),
            component_count: order.component_count(),
            groups: order
                .groups
                .iter()
                .map(|g| g.names.iter().map(ToString::to_string).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ComponentName;
    use crate::planner::DeploymentGroup;
    use chrono::Utc;

    fn sample_order() -> DeploymentOrder {
        DeploymentOrder {
            created_at: Utc::now(),
            groups: vec![
                DeploymentGroup {
                    names: vec![ComponentName::new("db").unwrap()],
                },
                DeploymentGroup {
                    names: vec![ComponentName::new("api").unwrap()],
                },
            ],
        }
    }

    #[test]
    fn test_order_json_lists_groups_in_order() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let rendered = formatter.format_order(&sample_order());
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["groups"][0][0], "db");
        assert_eq!(value["groups"][1][0], "api");
        assert_eq!(value["group_count"], 2);
    }

    #[test]
    fn test_validation_text_mentions_error() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let rendered = formatter.format_validation(&ValidationReport {
            app: Some(String::from("shop")),
            components: 3,
            hash: String::from("abcdef1234"),
            valid: false,
            error: Some(String::from("component 'ghost' not found")),
        });
        assert!(rendered.contains("invalid"));
        assert!(rendered.contains("ghost"));
    }

    #[test]
    fn test_pods_text_lists_members() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let rendered = formatter.format_pods(&[PodSummary {
            name: String::from("workers"),
            mode: String::from("children"),
            members: vec![String::from("workers/mailer"), String::from("workers/indexer")],
        }]);
        assert!(rendered.contains("workers/mailer"));
    }
}
