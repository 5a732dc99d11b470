//! Appdef CLI entrypoint.
//!
//! This is the main entrypoint for the appdef command-line tool.

use std::process::ExitCode;

use appdef::cli::{Cli, Commands, ComponentView, OutputFormatter, PodSummary, ValidationReport};
use appdef::definition::{
    find_definition_file, AppDefinition, ComponentName, DefinitionHasher, DefinitionParser,
};
use appdef::error::{Result, ValidationError};
use appdef::planner::DeploymentOrderer;
use appdef::validate::{
    mount_points, pod_members, pod_roots, resolve_expose, resolve_link, LinkTarget,
    ValidationContext, Validator,
};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    let file = match &cli.file {
        Some(file) => file.clone(),
        None => find_definition_file(std::env::current_dir()?)?,
    };
    let definition = DefinitionParser::new().load_file(&file)?;
    debug!("Loaded definition from {}", file.display());

    let ctx = cli
        .org
        .map_or_else(ValidationContext::default, ValidationContext::for_org);

    match cli.command {
        Commands::Validate { effective } => cmd_validate(definition, &ctx, effective, &formatter),
        Commands::Order { names } => cmd_order(&definition, &ctx, &names, &formatter),
        Commands::Pods => cmd_pods(&definition, &formatter),
        Commands::Inspect { component } => cmd_inspect(&definition, &component, &formatter),
    }
}

/// Validate the definition and report the result.
fn cmd_validate(
    mut definition: AppDefinition,
    ctx: &ValidationContext,
    effective: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let validator = Validator::new(ctx.clone());
    let hasher = DefinitionHasher::new();

    let outcome = if effective {
        validator.validate_and_default(&mut definition.components)
    } else {
        validator.validate(&definition.components)
    };

    let report = ValidationReport {
        app: definition.name.clone(),
        components: definition.components.len(),
        hash: hasher.hash_definition(&definition.components),
        valid: outcome.is_ok(),
        error: outcome.as_ref().err().map(ToString::to_string),
    };
    println!("{}", formatter.format_validation(&report));

    outcome?;
    info!("Definition validated");

    if effective {
        let rendered = serde_json::to_string_pretty(&definition)
            .map_err(|e| appdef::AppdefError::internal(format!("render failed: {e}")))?;
        println!("{rendered}");
    }

    Ok(())
}

/// Validate, then print the deployment order for the requested names.
fn cmd_order(
    definition: &AppDefinition,
    ctx: &ValidationContext,
    names: &[String],
    formatter: &OutputFormatter,
) -> Result<()> {
    Validator::new(ctx.clone()).validate(&definition.components)?;

    let requested: Vec<ComponentName> = if names.is_empty() {
        definition.components.names().cloned().collect()
    } else {
        names
            .iter()
            .map(|raw| parse_name(raw))
            .collect::<Result<_>>()?
    };

    let orderer = DeploymentOrderer::new(&definition.components);
    let order = orderer.group_and_order(&requested)?;
    println!("{}", formatter.format_order(&order));
    Ok(())
}

/// List pods and their members.
fn cmd_pods(definition: &AppDefinition, formatter: &OutputFormatter) -> Result<()> {
    let mut pods = Vec::new();

    for root in pod_roots(&definition.components) {
        let members = pod_members(&definition.components, &root)?;
        let mode = definition
            .components
            .get(&root)
            .and_then(|def| def.pod)
            .map(|mode| mode.to_string())
            .unwrap_or_default();

        pods.push(PodSummary {
            name: root.to_string(),
            mode,
            members: members.iter().map(ToString::to_string).collect(),
        });
    }

    println!("{}", formatter.format_pods(&pods));
    Ok(())
}

/// Show the resolved view of one component.
fn cmd_inspect(
    definition: &AppDefinition,
    component: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    let name = parse_name(component)?;
    let def = definition.components.by_name(&name)?;

    let mut links = Vec::new();
    for link in &def.links {
        let rendered = match resolve_link(&definition.components, &name, link)? {
            LinkTarget::Component { name: target, port } => format!("{target} ({port})"),
            LinkTarget::Service { name: service, port } => format!("service {service} ({port})"),
        };
        links.push(rendered);
    }

    let mut expose = Vec::new();
    for entry in &def.expose {
        let resolved = resolve_expose(&definition.components, &name, entry)?;
        expose.push(format!(
            "{} -> {} ({})",
            entry.port, resolved.implementer, resolved.port
        ));
    }

    let view = ComponentView {
        name: name.to_string(),
        image: def.image.as_ref().map(ToString::to_string),
        ports: def.ports.iter().map(ToString::to_string).collect(),
        mount_points: mount_points(&definition.components, &name)?,
        links,
        expose,
    };

    println!("{}", formatter.format_component(&view));
    Ok(())
}

/// Parses a raw CLI argument into a component name.
fn parse_name(raw: &str) -> Result<ComponentName> {
    ComponentName::new(raw)
        .map_err(|e| appdef::AppdefError::Validation(ValidationError::from(e)))
}
