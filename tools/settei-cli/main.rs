use clap::{Parser, Subcommand};
use settei::prelude::*;
use std::fs;
use std::time::Instant;

/// Inspect node types and edit workflow node settings from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Extra node types to register, as a JSON array of node type configs
    #[arg(long, global = true)]
    schemas: Option<String>,

    /// Legacy type names to accept, written `alias=type`
    #[arg(long = "alias", global = true, value_parser = parse_assignment)]
    aliases: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the insertable node types, grouped by menu category
    Types,
    /// Print the schema and handles of a node type as JSON
    Schema {
        /// The node type id
        type_id: String,
    },
    /// Check every edge and node of a workflow
    Validate {
        /// Path to the workflow JSON file
        workflow_path: String,
    },
    /// Open a node's settings, apply edits and save the result
    Edit {
        /// Path to the workflow JSON file
        workflow_path: String,
        /// The id of the node to edit
        node_id: String,
        /// An edit, written `key=value`; values are parsed as JSON, falling back to text
        #[arg(long = "set", value_parser = parse_assignment)]
        edits: Vec<(String, String)>,
        /// Where to write the updated workflow (defaults to the input file)
        #[arg(short, long)]
        output: Option<String>,
        /// Render the form without saving
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let registry = build_cli_registry(&cli);

    match cli.command {
        Command::Types => list_types(&registry),
        Command::Schema { type_id } => print_schema(&registry, &type_id),
        Command::Validate { workflow_path } => validate(&registry, &workflow_path),
        Command::Edit {
            workflow_path,
            node_id,
            edits,
            output,
            dry_run,
        } => edit(&registry, &workflow_path, &node_id, &edits, output, dry_run),
    }
}

fn build_cli_registry(cli: &Cli) -> NodeTypeRegistry {
    let mut builder = RegistryBuilder::new().with_builtin_types();
    if let Some(path) = &cli.schemas {
        let json = fs::read_to_string(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to read schema file '{}': {}", path, e)));
        builder = builder
            .with_config_json(&json)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    }
    for (alias, target) in &cli.aliases {
        builder = builder.with_type_alias(alias, target);
    }
    builder
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to build node type registry: {}", e)))
}

fn list_types(registry: &NodeTypeRegistry) {
    for (category, entries) in registry.menu_by_category() {
        println!("{}", category.name());
        for (type_id, menu) in entries {
            println!("  {:<18} {:<20} {}", type_id, menu.name, menu.description);
        }
    }
}

fn print_schema(registry: &NodeTypeRegistry, type_id: &str) {
    let definition = registry
        .definition(type_id)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let json = serde_json::json!({
        "schema": definition.schema,
        "handles": definition.handles,
        "menu": definition.menu,
        "defaults": definition.default_data(),
        "forwardHandle": definition.forward_handle,
        "outputs": definition.outputs,
    });
    let pretty = serde_json::to_string_pretty(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize schema: {}", e)));
    println!("{}", pretty);
}

fn load_graph(path: &str) -> (WorkflowDocument, WorkflowGraph) {
    let document = WorkflowDocument::from_file(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workflow from '{}': {}", path, e)));
    let graph = document
        .clone()
        .into_workflow()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert workflow: {}", e)));
    (document, graph)
}

fn validate(registry: &NodeTypeRegistry, path: &str) {
    let start = Instant::now();
    let (_, graph) = load_graph(path);
    let report = registry.validate_graph(&graph);

    println!(
        "Checked {} nodes and {} edges in {:?}",
        graph.nodes.len(),
        graph.edges.len(),
        start.elapsed()
    );
    for node_id in &report.unknown_nodes {
        println!("  [unknown]        node '{}'", node_id);
    }
    for node_id in &report.misconfigured_nodes {
        println!("  [misconfigured]  node '{}'", node_id);
    }
    for (edge, error) in &report.invalid_edges {
        println!("  [invalid edge]   {} -> {}: {}", edge.source, edge.target, error);
    }

    if report.is_clean() {
        println!("Workflow is valid.");
    } else {
        std::process::exit(2);
    }
}

fn edit(
    registry: &NodeTypeRegistry,
    path: &str,
    node_id: &str,
    edits: &[(String, String)],
    output: Option<String>,
    dry_run: bool,
) {
    let (document, mut graph) = load_graph(path);
    let mut form = SettingsForm::open_node(registry, &graph, node_id)
        .unwrap_or_else(|| exit_with_error(&format!("Node '{}' is not part of the workflow", node_id)));

    for (key, raw) in edits {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.clone()));
        form.set_field(key, value)
            .unwrap_or_else(|e| exit_with_error(&format!("Cannot set '{}': {}", key, e)));
    }

    println!("{}\n", form.render(&graph));
    if dry_run {
        return;
    }

    form.submit(&mut graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to save node '{}': {}", node_id, e)));
    let target = output.unwrap_or_else(|| path.to_string());
    document
        .with_graph(graph)
        .save(&target)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write workflow to '{}': {}", target, e)));
    println!("Saved node '{}' to {}", node_id, target);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
