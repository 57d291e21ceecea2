use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use weftcore::{
    Edge, LogLevel, NodeInstance, Value, ValueMap, WorkflowGraph, DEFAULT_HANDLE,
};
use weftengine::{validate_graph, FlowEngine, MemoryExecutionStore, NodeRegistry};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Weft workflow engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Initial inputs as a JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            verbose,
        } => {
            let level = if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            };
            tracing_subscriber::fmt().with_max_level(level).init();

            run_workflow(file, input).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    weftnodes::register_builtins(&mut registry);
    registry
}

async fn run_workflow(file: PathBuf, input: Option<String>) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let graph_json = std::fs::read_to_string(&file)?;
    let graph: WorkflowGraph = serde_json::from_str(&graph_json)?;

    println!("📋 Nodes: {}", graph.nodes.len());
    println!("   Edges: {}", graph.edges.len());
    println!();

    let initial_inputs: ValueMap = match input {
        Some(text) => {
            let json: serde_json::Value = serde_json::from_str(&text)?;
            match Value::from(json) {
                Value::Object(map) => map,
                _ => return Err(anyhow::anyhow!("Input must be a JSON object")),
            }
        }
        None => ValueMap::new(),
    };

    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(Arc::new(builtin_registry()), store.clone());

    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, initial_inputs)
        .await?;
    println!("▶️  Execution accepted: {}", execution_id);

    // The trigger call never blocks on completion; poll the persisted
    // record until it reaches a terminal status.
    let record = loop {
        if let Some(record) = store.get(execution_id).await {
            if record.status.is_terminal() {
                break record;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };

    println!();
    println!("📊 Execution {}", record.status);
    for entry in &record.logs {
        let tag = match entry.level {
            LogLevel::Info => "ℹ️ ",
            LogLevel::Error => "❌",
        };
        match &entry.node_id {
            Some(node_id) => println!("  {} [{}] {}", tag, node_id, entry.message),
            None => println!("  {} {}", tag, entry.message),
        }
    }

    if let Some(result) = record.result {
        let json: serde_json::Value = result.into();
        println!();
        println!("📤 Result:");
        println!("{}", serde_json::to_string_pretty(&json)?);
    }

    Ok(())
}

fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let graph_json = std::fs::read_to_string(&file)?;
    let graph: WorkflowGraph = serde_json::from_str(&graph_json)?;
    validate_graph(&graph)?;

    println!("✅ Workflow is valid:");
    println!("   Nodes: {}", graph.nodes.len());
    println!("   Edges: {}", graph.edges.len());

    Ok(())
}

fn list_nodes() {
    println!("📦 Available Node Types:");
    println!();

    let registry = builtin_registry();
    let mut definitions = registry.all_definitions();
    definitions.sort_by(|a, b| a.id.cmp(&b.id));

    for definition in definitions {
        println!("  • {} ({:?})", definition.id, definition.category);
        println!("    {}", definition.description);
    }
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let mut fetch_inputs = ValueMap::new();
    fetch_inputs.insert("url".to_string(), Value::from("https://api.github.com/zen"));
    fetch_inputs.insert("method".to_string(), Value::from("GET"));

    let graph = WorkflowGraph {
        nodes: vec![
            NodeInstance {
                id: "trigger".to_string(),
                node_type: "webhook".to_string(),
                label: "Incoming Request".to_string(),
                inputs: ValueMap::new(),
            },
            NodeInstance {
                id: "fetch".to_string(),
                node_type: "http_request".to_string(),
                label: "Fetch Data".to_string(),
                inputs: fetch_inputs,
            },
        ],
        edges: vec![Edge {
            source: "trigger".to_string(),
            source_handle: DEFAULT_HANDLE.to_string(),
            target: "fetch".to_string(),
            target_handle: DEFAULT_HANDLE.to_string(),
        }],
    };

    let json = serde_json::to_string_pretty(&graph)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  weft run --file {} --input '{{\"body\": {{\"source\": \"manual\"}}}}'",
        output.display()
    );

    Ok(())
}
