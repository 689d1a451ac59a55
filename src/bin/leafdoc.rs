//! leafdoc CLI tool
//!
//! Command-line interface for inspecting extracted documentation records with leafdoc.
//!
//! ## Commands
//!
//! - `get <file> <path>`: Resolve a dotted path (e.g. `arguments.x.type`) and print its value
//! - `fields <file>`: List the root's known keys, their shape, and whether the input supplies them

use clap::{Parser, Subcommand};
use leafdoc::{
    config::{ModelConfig, ModelConfigProvider, TomlConfigProvider},
    graph::DocumentGraph,
    leaf::FieldValue,
    model::LeafKind,
};
use std::{path::PathBuf, rc::Rc};

#[derive(Parser)]
#[command(name = "leafdoc")]
#[command(author, version, about = "A tool for inspecting extracted documentation records", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root kind (defaults to the configured root, or `function`)
    #[arg(short, long, global = true)]
    kind: Option<LeafKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a dotted path from the root and print the value
    Get {
        /// JSON or TOML record file
        file: PathBuf,

        /// Dotted path, e.g. `doc.description` or `arguments.x.type`
        path: String,
    },

    /// List the root's known keys
    Fields {
        /// JSON or TOML record file
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TomlConfigProvider::new(path.clone()).get_config()?,
        None => ModelConfig::default(),
    };
    let kind = cli.kind.unwrap_or(config.root);
    let registry = Rc::new(config.registry()?);

    match cli.command {
        Commands::Get { file, path } => {
            let graph = DocumentGraph::from_path(registry, kind, &file)?;
            match graph.lookup(&path)? {
                FieldValue::Map(map) => {
                    for (name, leaf) in map.iter() {
                        println!("{name}\t{leaf}");
                    }
                }
                value => println!("{value}"),
            }
            Ok(())
        }

        Commands::Fields { file } => {
            let graph = DocumentGraph::from_path(registry, kind, &file)?;
            let root = graph.root();
            for spec in root.schema().fields() {
                let supplied = if root.raw().contains(spec.name()) {
                    "present"
                } else {
                    "absent"
                };
                println!("{}\t{}\t{}", spec.name(), spec.shape(), supplied);
            }
            Ok(())
        }
    }
}
