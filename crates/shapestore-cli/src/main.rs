//! shapestore command-line tool
//!
//! Loads shape declarations from a JSON file and normalizes records,
//! prints derived schemas, or initializes records from them.

mod commands;
mod error;
mod formatter;

use clap::{Parser, Subcommand};
use formatter::OutputFormat;
use std::path::PathBuf;

/// shapestore command-line tool
#[derive(Parser, Debug)]
#[command(name = "shapestore")]
#[command(version, about = "Normalize JSON records against declared shapes")]
pub struct Args {
    /// Shape declaration file (JSON)
    #[arg(short, long, default_value = "shapes.json")]
    pub shapes: PathBuf,

    /// Output format
    #[arg(long, default_value = "pretty", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Normalize a record or an array of records into entity tables
    Normalize {
        /// Entity name of the root shape
        entity: String,

        /// Input file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Keep input keys the shapes do not declare
        #[arg(long)]
        keep_undeclared: bool,

        /// Maximum relation nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Print the schema derived from a shape
    Schema {
        /// Entity name of the root shape
        entity: String,

        /// Build the schema for an array of records
        #[arg(long)]
        many: bool,
    },

    /// Create a record from declared defaults and optional input
    Init {
        /// Entity name of the shape
        entity: String,

        /// Input file with field values
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// List declared shapes
    List,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shapestore=info".parse().expect("valid directive")),
        )
        .init();

    let args = Args::parse();

    match commands::run(&args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
