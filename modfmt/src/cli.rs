//! Command-line interface definitions for modfmt

use crate::pipeline::Stage;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the modfmt application
#[derive(Parser)]
#[command(name = "modfmt")]
#[command(version)]
#[command(about = "Reformat learning-module text and HTML for the content database", long_about = None)]
pub struct Cli {
    /// Verbose output (info-level logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./modfmt.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for modfmt
#[derive(Subcommand)]
pub enum Commands {
    /// Convert a plain-text module to styled HTML
    Convert {
        /// Input text file (reads standard input when omitted)
        input: Option<PathBuf>,

        /// Output file, '-' for standard output (defaults to the configured path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove doubled headings and wrap objective/analogy/example/key-point boxes
    Clean {
        /// Input HTML file (reads standard input when omitted)
        input: Option<PathBuf>,

        /// Emit a {title, content} JSON record with this title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Replace inline Tailwind classes with the semantic class vocabulary
    Uniformize {
        /// Input HTML file (reads standard input when omitted)
        input: Option<PathBuf>,

        /// Emit a {title, content} JSON record with this title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Run several stages in order, each over the previous one's output
    Pipeline {
        /// Input file (reads standard input when omitted)
        input: Option<PathBuf>,

        /// Stages to run, comma separated (defaults to the configured list)
        #[arg(short, long, value_enum, value_delimiter = ',')]
        stages: Option<Vec<Stage>>,

        /// Emit a {title, content} JSON record with this title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List the rules of each stage in application order
    ListRules {
        /// Only list this stage
        #[arg(value_enum)]
        stage: Option<Stage>,
    },
}
