//! modfmt - learning-module reformatting tool
//!
//! A CLI tool that converts plain-text learning modules into styled HTML
//! and normalizes generated HTML into the semantic classes understood by
//! the learning platform's stylesheet.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(missing_docs))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod cli;
mod config;

// Rule engine shared by the three stages
mod document;

// Stages
mod box_normalizer;
mod class_normalizer;
mod converter;

mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::ToolConfig;
use itertools::Itertools;
use pipeline::{Stage, ALL_STAGES};
use std::path::Path;

/// Main entry point for the modfmt CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = ToolConfig::resolve(cli.config.as_deref())
        .with_context(|| "Failed to load configuration")?;

    match cli.command {
        Commands::Convert { input, output } => {
            let output = output.unwrap_or_else(|| config.convert.output.clone());
            handle_convert_command(input.as_deref(), &output)?;
        }

        Commands::Clean { input, title } => {
            handle_filter_command(input.as_deref(), &[Stage::Boxes], title.as_deref())?;
        }

        Commands::Uniformize { input, title } => {
            handle_filter_command(input.as_deref(), &[Stage::Classes], title.as_deref())?;
        }

        Commands::Pipeline {
            input,
            stages,
            title,
        } => {
            let stages = stages.unwrap_or_else(|| config.pipeline.stages.clone());
            handle_filter_command(input.as_deref(), &stages, title.as_deref())?;
        }

        Commands::ListRules { stage } => {
            handle_list_rules_command(stage);
        }
    }

    Ok(())
}

/// Initialize logging from RUST_LOG, raised to info when verbose
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

/// Handle the convert command
///
/// Progress goes to stdout, so it is suppressed when the HTML itself does.
fn handle_convert_command(input: Option<&Path>, output: &Path) -> Result<()> {
    let show_progress = !pipeline::is_stdout(output);
    let source = describe_input(input);

    if show_progress {
        println!("Reading {}", source);
    }
    let text =
        pipeline::read_input(input).with_context(|| format!("Failed to read {}", source))?;

    if show_progress {
        println!("Converting to HTML...");
    }
    let html = converter::convert(&text).with_context(|| "Failed to convert text to HTML")?;

    if show_progress {
        println!("Writing {}", output.display());
    }
    pipeline::write_output(output, &html)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if show_progress {
        println!("✓ Conversion complete!");
    }

    Ok(())
}

/// Handle the clean, uniformize and pipeline commands: result to stdout
fn handle_filter_command(
    input: Option<&Path>,
    stages: &[Stage],
    title: Option<&str>,
) -> Result<()> {
    let source = describe_input(input);
    let text =
        pipeline::read_input(input).with_context(|| format!("Failed to read {}", source))?;

    log::info!(
        "Processing {} ({} bytes) through: {}",
        source,
        text.len(),
        stages.iter().join(" -> ")
    );

    let html = pipeline::run_stages(&text, stages)
        .with_context(|| format!("Failed to run stages {}", stages.iter().join(",")))?;

    let rendered =
        pipeline::render(html, title).with_context(|| "Failed to build module record")?;

    pipeline::write_stdout(&rendered).with_context(|| "Failed to write result")?;

    Ok(())
}

/// Handle the list-rules command
fn handle_list_rules_command(stage: Option<Stage>) {
    let stages = match stage {
        Some(stage) => vec![stage],
        None => ALL_STAGES.to_vec(),
    };

    for stage in stages {
        println!("{}:", stage);
        for (index, rule) in stage.rules().iter().enumerate() {
            println!("  {:>2}. {:<24} {}", index + 1, rule.name, rule.description);
        }
        println!();
    }

    println!("Usage: modfmt pipeline --stages convert,boxes,classes [INPUT]");
}

/// Human-readable name of the input source
fn describe_input(input: Option<&Path>) -> String {
    input.map_or_else(
        || "standard input".to_string(),
        |path| path.display().to_string(),
    )
}
