//! Stage selection, chaining and input/output
//!
//! The three filters share no state: each takes the whole text and returns
//! the whole text. A pipeline is just the stages run back to back, the output
//! of one being the input of the next.

use crate::box_normalizer;
use crate::class_normalizer;
use crate::converter;
use crate::document::{RewriteError, Rule};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output path meaning "standard output"
pub const STDOUT_PATH: &str = "-";

/// One of the three independent filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Plain text to styled HTML
    Convert,
    /// Heading cleanup and semantic box wrapping
    Boxes,
    /// Tailwind classes to semantic classes
    Classes,
}

/// Every stage, in the order they are meant to be chained
pub const ALL_STAGES: &[Stage] = &[Stage::Convert, Stage::Boxes, Stage::Classes];

impl Stage {
    /// The stage's rules in application order
    pub fn rules(self) -> &'static [Rule] {
        match self {
            Stage::Convert => converter::RULES,
            Stage::Boxes => box_normalizer::RULES,
            Stage::Classes => class_normalizer::RULES,
        }
    }

    /// Run this stage over `text`
    pub fn run(self, text: &str) -> Result<String, RewriteError> {
        match self {
            Stage::Convert => converter::convert(text),
            Stage::Boxes => box_normalizer::normalize(text),
            Stage::Classes => class_normalizer::normalize(text),
        }
    }

    /// Name used on the command line and in modfmt.toml
    pub fn name(self) -> &'static str {
        match self {
            Stage::Convert => "convert",
            Stage::Boxes => "boxes",
            Stage::Classes => "classes",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors that can occur while reading, transforming or writing a module
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read {path}: {source}", path = .path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read standard input: {0}")]
    ReadStdin(#[source] std::io::Error),

    #[error("Failed to write {path}: {source}", path = .path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write standard output: {0}")]
    WriteStdout(#[source] std::io::Error),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A module as accepted by the content database ingestion path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Module title
    pub title: String,
    /// Cleaned HTML body
    pub content: String,
}

/// Run `stages` in order, each over the previous stage's output
pub fn run_stages(text: &str, stages: &[Stage]) -> Result<String, RewriteError> {
    let mut current = text.to_string();
    for stage in stages {
        log::info!("Running stage {}", stage);
        current = stage.run(&current)?;
    }
    Ok(current)
}

/// Read the whole input: the file at `path`, or standard input when `None`
///
/// Line endings are normalized to `\n`, so every rule sees one line
/// terminator whatever platform produced the module.
///
/// # Returns
/// * `Ok(String)` - The UTF-8 contents
/// * `Err(PipelineError)` - Missing file, unreadable stream or invalid UTF-8
pub fn read_input(path: Option<&Path>) -> Result<String, PipelineError> {
    let content = match path {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|source| PipelineError::ReadInput {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(PipelineError::ReadStdin)?;
            content
        }
    };
    Ok(normalize_newlines(content))
}

/// Turn `\r\n` and lone `\r` line endings into `\n`
pub fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

/// Final text for a result: raw HTML, or a JSON module record when a title is given
pub fn render(content: String, title: Option<&str>) -> Result<String, PipelineError> {
    match title {
        Some(title) => {
            let record = ModuleRecord {
                title: title.to_string(),
                content,
            };
            Ok(serde_json::to_string_pretty(&record)?)
        }
        None => Ok(content),
    }
}

/// Write `content` to standard output without adding a trailing newline
pub fn write_stdout(content: &str) -> Result<(), PipelineError> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(content.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(PipelineError::WriteStdout)
}

/// Write `content` to `path`, or to standard output when `path` is `-`
pub fn write_output(path: &Path, content: &str) -> Result<(), PipelineError> {
    if is_stdout(path) {
        return write_stdout(content);
    }
    std::fs::write(path, content).map_err(|source| PipelineError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether `path` designates standard output
pub fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == STDOUT_PATH
}
