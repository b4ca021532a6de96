//! CLI module for the mapforge compiler
//!
//! ## Commands
//!
//! - `generate <paths..>` - Compile mapping declarations and write the generated Rust
//! - `check <paths..>` - Report problems without writing anything
//!
//! Paths may be `.map` files or directories, which are searched recursively.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use mapforge_core::lang::conventions::{GENERATED_MODULE, SOURCE_ROOT};
use thiserror::Error;

use crate::backend::EmitOptions;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Build-time mapping compiler
#[derive(Parser, Debug)]
#[command(name = "mapforge")]
#[command(version = VERSION)]
#[command(about = "Compile mapping declarations into staged Rust mappers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    // Debug/development flags
    /// Tokenize only (debug)
    #[arg(long = "lex", value_name = "FILE")]
    pub lex_file: Option<PathBuf>,

    /// Parse only (debug)
    #[arg(long = "parse", value_name = "FILE", conflicts_with = "lex_file")]
    pub parse_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile mapping declarations to Rust
    Generate {
        /// Source files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
        /// JSON file with compiled type metadata
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(long, short, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Module wrapping the generated namespaces; empty for none
        #[arg(long, value_name = "NAME", default_value = GENERATED_MODULE)]
        module: String,
        /// Rust path the compiled types' namespaces live under
        #[arg(long, value_name = "PATH", default_value = SOURCE_ROOT)]
        source_root: String,
    },

    /// Check mapping declarations without generating code
    Check {
        /// Source files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
        /// JSON file with compiled type metadata
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,
        /// Print the translation of every planned expression tree
        #[arg(long)]
        plans: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    if let Some(file) = cli.lex_file {
        return commands::lex_file(&file);
    }
    if let Some(file) = cli.parse_file {
        return commands::parse_file(&file);
    }

    match cli.command {
        Some(Command::Generate {
            paths,
            metadata,
            out,
            module,
            source_root,
        }) => {
            let options = EmitOptions { module, source_root };
            commands::generate(&paths, metadata.as_deref(), out.as_deref(), &options)
        }
        Some(Command::Check { paths, metadata, plans }) => commands::check(&paths, metadata.as_deref(), plans),
        // No command - clap prints nothing, so point at --help
        None => Err(CliError::failure("No command given. Run `mapforge --help` for usage.")),
    }
}

// ============================================================================
// Tests
// ============================================================================
