//! CLI module for Concord
//!
//! ## Commands
//!
//! - `list` - List the built-in scenarios and the roles of their modules
//! - `run <scenario>` - Run a built-in scenario and print its result log
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `report` - Console and JSON rendering of runs
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
pub mod report;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::engine::EngineConfig;
use crate::version::CONCORD_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// A run recorded failures, or the command itself failed.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// A run aborted with a fatal error.
    pub const FATAL: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
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

    /// Create a fatal error (exit code 2).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FATAL)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Multi-party collaboration test runner
#[derive(Parser, Debug)]
#[command(name = "concord")]
#[command(version = CONCORD_VERSION)]
#[command(about = "Run collaboration scenarios across cooperating modules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Debug logging and passing assertions in the result log
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in scenarios
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run a built-in scenario
    Run {
        /// Scenario name (case-insensitive)
        #[arg(value_name = "SCENARIO")]
        scenario: String,
        /// Exclude a module from discovery (repeatable)
        #[arg(long = "disable", value_name = "MODULE")]
        disable: Vec<String>,
        /// Root directory for isolated file namespaces
        #[arg(long, value_name = "PATH")]
        files_root: Option<PathBuf>,
        /// Base name of the isolated namespace
        #[arg(long, value_name = "NAME")]
        namespace_base: Option<String>,
        /// Keep isolated file namespaces on disk after the run
        #[arg(long)]
        keep_artifacts: bool,
        /// Print the result log as JSON lines
        #[arg(long)]
        json: bool,
    },
}

/// Options of the `run` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub scenario: String,
    pub disable: Vec<String>,
    pub files_root: Option<PathBuf>,
    pub namespace_base: Option<String>,
    pub keep_artifacts: bool,
    pub json: bool,
    pub verbose: bool,
}

impl RunOptions {
    /// Engine configuration described by the flags; unset flags keep the defaults.
    pub fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::new().with_keep_artifacts(self.keep_artifacts);
        if let Some(root) = &self.files_root {
            config = config.with_files_root(root.clone());
        }
        if let Some(base) = &self.namespace_base {
            config = config.with_namespace_base(base.clone());
        }
        for module in &self.disable {
            config = config.disable_module(module.clone());
        }
        config
    }
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
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::List { json } => commands::list(json),
        Command::Run {
            scenario,
            disable,
            files_root,
            namespace_base,
            keep_artifacts,
            json,
        } => commands::run_scenario(&RunOptions {
            scenario,
            disable,
            files_root,
            namespace_base,
            keep_artifacts,
            json,
            verbose: cli.verbose,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
