// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Sweepbench CLI
//!
//! Runs a benchmark instance against its result store, or prints what the
//! store already holds.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

mod commands;

/// Built-in benchmark instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Instance {
    /// Host/device data transfer timings (requires --db)
    Transfer,
    /// GPU kernel vs parallel vs sequential timings
    Kernel,
}

/// Sweepbench - run measurement programs over input sizes and report timings
#[derive(Parser, Debug)]
#[command(name = "sweepbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Built-in benchmark instance
    #[arg(long, value_enum, default_value_t = Instance::Kernel)]
    pub instance: Instance,

    /// YAML file describing a custom instance (overrides --instance)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Result store file
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Measurement program to run instead of the instance default
    #[arg(long)]
    pub executable: Option<PathBuf>,

    /// Give up on a size after this many failed runs (default: retry forever)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Wait this long between failed runs
    #[arg(long)]
    pub backoff_ms: Option<u64>,

    /// Run the benchmark sweep, store the results and print the report
    #[arg(short, long)]
    pub run: bool,

    /// Print every stored observation
    #[arg(short, long)]
    pub query: bool,

    /// Print averaged timings per size and name (default)
    #[arg(short, long)]
    pub performance: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// What an invocation does with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Run,
    Query,
    Performance,
}

impl Cli {
    /// Query wins over run, and performance is the fallback.
    pub fn mode(&self) -> Mode {
        if self.query {
            Mode::Query
        } else if self.run {
            Mode::Run
        } else {
            Mode::Performance
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for reports
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let result = commands::resolve_config(&cli).and_then(|config| match cli.mode() {
        Mode::Run => commands::run::execute(&config),
        Mode::Query => commands::query::execute(&config),
        Mode::Performance => commands::performance::execute(&config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_performance() {
        let cli = Cli::parse_from(["sweepbench"]);
        assert_eq!(cli.mode(), Mode::Performance);
        assert_eq!(cli.instance, Instance::Kernel);
    }

    #[test]
    fn test_mode_priority() {
        let cli = Cli::parse_from(["sweepbench", "-r", "-q"]);
        assert_eq!(cli.mode(), Mode::Query);

        let cli = Cli::parse_from(["sweepbench", "--run", "--performance"]);
        assert_eq!(cli.mode(), Mode::Run);
    }

    #[test]
    fn test_transfer_flags() {
        let cli = Cli::parse_from([
            "sweepbench",
            "--instance",
            "transfer",
            "--db",
            "copy.db",
            "--max-attempts",
            "5",
        ]);
        assert_eq!(cli.instance, Instance::Transfer);
        assert_eq!(cli.db, Some(PathBuf::from("copy.db")));
        assert_eq!(cli.max_attempts, Some(5));
    }
}
