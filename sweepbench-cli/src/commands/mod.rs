// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

use sweepbench_core::{Backoff, BenchmarkConfig, ConfigLoader, SweepResult, ValidationError};

use crate::{Cli, Instance};

pub mod performance;
pub mod query;
pub mod run;

/// Build the benchmark instance from the preset or config file, then apply
/// command-line overrides.
pub fn resolve_config(cli: &Cli) -> SweepResult<BenchmarkConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_file(path)?,
        None => match cli.instance {
            Instance::Transfer => BenchmarkConfig::transfer(),
            Instance::Kernel => BenchmarkConfig::kernel(),
        },
    };

    if let Some(db) = &cli.db {
        config.store.path = Some(db.clone());
    }
    if let Some(executable) = &cli.executable {
        config.executable = executable.clone();
    }
    if let Some(max_attempts) = cli.max_attempts {
        if max_attempts == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "max_attempts",
                value: "0".to_string(),
                reason: "At least one attempt is required".to_string(),
            }
            .into());
        }
        config.retry.max_attempts = Some(max_attempts);
    }
    if let Some(delay_ms) = cli.backoff_ms {
        config.retry.backoff = Backoff::Fixed { delay_ms };
    }

    tracing::debug!(
        benchmark = %config.name,
        executable = %config.executable.display(),
        table = %config.store.table,
        "Resolved benchmark configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn test_transfer_requires_db() {
        let cli = Cli::parse_from(["sweepbench", "--instance", "transfer"]);
        let config = resolve_config(&cli).unwrap();
        assert!(config.store_path().is_err());

        let cli = Cli::parse_from(["sweepbench", "--instance", "transfer", "--db", "copy.db"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.store_path().unwrap(), Path::new("copy.db"));
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "sweepbench",
            "--executable",
            "/opt/bench/mxm",
            "--max-attempts",
            "4",
            "--backoff-ms",
            "250",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.executable, Path::new("/opt/bench/mxm"));
        assert_eq!(config.retry.max_attempts, Some(4));
        assert_eq!(config.retry.backoff, Backoff::Fixed { delay_ms: 250 });
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let cli = Cli::parse_from(["sweepbench", "--max-attempts", "0"]);
        assert!(resolve_config(&cli).is_err());
    }
}
