// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `sweepbench --run` - Sweep the measurement program and store the results.

use sweepbench_core::{BenchmarkConfig, BenchmarkOrchestrator, SweepResult};

pub fn execute(config: &BenchmarkConfig) -> SweepResult<()> {
    let store = config.result_store()?;

    tracing::info!(
        benchmark = %config.name,
        executable = %config.executable.display(),
        store = %store.path().display(),
        points = config.sweep.len(),
        "Starting benchmark sweep"
    );
    if config.retry.max_attempts.is_none() {
        tracing::debug!("Retry limit disabled; a program that always fails will stall the sweep");
    }

    let mut orchestrator = BenchmarkOrchestrator::new(
        &store,
        config.process_runner(),
        config.extractor()?,
        config.sweep.clone(),
    )
    .with_retry_policy(config.retry);

    let stdout = std::io::stdout();
    orchestrator.run(&mut stdout.lock())?;
    Ok(())
}
