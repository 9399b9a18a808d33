// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `sweepbench --query` - Print every stored observation.

use sweepbench_core::report;
use sweepbench_core::{BenchmarkConfig, SweepResult};

pub fn execute(config: &BenchmarkConfig) -> SweepResult<()> {
    let store = config.result_store()?;
    let conn = store.open()?;

    let stdout = std::io::stdout();
    report::write_observations(&conn, &mut stdout.lock())?;

    conn.close()?;
    Ok(())
}
