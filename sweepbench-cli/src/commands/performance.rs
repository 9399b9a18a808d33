// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `sweepbench --performance` - Print averaged timings per size and name.
//!
//! This is also what a bare `sweepbench` does.

use sweepbench_core::report;
use sweepbench_core::{BenchmarkConfig, SweepResult};

pub fn execute(config: &BenchmarkConfig) -> SweepResult<()> {
    let store = config.result_store()?;
    let conn = store.open()?;

    let stdout = std::io::stdout();
    report::write_aggregate(&conn, &mut stdout.lock())?;

    conn.close()?;
    Ok(())
}
