// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Plain-text renderings of a result store.

use std::io::Write;

use crate::error::{SweepError, SweepResult};
use crate::store::StoreConnection;
use crate::types::{AggregateRow, Observation};

/// Header line of the aggregated report.
pub const AGGREGATE_HEADER: &str = "SIZE NAME TIMER COUNT";

/// Print `SIZE NAME TIMER COUNT` followed by one line per (size, label).
pub fn write_aggregate<W: Write>(conn: &StoreConnection, out: &mut W) -> SweepResult<()> {
    writeln!(out, "{}", AGGREGATE_HEADER).map_err(write_err)?;
    conn.for_each_aggregate(|row| write_aggregate_row(out, &row))?;
    out.flush().map_err(write_err)
}

/// Print every observation as a `SIZE`/`NAME`/`TIMER` block.
pub fn write_observations<W: Write>(conn: &StoreConnection, out: &mut W) -> SweepResult<()> {
    conn.for_each_observation(|observation| write_observation(out, &observation))?;
    out.flush().map_err(write_err)
}

fn write_aggregate_row<W: Write>(out: &mut W, row: &AggregateRow) -> SweepResult<()> {
    writeln!(out, "{} {} {} {}", row.size, row.label, row.mean_ns, row.count).map_err(write_err)
}

fn write_observation<W: Write>(out: &mut W, observation: &Observation) -> SweepResult<()> {
    writeln!(out, "SIZE = {}", observation.size).map_err(write_err)?;
    writeln!(out, "NAME = {}", observation.label).map_err(write_err)?;
    writeln!(out, "TIMER = {}", observation.elapsed_ns).map_err(write_err)?;
    writeln!(out).map_err(write_err)
}

fn write_err(source: std::io::Error) -> SweepError {
    SweepError::Io {
        context: "writing report",
        source,
    }
}
