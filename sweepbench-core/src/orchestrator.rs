// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end benchmark driver.
//!
//! Implements the run lifecycle: NotStarted → EnsuringStore → Sweeping → Reporting → Done.
//! Each sweep point is measured, extracted and persisted before the next one
//! starts; nothing runs concurrently.

use std::io::Write;

use crate::error::SweepResult;
use crate::extract::ObservationExtractor;
use crate::report;
use crate::runner::{run_until_success, MeasurementRunner, RetryPolicy};
use crate::store::{ResultStore, StoreConnection};
use crate::sweep::SweepPlan;
use crate::types::Observation;

/// Run lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    EnsuringStore,
    /// Measuring the sweep point at this index.
    Sweeping(usize),
    Reporting,
    Done,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::EnsuringStore => write!(f, "EnsuringStore"),
            Self::Sweeping(index) => write!(f, "Sweeping({})", index),
            Self::Reporting => write!(f, "Reporting"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Counters from a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sweep points measured.
    pub points: usize,
    /// Observations written to the store.
    pub observations: usize,
}

/// Drives a measurement runner across a sweep and reports the results.
pub struct BenchmarkOrchestrator<'a, R: MeasurementRunner> {
    store: &'a ResultStore,
    runner: R,
    extractor: ObservationExtractor,
    sweep: SweepPlan,
    retry: RetryPolicy,
    state: RunState,
}

impl<'a, R: MeasurementRunner> BenchmarkOrchestrator<'a, R> {
    pub fn new(
        store: &'a ResultStore,
        runner: R,
        extractor: ObservationExtractor,
        sweep: SweepPlan,
    ) -> Self {
        Self {
            store,
            runner,
            extractor,
            sweep,
            retry: RetryPolicy::unbounded(),
            state: RunState::NotStarted,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the full sweep, then write the aggregated report to `out`.
    ///
    /// On any error the run stops where it is: no report is written and the
    /// store connection is released before the error is returned. Rows that
    /// were already inserted stay in the store.
    pub fn run<W: Write>(&mut self, out: &mut W) -> SweepResult<RunSummary> {
        self.transition(RunState::EnsuringStore);
        if !self.store.exists() {
            self.store.ensure_schema()?;
        }

        let conn = self.store.open()?;
        let summary = self.sweep_and_report(&conn, out)?;
        let stored = conn.count()?;
        conn.close()?;

        self.transition(RunState::Done);
        tracing::info!(
            points = summary.points,
            observations = summary.observations,
            stored = stored,
            "Benchmark run complete"
        );
        Ok(summary)
    }

    fn sweep_and_report<W: Write>(
        &mut self,
        conn: &StoreConnection,
        out: &mut W,
    ) -> SweepResult<RunSummary> {
        let points = self.sweep.points();
        let total = points.len();
        let mut summary = RunSummary::default();

        for (index, point) in points.into_iter().enumerate() {
            self.transition(RunState::Sweeping(index));
            tracing::info!(
                size = %point.size,
                iteration = point.iteration,
                point = index + 1,
                total = total,
                "Running measurement"
            );

            let output = run_until_success(&mut self.runner, point.size, &self.retry)?;
            let pairs = self.extractor.extract(&output.stdout)?;

            for (label, elapsed_ns) in pairs {
                conn.insert(&Observation::new(point.size, label, elapsed_ns))?;
                summary.observations += 1;
            }
            summary.points += 1;
        }

        self.transition(RunState::Reporting);
        report::write_aggregate(conn, out)?;
        Ok(summary)
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "Run state transition");
        self.state = next;
    }
}
