//! Sweepbench Core Library
//!
//! Drives an external measurement program across a sweep of input sizes,
//! extracts the timings it prints, stores every observation in SQLite and
//! reports per-size averages.

pub mod config;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod store;
pub mod sweep;
pub mod types;

// Re-export commonly used types
pub use config::{BenchmarkConfig, ConfigLoader};
pub use error::{
    ExtractError, RunnerError, StoreError, SweepError, SweepResult, ValidationError,
};
pub use extract::{ExtractionMode, LabelSpec, ObservationExtractor};
pub use orchestrator::{BenchmarkOrchestrator, RunState, RunSummary};
pub use runner::{run_until_success, Backoff, MeasurementRunner, ProcessRunner, RetryPolicy, RunOutput};
pub use store::{ResultStore, StoreConnection};
pub use sweep::{SweepPlan, SweepPoint};
pub use types::{AggregateRow, Label, Observation, Size, TableName};
