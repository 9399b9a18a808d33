// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark instance configuration.
//!
//! An instance names the measurement program, where its results go, which
//! sizes to sweep and which markers to pull out of its output. The two
//! built-in presets cover the transfer and kernel benchmarks; anything else
//! is described in YAML and validated here before a run starts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ExtractError, SweepError, SweepResult, ValidationError};
use crate::extract::{ExtractionMode, LabelSpec, ObservationExtractor};
use crate::runner::{Backoff, ProcessRunner, RetryPolicy};
use crate::store::ResultStore;
use crate::sweep::SweepPlan;
use crate::types::{Label, Size, TableName};

/// Store file used by the kernel preset.
pub const KERNEL_DB_FILE: &str = "performanceTableKernel.db";

/// Raw label mapping as parsed from YAML.
#[derive(Debug, Deserialize)]
struct RawLabel {
    marker: String,
    name: String,
}

/// Raw retry settings.
#[derive(Debug, Default, Deserialize)]
struct RawRetry {
    #[serde(default)]
    max_attempts: Option<u32>,
    #[serde(default)]
    backoff: Backoff,
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    name: String,
    executable: String,
    #[serde(default)]
    working_dir: Option<String>,
    db: Option<String>,
    table: String,
    sweep: SweepPlan,
    mode: ExtractionMode,
    labels: Vec<RawLabel>,
    #[serde(default)]
    retry: RawRetry,
}

/// Where observations are stored.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store path; `None` until supplied on the command line.
    pub path: Option<PathBuf>,
    pub table: TableName,
}

/// Markers to extract and how strictly.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub mode: ExtractionMode,
    pub labels: Vec<LabelSpec>,
}

/// Complete validated benchmark instance.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub name: String,
    pub executable: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub store: StoreConfig,
    pub sweep: SweepPlan,
    pub extraction: ExtractionConfig,
    pub retry: RetryPolicy,
}

impl BenchmarkConfig {
    /// Data-transfer timings: geometric sweep, every occurrence of every
    /// direction recorded. Has no default store path.
    pub fn transfer() -> Self {
        Self {
            name: "transfer".to_string(),
            executable: PathBuf::from("./timeDataTransfers"),
            working_dir: None,
            store: StoreConfig {
                path: None,
                table: preset_table("COPY_PERFORMANCE"),
            },
            sweep: SweepPlan::geometric_default(),
            extraction: ExtractionConfig {
                mode: ExtractionMode::Multi,
                labels: preset_labels(&[
                    ("SHARED:", "Shared->Shared"),
                    ("Heap->Device:", "Heap->Device"),
                    ("Device->Heap:", "Device->Heap"),
                    ("DEVICE->DEVICE:", "Device->Device"),
                    ("HOST->DEVICE:", "Host->Device"),
                    ("DEVICE->HOST:", "Device->Host"),
                ]),
            },
            retry: RetryPolicy::unbounded(),
        }
    }

    /// GPU kernel timings: fixed sizes, 10 iterations each, all three
    /// timers mandatory in every run.
    pub fn kernel() -> Self {
        Self {
            name: "kernel".to_string(),
            executable: PathBuf::from("./mxm"),
            working_dir: None,
            store: StoreConfig {
                path: Some(PathBuf::from(KERNEL_DB_FILE)),
                table: preset_table("KERNEL_PERFORMANCE"),
            },
            sweep: SweepPlan::Fixed {
                sizes: [32, 64, 128, 256, 512, 1024, 2048]
                    .into_iter()
                    .filter_map(|s| Size::new(s).ok())
                    .collect(),
                iterations: 10,
            },
            extraction: ExtractionConfig {
                mode: ExtractionMode::Single,
                labels: preset_labels(&[
                    ("GPU-KERNEL =", "GPU-KERNEL"),
                    ("PARALLEL =", "PARALLEL"),
                    ("SEQ =", "SEQ"),
                ]),
            },
            retry: RetryPolicy::unbounded(),
        }
    }

    /// Store path, or an error naming the missing `db` setting.
    pub fn store_path(&self) -> Result<&Path, ValidationError> {
        self.store
            .path
            .as_deref()
            .ok_or_else(|| ValidationError::MissingRequiredField {
                field: "db",
                context: format!("benchmark '{}'", self.name),
            })
    }

    pub fn result_store(&self) -> Result<ResultStore, ValidationError> {
        Ok(ResultStore::new(
            self.store_path()?,
            self.store.table.clone(),
        ))
    }

    pub fn extractor(&self) -> Result<ObservationExtractor, ExtractError> {
        ObservationExtractor::new(self.extraction.labels.clone(), self.extraction.mode)
    }

    pub fn process_runner(&self) -> ProcessRunner {
        let runner = ProcessRunner::new(&self.executable);
        match &self.working_dir {
            Some(dir) => runner.with_working_dir(dir),
            None => runner,
        }
    }
}

fn preset_table(name: &str) -> TableName {
    TableName::new(name).expect("preset table names are valid identifiers")
}

fn preset_labels(pairs: &[(&str, &str)]) -> Vec<LabelSpec> {
    pairs
        .iter()
        .map(|(marker, name)| {
            LabelSpec::new(
                *marker,
                Label::new(*name).expect("preset label names are non-empty"),
            )
        })
        .collect()
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a benchmark instance from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> SweepResult<BenchmarkConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SweepError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SweepError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate a benchmark instance from a YAML string.
    pub fn load_string(content: &str) -> SweepResult<BenchmarkConfig> {
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| SweepError::ConfigParse {
            message: format!("YAML parse error: {}", e),
        })?;

        Ok(Self::validate(raw)?)
    }

    fn validate(raw: RawConfig) -> Result<BenchmarkConfig, ValidationError> {
        if raw.name.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "name",
                value: raw.name,
                reason: "Benchmark name cannot be empty".to_string(),
            });
        }

        if raw.executable.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "executable",
                value: raw.executable,
                reason: "Executable path cannot be empty".to_string(),
            });
        }

        let table = TableName::new(raw.table)?;
        raw.sweep.validate()?;

        if raw.labels.is_empty() {
            return Err(ValidationError::MissingRequiredField {
                field: "labels",
                context: format!("benchmark '{}'", raw.name),
            });
        }

        let mut seen = HashSet::new();
        let mut labels = Vec::with_capacity(raw.labels.len());
        for (index, raw_label) in raw.labels.into_iter().enumerate() {
            if raw_label.marker.is_empty() {
                return Err(ValidationError::InvalidFieldValue {
                    field: "marker",
                    value: String::new(),
                    reason: format!("Marker of label at index {} cannot be empty", index),
                });
            }
            let label = Label::new(raw_label.name)?;
            if !seen.insert(label.clone()) {
                return Err(ValidationError::DuplicateLabel {
                    name: label.to_string(),
                });
            }
            labels.push(LabelSpec::new(raw_label.marker, label));
        }

        if raw.retry.max_attempts == Some(0) {
            return Err(ValidationError::InvalidFieldValue {
                field: "retry.max_attempts",
                value: "0".to_string(),
                reason: "At least one attempt is required; omit the field for no limit"
                    .to_string(),
            });
        }

        Ok(BenchmarkConfig {
            name: raw.name,
            executable: PathBuf::from(raw.executable),
            working_dir: raw.working_dir.map(PathBuf::from),
            store: StoreConfig {
                path: raw.db.map(PathBuf::from),
                table,
            },
            sweep: raw.sweep,
            extraction: ExtractionConfig {
                mode: raw.mode,
                labels,
            },
            retry: RetryPolicy {
                max_attempts: raw.retry.max_attempts,
                backoff: raw.retry.backoff,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
name: bandwidth
executable: ./bandwidth
db: bandwidth.db
table: BANDWIDTH
sweep:
  kind: geometric
  start: 1024
  count: 4
mode: multi
labels:
  - marker: "H2D:"
    name: Host->Device
  - marker: "D2H:"
    name: Device->Host
retry:
  max_attempts: 5
  backoff:
    kind: fixed
    delay_ms: 100
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.name, "bandwidth");
        assert_eq!(config.store.table.as_str(), "BANDWIDTH");
        assert_eq!(config.store_path().unwrap(), Path::new("bandwidth.db"));
        assert_eq!(config.sweep.len(), 4);
        assert_eq!(config.extraction.mode, ExtractionMode::Multi);
        assert_eq!(config.extraction.labels.len(), 2);
        assert_eq!(config.retry.max_attempts, Some(5));
        assert_eq!(config.retry.backoff, Backoff::Fixed { delay_ms: 100 });
    }

    #[test]
    fn test_retry_defaults_to_unbounded() {
        let yaml = r#"
name: k
executable: ./k
table: K
sweep: { kind: fixed, sizes: [8], iterations: 1 }
mode: single
labels:
  - { marker: "T =", name: T }
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(config.retry, RetryPolicy::unbounded());
        assert!(config.store_path().is_err());
    }

    #[test]
    fn test_duplicate_label_names() {
        let yaml = r#"
name: k
executable: ./k
table: K
sweep: { kind: fixed, sizes: [8], iterations: 1 }
mode: single
labels:
  - { marker: "A =", name: T }
  - { marker: "B =", name: T }
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            // zero size
            "sweep: { kind: fixed, sizes: [0], iterations: 1 }\ntable: K\nlabels: [{ marker: 'A', name: A }]",
            // empty marker
            "sweep: { kind: fixed, sizes: [8], iterations: 1 }\ntable: K\nlabels: [{ marker: '', name: A }]",
            // no labels
            "sweep: { kind: fixed, sizes: [8], iterations: 1 }\ntable: K\nlabels: []",
            // table name is not an identifier
            "sweep: { kind: fixed, sizes: [8], iterations: 1 }\ntable: 'K; DROP'\nlabels: [{ marker: 'A', name: A }]",
            // zero iterations
            "sweep: { kind: fixed, sizes: [8], iterations: 0 }\ntable: K\nlabels: [{ marker: 'A', name: A }]",
            // zero attempts
            "sweep: { kind: fixed, sizes: [8], iterations: 1 }\ntable: K\nlabels: [{ marker: 'A', name: A }]\nretry: { max_attempts: 0 }",
        ];

        for body in cases {
            let yaml = format!("name: k\nexecutable: ./k\nmode: multi\n{}", body);
            assert!(
                ConfigLoader::load_string(&yaml).is_err(),
                "accepted invalid config:\n{}",
                yaml
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load_file("/nonexistent/sweepbench.yaml").unwrap_err();
        assert!(matches!(err, SweepError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_presets() {
        let transfer = BenchmarkConfig::transfer();
        assert_eq!(transfer.extraction.labels.len(), 6);
        assert_eq!(transfer.extraction.mode, ExtractionMode::Multi);
        assert!(transfer.store_path().is_err());

        let kernel = BenchmarkConfig::kernel();
        assert_eq!(kernel.sweep.len(), 70);
        assert_eq!(kernel.extraction.mode, ExtractionMode::Single);
        assert_eq!(kernel.store_path().unwrap(), Path::new(KERNEL_DB_FILE));
    }
}
