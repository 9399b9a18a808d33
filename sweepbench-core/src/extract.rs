// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Extraction of labeled timings from measurement program output.
//!
//! Each configured label has a literal marker (e.g. `HOST->DEVICE:`) that the
//! program prints before a decimal value. The marker is matched as
//! `<marker>\s*(\d+)` anywhere in the captured text.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::types::Label;

/// Whether a label may appear any number of times or exactly once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Zero or more occurrences per label; each one becomes an observation.
    Multi,
    /// Every label must be present; one observation per label.
    Single,
}

/// Marker text and the label its values are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub marker: String,
    pub label: Label,
}

impl LabelSpec {
    pub fn new(marker: impl Into<String>, label: Label) -> Self {
        Self {
            marker: marker.into(),
            label,
        }
    }
}

#[derive(Debug)]
struct CompiledLabel {
    spec: LabelSpec,
    pattern: Regex,
}

/// Turns captured stdout into `(label, value)` pairs.
#[derive(Debug)]
pub struct ObservationExtractor {
    labels: Vec<CompiledLabel>,
    mode: ExtractionMode,
}

impl ObservationExtractor {
    /// Compile one pattern per label.
    pub fn new(specs: Vec<LabelSpec>, mode: ExtractionMode) -> Result<Self, ExtractError> {
        let labels = specs
            .into_iter()
            .map(|spec| {
                let pattern = Regex::new(&format!(r"{}\s*(\d+)", regex::escape(&spec.marker)))
                    .map_err(|source| ExtractError::InvalidPattern {
                        marker: spec.marker.clone(),
                        source,
                    })?;
                Ok(CompiledLabel { spec, pattern })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        Ok(Self { labels, mode })
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn labels(&self) -> impl Iterator<Item = &LabelSpec> {
        self.labels.iter().map(|l| &l.spec)
    }

    /// Extract every configured label from `text`.
    ///
    /// Pairs are ordered by configured label, then by position in the text.
    /// Extraction is all-or-nothing: any malformed value or, in single mode,
    /// any missing label fails the whole text.
    pub fn extract(&self, text: &str) -> Result<Vec<(Label, u64)>, ExtractError> {
        let mut pairs = Vec::new();

        for compiled in &self.labels {
            let mut captures = compiled.pattern.captures_iter(text);

            match self.mode {
                ExtractionMode::Multi => {
                    for caps in captures {
                        let value = decode(&compiled.spec.marker, &caps[1])?;
                        pairs.push((compiled.spec.label.clone(), value));
                    }
                }
                ExtractionMode::Single => {
                    let caps = captures.next().ok_or_else(|| ExtractError::MissingField {
                        marker: compiled.spec.marker.clone(),
                        label: compiled.spec.label.to_string(),
                    })?;
                    let value = decode(&compiled.spec.marker, &caps[1])?;

                    let extra = captures.count();
                    if extra > 0 {
                        tracing::warn!(
                            label = %compiled.spec.label,
                            extra = extra,
                            "Marker repeated in single-occurrence output, keeping the first"
                        );
                    }
                    pairs.push((compiled.spec.label.clone(), value));
                }
            }
        }

        Ok(pairs)
    }
}

/// Largest value an SQLite INTEGER column can hold.
const MAX_STORABLE: u64 = i64::MAX as u64;

fn decode(marker: &str, raw: &str) -> Result<u64, ExtractError> {
    raw.parse::<u64>()
        .ok()
        .filter(|value| *value <= MAX_STORABLE)
        .ok_or_else(|| ExtractError::Malformed {
            marker: marker.to_string(),
            raw: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(marker: &str, label: &str) -> LabelSpec {
        LabelSpec::new(marker, Label::new(label).unwrap())
    }

    fn kernel_extractor() -> ObservationExtractor {
        ObservationExtractor::new(
            vec![
                spec("GPU-KERNEL =", "GPU-KERNEL"),
                spec("PARALLEL =", "PARALLEL"),
                spec("SEQ =", "SEQ"),
            ],
            ExtractionMode::Single,
        )
        .unwrap()
    }

    fn values(pairs: &[(Label, u64)]) -> Vec<(&str, u64)> {
        pairs.iter().map(|(l, v)| (l.as_str(), *v)).collect()
    }

    #[test]
    fn test_multi_mode_collects_all_occurrences() {
        let extractor =
            ObservationExtractor::new(vec![spec("SHARED:", "Shared->Shared")], ExtractionMode::Multi)
                .unwrap();

        let pairs = extractor.extract("SHARED: 10 ns\n...\nSHARED: 20 ns\n").unwrap();
        assert_eq!(
            values(&pairs),
            vec![("Shared->Shared", 10), ("Shared->Shared", 20)]
        );
    }

    #[test]
    fn test_multi_mode_absent_label_is_empty() {
        let extractor = ObservationExtractor::new(
            vec![
                spec("HOST->DEVICE:", "Host->Device"),
                spec("DEVICE->HOST:", "Device->Host"),
            ],
            ExtractionMode::Multi,
        )
        .unwrap();

        let pairs = extractor.extract("HOST->DEVICE: 42 ns\n").unwrap();
        assert_eq!(values(&pairs), vec![("Host->Device", 42)]);
    }

    #[test]
    fn test_markers_are_literal() {
        // "->" and "." must not be treated as regex syntax
        let extractor =
            ObservationExtractor::new(vec![spec("a.b->", "dotted")], ExtractionMode::Multi)
                .unwrap();

        assert!(extractor.extract("axb-> 5").unwrap().is_empty());
        assert_eq!(values(&extractor.extract("a.b->5").unwrap()), vec![("dotted", 5)]);
    }

    #[test]
    fn test_single_mode_in_label_order() {
        let text = "Matrix Size: 32 x 32\nSEQ = 5 [ns]\nPARALLEL = 7 [ns]\nGPU-KERNEL = 9 [ns]\n";
        let pairs = kernel_extractor().extract(text).unwrap();
        assert_eq!(
            values(&pairs),
            vec![("GPU-KERNEL", 9), ("PARALLEL", 7), ("SEQ", 5)]
        );
    }

    #[test]
    fn test_single_mode_missing_label() {
        let err = kernel_extractor()
            .extract("GPU-KERNEL = 9\nPARALLEL = 7\n")
            .unwrap_err();
        match err {
            ExtractError::MissingField { label, .. } => assert_eq!(label, "SEQ"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_mode_keeps_first_occurrence() {
        let pairs = kernel_extractor()
            .extract("GPU-KERNEL = 9\nGPU-KERNEL = 99\nPARALLEL = 7\nSEQ = 5\n")
            .unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].1, 9);
    }

    #[test]
    fn test_overflow_is_malformed() {
        let extractor =
            ObservationExtractor::new(vec![spec("SEQ =", "SEQ")], ExtractionMode::Multi).unwrap();

        let err = extractor
            .extract("SEQ = 5\nSEQ = 99999999999999999999999\n")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));
    }

    #[test]
    fn test_values_beyond_i64_are_malformed() {
        let extractor = kernel_extractor();

        let err = extractor
            .extract("GPU-KERNEL = 9\nPARALLEL = 7\nSEQ = 9223372036854775808\n")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));

        let pairs = extractor
            .extract("GPU-KERNEL = 9\nPARALLEL = 7\nSEQ = 9223372036854775807\n")
            .unwrap();
        assert_eq!(pairs[2].1, i64::MAX as u64);
    }

    #[test]
    fn test_non_ascii_digits_are_malformed() {
        let extractor =
            ObservationExtractor::new(vec![spec("SEQ =", "SEQ")], ExtractionMode::Single).unwrap();

        // Arabic-Indic digits match \d but are not a decimal u64
        let err = extractor.extract("SEQ = \u{0661}\u{0662}").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));
    }
}
