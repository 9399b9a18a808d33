// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! All types validate their invariants at creation time, so a value that
//! reaches the store is already known to be well formed.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Input size handed to the measurement program. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Size(NonZeroU64);

impl Size {
    /// Create a new Size with validation.
    pub fn new(size: u64) -> Result<Self, ValidationError> {
        NonZeroU64::new(size)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidFieldValue {
                field: "size",
                value: size.to_string(),
                reason: "Size must be greater than 0".to_string(),
            })
    }

    /// Get the inner value.
    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Size {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Size> for u64 {
    fn from(size: Size) -> Self {
        size.get()
    }
}

/// Name of the timing phase a value belongs to, e.g. `Host->Device`.
/// Must be non-empty. Membership in any fixed label set is not checked.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Create a new Label with validation.
    pub fn new(label: impl Into<String>) -> Result<Self, ValidationError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "label",
                value: label,
                reason: "Label cannot be empty".to_string(),
            });
        }
        Ok(Self(label))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Label {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

/// SQL identifier for the observation table.
///
/// Table names cannot be bound as parameters, so they are restricted to
/// ASCII letters, digits and underscores and may not start with a digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Create a new TableName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() || name.len() > 64 {
            return Err(ValidationError::InvalidFieldValue {
                field: "table",
                value: name,
                reason: "Table name must be 1-64 characters".to_string(),
            });
        }

        let starts_with_digit = name.chars().next().is_some_and(|c| c.is_ascii_digit());
        if starts_with_digit || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError::InvalidFieldValue {
                field: "table",
                value: name,
                reason: "Table name must be an identifier of letters, digits and underscores"
                    .to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TableName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

/// One persisted measurement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Observation {
    pub size: Size,
    pub label: Label,
    /// Elapsed time in nanoseconds as reported by the measurement program.
    pub elapsed_ns: u64,
}

impl Observation {
    pub fn new(size: Size, label: Label, elapsed_ns: u64) -> Self {
        Self {
            size,
            label,
            elapsed_ns,
        }
    }
}

/// Per-(size, label) summary computed from the stored observations.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub size: Size,
    pub label: Label,
    pub mean_ns: f64,
    pub count: u64,
}
