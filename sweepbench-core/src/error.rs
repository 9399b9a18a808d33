// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for sweepbench.
//!
//! Every failure is an explicit enum variant. No `Box<dyn Error>`, no
//! `anyhow::Result` inside the library. A nonzero exit from the measurement
//! program is not an error at all; it is handled by the retry policy.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Size;

/// Top-level error type for a sweepbench invocation.
#[derive(Debug, Error)]
pub enum SweepError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Pipeline Errors
    // =========================================================================
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid configuration values. Raised before any store or process is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Duplicate label name: {name}")]
    DuplicateLabel { name: String },
}

/// Result store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file or its table could not be created.
    #[error("Failed to initialise store at {path}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Store not found at {path}")]
    NotFound { path: PathBuf },

    #[error("Store operation '{operation}' failed: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Stored row is invalid: {reason}")]
    CorruptRow { reason: String },
}

/// Failures while invoking the external measurement program.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to launch {executable}: {source}")]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to collect output of {executable}: {source}")]
    Io {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Gave up on size {size} after {attempts} failed attempts (last exit code: {last_exit_code:?})")]
    RetriesExhausted {
        size: Size,
        attempts: u32,
        last_exit_code: Option<i32>,
    },
}

/// Failures while turning captured program output into observations.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed value '{raw}' after marker '{marker}'")]
    Malformed { marker: String, raw: String },

    #[error("Mandatory marker '{marker}' for label '{label}' missing from output")]
    MissingField { marker: String, label: String },

    #[error("Invalid extraction pattern for marker '{marker}': {source}")]
    InvalidPattern {
        marker: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type alias using SweepError.
pub type SweepResult<T> = Result<T, SweepError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
