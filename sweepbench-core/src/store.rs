// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! SQLite-backed append-only observation store.
//!
//! One table per store with columns `SIZE`, `NAME` and `TIME`. Rows are only
//! ever appended; every insert is its own implicit transaction, so a crash
//! after N inserts leaves exactly N rows behind. Aggregates are computed on
//! demand and never written back.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use crate::error::{StoreError, StoreResult};
use crate::types::{AggregateRow, Label, Observation, Size, TableName};

/// Location and table of a result store.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
    table: TableName,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>, table: TableName) -> Self {
        Self {
            path: path.into(),
            table,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Whether a store file already exists at the configured path.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the store file and its observation table.
    ///
    /// # Errors
    /// Returns `StoreError::Init` if the file cannot be created or the table
    /// already exists.
    pub fn ensure_schema(&self) -> StoreResult<()> {
        let init_err = |source| StoreError::Init {
            path: self.path.clone(),
            source,
        };

        let conn = Connection::open(&self.path).map_err(init_err)?;
        conn.execute_batch(&format!(
            "CREATE TABLE {} (
                SIZE INTEGER NOT NULL,
                NAME TEXT NOT NULL,
                TIME INTEGER NOT NULL
            );",
            self.table
        ))
        .map_err(init_err)?;
        conn.close().map_err(|(_, e)| init_err(e))?;

        tracing::info!(
            path = %self.path.display(),
            table = %self.table,
            "Created result store"
        );
        Ok(())
    }

    /// Open a connection to an existing store.
    ///
    /// Never creates the file; use [`ResultStore::ensure_schema`] for that.
    pub fn open(&self) -> StoreResult<StoreConnection> {
        if !self.exists() {
            return Err(StoreError::NotFound {
                path: self.path.clone(),
            });
        }

        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Io {
            operation: "open",
            source,
        })?;

        tracing::debug!(path = %self.path.display(), "Opened result store");

        Ok(StoreConnection {
            conn,
            table: self.table.clone(),
        })
    }
}

/// An open handle on a result store.
///
/// Dropping the handle releases the underlying connection; [`close`] does the
/// same but reports failures.
///
/// [`close`]: StoreConnection::close
#[derive(Debug)]
pub struct StoreConnection {
    conn: Connection,
    table: TableName,
}

impl StoreConnection {
    /// Append one observation.
    pub fn insert(&self, observation: &Observation) -> StoreResult<()> {
        self.conn
            .prepare_cached(&format!(
                "INSERT INTO {} (SIZE, NAME, TIME) VALUES (?1, ?2, ?3)",
                self.table
            ))
            .and_then(|mut stmt| {
                stmt.execute(params![
                    observation.size.get(),
                    observation.label.as_str(),
                    observation.elapsed_ns
                ])
            })
            .map_err(|source| StoreError::Io {
                operation: "insert",
                source,
            })?;
        Ok(())
    }

    /// Number of stored observations.
    pub fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                row.get(0)
            })
            .map_err(|source| StoreError::Io {
                operation: "count",
                source,
            })?;
        Ok(count as u64)
    }

    /// Stream one aggregate row per distinct (size, label) pair, ordered by
    /// label and then size.
    ///
    /// Rows are decoded one at a time as `f` consumes them; an error from `f`
    /// stops the scan.
    pub fn for_each_aggregate<F, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(AggregateRow) -> Result<(), E>,
        E: From<StoreError>,
    {
        let io_err = |source| StoreError::Io {
            operation: "query aggregate",
            source,
        };

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT SIZE, NAME, AVG(TIME), COUNT(*) FROM {}
                 GROUP BY SIZE, NAME
                 ORDER BY NAME ASC, SIZE ASC",
                self.table
            ))
            .map_err(io_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(io_err)?;

        for row in rows {
            let (size, name, mean_ns, count) = row.map_err(io_err)?;
            f(AggregateRow {
                size: decode_size(size)?,
                label: decode_label(name)?,
                mean_ns,
                count: count as u64,
            })?;
        }
        Ok(())
    }

    /// Stream every stored observation in storage order.
    pub fn for_each_observation<F, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(Observation) -> Result<(), E>,
        E: From<StoreError>,
    {
        let io_err = |source| StoreError::Io {
            operation: "query all",
            source,
        };

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT SIZE, NAME, TIME FROM {} ORDER BY rowid",
                self.table
            ))
            .map_err(io_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(io_err)?;

        for row in rows {
            let (size, name, time) = row.map_err(io_err)?;
            let elapsed_ns = u64::try_from(time).map_err(|_| StoreError::CorruptRow {
                reason: format!("negative time {}", time),
            })?;
            f(Observation::new(
                decode_size(size)?,
                decode_label(name)?,
                elapsed_ns,
            ))?;
        }
        Ok(())
    }

    /// Collect the aggregate report into memory.
    pub fn query_aggregate(&self) -> StoreResult<Vec<AggregateRow>> {
        let mut out = Vec::new();
        self.for_each_aggregate(|row| {
            out.push(row);
            Ok::<_, StoreError>(())
        })?;
        Ok(out)
    }

    /// Collect every stored observation into memory.
    pub fn query_all(&self) -> StoreResult<Vec<Observation>> {
        let mut out = Vec::new();
        self.for_each_observation(|observation| {
            out.push(observation);
            Ok::<_, StoreError>(())
        })?;
        Ok(out)
    }

    /// Release the connection.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, source)| StoreError::Io {
            operation: "close",
            source,
        })?;
        tracing::debug!("Closed result store");
        Ok(())
    }
}

fn decode_size(raw: i64) -> StoreResult<Size> {
    u64::try_from(raw)
        .ok()
        .and_then(|size| Size::new(size).ok())
        .ok_or_else(|| StoreError::CorruptRow {
            reason: format!("non-positive size {}", raw),
        })
}

fn decode_label(raw: String) -> StoreResult<Label> {
    Label::new(raw).map_err(|e| StoreError::CorruptRow {
        reason: e.to_string(),
    })
}
