//! Versioned key/value ledger used as the registry's single source of truth.
//!
//! This crate provides:
//! - The [`Ledger`] contract: point get/put, tombstoning delete, lexicographic
//!   range scans, and per-key change history
//! - [`ResultsIterator`], the scoped handle every scan is returned through
//! - [`MemoryLedger`] for tests and dry runs
//! - [`SqliteLedger`] for durable local storage
//!
//! # Architecture
//!
//! ```text
//! Ledger (trait)
//! ├── MemoryLedger: BTreeMap world state + per-key history vectors
//! └── SqliteLedger: world_state table + append-only key_history table
//!
//! state_by_range / history_for_key
//! └── ResultsIterator (released on drop or close)
//! ```
//!
//! Every successful write is its own ledger transaction with a fresh [`TxId`]
//! and a UTC commit timestamp.

mod iter;
mod ledger_file;
mod memory;
mod sqlite;

pub use iter::ResultsIterator;
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;

use std::fmt;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Identifier of the ledger transaction that produced a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxId(String);

impl TxId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live world-state entry yielded by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// One historical version of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: TxId,
    /// Value written by the transaction. Empty for tombstones.
    pub value: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger key must not be empty")]
    EmptyKey,
    #[error("ledger storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("ledger file error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt history entry for key {key}: {reason}")]
    CorruptHistory { key: String, reason: String },
    #[error("ledger unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Host ledger primitives consumed by the registry.
///
/// Implementations must make each `put_state`/`delete_state` atomic: a failed
/// write leaves the previously committed value in place.
pub trait Ledger {
    /// Read the current value of `key`. `Ok(None)` means the key is absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write the full value of `key`, recording a new history entry.
    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError>;

    /// Remove `key` from world state, recording a tombstone in its history.
    /// Deleting an absent key is a no-op.
    fn delete_state(&mut self, key: &str) -> Result<(), LedgerError>;

    /// Live entries with `start <= key < end` in ascending byte order.
    /// An empty bound is unbounded on that side.
    fn state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<ResultsIterator<'_, KeyValue>, LedgerError>;

    /// Every committed version of `key`, oldest first.
    fn history_for_key(
        &self,
        key: &str,
    ) -> Result<ResultsIterator<'_, KeyModification>, LedgerError>;

    fn state_exists(&self, key: &str) -> Result<bool, LedgerError> {
        Ok(self.get_state(key)?.is_some())
    }
}

impl<L: Ledger + ?Sized> Ledger for Box<L> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        (**self).get_state(key)
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        (**self).put_state(key, value)
    }

    fn delete_state(&mut self, key: &str) -> Result<(), LedgerError> {
        (**self).delete_state(key)
    }

    fn state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<ResultsIterator<'_, KeyValue>, LedgerError> {
        (**self).state_by_range(start, end)
    }

    fn history_for_key(
        &self,
        key: &str,
    ) -> Result<ResultsIterator<'_, KeyModification>, LedgerError> {
        (**self).history_for_key(key)
    }
}

fn ensure_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        Err(LedgerError::EmptyKey)
    } else {
        Ok(())
    }
}
