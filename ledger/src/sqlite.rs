//! SQLite-backed ledger.
//!
//! World state lives in `world_state` (one row per key). Every committed write
//! or delete also appends a row to `key_history`, which is never updated or
//! pruned. Both rows are written in one transaction, so a failed write leaves
//! the previous version untouched.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::ledger_file::open_ledger_db;
use crate::{KeyModification, KeyValue, Ledger, LedgerError, ResultsIterator, TxId, ensure_key};

pub struct SqliteLedger {
    db: Connection,
}

impl SqliteLedger {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS world_state (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL,
            tx_id TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS key_history (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL,
            tx_id TEXT NOT NULL,
            value BLOB,
            is_delete INTEGER NOT NULL,
            ts_seconds INTEGER NOT NULL,
            ts_nanos INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_key_history_key
        ON key_history(key, seq);
    ";

    /// Open or create the ledger database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let db = open_ledger_db(path)?;
        tracing::debug!(path = %path.display(), "Opened SQLite ledger");
        Self::initialize(db)
    }

    /// Open an in-memory ledger (for testing).
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let db = Connection::open_in_memory()?;
        Self::initialize(db)
    }

    fn initialize(db: Connection) -> Result<Self, LedgerError> {
        db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")?;
        db.execute_batch(Self::SCHEMA)?;
        Ok(Self { db })
    }

    fn commit_version(
        &mut self,
        key: &str,
        value: Option<&[u8]>,
    ) -> Result<TxId, LedgerError> {
        let tx_id = TxId::generate();
        let now = Utc::now();
        let tx = self.db.transaction()?;

        match value {
            Some(value) => {
                tx.execute(
                    "INSERT INTO world_state (key, value, tx_id) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, tx_id = excluded.tx_id",
                    params![key, value, tx_id.as_str()],
                )?;
            }
            None => {
                tx.execute("DELETE FROM world_state WHERE key = ?1", params![key])?;
            }
        }

        tx.execute(
            "INSERT INTO key_history (key, tx_id, value, is_delete, ts_seconds, ts_nanos)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                key,
                tx_id.as_str(),
                value,
                value.is_none(),
                now.timestamp(),
                i64::from(now.timestamp_subsec_nanos())
            ],
        )?;

        tx.commit()?;
        Ok(tx_id)
    }
}

impl Ledger for SqliteLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        ensure_key(key)?;
        let mut stmt = self
            .db
            .prepare_cached("SELECT value FROM world_state WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        ensure_key(key)?;
        let tx_id = self.commit_version(key, Some(value))?;
        tracing::trace!(key, %tx_id, bytes = value.len(), "Committed ledger write");
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> Result<(), LedgerError> {
        ensure_key(key)?;
        if self.get_state(key)?.is_none() {
            return Ok(());
        }
        let tx_id = self.commit_version(key, None)?;
        tracing::trace!(key, %tx_id, "Committed ledger tombstone");
        Ok(())
    }

    fn state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<ResultsIterator<'_, KeyValue>, LedgerError> {
        let mut stmt = self.db.prepare(
            "SELECT key, value FROM world_state
             WHERE key >= ?1 AND (?2 = '' OR key < ?2)
             ORDER BY key ASC",
        )?;
        let items: Vec<Result<KeyValue, LedgerError>> = stmt
            .query_map(params![start, end], |row| {
                Ok(KeyValue {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .map(|row| row.map_err(LedgerError::from))
            .collect();

        Ok(ResultsIterator::new("state_by_range", items.into_iter()))
    }

    fn history_for_key(
        &self,
        key: &str,
    ) -> Result<ResultsIterator<'_, KeyModification>, LedgerError> {
        ensure_key(key)?;
        let mut stmt = self.db.prepare(
            "SELECT tx_id, value, is_delete, ts_seconds, ts_nanos
             FROM key_history
             WHERE key = ?1
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![key], |row| {
            let tx_id: String = row.get(0)?;
            let value: Option<Vec<u8>> = row.get(1)?;
            let is_delete: bool = row.get(2)?;
            let seconds: i64 = row.get(3)?;
            let nanos: i64 = row.get(4)?;
            Ok((tx_id, value, is_delete, seconds, nanos))
        })?;

        let owned_key = key.to_string();
        let items: Vec<Result<KeyModification, LedgerError>> = rows
            .map(|row| {
                let (tx_id, value, is_delete, seconds, nanos) = row?;
                let timestamp = u32::try_from(nanos)
                    .ok()
                    .and_then(|nanos| DateTime::from_timestamp(seconds, nanos))
                    .ok_or_else(|| LedgerError::CorruptHistory {
                        key: owned_key.clone(),
                        reason: format!("invalid timestamp {seconds}.{nanos:09}"),
                    })?;
                Ok(KeyModification {
                    tx_id: TxId::from_raw(tx_id),
                    value: value.unwrap_or_default(),
                    timestamp,
                    is_delete,
                })
            })
            .collect();

        Ok(ResultsIterator::new("history_for_key", items.into_iter()))
    }
}
