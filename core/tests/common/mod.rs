//! Shared fixtures for the registry integration tests.

#![allow(dead_code)]

use std::cell::Cell;

use escrow_ledger::{
    KeyModification, KeyValue, Ledger, LedgerError, MemoryLedger, ResultsIterator,
};

pub const T1_REGISTER: [&str; 9] = [
    "T1",
    "3",
    "Acme",
    "100",
    "12",
    "a.txt",
    "deadbeef",
    "2020-01-01",
    "1",
];

/// Registration arguments for a technology named `name` with one content file.
pub fn register_args(name: &str) -> Vec<String> {
    let mut args: Vec<String> = T1_REGISTER.iter().map(ToString::to_string).collect();
    args[0] = name.to_string();
    args
}

pub fn parse_json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).expect("payload is valid JSON")
}

fn injected(operation: &str) -> LedgerError {
    LedgerError::Unavailable {
        reason: format!("injected {operation} failure"),
    }
}

/// [`MemoryLedger`] wrapper with switchable failures at each primitive.
#[derive(Debug, Default)]
pub struct FaultyLedger {
    pub inner: MemoryLedger,
    fail_get: Cell<bool>,
    fail_put: Cell<bool>,
    /// Yield an error instead of the entry at this index during range scans.
    fail_scan_at: Cell<Option<usize>>,
}

impl FaultyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.set(fail);
    }

    pub fn fail_put(&self, fail: bool) {
        self.fail_put.set(fail);
    }

    pub fn fail_scan_at(&self, index: Option<usize>) {
        self.fail_scan_at.set(index);
    }
}

impl Ledger for FaultyLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if self.fail_get.get() {
            return Err(injected("get"));
        }
        self.inner.get_state(key)
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        if self.fail_put.get() {
            return Err(injected("put"));
        }
        self.inner.put_state(key, value)
    }

    fn delete_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.inner.delete_state(key)
    }

    fn state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<ResultsIterator<'_, KeyValue>, LedgerError> {
        let scan = self.inner.state_by_range(start, end)?;
        let Some(fail_at) = self.fail_scan_at.get() else {
            return Ok(scan);
        };
        let items = scan.enumerate().map(move |(index, item)| {
            if index == fail_at {
                Err(injected("scan"))
            } else {
                item
            }
        });
        Ok(ResultsIterator::new("faulty_range", items))
    }

    fn history_for_key(
        &self,
        key: &str,
    ) -> Result<ResultsIterator<'_, KeyModification>, LedgerError> {
        self.inner.history_for_key(key)
    }
}
