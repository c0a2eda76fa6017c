//! In-memory ledger for tests and dry runs.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;

use crate::{KeyModification, KeyValue, Ledger, LedgerError, ResultsIterator, TxId, ensure_key};

/// Ledger held entirely in process memory.
///
/// Scans snapshot the matching entries when they are opened; the number of
/// scans that have not yet been released is observable through
/// [`MemoryLedger::open_iterators`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: BTreeMap<String, Vec<u8>>,
    history: BTreeMap<String, Vec<KeyModification>>,
    open_iterators: Arc<AtomicUsize>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Scans handed out and not yet dropped or closed.
    #[must_use]
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.load(Ordering::SeqCst)
    }

    fn record(&mut self, key: &str, value: Vec<u8>, is_delete: bool) {
        self.history
            .entry(key.to_string())
            .or_default()
            .push(KeyModification {
                tx_id: TxId::generate(),
                value,
                timestamp: Utc::now(),
                is_delete,
            });
    }

    fn track<'a, T: 'a>(
        &self,
        label: &'static str,
        items: Vec<T>,
    ) -> ResultsIterator<'a, T> {
        let counter = Arc::clone(&self.open_iterators);
        counter.fetch_add(1, Ordering::SeqCst);
        ResultsIterator::new(label, items.into_iter().map(Ok)).on_release(move || {
            counter.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

impl Ledger for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        ensure_key(key)?;
        Ok(self.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        ensure_key(key)?;
        self.state.insert(key.to_string(), value.to_vec());
        self.record(key, value.to_vec(), false);
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> Result<(), LedgerError> {
        ensure_key(key)?;
        if self.state.remove(key).is_some() {
            self.record(key, Vec::new(), true);
        }
        Ok(())
    }

    fn state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<ResultsIterator<'_, KeyValue>, LedgerError> {
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };

        // BTreeMap::range panics on an inverted range.
        let inverted = !start.is_empty() && !end.is_empty() && start > end;
        let items = if inverted {
            Vec::new()
        } else {
            self.state
                .range::<str, _>((lower, upper))
                .map(|(key, value)| KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect()
        };

        Ok(self.track("state_by_range", items))
    }

    fn history_for_key(
        &self,
        key: &str,
    ) -> Result<ResultsIterator<'_, KeyModification>, LedgerError> {
        ensure_key(key)?;
        let items = self.history.get(key).cloned().unwrap_or_default();
        Ok(self.track("history_for_key", items))
    }
}
