//! Read-only operations.
//!
//! Scans iterate the ledger's [`escrow_ledger::ResultsIterator`] directly, so
//! the scan is released when the loop ends, including when `?` returns early.

use escrow_ledger::{KeyValue, Ledger, ResultsIterator};
use escrow_types::{TechnologyName, TechnologyRecord};

use crate::errors::EscrowError;
use crate::mutation::load_record;
use crate::render::{HistoryEntry, ScanEntry, TechnologyView, to_payload};

/// Fetch a single record.
pub fn get_tech<L: Ledger + ?Sized>(
    ledger: &L,
    technology: &TechnologyName,
) -> Result<TechnologyRecord, EscrowError> {
    load_record(ledger, technology)
}

/// Render a single record as the `get_tech` JSON view.
pub fn render_tech<L: Ledger + ?Sized>(
    ledger: &L,
    technology: &TechnologyName,
) -> Result<Vec<u8>, EscrowError> {
    let record = get_tech(ledger, technology)?;
    tracing::debug!(%technology, status = %record.status(), "Technology fetched");
    to_payload(&TechnologyView::new(&record), technology)
}

/// Every record on the ledger as `[{"Key", "Value"}]`, in ascending key order.
pub fn get_all_tech<L: Ledger + ?Sized>(ledger: &L) -> Result<Vec<u8>, EscrowError> {
    get_tech_range(ledger, "", "")
}

/// Records with `start <= key < end` as `[{"Key", "Value"}]`. An empty bound
/// is open on that side.
pub fn get_tech_range<L: Ledger + ?Sized>(
    ledger: &L,
    start: &str,
    end: &str,
) -> Result<Vec<u8>, EscrowError> {
    let target = scan_target(start, end);
    let scan = ledger
        .state_by_range(start, end)
        .map_err(|source| EscrowError::store(target.clone(), source))?;
    let entries = collect_scan(scan, &target)?;

    tracing::debug!(start, end, records = entries.len(), "Range scan complete");
    to_payload(&entries, &target)
}

fn collect_scan(
    scan: ResultsIterator<'_, KeyValue>,
    target: &str,
) -> Result<Vec<ScanEntry>, EscrowError> {
    let mut entries = Vec::new();
    for item in scan {
        let kv = item.map_err(|source| EscrowError::store(target, source))?;
        entries.push(ScanEntry::from_key_value(kv)?);
    }
    Ok(entries)
}

fn scan_target(start: &str, end: &str) -> String {
    format!("range [{start:?}, {end:?})")
}

/// Full change history of a record as `[{"TxId", "Value", "Timestamp", "IsDelete"}]`,
/// oldest first. A key that was never written yields `[]`.
pub fn get_cert_verify<L: Ledger + ?Sized>(
    ledger: &L,
    technology: &TechnologyName,
) -> Result<Vec<u8>, EscrowError> {
    let history = ledger
        .history_for_key(technology)
        .map_err(|source| EscrowError::store(technology.as_str(), source))?;

    let mut entries = Vec::new();
    for item in history {
        let modification = item.map_err(|source| EscrowError::store(technology.as_str(), source))?;
        entries.push(HistoryEntry::from_modification(technology, modification)?);
    }

    tracing::debug!(%technology, versions = entries.len(), "History fetched");
    to_payload(&entries, technology)
}
