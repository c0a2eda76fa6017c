//! Ledger failures surface as `StoreUnavailable` and never corrupt state.

use std::error::Error as _;

use escrow_core::{EscrowError, invoke};
use escrow_ledger::{Ledger, LedgerError};

use crate::common::{FaultyLedger, T1_REGISTER, register_args};

fn registered() -> FaultyLedger {
    let mut ledger = FaultyLedger::new();
    invoke(&mut ledger, "add_cont", &T1_REGISTER).unwrap();
    ledger
}

#[test]
fn failed_existence_probe_is_store_unavailable() {
    let mut ledger = FaultyLedger::new();
    ledger.fail_get(true);

    let err = invoke(&mut ledger, "add_cont", &T1_REGISTER).unwrap_err();
    assert!(matches!(err, EscrowError::StoreUnavailable { ref target, .. } if target == "T1"));
    assert!(matches!(
        err.source().and_then(|s| s.downcast_ref::<LedgerError>()),
        Some(LedgerError::Unavailable { .. })
    ));
    assert!(ledger.inner.is_empty());
}

#[test]
fn failed_write_leaves_previous_value() {
    let mut ledger = registered();
    let before = ledger.get_state("T1").unwrap();

    ledger.fail_put(true);
    let err = invoke(&mut ledger, "add_client", &["T1", "ClientX", "6", "4"]).unwrap_err();
    assert_eq!(err.kind(), "store_unavailable");

    ledger.fail_put(false);
    assert_eq!(ledger.get_state("T1").unwrap(), before);
    assert_eq!(ledger.history_for_key("T1").unwrap().count(), 1);
}

#[test]
fn failed_read_on_query_is_store_unavailable() {
    let mut ledger = registered();
    ledger.fail_get(true);
    let err = invoke(&mut ledger, "get_tech", &["T1"]).unwrap_err();
    assert!(matches!(err, EscrowError::StoreUnavailable { .. }));
}

#[test]
fn scan_error_mid_iteration_releases_scan() {
    let mut ledger = FaultyLedger::new();
    for name in ["A", "B", "C"] {
        invoke(&mut ledger, "add_cont", &register_args(name)).unwrap();
    }

    ledger.fail_scan_at(Some(1));
    let err = invoke(&mut ledger, "get_all_tech", &[] as &[&str]).unwrap_err();
    assert!(matches!(err, EscrowError::StoreUnavailable { .. }));
    assert_eq!(ledger.inner.open_iterators(), 0);

    ledger.fail_scan_at(None);
    assert!(invoke(&mut ledger, "get_all_tech", &[] as &[&str]).is_ok());
    assert_eq!(ledger.inner.open_iterators(), 0);
}

#[test]
fn validation_failure_never_touches_ledger() {
    let mut ledger = FaultyLedger::new();
    ledger.fail_get(true);
    ledger.fail_put(true);

    let err = invoke(&mut ledger, "change_term", &["T1", "twelve", "3"]).unwrap_err();
    assert!(matches!(err, EscrowError::NotNumeric { position: 2, .. }));
}
