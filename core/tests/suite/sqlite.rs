//! The registry on the durable SQLite ledger.

use escrow_core::invoke;
use escrow_ledger::{Ledger, SqliteLedger};
use serde_json::json;

use crate::common::{T1_REGISTER, parse_json};

#[test]
fn records_and_history_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    {
        let mut ledger = SqliteLedger::open(&path).unwrap();
        invoke(&mut ledger, "add_cont", &T1_REGISTER).unwrap();
        invoke(&mut ledger, "add_client", &["T1", "ClientX", "6", "4"]).unwrap();
    }

    let mut ledger = SqliteLedger::open(&path).unwrap();
    let view = parse_json(&invoke(&mut ledger, "get_tech", &["T1"]).unwrap());
    assert_eq!(view["client"], json!({"ClientX": 6}));
    assert_eq!(view["status"], "4");

    let history = parse_json(&invoke(&mut ledger, "get_cert_verify", &["T1"]).unwrap());
    assert_eq!(history.as_array().unwrap().len(), 2);

    let err = invoke(&mut ledger, "add_cont", &T1_REGISTER).unwrap_err();
    assert_eq!(err.kind(), "already_exists");
}

#[test]
fn scan_value_matches_stored_bytes() {
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    invoke(&mut ledger, "add_cont", &T1_REGISTER).unwrap();

    let stored = String::from_utf8(ledger.get_state("T1").unwrap().unwrap()).unwrap();
    let raw = String::from_utf8(invoke(&mut ledger, "get_all_tech", &[] as &[&str]).unwrap()).unwrap();
    assert_eq!(raw, format!(r#"[{{"Key":"T1","Value":{stored}}}]"#));
}

#[test]
fn tombstone_renders_null_on_sqlite() {
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    invoke(&mut ledger, "add_cont", &T1_REGISTER).unwrap();
    ledger.delete_state("T1").unwrap();

    let history = parse_json(&invoke(&mut ledger, "get_cert_verify", &["T1"]).unwrap());
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[1]["Value"].is_null());
    assert_eq!(history[1]["IsDelete"], true);

    let err = invoke(&mut ledger, "get_tech", &["T1"]).unwrap_err();
    assert_eq!(err.to_string(), "Technology does not exist: T1");
}
