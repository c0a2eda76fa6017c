//! End-to-end registry behaviour through `invoke` on the in-memory ledger.

use escrow_core::{EscrowError, invoke};
use escrow_ledger::{Ledger, MemoryLedger};
use serde_json::json;

use crate::common::{T1_REGISTER, parse_json, register_args};

fn registered_t1() -> MemoryLedger {
    let mut ledger = MemoryLedger::new();
    invoke(&mut ledger, "add_cont", &T1_REGISTER).unwrap();
    ledger
}

#[test]
fn t1_acme_client_scenario() {
    let mut ledger = registered_t1();

    let view = parse_json(&invoke(&mut ledger, "get_tech", &["T1"]).unwrap());
    assert_eq!(view["term"], "12");
    assert_eq!(view["status"], "1");
    assert_eq!(view["content"], json!({"a.txt": "deadbeef"}));
    assert_eq!(view["client"], json!({}));

    invoke(&mut ledger, "add_client", &["T1", "ClientX", "6", "4"]).unwrap();
    let view = parse_json(&invoke(&mut ledger, "get_tech", &["T1"]).unwrap());
    assert_eq!(view["client"], json!({"ClientX": 6}));
    assert_eq!(view["status"], "4");

    invoke(&mut ledger, "add_client", &["T1", "ClientX", "9", "4"]).unwrap();
    let view = parse_json(&invoke(&mut ledger, "get_tech", &["T1"]).unwrap());
    assert_eq!(view["client"], json!({"ClientX": 9}));
}

#[test]
fn get_tech_keys_are_in_fixed_order() {
    let mut ledger = registered_t1();
    let raw = String::from_utf8(invoke(&mut ledger, "get_tech", &["T1"]).unwrap()).unwrap();
    let keys = [
        "\"technology\"",
        "\"sort\"",
        "\"company\"",
        "\"company_number\"",
        "\"term\"",
        "\"content\"",
        "\"client\"",
        "\"enroll_date\"",
        "\"status\"",
    ];
    let positions: Vec<usize> = keys.iter().map(|key| raw.find(key).unwrap()).collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{raw}");
}

#[test]
fn second_registration_fails_and_keeps_first() {
    let mut ledger = registered_t1();
    let before = ledger.get_state("T1").unwrap();

    let mut args = register_args("T1");
    args[2] = "Globex".to_string();
    let err = invoke(&mut ledger, "add_cont", &args).unwrap_err();
    assert_eq!(err.to_string(), "This technology already exists: T1");
    assert_eq!(ledger.get_state("T1").unwrap(), before);
}

#[test]
fn mutations_on_absent_key_leave_store_unchanged() {
    let mut ledger = registered_t1();
    let calls: [(&str, Vec<&str>); 3] = [
        ("add_client", vec!["T9", "ClientX", "6", "4"]),
        ("change_term", vec!["T9", "24", "3"]),
        ("add_content", vec!["T9", "b.txt", "cafebabe", "2"]),
    ];

    for (operation, args) in calls {
        let err = invoke(&mut ledger, operation, &args).unwrap_err();
        assert!(
            matches!(err, EscrowError::NotFound { ref technology } if technology == "T9"),
            "{operation}: {err}"
        );
    }
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.get_state("T9").unwrap(), None);
    assert_eq!(ledger.history_for_key("T1").unwrap().count(), 1);
}

#[test]
fn readding_content_overwrites_hash() {
    let mut ledger = registered_t1();
    invoke(&mut ledger, "add_content", &["T1", "a.txt", "cafebabe", "2"]).unwrap();

    let view = parse_json(&invoke(&mut ledger, "get_tech", &["T1"]).unwrap());
    assert_eq!(view["content"], json!({"a.txt": "cafebabe"}));
}

#[test]
fn status_after_mutation_equals_value_passed() {
    let mut ledger = registered_t1();
    let steps: [(&str, Vec<&str>, &str); 3] = [
        ("add_content", vec!["T1", "b.txt", "00ff", "2"], "2"),
        ("change_term", vec!["T1", "6", "3"], "3"),
        ("add_client", vec!["T1", "ClientY", "12", "7"], "7"),
    ];

    for (operation, args, status) in steps {
        invoke(&mut ledger, operation, &args).unwrap();
        let view = parse_json(&invoke(&mut ledger, "get_tech", &["T1"]).unwrap());
        assert_eq!(view["status"], status, "after {operation}");
    }
}

#[test]
fn change_term_may_shorten() {
    let mut ledger = registered_t1();
    invoke(&mut ledger, "change_term", &["T1", "1", "3"]).unwrap();
    let view = parse_json(&invoke(&mut ledger, "get_tech", &["T1"]).unwrap());
    assert_eq!(view["term"], "1");
    assert_eq!(view["enroll_date"], "2020-01-01");
}

#[test]
fn full_scan_returns_last_written_bytes_in_key_order() {
    let mut ledger = MemoryLedger::new();
    for name in ["gamma", "alpha", "beta"] {
        invoke(&mut ledger, "add_cont", &register_args(name)).unwrap();
    }
    invoke(&mut ledger, "add_client", &["beta", "ClientX", "6", "4"]).unwrap();

    let raw = String::from_utf8(invoke(&mut ledger, "get_all_tech", &[] as &[&str]).unwrap()).unwrap();
    let entries = parse_json(raw.as_bytes());
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 3);

    let keys: Vec<&str> = entries.iter().map(|e| e["Key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["alpha", "beta", "gamma"]);

    for key in keys {
        let stored = String::from_utf8(ledger.get_state(key).unwrap().unwrap()).unwrap();
        let expected = format!(r#"{{"Key":"{key}","Value":{stored}}}"#);
        assert!(raw.contains(&expected), "{raw}");
    }
    assert_eq!(ledger.open_iterators(), 0);
}

#[test]
fn range_query_restricts_keys() {
    let mut ledger = MemoryLedger::new();
    for name in ["A1", "B1", "B2", "C1"] {
        invoke(&mut ledger, "add_cont", &register_args(name)).unwrap();
    }

    let entries = parse_json(&invoke(&mut ledger, "get_tech_range", &["B", "C"]).unwrap());
    let keys: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["Key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["B1", "B2"]);

    let entries = parse_json(&invoke(&mut ledger, "get_tech_range", &["B2", ""]).unwrap());
    assert_eq!(entries.as_array().unwrap().len(), 2);
}

#[test]
fn get_all_tech_takes_no_arguments() {
    let mut ledger = registered_t1();
    let err = invoke(&mut ledger, "get_all_tech", &[""]).unwrap_err();
    assert!(matches!(
        err,
        EscrowError::ArityMismatch {
            expected: 0,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn history_lists_every_version_with_tombstone() {
    let mut ledger = registered_t1();
    invoke(&mut ledger, "change_term", &["T1", "24", "3"]).unwrap();
    ledger.delete_state("T1").unwrap();

    let history = parse_json(&invoke(&mut ledger, "get_cert_verify", &["T1"]).unwrap());
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 3);

    assert_eq!(history[0]["Value"]["term"], 12);
    assert_eq!(history[0]["IsDelete"], false);
    assert_eq!(history[1]["Value"]["term"], 24);
    assert!(history[2]["Value"].is_null());
    assert_eq!(history[2]["IsDelete"], true);

    for entry in history {
        assert!(!entry["TxId"].as_str().unwrap().is_empty());
        assert!(entry["Timestamp"].as_str().unwrap().ends_with('Z'));
    }
    assert_ne!(history[0]["TxId"], history[1]["TxId"]);
}

#[test]
fn deleted_technology_can_be_registered_again() {
    let mut ledger = registered_t1();
    ledger.delete_state("T1").unwrap();
    invoke(&mut ledger, "add_cont", &T1_REGISTER).unwrap();

    let history = parse_json(&invoke(&mut ledger, "get_cert_verify", &["T1"]).unwrap());
    assert_eq!(history.as_array().unwrap().len(), 3);
}

#[test]
fn csv_content_lists_zip_to_shorter_length() {
    let mut ledger = MemoryLedger::new();
    let mut args = register_args("T2");
    args[5] = "a.txt,b.txt,c.txt".to_string();
    args[6] = "h1,h2".to_string();
    invoke(&mut ledger, "add_cont", &args).unwrap();

    let view = parse_json(&invoke(&mut ledger, "get_tech", &["T2"]).unwrap());
    assert_eq!(view["content"], json!({"a.txt": "h1", "b.txt": "h2"}));
}
