//! JSON views returned by the query operations.
//!
//! Stored record bytes are embedded verbatim through [`RawValue`], so a scan
//! entry's `Value` is byte-for-byte what was last written under its key.

use std::collections::BTreeMap;

use chrono::SecondsFormat;
use escrow_ledger::{KeyModification, KeyValue};
use escrow_types::TechnologyRecord;
use serde::Serialize;
use serde_json::value::RawValue;

use crate::errors::EscrowError;

/// Presentation of one record. Scalars are rendered as strings and both maps
/// are always present, `{}` when empty.
#[derive(Debug, Serialize)]
pub(crate) struct TechnologyView<'a> {
    technology: &'a str,
    sort: String,
    company: &'a str,
    company_number: String,
    term: String,
    content: BTreeMap<&'a str, &'a str>,
    client: BTreeMap<&'a str, i64>,
    enroll_date: &'a str,
    status: String,
}

impl<'a> TechnologyView<'a> {
    pub(crate) fn new(record: &'a TechnologyRecord) -> Self {
        Self {
            technology: record.technology().as_str(),
            sort: record.sort().to_string(),
            company: record.company(),
            company_number: record.company_number().to_string(),
            term: record.term().to_string(),
            content: record.content().collect(),
            client: record.clients().collect(),
            enroll_date: record.enroll_date(),
            status: record.status().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ScanEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: Box<RawValue>,
}

impl ScanEntry {
    pub(crate) fn from_key_value(kv: KeyValue) -> Result<Self, EscrowError> {
        let value = embed(&kv.key, &kv.value)?;
        Ok(Self { key: kv.key, value })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryEntry {
    #[serde(rename = "TxId")]
    tx_id: String,
    #[serde(rename = "Value")]
    value: Option<Box<RawValue>>,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "IsDelete")]
    is_delete: bool,
}

impl HistoryEntry {
    pub(crate) fn from_modification(key: &str, modification: KeyModification) -> Result<Self, EscrowError> {
        let value = if modification.is_delete {
            None
        } else {
            Some(embed(key, &modification.value)?)
        };
        Ok(Self {
            tx_id: modification.tx_id.to_string(),
            value,
            timestamp: modification
                .timestamp
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            is_delete: modification.is_delete,
        })
    }
}

fn embed(key: &str, bytes: &[u8]) -> Result<Box<RawValue>, EscrowError> {
    serde_json::from_slice(bytes).map_err(|source| EscrowError::malformed(key, source))
}

/// Serialize a view. The views contain only strings, integers, and
/// already-validated raw JSON, so encoding cannot fail in practice.
pub(crate) fn to_payload<T: Serialize>(view: &T, technology: &str) -> Result<Vec<u8>, EscrowError> {
    serde_json::to_vec(view).map_err(|source| EscrowError::EncodeRecord {
        technology: technology.to_string(),
        source,
    })
}
