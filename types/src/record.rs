//! The technology escrow record as it is persisted on the ledger.
//!
//! One record exists per [`TechnologyName`]. Records only grow: content and
//! client entries are inserted or overwritten, never removed, and the enroll
//! date is fixed at creation.
//!
//! # Persisted shape
//!
//! ```json
//! {"technology":"T1","sort":3,"company":"Acme","com_num":100,"term":12,
//!  "content":{"a.txt":"deadbeef"},"client":{"ClientX":6},
//!  "enroll_date":"2020-01-01","status":4}
//! ```
//!
//! `client` is omitted entirely while no client has been added. Maps are
//! `BTreeMap`s so the serialized bytes are deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

use crate::{StatusCode, TechnologyName};

/// File name to content hash.
pub type ContentMap = BTreeMap<String, String>;

/// Client company name to its individually negotiated contract term.
pub type ClientMap = BTreeMap<String, i64>;

/// Field values for a brand-new record. Clients always start empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTechnology {
    pub technology: TechnologyName,
    pub sort: i64,
    pub company: String,
    pub company_number: i64,
    pub term: i64,
    pub content: ContentMap,
    pub enroll_date: String,
    pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyRecord {
    technology: TechnologyName,
    sort: i64,
    company: String,
    #[serde(rename = "com_num")]
    company_number: i64,
    term: i64,
    #[serde(default, serialize_with = "serialize_or_empty")]
    content: Option<ContentMap>,
    #[serde(
        rename = "client",
        default,
        skip_serializing_if = "is_absent_or_empty"
    )]
    clients: Option<ClientMap>,
    enroll_date: String,
    status: StatusCode,
}

impl TechnologyRecord {
    #[must_use]
    pub fn new(fields: NewTechnology) -> Self {
        Self {
            technology: fields.technology,
            sort: fields.sort,
            company: fields.company,
            company_number: fields.company_number,
            term: fields.term,
            content: Some(fields.content),
            clients: None,
            enroll_date: fields.enroll_date,
            status: fields.status,
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    #[must_use]
    pub fn technology(&self) -> &TechnologyName {
        &self.technology
    }

    #[must_use]
    pub fn sort(&self) -> i64 {
        self.sort
    }

    #[must_use]
    pub fn company(&self) -> &str {
        &self.company
    }

    #[must_use]
    pub fn company_number(&self) -> i64 {
        self.company_number
    }

    #[must_use]
    pub fn term(&self) -> i64 {
        self.term
    }

    #[must_use]
    pub fn enroll_date(&self) -> &str {
        &self.enroll_date
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Content entries in file-name order. Empty when no content map was ever stored.
    pub fn content(&self) -> impl Iterator<Item = (&str, &str)> {
        self.content
            .iter()
            .flatten()
            .map(|(file, hash)| (file.as_str(), hash.as_str()))
    }

    #[must_use]
    pub fn content_hash(&self, file_name: &str) -> Option<&str> {
        self.content.as_ref()?.get(file_name).map(String::as_str)
    }

    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.as_ref().map_or(0, BTreeMap::len)
    }

    /// Client entries in client-name order. Empty until the first client is added.
    pub fn clients(&self) -> impl Iterator<Item = (&str, i64)> {
        self.clients
            .iter()
            .flatten()
            .map(|(name, term)| (name.as_str(), *term))
    }

    #[must_use]
    pub fn client_term(&self, client: &str) -> Option<i64> {
        self.clients.as_ref()?.get(client).copied()
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.as_ref().map_or(0, BTreeMap::len)
    }

    /// Insert or overwrite a client's contract term. Returns the previous term.
    pub fn upsert_client(&mut self, client: impl Into<String>, contract_term: i64) -> Option<i64> {
        self.clients
            .get_or_insert_with(ClientMap::new)
            .insert(client.into(), contract_term)
    }

    /// Insert or overwrite a file's content hash. Returns the previous hash.
    pub fn upsert_content(
        &mut self,
        file_name: impl Into<String>,
        file_hash: impl Into<String>,
    ) -> Option<String> {
        self.content
            .get_or_insert_with(ContentMap::new)
            .insert(file_name.into(), file_hash.into())
    }

    pub fn set_term(&mut self, term: i64) {
        self.term = term;
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }
}

fn is_absent_or_empty<V>(map: &Option<BTreeMap<String, V>>) -> bool {
    map.as_ref().is_none_or(BTreeMap::is_empty)
}

fn serialize_or_empty<S, V>(
    map: &Option<BTreeMap<String, V>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    match map {
        Some(map) => map.serialize(serializer),
        None => BTreeMap::<String, V>::new().serialize(serializer),
    }
}
