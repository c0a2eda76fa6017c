//! Core domain types for the technology escrow registry.
//!
//! This crate contains the record schema with no IO, no async, and minimal
//! dependencies. The ledger adapter and the operation layer both build on it.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod record;
mod status;

pub use record::{ClientMap, ContentMap, NewTechnology, TechnologyRecord};
pub use status::{LifecycleStage, StatusCode};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Technology name
// ============================================================================

/// The unique name of an escrowed technology. Doubles as its ledger key.
///
/// Any non-empty string is accepted; whitespace is significant because the
/// name is used verbatim as a storage key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TechnologyName(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("technology name must not be empty")]
pub struct EmptyTechnologyName;

impl TechnologyName {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyTechnologyName> {
        let value = value.into();
        if value.is_empty() {
            Err(EmptyTechnologyName)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for TechnologyName {
    type Error = EmptyTechnologyName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TechnologyName {
    type Error = EmptyTechnologyName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TechnologyName> for String {
    fn from(value: TechnologyName) -> Self {
        value.0
    }
}

impl std::ops::Deref for TechnologyName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for TechnologyName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TechnologyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
