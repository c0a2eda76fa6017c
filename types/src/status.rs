//! Lifecycle status codes.
//!
//! Status values are supplied by the caller of each mutating operation and are
//! stored verbatim. [`LifecycleStage`] names the codes the registry knows about,
//! but a record may carry any integer.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(i64);

impl StatusCode {
    #[must_use]
    pub const fn new(code: i64) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// The named lifecycle stage for this code, if it is one of the known ones.
    #[must_use]
    pub const fn stage(self) -> Option<LifecycleStage> {
        LifecycleStage::from_code(self.0)
    }
}

impl From<LifecycleStage> for StatusCode {
    fn from(stage: LifecycleStage) -> Self {
        Self(stage.code())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last action taken on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    Registered,
    ContentAdded,
    TermExtended,
    ClientAdded,
    Verified,
    Queried,
}

impl LifecycleStage {
    pub const ALL: [LifecycleStage; 6] = [
        LifecycleStage::Registered,
        LifecycleStage::ContentAdded,
        LifecycleStage::TermExtended,
        LifecycleStage::ClientAdded,
        LifecycleStage::Verified,
        LifecycleStage::Queried,
    ];

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            LifecycleStage::Registered => 1,
            LifecycleStage::ContentAdded => 2,
            LifecycleStage::TermExtended => 3,
            LifecycleStage::ClientAdded => 4,
            LifecycleStage::Verified => 5,
            LifecycleStage::Queried => 6,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(LifecycleStage::Registered),
            2 => Some(LifecycleStage::ContentAdded),
            3 => Some(LifecycleStage::TermExtended),
            4 => Some(LifecycleStage::ClientAdded),
            5 => Some(LifecycleStage::Verified),
            6 => Some(LifecycleStage::Queried),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LifecycleStage::Registered => "register",
            LifecycleStage::ContentAdded => "add-content",
            LifecycleStage::TermExtended => "extend-term",
            LifecycleStage::ClientAdded => "add-client",
            LifecycleStage::Verified => "verify",
            LifecycleStage::Queried => "query",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
