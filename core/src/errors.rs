//! Operation failures.
//!
//! Every variant names the field, key, or operation it concerns so a caller can
//! present a precise diagnostic. None of them are retried.

use escrow_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error("Incorrect number of arguments for {operation}. Expecting {expected}, got {actual}")]
    ArityMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{} argument {field} must be a non-empty string", ordinal(*position))]
    EmptyField {
        position: usize,
        field: &'static str,
    },

    #[error("{} argument {field} must be a numeric string (got {value:?})", ordinal(*position))]
    NotNumeric {
        position: usize,
        field: &'static str,
        value: String,
    },

    #[error("This technology already exists: {technology}")]
    AlreadyExists { technology: String },

    #[error("Technology does not exist: {technology}")]
    NotFound { technology: String },

    #[error("Ledger unavailable while accessing {target}")]
    StoreUnavailable {
        target: String,
        #[source]
        source: LedgerError,
    },

    #[error("Stored value for {key} is not a valid technology record")]
    MalformedRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode record for {technology}")]
    EncodeRecord {
        technology: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid function name: {name}")]
    UnknownOperation { name: String },
}

impl EscrowError {
    pub(crate) fn store(target: impl Into<String>, source: LedgerError) -> Self {
        EscrowError::StoreUnavailable {
            target: target.into(),
            source,
        }
    }

    pub(crate) fn malformed(key: impl Into<String>, source: serde_json::Error) -> Self {
        EscrowError::MalformedRecord {
            key: key.into(),
            source,
        }
    }

    /// Short machine-friendly name of the failure class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            EscrowError::ArityMismatch { .. } => "arity_mismatch",
            EscrowError::EmptyField { .. } => "empty_field",
            EscrowError::NotNumeric { .. } => "not_numeric",
            EscrowError::AlreadyExists { .. } => "already_exists",
            EscrowError::NotFound { .. } => "not_found",
            EscrowError::StoreUnavailable { .. } => "store_unavailable",
            EscrowError::MalformedRecord { .. } => "malformed_record",
            EscrowError::EncodeRecord { .. } => "encode_record",
            EscrowError::UnknownOperation { .. } => "unknown_operation",
        }
    }
}

/// English ordinal for a 1-based argument position: 1st, 2nd, 3rd, 4th, ...
#[must_use]
pub fn ordinal(position: usize) -> String {
    let suffix = match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}
