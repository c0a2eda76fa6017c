//! Argument validation for every operation.
//!
//! Operations receive a flat list of strings. Before any ledger access the list
//! is checked for exact arity, then every required position for non-emptiness
//! (first failure wins), and finally integer positions are parsed in order.
//! The typed requests below are the only way operations see their input.

use escrow_types::{ContentMap, StatusCode, TechnologyName};

use crate::errors::EscrowError;

/// Role of one positional argument.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> Field {
    Field {
        name,
        required: true,
    }
}

const fn optional(name: &'static str) -> Field {
    Field {
        name,
        required: false,
    }
}

pub(crate) const ADD_CONT: &[Field] = &[
    required("Technology"),
    required("Sort"),
    required("Company"),
    required("Company number"),
    required("Term"),
    required("File name"),
    required("File hash"),
    required("Enroll date"),
    required("Status"),
];

pub(crate) const ADD_CLIENT: &[Field] = &[
    required("Technology"),
    required("Client"),
    required("Contract term"),
    required("Status"),
];

pub(crate) const CHANGE_TERM: &[Field] = &[
    required("Technology"),
    required("Term"),
    required("Status"),
];

pub(crate) const ADD_CONTENT: &[Field] = &[
    required("Technology"),
    required("File name"),
    required("File hash"),
    required("Status"),
];

pub(crate) const TECHNOLOGY_ONLY: &[Field] = &[required("Technology")];

pub(crate) const KEY_RANGE: &[Field] = &[optional("Start key"), optional("End key")];

/// Argument list that passed the arity and non-empty checks.
pub(crate) struct ArgList<'a> {
    fields: &'static [Field],
    values: Vec<&'a str>,
}

impl<'a> ArgList<'a> {
    pub(crate) fn check<S: AsRef<str>>(
        operation: &'static str,
        fields: &'static [Field],
        args: &'a [S],
    ) -> Result<Self, EscrowError> {
        if args.len() != fields.len() {
            return Err(EscrowError::ArityMismatch {
                operation,
                expected: fields.len(),
                actual: args.len(),
            });
        }

        let values: Vec<&'a str> = args.iter().map(|arg| arg.as_ref()).collect();
        for (index, (field, value)) in fields.iter().zip(&values).enumerate() {
            if field.required && value.is_empty() {
                return Err(EscrowError::EmptyField {
                    position: index + 1,
                    field: field.name,
                });
            }
        }

        Ok(Self { fields, values })
    }

    pub(crate) fn text(&self, index: usize) -> &'a str {
        self.values[index]
    }

    pub(crate) fn technology(&self, index: usize) -> Result<TechnologyName, EscrowError> {
        TechnologyName::new(self.values[index]).map_err(|_| EscrowError::EmptyField {
            position: index + 1,
            field: self.fields[index].name,
        })
    }

    /// Base-10 signed integer; an optional leading sign is accepted, whitespace is not.
    pub(crate) fn integer(&self, index: usize) -> Result<i64, EscrowError> {
        let raw = self.values[index];
        raw.parse::<i64>().map_err(|_| EscrowError::NotNumeric {
            position: index + 1,
            field: self.fields[index].name,
            value: raw.to_string(),
        })
    }

    pub(crate) fn status(&self, index: usize) -> Result<StatusCode, EscrowError> {
        self.integer(index).map(StatusCode::new)
    }
}

/// Zip comma-delimited file names and hashes positionally.
///
/// Pairs stop at the shorter list; trailing unmatched entries are dropped. A
/// file name repeated within the list keeps its last hash.
#[must_use]
pub fn zip_content(file_names: &str, file_hashes: &str) -> ContentMap {
    file_names
        .split(',')
        .zip(file_hashes.split(','))
        .map(|(name, hash)| (name.to_string(), hash.to_string()))
        .collect()
}

/// Input of `add_cont`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterTechnology {
    pub technology: TechnologyName,
    pub sort: i64,
    pub company: String,
    pub company_number: i64,
    pub term: i64,
    pub content: ContentMap,
    pub enroll_date: String,
    pub status: StatusCode,
}

impl RegisterTechnology {
    pub const OPERATION: &'static str = "add_cont";

    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, EscrowError> {
        let args = ArgList::check(Self::OPERATION, ADD_CONT, args)?;
        Ok(Self {
            technology: args.technology(0)?,
            sort: args.integer(1)?,
            company: args.text(2).to_string(),
            company_number: args.integer(3)?,
            term: args.integer(4)?,
            content: zip_content(args.text(5), args.text(6)),
            enroll_date: args.text(7).to_string(),
            status: args.status(8)?,
        })
    }
}

/// Input of `add_client`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddClient {
    pub technology: TechnologyName,
    pub client: String,
    pub contract_term: i64,
    pub status: StatusCode,
}

impl AddClient {
    pub const OPERATION: &'static str = "add_client";

    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, EscrowError> {
        let args = ArgList::check(Self::OPERATION, ADD_CLIENT, args)?;
        Ok(Self {
            technology: args.technology(0)?,
            client: args.text(1).to_string(),
            contract_term: args.integer(2)?,
            status: args.status(3)?,
        })
    }
}

/// Input of `change_term`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTerm {
    pub technology: TechnologyName,
    pub term: i64,
    pub status: StatusCode,
}

impl ChangeTerm {
    pub const OPERATION: &'static str = "change_term";

    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, EscrowError> {
        let args = ArgList::check(Self::OPERATION, CHANGE_TERM, args)?;
        Ok(Self {
            technology: args.technology(0)?,
            term: args.integer(1)?,
            status: args.status(2)?,
        })
    }
}

/// Input of `add_content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddContent {
    pub technology: TechnologyName,
    pub file_name: String,
    pub file_hash: String,
    pub status: StatusCode,
}

impl AddContent {
    pub const OPERATION: &'static str = "add_content";

    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, EscrowError> {
        let args = ArgList::check(Self::OPERATION, ADD_CONTENT, args)?;
        Ok(Self {
            technology: args.technology(0)?,
            file_name: args.text(1).to_string(),
            file_hash: args.text(2).to_string(),
            status: args.status(3)?,
        })
    }
}

pub(crate) fn technology_arg<S: AsRef<str>>(
    operation: &'static str,
    args: &[S],
) -> Result<TechnologyName, EscrowError> {
    ArgList::check(operation, TECHNOLOGY_ONLY, args)?.technology(0)
}

pub(crate) fn key_range_args<'a, S: AsRef<str>>(
    operation: &'static str,
    args: &'a [S],
) -> Result<(&'a str, &'a str), EscrowError> {
    let args = ArgList::check(operation, KEY_RANGE, args)?;
    Ok((args.text(0), args.text(1)))
}

pub(crate) fn no_args<S: AsRef<str>>(operation: &'static str, args: &[S]) -> Result<(), EscrowError> {
    ArgList::check(operation, &[], args).map(|_| ())
}
