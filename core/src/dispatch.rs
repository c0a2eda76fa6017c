//! Operation routing.
//!
//! [`invoke`] is the single entry point a host calls with an operation name and
//! its raw string arguments. Mutations answer with an empty payload; queries
//! answer with their JSON bytes.

use std::fmt;
use std::str::FromStr;

use escrow_ledger::Ledger;

use crate::args::{
    AddClient, AddContent, ChangeTerm, RegisterTechnology, key_range_args, no_args, technology_arg,
};
use crate::errors::EscrowError;
use crate::{mutation, query};

/// Bytes returned to the caller of [`invoke`].
pub type Payload = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    AddCont,
    AddClient,
    ChangeTerm,
    AddContent,
    GetTech,
    GetCertVerify,
    GetAllTech,
    GetTechRange,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Init,
        Operation::AddCont,
        Operation::AddClient,
        Operation::ChangeTerm,
        Operation::AddContent,
        Operation::GetTech,
        Operation::GetCertVerify,
        Operation::GetAllTech,
        Operation::GetTechRange,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::AddCont => RegisterTechnology::OPERATION,
            Operation::AddClient => AddClient::OPERATION,
            Operation::ChangeTerm => ChangeTerm::OPERATION,
            Operation::AddContent => AddContent::OPERATION,
            Operation::GetTech => "get_tech",
            Operation::GetCertVerify => "get_cert_verify",
            Operation::GetAllTech => "get_all_tech",
            Operation::GetTechRange => "get_tech_range",
        }
    }

    /// Argument names in positional order, for usage text.
    #[must_use]
    pub const fn usage(self) -> &'static str {
        match self {
            Operation::Init => "[ignored...]",
            Operation::AddCont => {
                "<technology> <sort> <company> <company_number> <term> <file_names> <file_hashes> <enroll_date> <status>"
            }
            Operation::AddClient => "<technology> <client> <contract_term> <status>",
            Operation::ChangeTerm => "<technology> <term> <status>",
            Operation::AddContent => "<technology> <file_name> <file_hash> <status>",
            Operation::GetTech | Operation::GetCertVerify => "<technology>",
            Operation::GetAllTech => "",
            Operation::GetTechRange => "<start_key> <end_key>",
        }
    }

    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::AddCont | Operation::AddClient | Operation::ChangeTerm | Operation::AddContent
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = EscrowError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == name)
            .ok_or_else(|| EscrowError::UnknownOperation {
                name: name.to_string(),
            })
    }
}

/// Route `name` to its operation. Names match exactly.
pub fn invoke<L, S>(ledger: &mut L, name: &str, args: &[S]) -> Result<Payload, EscrowError>
where
    L: Ledger + ?Sized,
    S: AsRef<str>,
{
    let operation: Operation = name.parse()?;
    tracing::debug!(
        %operation,
        mutation = operation.is_mutation(),
        args = args.len(),
        "Invoking operation"
    );

    let result = run(ledger, operation, args);
    if let Err(err) = &result {
        tracing::debug!(%operation, kind = err.kind(), error = %err, "Operation failed");
    }
    result
}

fn run<L, S>(ledger: &mut L, operation: Operation, args: &[S]) -> Result<Payload, EscrowError>
where
    L: Ledger + ?Sized,
    S: AsRef<str>,
{
    match operation {
        Operation::Init => Ok(Payload::new()),
        Operation::AddCont => {
            mutation::register(ledger, RegisterTechnology::from_args(args)?)?;
            Ok(Payload::new())
        }
        Operation::AddClient => {
            mutation::add_client(ledger, AddClient::from_args(args)?)?;
            Ok(Payload::new())
        }
        Operation::ChangeTerm => {
            mutation::change_term(ledger, ChangeTerm::from_args(args)?)?;
            Ok(Payload::new())
        }
        Operation::AddContent => {
            mutation::add_content(ledger, AddContent::from_args(args)?)?;
            Ok(Payload::new())
        }
        Operation::GetTech => {
            let technology = technology_arg(operation.as_str(), args)?;
            query::render_tech(ledger, &technology)
        }
        Operation::GetCertVerify => {
            let technology = technology_arg(operation.as_str(), args)?;
            query::get_cert_verify(ledger, &technology)
        }
        Operation::GetAllTech => {
            no_args(operation.as_str(), args)?;
            query::get_all_tech(ledger)
        }
        Operation::GetTechRange => {
            let (start, end) = key_range_args(operation.as_str(), args)?;
            query::get_tech_range(ledger, start, end)
        }
    }
}
