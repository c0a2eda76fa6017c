//! Technology escrow registry operations.
//!
//! This crate holds the registry's business rules on top of any
//! [`escrow_ledger::Ledger`]:
//! - argument validation shared by every operation
//! - the four mutations (`add_cont`, `add_client`, `change_term`, `add_content`)
//! - the read views (`get_tech`, `get_all_tech`, `get_tech_range`, `get_cert_verify`)
//! - [`invoke`], which routes an operation name and raw arguments to the above
//!
//! # Architecture
//!
//! ```text
//! invoke(name, args)
//! ├── args:     arity → non-empty → numeric, into typed requests
//! ├── mutation: read record → modify in memory → write whole record
//! └── query:    point get / range scan / key history → render JSON
//! ```
//!
//! Mutations borrow the ledger mutably for the full read-modify-write, so two
//! mutations of the same key cannot interleave within one process.

mod args;
mod dispatch;
pub mod errors;
mod mutation;
mod query;
mod render;

pub use args::{AddClient, AddContent, ChangeTerm, RegisterTechnology, zip_content};
pub use dispatch::{Operation, Payload, invoke};
pub use errors::{EscrowError, ordinal};
pub use mutation::{add_client, add_content, change_term, register};
pub use query::{get_all_tech, get_cert_verify, get_tech, get_tech_range, render_tech};
