//! Mutating operations.
//!
//! Each operation is a single read-modify-write of the whole record under its
//! technology key. The `&mut` ledger borrow is held for the full operation, so
//! no other mutation can interleave between the read and the write.

use escrow_ledger::Ledger;
use escrow_types::{LifecycleStage, NewTechnology, StatusCode, TechnologyName, TechnologyRecord};

use crate::args::{AddClient, AddContent, ChangeTerm, RegisterTechnology};
use crate::errors::EscrowError;

/// Read and decode an existing record, failing with `NotFound` when absent.
pub(crate) fn load_record<L: Ledger + ?Sized>(
    ledger: &L,
    technology: &TechnologyName,
) -> Result<TechnologyRecord, EscrowError> {
    let bytes = ledger
        .get_state(technology)
        .map_err(|source| EscrowError::store(technology.as_str(), source))?
        .ok_or_else(|| EscrowError::NotFound {
            technology: technology.to_string(),
        })?;
    TechnologyRecord::from_json(&bytes).map_err(|source| EscrowError::malformed(technology.as_str(), source))
}

/// Write `record` back under the key it was loaded from, whatever its body says.
fn write_record<L: Ledger + ?Sized>(
    ledger: &mut L,
    technology: &TechnologyName,
    record: &TechnologyRecord,
) -> Result<(), EscrowError> {
    if record.technology() != technology {
        tracing::warn!(
            key = %technology,
            body = %record.technology(),
            "Stored record names a different technology than its key"
        );
    }
    tracing::debug!(
        %technology,
        status = %record.status(),
        stage = stage_label(record.status()),
        "Writing record"
    );
    let bytes = record.to_json().map_err(|source| EscrowError::EncodeRecord {
        technology: technology.to_string(),
        source,
    })?;
    ledger
        .put_state(technology, &bytes)
        .map_err(|source| EscrowError::store(technology.as_str(), source))
}

/// Status codes outside the known lifecycle are stored as-is and logged as such.
fn stage_label(status: StatusCode) -> &'static str {
    status.stage().map_or("unrecognized", LifecycleStage::as_str)
}

/// Create a record. Fails if any value is already stored under the key.
pub fn register<L: Ledger + ?Sized>(
    ledger: &mut L,
    request: RegisterTechnology,
) -> Result<TechnologyRecord, EscrowError> {
    let technology = request.technology;
    tracing::debug!(%technology, status = %request.status, "Registering technology");

    let exists = ledger
        .state_exists(&technology)
        .map_err(|source| EscrowError::store(technology.as_str(), source))?;
    if exists {
        tracing::debug!(%technology, "Technology already registered");
        return Err(EscrowError::AlreadyExists {
            technology: technology.into_inner(),
        });
    }

    let record = TechnologyRecord::new(NewTechnology {
        technology,
        sort: request.sort,
        company: request.company,
        company_number: request.company_number,
        term: request.term,
        content: request.content,
        enroll_date: request.enroll_date,
        status: request.status,
    });
    write_record(ledger, record.technology(), &record)?;

    tracing::info!(
        technology = %record.technology(),
        files = record.content_len(),
        "Technology registered"
    );
    Ok(record)
}

/// Add a licensing client, or overwrite the contract term of an existing one.
pub fn add_client<L: Ledger + ?Sized>(
    ledger: &mut L,
    request: AddClient,
) -> Result<TechnologyRecord, EscrowError> {
    tracing::debug!(technology = %request.technology, client = %request.client, "Adding client");

    let mut record = load_record(ledger, &request.technology)?;
    if let Some(previous) = record.upsert_client(request.client.as_str(), request.contract_term) {
        tracing::debug!(
            client = %request.client,
            previous,
            term = request.contract_term,
            "Client contract term overwritten"
        );
    }
    record.set_status(request.status);
    write_record(ledger, &request.technology, &record)?;

    tracing::info!(
        technology = %record.technology(),
        clients = record.client_count(),
        "Client recorded"
    );
    Ok(record)
}

/// Replace the escrow term. Shorter terms are accepted.
pub fn change_term<L: Ledger + ?Sized>(
    ledger: &mut L,
    request: ChangeTerm,
) -> Result<TechnologyRecord, EscrowError> {
    tracing::debug!(technology = %request.technology, term = request.term, "Changing term");

    let mut record = load_record(ledger, &request.technology)?;
    if request.term < record.term() {
        tracing::debug!(
            technology = %request.technology,
            from = record.term(),
            to = request.term,
            "Escrow term shortened"
        );
    }
    record.set_term(request.term);
    record.set_status(request.status);
    write_record(ledger, &request.technology, &record)?;

    tracing::info!(technology = %record.technology(), term = record.term(), "Term changed");
    Ok(record)
}

/// Add a content file hash, or overwrite the hash of an existing file name.
pub fn add_content<L: Ledger + ?Sized>(
    ledger: &mut L,
    request: AddContent,
) -> Result<TechnologyRecord, EscrowError> {
    tracing::debug!(technology = %request.technology, file = %request.file_name, "Adding content");

    let mut record = load_record(ledger, &request.technology)?;
    record.upsert_content(request.file_name, request.file_hash);
    record.set_status(request.status);
    write_record(ledger, &request.technology, &record)?;

    tracing::info!(
        technology = %record.technology(),
        files = record.content_len(),
        "Content recorded"
    );
    Ok(record)
}
