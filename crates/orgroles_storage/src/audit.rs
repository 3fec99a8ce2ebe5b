#![forbid(unsafe_code)]

use orgroles_kernel_contracts::audit::{AuditEventId, AuditEventInput};

use crate::catalog::{CatalogStore, StorageError};

/// Append-only writer into the catalog store's `audit_events` ledger.
#[derive(Debug, Default)]
pub struct AuditRuntime;

impl AuditRuntime {
    pub fn emit(store: &mut CatalogStore, input: AuditEventInput) -> Result<AuditEventId, StorageError> {
        store.append_audit_event(input)
    }
}
