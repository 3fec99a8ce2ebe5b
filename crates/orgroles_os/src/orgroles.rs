#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use orgroles_kernel_contracts::audit::{
    AuditEventInput, AuditEventType, AuditPayloadMin, AuditSeverity, CorrelationId, PayloadKey,
    PayloadValue,
};
use orgroles_kernel_contracts::catalog::{CatalogError, CatalogErrorKind, OrgId};
use orgroles_kernel_contracts::orgroles::{
    OrgRolesOk, OrgRolesOperation, OrgRolesOutcome, OrgRolesRefuse, OrgRolesRequest,
    OrgRolesResponse,
};
use orgroles_kernel_contracts::{MonotonicTimeNs, ReasonCodeId, Validate};
use orgroles_storage::audit::AuditRuntime;
use orgroles_storage::catalog::{CatalogStore, StorageError};
use tracing::{error, info, warn};

pub mod reason_codes {
    use orgroles_kernel_contracts::ReasonCodeId;

    // ORGROLES reason-code namespace ("OR").
    pub const ORGROLES_OK_INITIALIZE: ReasonCodeId = ReasonCodeId(0x4F52_0001);
    pub const ORGROLES_OK_RESET: ReasonCodeId = ReasonCodeId(0x4F52_0002);
    pub const ORGROLES_OK_CREATE_POSITION: ReasonCodeId = ReasonCodeId(0x4F52_0003);
    pub const ORGROLES_OK_UPDATE_POSITION: ReasonCodeId = ReasonCodeId(0x4F52_0004);
    pub const ORGROLES_OK_DELETE_POSITION: ReasonCodeId = ReasonCodeId(0x4F52_0005);
    pub const ORGROLES_OK_MOVE_POSITION_LEVEL: ReasonCodeId = ReasonCodeId(0x4F52_0006);
    pub const ORGROLES_OK_MOVE_POSITION_LEVEL_NOOP: ReasonCodeId = ReasonCodeId(0x4F52_0007);
    pub const ORGROLES_OK_CREATE_MINISTRY_GROUP: ReasonCodeId = ReasonCodeId(0x4F52_0008);
    pub const ORGROLES_OK_DELETE_MINISTRY_GROUP: ReasonCodeId = ReasonCodeId(0x4F52_0009);

    pub const ORGROLES_REFUSE_NOT_FOUND: ReasonCodeId = ReasonCodeId(0x4F52_0101);
    pub const ORGROLES_REFUSE_ALREADY_INITIALIZED: ReasonCodeId = ReasonCodeId(0x4F52_0102);
    pub const ORGROLES_REFUSE_NOT_INITIALIZED: ReasonCodeId = ReasonCodeId(0x4F52_0103);
    pub const ORGROLES_REFUSE_UNKNOWN_TEMPLATE: ReasonCodeId = ReasonCodeId(0x4F52_0104);
    pub const ORGROLES_REFUSE_DUPLICATE_CODE: ReasonCodeId = ReasonCodeId(0x4F52_0105);
    pub const ORGROLES_REFUSE_INVALID_MODULE_CODE: ReasonCodeId = ReasonCodeId(0x4F52_0106);
    pub const ORGROLES_REFUSE_INVALID_LEVEL: ReasonCodeId = ReasonCodeId(0x4F52_0107);
    pub const ORGROLES_REFUSE_INVALID_MINISTRY_GROUP: ReasonCodeId = ReasonCodeId(0x4F52_0108);
    pub const ORGROLES_REFUSE_REQUIRED_POSITION: ReasonCodeId = ReasonCodeId(0x4F52_0109);
    pub const ORGROLES_REFUSE_INVALID_INPUT: ReasonCodeId = ReasonCodeId(0x4F52_010A);
}

pub fn refuse_reason_code(kind: CatalogErrorKind) -> ReasonCodeId {
    use reason_codes::*;
    match kind {
        CatalogErrorKind::NotFound => ORGROLES_REFUSE_NOT_FOUND,
        CatalogErrorKind::AlreadyInitialized => ORGROLES_REFUSE_ALREADY_INITIALIZED,
        CatalogErrorKind::NotInitialized => ORGROLES_REFUSE_NOT_INITIALIZED,
        CatalogErrorKind::UnknownTemplate => ORGROLES_REFUSE_UNKNOWN_TEMPLATE,
        CatalogErrorKind::DuplicateCode => ORGROLES_REFUSE_DUPLICATE_CODE,
        CatalogErrorKind::InvalidModuleCode => ORGROLES_REFUSE_INVALID_MODULE_CODE,
        CatalogErrorKind::InvalidLevel => ORGROLES_REFUSE_INVALID_LEVEL,
        CatalogErrorKind::InvalidMinistryGroup => ORGROLES_REFUSE_INVALID_MINISTRY_GROUP,
        CatalogErrorKind::RequiredPosition => ORGROLES_REFUSE_REQUIRED_POSITION,
        CatalogErrorKind::InvalidInput => ORGROLES_REFUSE_INVALID_INPUT,
    }
}

const STATE_UNINITIALIZED: &str = "UNINITIALIZED";
const STATE_INITIALIZED: &str = "INITIALIZED";
const STATE_CUSTOMIZED: &str = "CUSTOMIZED";

/// Catalog lifecycle label used in audit transitions.
pub fn catalog_state(store: &CatalogStore, org_id: &OrgId) -> &'static str {
    match store.org_config(org_id) {
        None => STATE_UNINITIALIZED,
        Some(c) if c.is_customized => STATE_CUSTOMIZED,
        Some(_) => STATE_INITIALIZED,
    }
}

#[derive(Debug, Default, Clone)]
pub struct OrgRolesRuntime;

impl OrgRolesRuntime {
    /// Domain refusals come back as `OrgRolesResponse::Refuse`; `Err` is reserved for storage failures.
    pub fn run(
        &self,
        store: &mut CatalogStore,
        req: &OrgRolesRequest,
    ) -> Result<OrgRolesResponse, StorageError> {
        if let Err(violation) = req.validate() {
            return match req.request.validate() {
                Err(body) => self.refuse(store, req, CatalogError::InvalidInput(body)),
                Ok(()) => Err(StorageError::ContractViolation(violation)),
            };
        }

        match self.dispatch(store, req) {
            Ok(resp) => Ok(resp),
            Err(StorageError::Catalog(e)) => self.refuse(store, req, e),
            Err(e) => {
                error!(
                    org_id = %req.request.org_id().as_str(),
                    operation_id = %req.operation_id,
                    error = %e,
                    "org roles storage failure"
                );
                Err(e)
            }
        }
    }

    fn dispatch(
        &self,
        store: &mut CatalogStore,
        req: &OrgRolesRequest,
    ) -> Result<OrgRolesResponse, StorageError> {
        let state_from = catalog_state(store, req.request.org_id());

        let (reason_code, details, outcome) = match &req.request {
            OrgRolesOperation::Initialize(r) => {
                let res = store.initialize(req.now, &r.org_id, &r.template_type)?;
                (
                    reason_codes::ORGROLES_OK_INITIALIZE,
                    vec![
                        ("template_type", res.template_type.as_str().to_string()),
                        ("positions_created", res.positions_created.to_string()),
                    ],
                    OrgRolesOutcome::Initialized(res),
                )
            }
            OrgRolesOperation::Reset(r) => {
                let res = store.reset(req.now, &r.org_id, &r.template_type)?;
                (
                    reason_codes::ORGROLES_OK_RESET,
                    vec![
                        ("template_type", res.template_type.as_str().to_string()),
                        ("positions_created", res.positions_created.to_string()),
                        ("positions_removed", res.positions_removed.to_string()),
                    ],
                    OrgRolesOutcome::Reset(res),
                )
            }
            OrgRolesOperation::CreatePosition(r) => {
                let rec = store.create_position(req.now, r)?;
                (
                    reason_codes::ORGROLES_OK_CREATE_POSITION,
                    vec![
                        ("position_id", rec.position_id.as_str().to_string()),
                        ("code", rec.code.as_str().to_string()),
                    ],
                    OrgRolesOutcome::PositionCreated(rec),
                )
            }
            OrgRolesOperation::UpdatePosition(r) => {
                let rec = store.update_position(req.now, r)?;
                (
                    reason_codes::ORGROLES_OK_UPDATE_POSITION,
                    vec![("position_id", rec.position_id.as_str().to_string())],
                    OrgRolesOutcome::PositionUpdated(rec),
                )
            }
            OrgRolesOperation::DeletePosition(r) => {
                let id = store.delete_position(&r.org_id, &r.position_id)?;
                (
                    reason_codes::ORGROLES_OK_DELETE_POSITION,
                    vec![("position_id", id.as_str().to_string())],
                    OrgRolesOutcome::PositionDeleted(id),
                )
            }
            OrgRolesOperation::MovePositionLevel(r) => {
                let res =
                    store.move_position_level(req.now, &r.org_id, &r.position_id, r.direction)?;
                let mut details = vec![
                    ("position_id", res.position_id.as_str().to_string()),
                    ("level_from", res.level_from.to_string()),
                    ("level_to", res.level.to_string()),
                ];
                if let Some(other) = &res.swapped_with {
                    details.push(("swapped_with", other.as_str().to_string()));
                }
                let rc = if res.swapped() {
                    reason_codes::ORGROLES_OK_MOVE_POSITION_LEVEL
                } else {
                    reason_codes::ORGROLES_OK_MOVE_POSITION_LEVEL_NOOP
                };
                (rc, details, OrgRolesOutcome::PositionMoved(res))
            }
            OrgRolesOperation::CreateMinistryGroup(r) => {
                let rec = store.create_ministry_group(req.now, r)?;
                (
                    reason_codes::ORGROLES_OK_CREATE_MINISTRY_GROUP,
                    vec![
                        ("group_id", rec.group_id.as_str().to_string()),
                        ("code", rec.code.as_str().to_string()),
                    ],
                    OrgRolesOutcome::MinistryGroupCreated(rec),
                )
            }
            OrgRolesOperation::DeleteMinistryGroup(r) => {
                let res = store.delete_ministry_group(req.now, &r.org_id, &r.group_id)?;
                (
                    reason_codes::ORGROLES_OK_DELETE_MINISTRY_GROUP,
                    vec![
                        ("group_id", res.group_id.as_str().to_string()),
                        ("positions_unassigned", res.positions_unassigned.to_string()),
                        ("groups_promoted", res.groups_promoted.to_string()),
                    ],
                    OrgRolesOutcome::MinistryGroupDeleted(res),
                )
            }
        };

        let state_to = catalog_state(store, req.request.org_id());
        self.audit_transition_with_details(
            store,
            req.now,
            req.correlation_id,
            req.request.org_id(),
            &req.operation_id,
            state_from,
            state_to,
            &details,
            reason_code,
        )?;
        info!(
            org_id = %req.request.org_id().as_str(),
            operation_id = %req.operation_id,
            reason_code = reason_code.0,
            state_from,
            state_to,
            "org roles mutation committed"
        );

        Ok(OrgRolesResponse::Ok(
            OrgRolesOk::v1(req.operation_id.clone(), reason_code, outcome)
                .map_err(StorageError::ContractViolation)?,
        ))
    }

    fn refuse(
        &self,
        store: &mut CatalogStore,
        req: &OrgRolesRequest,
        err: CatalogError,
    ) -> Result<OrgRolesResponse, StorageError> {
        let kind = err.kind();
        let reason_code = refuse_reason_code(kind);
        let org_id = req.request.org_id();

        let mut entries: BTreeMap<PayloadKey, PayloadValue> = BTreeMap::new();
        entries.insert(
            PayloadKey::new("gate").map_err(StorageError::ContractViolation)?,
            PayloadValue::new(req.request.gate_name()).map_err(StorageError::ContractViolation)?,
        );
        entries.insert(
            PayloadKey::new("kind").map_err(StorageError::ContractViolation)?,
            PayloadValue::new(kind.as_str()).map_err(StorageError::ContractViolation)?,
        );
        let payload_min = AuditPayloadMin::v1(entries).map_err(StorageError::ContractViolation)?;
        let ev = AuditEventInput::v1(
            audit_time(req.now),
            Some(org_id.as_str().to_string()),
            req.request.operation_id().to_string(),
            AuditEventType::GateFail,
            reason_code,
            AuditSeverity::Warn,
            req.correlation_id,
            payload_min,
        )
        .map_err(StorageError::ContractViolation)?;
        AuditRuntime::emit(store, ev)?;

        let message = err.to_string();
        warn!(
            org_id = %org_id.as_str(),
            operation_id = %req.request.operation_id(),
            reason_code = reason_code.0,
            kind = kind.as_str(),
            %message,
            "org roles request refused"
        );

        Ok(OrgRolesResponse::Refuse(
            OrgRolesRefuse::v1(
                req.request.operation_id().to_string(),
                kind,
                reason_code,
                truncate_message(message),
            )
            .map_err(StorageError::ContractViolation)?,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn audit_transition_with_details(
        &self,
        store: &mut CatalogStore,
        now: MonotonicTimeNs,
        correlation_id: CorrelationId,
        org_id: &OrgId,
        operation_id: &str,
        state_from: &'static str,
        state_to: &'static str,
        detail_entries: &[(&'static str, String)],
        reason_code: ReasonCodeId,
    ) -> Result<(), StorageError> {
        let mut entries: BTreeMap<PayloadKey, PayloadValue> = BTreeMap::new();
        entries.insert(
            PayloadKey::new("state_from").map_err(StorageError::ContractViolation)?,
            PayloadValue::new(state_from).map_err(StorageError::ContractViolation)?,
        );
        entries.insert(
            PayloadKey::new("state_to").map_err(StorageError::ContractViolation)?,
            PayloadValue::new(state_to).map_err(StorageError::ContractViolation)?,
        );
        for (k, v) in detail_entries {
            entries.insert(
                PayloadKey::new(*k).map_err(StorageError::ContractViolation)?,
                PayloadValue::new(v.as_str()).map_err(StorageError::ContractViolation)?,
            );
        }
        let payload_min = AuditPayloadMin::v1(entries).map_err(StorageError::ContractViolation)?;

        let ev = AuditEventInput::v1(
            now,
            Some(org_id.as_str().to_string()),
            operation_id.to_string(),
            AuditEventType::StateTransition,
            reason_code,
            AuditSeverity::Info,
            correlation_id,
            payload_min,
        )
        .map_err(StorageError::ContractViolation)?;

        AuditRuntime::emit(store, ev)?;
        Ok(())
    }
}

// A refused envelope may carry a zero clock; the ledger still needs a positive timestamp.
fn audit_time(now: MonotonicTimeNs) -> MonotonicTimeNs {
    MonotonicTimeNs(now.0.max(1))
}

fn truncate_message(message: String) -> String {
    if message.chars().count() <= 512 {
        return message;
    }
    message.chars().take(512).collect()
}
