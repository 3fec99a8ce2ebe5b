#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use crate::common::{is_ascii_lower_snake, validate_id};
use crate::{ContractViolation, MonotonicTimeNs, ReasonCodeId, SchemaVersion, Validate};

pub const AUDIT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId(pub u128);

impl Validate for CorrelationId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "correlation_id",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AuditEventId(pub u64);

impl Validate for AuditEventId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "audit_event_id",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditEventType {
    GatePass,
    GateFail,
    StateTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditSeverity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PayloadKey(String);

impl PayloadKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ContractViolation> {
        let k = Self(key.into());
        k.validate()?;
        Ok(k)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for PayloadKey {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("payload_key", &self.0, 64)?;
        if !is_ascii_lower_snake(&self.0) || !self.0.as_bytes()[0].is_ascii_lowercase() {
            return Err(ContractViolation::InvalidValue {
                field: "payload_key",
                reason: "must be lower_snake_case (a-z0-9_)",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadValue(String);

impl PayloadValue {
    pub fn new(value: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(value.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for PayloadValue {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "payload_value",
                reason: "must not be empty",
            });
        }
        if self.0.len() > 256 {
            return Err(ContractViolation::InvalidValue {
                field: "payload_value",
                reason: "must be <= 256 chars",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPayloadMin {
    pub schema_version: SchemaVersion,
    pub entries: BTreeMap<PayloadKey, PayloadValue>,
}

impl AuditPayloadMin {
    pub fn empty_v1() -> Self {
        Self {
            schema_version: AUDIT_CONTRACT_VERSION,
            entries: BTreeMap::new(),
        }
    }

    pub fn v1(entries: BTreeMap<PayloadKey, PayloadValue>) -> Result<Self, ContractViolation> {
        let p = Self {
            schema_version: AUDIT_CONTRACT_VERSION,
            entries,
        };
        p.validate()?;
        Ok(p)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Validate for AuditPayloadMin {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != AUDIT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "audit_payload_min.schema_version",
                reason: "must match AUDIT_CONTRACT_VERSION",
            });
        }
        if self.entries.len() > 16 {
            return Err(ContractViolation::InvalidValue {
                field: "audit_payload_min.entries",
                reason: "must be <= 16 entries",
            });
        }
        let mut total_bytes: usize = 0;
        for (k, v) in &self.entries {
            k.validate()?;
            v.validate()?;
            total_bytes = total_bytes.saturating_add(k.as_str().len());
            total_bytes = total_bytes.saturating_add(v.as_str().len());
            if total_bytes > 2048 {
                return Err(ContractViolation::InvalidValue {
                    field: "audit_payload_min",
                    reason: "total payload size must be <= 2048 bytes",
                });
            }
        }
        Ok(())
    }
}

fn allowed_payload_keys_for_event(event_type: AuditEventType) -> &'static [&'static str] {
    match event_type {
        AuditEventType::GatePass | AuditEventType::GateFail => &["gate", "kind"],
        AuditEventType::StateTransition => &[
            "state_from",
            "state_to",
            "template_type",
            "positions_created",
            "positions_removed",
            "position_id",
            "group_id",
            "code",
            "level_from",
            "level_to",
            "swapped_with",
            "positions_unassigned",
            "groups_promoted",
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEventInput {
    pub schema_version: SchemaVersion,
    pub created_at: MonotonicTimeNs,
    pub org_id: Option<String>,
    pub operation_id: String,
    pub event_type: AuditEventType,
    pub reason_code: ReasonCodeId,
    pub severity: AuditSeverity,
    pub correlation_id: CorrelationId,
    pub payload_min: AuditPayloadMin,
}

impl AuditEventInput {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        created_at: MonotonicTimeNs,
        org_id: Option<String>,
        operation_id: String,
        event_type: AuditEventType,
        reason_code: ReasonCodeId,
        severity: AuditSeverity,
        correlation_id: CorrelationId,
        payload_min: AuditPayloadMin,
    ) -> Result<Self, ContractViolation> {
        let e = Self {
            schema_version: AUDIT_CONTRACT_VERSION,
            created_at,
            org_id,
            operation_id,
            event_type,
            reason_code,
            severity,
            correlation_id,
            payload_min,
        };
        e.validate()?;
        Ok(e)
    }
}

impl Validate for AuditEventInput {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != AUDIT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "audit_event_input.schema_version",
                reason: "must match AUDIT_CONTRACT_VERSION",
            });
        }
        validate_event_body(
            "audit_event_input",
            self.created_at,
            &self.org_id,
            &self.operation_id,
            self.event_type,
            self.reason_code,
            self.correlation_id,
            &self.payload_min,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub schema_version: SchemaVersion,
    pub event_id: AuditEventId,
    pub created_at: MonotonicTimeNs,
    pub org_id: Option<String>,
    pub operation_id: String,
    pub event_type: AuditEventType,
    pub reason_code: ReasonCodeId,
    pub severity: AuditSeverity,
    pub correlation_id: CorrelationId,
    pub payload_min: AuditPayloadMin,
}

impl AuditEvent {
    pub fn from_input_v1(
        event_id: AuditEventId,
        input: AuditEventInput,
    ) -> Result<Self, ContractViolation> {
        input.validate()?;
        let e = Self {
            schema_version: AUDIT_CONTRACT_VERSION,
            event_id,
            created_at: input.created_at,
            org_id: input.org_id,
            operation_id: input.operation_id,
            event_type: input.event_type,
            reason_code: input.reason_code,
            severity: input.severity,
            correlation_id: input.correlation_id,
            payload_min: input.payload_min,
        };
        e.validate()?;
        Ok(e)
    }
}

impl Validate for AuditEvent {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != AUDIT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "audit_event.schema_version",
                reason: "must match AUDIT_CONTRACT_VERSION",
            });
        }
        self.event_id.validate()?;
        validate_event_body(
            "audit_event",
            self.created_at,
            &self.org_id,
            &self.operation_id,
            self.event_type,
            self.reason_code,
            self.correlation_id,
            &self.payload_min,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_event_body(
    field: &'static str,
    created_at: MonotonicTimeNs,
    org_id: &Option<String>,
    operation_id: &str,
    event_type: AuditEventType,
    reason_code: ReasonCodeId,
    correlation_id: CorrelationId,
    payload_min: &AuditPayloadMin,
) -> Result<(), ContractViolation> {
    if created_at.0 == 0 {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "created_at must be > 0",
        });
    }
    if let Some(org_id) = org_id {
        validate_id(field, org_id, 64)?;
    }
    validate_id(field, operation_id, 96)?;
    if reason_code.0 == 0 {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "reason_code must be > 0",
        });
    }
    correlation_id.validate()?;
    payload_min.validate()?;
    let allowed = allowed_payload_keys_for_event(event_type);
    for k in payload_min.entries.keys() {
        if !allowed.contains(&k.as_str()) {
            return Err(ContractViolation::InvalidValue {
                field,
                reason: "payload contains unapproved key for this event_type",
            });
        }
    }
    Ok(())
}
