#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::audit::CorrelationId;
use crate::catalog::{
    CatalogCode, CatalogErrorKind, LocalizedText, MinistryGroupId, MinistryGroupRecord, OrgId,
    PositionGrade, PositionId, PositionRecord, TemplateType, LOCALIZED_TEXT_MAX_LEN,
};
use crate::common::{validate_id, validate_text};
use crate::{ContractViolation, MonotonicTimeNs, ReasonCodeId, SchemaVersion, Validate};

pub const ORGROLES_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const ORGROLES_OP_001_INITIALIZE: &str = "ORGROLES_OP_001_INITIALIZE";
pub const ORGROLES_OP_002_RESET: &str = "ORGROLES_OP_002_RESET";
pub const ORGROLES_OP_003_CREATE_POSITION: &str = "ORGROLES_OP_003_CREATE_POSITION";
pub const ORGROLES_OP_004_UPDATE_POSITION: &str = "ORGROLES_OP_004_UPDATE_POSITION";
pub const ORGROLES_OP_005_DELETE_POSITION: &str = "ORGROLES_OP_005_DELETE_POSITION";
pub const ORGROLES_OP_006_MOVE_POSITION_LEVEL: &str = "ORGROLES_OP_006_MOVE_POSITION_LEVEL";
pub const ORGROLES_OP_007_CREATE_MINISTRY_GROUP: &str = "ORGROLES_OP_007_CREATE_MINISTRY_GROUP";
pub const ORGROLES_OP_008_DELETE_MINISTRY_GROUP: &str = "ORGROLES_OP_008_DELETE_MINISTRY_GROUP";

/// Three-state patch field: keep, replace, or unset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Set(T),
    Clear,
}

impl<T: Clone> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    pub fn resolve(&self, current: &Option<T>) -> Option<T> {
        match self {
            Patch::Unchanged => current.clone(),
            Patch::Set(v) => Some(v.clone()),
            Patch::Clear => None,
        }
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(v) => Some(v),
            Patch::Unchanged | Patch::Clear => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeRequest {
    pub org_id: OrgId,
    pub template_type: String,
}

impl Validate for InitializeRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()?;
        validate_id("initialize_request.template_type", &self.template_type, 64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    pub org_id: OrgId,
    pub template_type: String,
}

impl Validate for ResetRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()?;
        validate_id("reset_request.template_type", &self.template_type, 64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePositionRequest {
    pub org_id: OrgId,
    pub code: Option<CatalogCode>,
    pub title: LocalizedText,
    pub description: Option<LocalizedText>,
    /// Checked by the store so that out-of-range values surface as `InvalidLevel`.
    pub level: i64,
    pub grade: Option<PositionGrade>,
    pub ministry_group_id: Option<MinistryGroupId>,
    pub role_module_codes: Vec<String>,
    pub is_required: bool,
}

impl Validate for CreatePositionRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()?;
        if let Some(c) = &self.code {
            c.validate()?;
        }
        self.title
            .validate_field("create_position_request.title", LOCALIZED_TEXT_MAX_LEN)?;
        if let Some(d) = &self.description {
            d.validate_field("create_position_request.description", LOCALIZED_TEXT_MAX_LEN)?;
        }
        if let Some(g) = &self.ministry_group_id {
            g.validate()?;
        }
        validate_module_code_count("create_position_request.role_module_codes", &self.role_module_codes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionPatch {
    pub title: Option<LocalizedText>,
    pub description: Patch<LocalizedText>,
    pub level: Option<i64>,
    pub grade: Patch<PositionGrade>,
    pub ministry_group_id: Patch<MinistryGroupId>,
    pub role_module_codes: Option<Vec<String>>,
    pub is_required: Option<bool>,
    pub is_active: Option<bool>,
}

impl PositionPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_unchanged()
            && self.level.is_none()
            && self.grade.is_unchanged()
            && self.ministry_group_id.is_unchanged()
            && self.role_module_codes.is_none()
            && self.is_required.is_none()
            && self.is_active.is_none()
    }
}

impl Validate for PositionPatch {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "position_patch",
                reason: "must change at least one field",
            });
        }
        if let Some(t) = &self.title {
            t.validate_field("position_patch.title", LOCALIZED_TEXT_MAX_LEN)?;
        }
        if let Some(d) = self.description.as_set() {
            d.validate_field("position_patch.description", LOCALIZED_TEXT_MAX_LEN)?;
        }
        if let Some(g) = self.ministry_group_id.as_set() {
            g.validate()?;
        }
        if let Some(codes) = &self.role_module_codes {
            validate_module_code_count("position_patch.role_module_codes", codes)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePositionRequest {
    pub org_id: OrgId,
    pub position_id: PositionId,
    pub patch: PositionPatch,
}

impl Validate for UpdatePositionRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()?;
        self.position_id.validate()?;
        self.patch.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePositionRequest {
    pub org_id: OrgId,
    pub position_id: PositionId,
}

impl Validate for DeletePositionRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()?;
        self.position_id.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePositionLevelRequest {
    pub org_id: OrgId,
    pub position_id: PositionId,
    pub direction: MoveDirection,
}

impl Validate for MovePositionLevelRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()?;
        self.position_id.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMinistryGroupRequest {
    pub org_id: OrgId,
    pub code: Option<CatalogCode>,
    pub label: LocalizedText,
    pub description: Option<LocalizedText>,
    pub icon: Option<String>,
    pub sort_order: i64,
    pub parent_code: Option<CatalogCode>,
}

impl Validate for CreateMinistryGroupRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()?;
        if let Some(c) = &self.code {
            c.validate()?;
        }
        self.label
            .validate_field("create_ministry_group_request.label", LOCALIZED_TEXT_MAX_LEN)?;
        if let Some(d) = &self.description {
            d.validate_field(
                "create_ministry_group_request.description",
                LOCALIZED_TEXT_MAX_LEN,
            )?;
        }
        if let Some(icon) = &self.icon {
            validate_id("create_ministry_group_request.icon", icon, 64)?;
        }
        if let Some(p) = &self.parent_code {
            p.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteMinistryGroupRequest {
    pub org_id: OrgId,
    pub group_id: MinistryGroupId,
}

impl Validate for DeleteMinistryGroupRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()?;
        self.group_id.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgRolesOperation {
    Initialize(InitializeRequest),
    Reset(ResetRequest),
    CreatePosition(CreatePositionRequest),
    UpdatePosition(UpdatePositionRequest),
    DeletePosition(DeletePositionRequest),
    MovePositionLevel(MovePositionLevelRequest),
    CreateMinistryGroup(CreateMinistryGroupRequest),
    DeleteMinistryGroup(DeleteMinistryGroupRequest),
}

impl OrgRolesOperation {
    pub fn operation_id(&self) -> &'static str {
        match self {
            OrgRolesOperation::Initialize(_) => ORGROLES_OP_001_INITIALIZE,
            OrgRolesOperation::Reset(_) => ORGROLES_OP_002_RESET,
            OrgRolesOperation::CreatePosition(_) => ORGROLES_OP_003_CREATE_POSITION,
            OrgRolesOperation::UpdatePosition(_) => ORGROLES_OP_004_UPDATE_POSITION,
            OrgRolesOperation::DeletePosition(_) => ORGROLES_OP_005_DELETE_POSITION,
            OrgRolesOperation::MovePositionLevel(_) => ORGROLES_OP_006_MOVE_POSITION_LEVEL,
            OrgRolesOperation::CreateMinistryGroup(_) => ORGROLES_OP_007_CREATE_MINISTRY_GROUP,
            OrgRolesOperation::DeleteMinistryGroup(_) => ORGROLES_OP_008_DELETE_MINISTRY_GROUP,
        }
    }

    pub fn org_id(&self) -> &OrgId {
        match self {
            OrgRolesOperation::Initialize(r) => &r.org_id,
            OrgRolesOperation::Reset(r) => &r.org_id,
            OrgRolesOperation::CreatePosition(r) => &r.org_id,
            OrgRolesOperation::UpdatePosition(r) => &r.org_id,
            OrgRolesOperation::DeletePosition(r) => &r.org_id,
            OrgRolesOperation::MovePositionLevel(r) => &r.org_id,
            OrgRolesOperation::CreateMinistryGroup(r) => &r.org_id,
            OrgRolesOperation::DeleteMinistryGroup(r) => &r.org_id,
        }
    }

    /// Short lower_snake name used as the audit gate label.
    pub fn gate_name(&self) -> &'static str {
        match self {
            OrgRolesOperation::Initialize(_) => "initialize",
            OrgRolesOperation::Reset(_) => "reset",
            OrgRolesOperation::CreatePosition(_) => "create_position",
            OrgRolesOperation::UpdatePosition(_) => "update_position",
            OrgRolesOperation::DeletePosition(_) => "delete_position",
            OrgRolesOperation::MovePositionLevel(_) => "move_position_level",
            OrgRolesOperation::CreateMinistryGroup(_) => "create_ministry_group",
            OrgRolesOperation::DeleteMinistryGroup(_) => "delete_ministry_group",
        }
    }
}

impl Validate for OrgRolesOperation {
    fn validate(&self) -> Result<(), ContractViolation> {
        match self {
            OrgRolesOperation::Initialize(r) => r.validate(),
            OrgRolesOperation::Reset(r) => r.validate(),
            OrgRolesOperation::CreatePosition(r) => r.validate(),
            OrgRolesOperation::UpdatePosition(r) => r.validate(),
            OrgRolesOperation::DeletePosition(r) => r.validate(),
            OrgRolesOperation::MovePositionLevel(r) => r.validate(),
            OrgRolesOperation::CreateMinistryGroup(r) => r.validate(),
            OrgRolesOperation::DeleteMinistryGroup(r) => r.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRolesRequest {
    pub schema_version: SchemaVersion,
    pub correlation_id: CorrelationId,
    pub now: MonotonicTimeNs,
    pub operation_id: String,
    pub request: OrgRolesOperation,
}

impl OrgRolesRequest {
    pub fn v1(
        correlation_id: CorrelationId,
        now: MonotonicTimeNs,
        request: OrgRolesOperation,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: ORGROLES_CONTRACT_VERSION,
            correlation_id,
            now,
            operation_id: request.operation_id().to_string(),
            request,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for OrgRolesRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != ORGROLES_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "orgroles_request.schema_version",
                reason: "must match ORGROLES_CONTRACT_VERSION",
            });
        }
        self.correlation_id.validate()?;
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "orgroles_request.now",
                reason: "must be > 0",
            });
        }
        if self.operation_id != self.request.operation_id() {
            return Err(ContractViolation::InvalidValue {
                field: "orgroles_request.operation_id",
                reason: "must match request variant operation ID",
            });
        }
        self.request.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateApplyResult {
    pub template_type: TemplateType,
    pub positions_created: u32,
    pub positions_removed: u32,
    pub ministry_groups_created: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMoveResult {
    pub position_id: PositionId,
    pub level_from: u32,
    pub level: u32,
    pub swapped_with: Option<PositionId>,
}

impl PositionMoveResult {
    pub fn swapped(&self) -> bool {
        self.swapped_with.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinistryGroupDeleteResult {
    pub group_id: MinistryGroupId,
    pub positions_unassigned: u32,
    pub groups_promoted: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgRolesOutcome {
    Initialized(TemplateApplyResult),
    Reset(TemplateApplyResult),
    PositionCreated(PositionRecord),
    PositionUpdated(PositionRecord),
    PositionDeleted(PositionId),
    PositionMoved(PositionMoveResult),
    MinistryGroupCreated(MinistryGroupRecord),
    MinistryGroupDeleted(MinistryGroupDeleteResult),
}

impl Validate for OrgRolesOutcome {
    fn validate(&self) -> Result<(), ContractViolation> {
        match self {
            OrgRolesOutcome::Initialized(_) | OrgRolesOutcome::Reset(_) => Ok(()),
            OrgRolesOutcome::PositionCreated(r) | OrgRolesOutcome::PositionUpdated(r) => {
                r.validate()
            }
            OrgRolesOutcome::PositionDeleted(id) => id.validate(),
            OrgRolesOutcome::PositionMoved(m) => {
                m.position_id.validate()?;
                if m.level == 0 {
                    return Err(ContractViolation::InvalidValue {
                        field: "position_move_result.level",
                        reason: "must be > 0",
                    });
                }
                Ok(())
            }
            OrgRolesOutcome::MinistryGroupCreated(g) => g.validate(),
            OrgRolesOutcome::MinistryGroupDeleted(d) => d.group_id.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRolesOk {
    pub schema_version: SchemaVersion,
    pub operation_id: String,
    pub reason_code: ReasonCodeId,
    pub outcome: OrgRolesOutcome,
}

impl OrgRolesOk {
    pub fn v1(
        operation_id: String,
        reason_code: ReasonCodeId,
        outcome: OrgRolesOutcome,
    ) -> Result<Self, ContractViolation> {
        let o = Self {
            schema_version: ORGROLES_CONTRACT_VERSION,
            operation_id,
            reason_code,
            outcome,
        };
        o.validate()?;
        Ok(o)
    }
}

impl Validate for OrgRolesOk {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != ORGROLES_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "orgroles_ok.schema_version",
                reason: "must match ORGROLES_CONTRACT_VERSION",
            });
        }
        validate_id("orgroles_ok.operation_id", &self.operation_id, 96)?;
        if self.reason_code.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "orgroles_ok.reason_code",
                reason: "must be > 0",
            });
        }
        self.outcome.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRolesRefuse {
    pub schema_version: SchemaVersion,
    pub operation_id: String,
    pub kind: CatalogErrorKind,
    pub reason_code: ReasonCodeId,
    pub message: String,
}

impl OrgRolesRefuse {
    pub fn v1(
        operation_id: String,
        kind: CatalogErrorKind,
        reason_code: ReasonCodeId,
        message: String,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: ORGROLES_CONTRACT_VERSION,
            operation_id,
            kind,
            reason_code,
            message,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for OrgRolesRefuse {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != ORGROLES_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "orgroles_refuse.schema_version",
                reason: "must match ORGROLES_CONTRACT_VERSION",
            });
        }
        validate_id("orgroles_refuse.operation_id", &self.operation_id, 96)?;
        if self.reason_code.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "orgroles_refuse.reason_code",
                reason: "must be > 0",
            });
        }
        validate_text("orgroles_refuse.message", &self.message, 512)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgRolesResponse {
    Ok(OrgRolesOk),
    Refuse(OrgRolesRefuse),
}

impl Validate for OrgRolesResponse {
    fn validate(&self) -> Result<(), ContractViolation> {
        match self {
            OrgRolesResponse::Ok(o) => o.validate(),
            OrgRolesResponse::Refuse(r) => r.validate(),
        }
    }
}

/// Only the list size is bounded here; the store decides whether each code is in the catalog.
fn validate_module_code_count(field: &'static str, codes: &[String]) -> Result<(), ContractViolation> {
    if codes.len() > 64 {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be <= 64 entries",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> OrgId {
        OrgId::new("org_1").unwrap()
    }

    #[test]
    fn request_operation_id_must_match_variant() {
        let mut req = OrgRolesRequest::v1(
            CorrelationId(1),
            MonotonicTimeNs(10),
            OrgRolesOperation::Initialize(InitializeRequest {
                org_id: org(),
                template_type: "embassy".to_string(),
            }),
        )
        .unwrap();
        assert_eq!(req.operation_id, ORGROLES_OP_001_INITIALIZE);
        req.operation_id = ORGROLES_OP_002_RESET.to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let req = UpdatePositionRequest {
            org_id: org(),
            position_id: PositionId::new("pos_1").unwrap(),
            patch: PositionPatch::default(),
        };
        assert!(req.validate().is_err());

        let clear_only = UpdatePositionRequest {
            org_id: org(),
            position_id: PositionId::new("pos_1").unwrap(),
            patch: PositionPatch {
                ministry_group_id: Patch::Clear,
                ..PositionPatch::default()
            },
        };
        assert!(clear_only.validate().is_ok());
    }

    #[test]
    fn patch_resolve_distinguishes_clear_from_unchanged() {
        let current = Some(PositionGrade::Chief);
        assert_eq!(Patch::Unchanged.resolve(&current), Some(PositionGrade::Chief));
        assert_eq!(Patch::Clear.resolve(&current), None);
        assert_eq!(
            Patch::Set(PositionGrade::Agent).resolve(&current),
            Some(PositionGrade::Agent)
        );
    }

    #[test]
    fn create_position_request_rejects_blank_title() {
        let req = CreatePositionRequest {
            org_id: org(),
            code: None,
            title: LocalizedText::default(),
            description: None,
            level: 4,
            grade: None,
            ministry_group_id: None,
            role_module_codes: vec!["reception".to_string()],
            is_required: false,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn refuse_requires_message_and_reason_code() {
        assert!(OrgRolesRefuse::v1(
            ORGROLES_OP_005_DELETE_POSITION.to_string(),
            CatalogErrorKind::RequiredPosition,
            ReasonCodeId(0),
            "required".to_string(),
        )
        .is_err());
        assert!(OrgRolesRefuse::v1(
            ORGROLES_OP_005_DELETE_POSITION.to_string(),
            CatalogErrorKind::RequiredPosition,
            ReasonCodeId(5),
            "required".to_string(),
        )
        .is_ok());
    }
}
