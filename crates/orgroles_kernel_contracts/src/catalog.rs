#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::{is_ascii_lower_snake, validate_id, validate_text};
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const CATALOG_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const POSITION_LEVEL_MAX: i64 = 1_000_000;

pub const CATALOG_CODE_MAX_LEN: usize = 64;
pub const LOCALIZED_TEXT_MAX_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(id.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for OrgId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("org_id", &self.0, 64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionId(String);

impl PositionId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(id.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for PositionId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("position_id", &self.0, 64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinistryGroupId(String);

impl MinistryGroupId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(id.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for MinistryGroupId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("ministry_group_id", &self.0, 64)
    }
}

/// Org-scoped short identifier shared by positions and ministry groups (`[a-z0-9_]+`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CatalogCode(String);

impl CatalogCode {
    pub fn new(code: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(code.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for CatalogCode {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("catalog_code", &self.0, CATALOG_CODE_MAX_LEN)?;
        if !is_ascii_lower_snake(&self.0) {
            return Err(ContractViolation::InvalidValue {
                field: "catalog_code",
                reason: "must be lower_snake_case (a-z0-9_)",
            });
        }
        Ok(())
    }
}

/// Language tag -> text. Stored and returned verbatim; display fallback belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new(entries: BTreeMap<String, String>) -> Result<Self, ContractViolation> {
        let t = Self(entries);
        t.validate()?;
        Ok(t)
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, ContractViolation>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// First entry found among `langs`, else the first entry in key order.
    pub fn first_available(&self, langs: &[&str]) -> Option<&str> {
        langs
            .iter()
            .find_map(|l| self.get(l))
            .or_else(|| self.0.values().next().map(String::as_str))
    }

    pub fn validate_field(&self, field: &'static str, max_len: usize) -> Result<(), ContractViolation> {
        if self.0.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field,
                reason: "must contain at least one language entry",
            });
        }
        if self.0.len() > 16 {
            return Err(ContractViolation::InvalidValue {
                field,
                reason: "must be <= 16 language entries",
            });
        }
        for (lang, text) in &self.0 {
            if lang.is_empty()
                || lang.len() > 16
                || !lang.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-')
            {
                return Err(ContractViolation::InvalidValue {
                    field,
                    reason: "language tag must be 1..=16 chars of [A-Za-z0-9-]",
                });
            }
            validate_text(field, text, max_len)?;
        }
        Ok(())
    }
}

impl Validate for LocalizedText {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.validate_field("localized_text", LOCALIZED_TEXT_MAX_LEN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionGrade {
    Chief,
    Counselor,
    Agent,
    External,
}

impl PositionGrade {
    pub const DISPLAY_ORDER: [PositionGrade; 4] = [
        PositionGrade::Chief,
        PositionGrade::Counselor,
        PositionGrade::Agent,
        PositionGrade::External,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PositionGrade::Chief => "chief",
            PositionGrade::Counselor => "counselor",
            PositionGrade::Agent => "agent",
            PositionGrade::External => "external",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::DISPLAY_ORDER.into_iter().find(|g| g.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Embassy,
    GeneralConsulate,
    Consulate,
    PermanentMission,
    HonoraryConsulate,
    HighCommission,
    ThirdParty,
    Other,
    Custom,
}

impl TemplateType {
    pub const ALL: [TemplateType; 9] = [
        TemplateType::Embassy,
        TemplateType::GeneralConsulate,
        TemplateType::Consulate,
        TemplateType::PermanentMission,
        TemplateType::HonoraryConsulate,
        TemplateType::HighCommission,
        TemplateType::ThirdParty,
        TemplateType::Other,
        TemplateType::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateType::Embassy => "embassy",
            TemplateType::GeneralConsulate => "general_consulate",
            TemplateType::Consulate => "consulate",
            TemplateType::PermanentMission => "permanent_mission",
            TemplateType::HonoraryConsulate => "honorary_consulate",
            TemplateType::HighCommission => "high_commission",
            TemplateType::ThirdParty => "third_party",
            TemplateType::Other => "other",
            TemplateType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRecord {
    pub schema_version: SchemaVersion,
    pub org_id: OrgId,
    pub position_id: PositionId,
    pub code: CatalogCode,
    pub title: LocalizedText,
    pub description: Option<LocalizedText>,
    pub level: u32,
    pub grade: Option<PositionGrade>,
    pub ministry_group_id: Option<MinistryGroupId>,
    pub role_module_codes: Vec<String>,
    pub is_required: bool,
    pub is_active: bool,
    /// Store-wide insertion sequence; breaks level ties for display.
    pub created_seq: u64,
    pub created_at: MonotonicTimeNs,
    pub updated_at: MonotonicTimeNs,
}

impl PositionRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        org_id: OrgId,
        position_id: PositionId,
        code: CatalogCode,
        title: LocalizedText,
        description: Option<LocalizedText>,
        level: u32,
        grade: Option<PositionGrade>,
        ministry_group_id: Option<MinistryGroupId>,
        role_module_codes: Vec<String>,
        is_required: bool,
        is_active: bool,
        created_seq: u64,
        created_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: CATALOG_CONTRACT_VERSION,
            org_id,
            position_id,
            code,
            title,
            description,
            level,
            grade,
            ministry_group_id,
            role_module_codes,
            is_required,
            is_active,
            created_seq,
            created_at,
            updated_at: created_at,
        };
        r.validate()?;
        Ok(r)
    }

    /// Display/ordering key: level first, creation order second.
    pub fn sort_key(&self) -> (u32, u64) {
        (self.level, self.created_seq)
    }
}

impl Validate for PositionRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != CATALOG_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "position_record.schema_version",
                reason: "must match CATALOG_CONTRACT_VERSION",
            });
        }
        self.org_id.validate()?;
        self.position_id.validate()?;
        self.code.validate()?;
        self.title
            .validate_field("position_record.title", LOCALIZED_TEXT_MAX_LEN)?;
        if let Some(d) = &self.description {
            d.validate_field("position_record.description", LOCALIZED_TEXT_MAX_LEN)?;
        }
        if self.level == 0 || i64::from(self.level) > POSITION_LEVEL_MAX {
            return Err(ContractViolation::InvalidRange {
                field: "position_record.level",
                min: 1.0,
                max: POSITION_LEVEL_MAX as f64,
                got: f64::from(self.level),
            });
        }
        if let Some(g) = &self.ministry_group_id {
            g.validate()?;
        }
        validate_module_code_list("position_record.role_module_codes", &self.role_module_codes)?;
        if self.created_seq == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "position_record.created_seq",
                reason: "must be > 0",
            });
        }
        if self.updated_at.0 < self.created_at.0 {
            return Err(ContractViolation::InvalidValue {
                field: "position_record.updated_at",
                reason: "must be >= created_at",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinistryGroupRecord {
    pub schema_version: SchemaVersion,
    pub org_id: OrgId,
    pub group_id: MinistryGroupId,
    pub code: CatalogCode,
    pub label: LocalizedText,
    pub description: Option<LocalizedText>,
    pub icon: Option<String>,
    pub sort_order: i64,
    pub parent_code: Option<CatalogCode>,
    pub is_active: bool,
    pub created_seq: u64,
    pub created_at: MonotonicTimeNs,
}

impl MinistryGroupRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        org_id: OrgId,
        group_id: MinistryGroupId,
        code: CatalogCode,
        label: LocalizedText,
        description: Option<LocalizedText>,
        icon: Option<String>,
        sort_order: i64,
        parent_code: Option<CatalogCode>,
        created_seq: u64,
        created_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: CATALOG_CONTRACT_VERSION,
            org_id,
            group_id,
            code,
            label,
            description,
            icon,
            sort_order,
            parent_code,
            is_active: true,
            created_seq,
            created_at,
        };
        r.validate()?;
        Ok(r)
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_code.is_none()
    }
}

impl Validate for MinistryGroupRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != CATALOG_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "ministry_group_record.schema_version",
                reason: "must match CATALOG_CONTRACT_VERSION",
            });
        }
        self.org_id.validate()?;
        self.group_id.validate()?;
        self.code.validate()?;
        self.label
            .validate_field("ministry_group_record.label", LOCALIZED_TEXT_MAX_LEN)?;
        if let Some(d) = &self.description {
            d.validate_field("ministry_group_record.description", LOCALIZED_TEXT_MAX_LEN)?;
        }
        if let Some(icon) = &self.icon {
            validate_id("ministry_group_record.icon", icon, 64)?;
        }
        if let Some(parent) = &self.parent_code {
            parent.validate()?;
            if parent == &self.code {
                return Err(ContractViolation::InvalidValue {
                    field: "ministry_group_record.parent_code",
                    reason: "must not reference the group itself",
                });
            }
        }
        if self.created_seq == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "ministry_group_record.created_seq",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRoleConfigRecord {
    pub schema_version: SchemaVersion,
    pub org_id: OrgId,
    pub template_type: TemplateType,
    pub is_customized: bool,
    pub initialized_at: MonotonicTimeNs,
}

impl OrgRoleConfigRecord {
    pub fn v1(
        org_id: OrgId,
        template_type: TemplateType,
        initialized_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: CATALOG_CONTRACT_VERSION,
            org_id,
            template_type,
            is_customized: false,
            initialized_at,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for OrgRoleConfigRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != CATALOG_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "org_role_config_record.schema_version",
                reason: "must match CATALOG_CONTRACT_VERSION",
            });
        }
        self.org_id.validate()?;
        if self.initialized_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "org_role_config_record.initialized_at",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// Shape check only: catalog membership is checked by the store against the module registry.
pub fn validate_module_code_list(
    field: &'static str,
    codes: &[String],
) -> Result<(), ContractViolation> {
    if codes.len() > 64 {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be <= 64 entries",
        });
    }
    for c in codes {
        validate_id(field, c, CATALOG_CODE_MAX_LEN)?;
    }
    let distinct: BTreeSet<&str> = codes.iter().map(String::as_str).collect();
    if distinct.len() != codes.len() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not contain duplicates",
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogErrorKind {
    NotFound,
    AlreadyInitialized,
    NotInitialized,
    UnknownTemplate,
    DuplicateCode,
    InvalidModuleCode,
    InvalidLevel,
    InvalidMinistryGroup,
    RequiredPosition,
    InvalidInput,
}

impl CatalogErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogErrorKind::NotFound => "NotFound",
            CatalogErrorKind::AlreadyInitialized => "AlreadyInitialized",
            CatalogErrorKind::NotInitialized => "NotInitialized",
            CatalogErrorKind::UnknownTemplate => "UnknownTemplate",
            CatalogErrorKind::DuplicateCode => "DuplicateCode",
            CatalogErrorKind::InvalidModuleCode => "InvalidModuleCode",
            CatalogErrorKind::InvalidLevel => "InvalidLevel",
            CatalogErrorKind::InvalidMinistryGroup => "InvalidMinistryGroup",
            CatalogErrorKind::RequiredPosition => "RequiredPosition",
            CatalogErrorKind::InvalidInput => "InvalidInput",
        }
    }
}

/// Caller-visible domain failures. Raised before any store write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("organization {org_id} is already initialized")]
    AlreadyInitialized { org_id: String },
    #[error("organization {org_id} is not initialized")]
    NotInitialized { org_id: String },
    #[error("unknown template: {template_type}")]
    UnknownTemplate { template_type: String },
    #[error("{entity} code already exists in organization: {code}")]
    DuplicateCode { entity: &'static str, code: String },
    #[error("invalid role module code {code}: {reason}")]
    InvalidModuleCode { code: String, reason: &'static str },
    #[error("invalid level {level}: must be between 1 and {max}", max = POSITION_LEVEL_MAX)]
    InvalidLevel { level: i64 },
    #[error("invalid ministry group {key}: {reason}")]
    InvalidMinistryGroup { key: String, reason: &'static str },
    #[error("invalid parent ministry group {parent_code}: {reason}")]
    InvalidParent {
        parent_code: String,
        reason: &'static str,
    },
    #[error("position {position_id} is required and can only be removed by a reset")]
    RequiredPosition { position_id: String },
    #[error("invalid input: {0}")]
    InvalidInput(ContractViolation),
}

impl CatalogError {
    pub fn kind(&self) -> CatalogErrorKind {
        match self {
            CatalogError::NotFound { .. } => CatalogErrorKind::NotFound,
            CatalogError::AlreadyInitialized { .. } => CatalogErrorKind::AlreadyInitialized,
            CatalogError::NotInitialized { .. } => CatalogErrorKind::NotInitialized,
            CatalogError::UnknownTemplate { .. } => CatalogErrorKind::UnknownTemplate,
            CatalogError::DuplicateCode { .. } => CatalogErrorKind::DuplicateCode,
            CatalogError::InvalidModuleCode { .. } => CatalogErrorKind::InvalidModuleCode,
            CatalogError::InvalidLevel { .. } => CatalogErrorKind::InvalidLevel,
            CatalogError::InvalidMinistryGroup { .. } | CatalogError::InvalidParent { .. } => {
                CatalogErrorKind::InvalidMinistryGroup
            }
            CatalogError::RequiredPosition { .. } => CatalogErrorKind::RequiredPosition,
            CatalogError::InvalidInput(_) => CatalogErrorKind::InvalidInput,
        }
    }
}

impl From<ContractViolation> for CatalogError {
    fn from(v: ContractViolation) -> Self {
        CatalogError::InvalidInput(v)
    }
}
