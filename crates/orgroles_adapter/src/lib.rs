#![forbid(unsafe_code)]

use std::env;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use orgroles_engines::modules::{self, RoleModuleDefinition};
use orgroles_engines::projection;
use orgroles_engines::tasks::{self, TaskDefinition};
use orgroles_engines::templates::{self, MinistryGroupSeed, SeedPosition};
use orgroles_engines::StaticText;
use orgroles_kernel_contracts::audit::CorrelationId;
use orgroles_kernel_contracts::catalog::{
    CatalogCode, CatalogErrorKind, LocalizedText, MinistryGroupId, MinistryGroupRecord, OrgId,
    OrgRoleConfigRecord, PositionGrade, PositionId, PositionRecord, TemplateType,
};
use orgroles_kernel_contracts::orgroles::{
    CreateMinistryGroupRequest, CreatePositionRequest, DeleteMinistryGroupRequest,
    DeletePositionRequest, InitializeRequest, MoveDirection, MovePositionLevelRequest,
    OrgRolesOperation, OrgRolesOutcome, OrgRolesRequest, OrgRolesResponse, Patch, PositionPatch,
    ResetRequest, UpdatePositionRequest, ORGROLES_CONTRACT_VERSION,
};
use orgroles_kernel_contracts::{ContractViolation, MonotonicTimeNs};
use orgroles_os::orgroles::refuse_reason_code;
use orgroles_os::service::OrgRolesService;
use orgroles_storage::catalog::{OrgRoleFullConfig, StorageError};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, info};

pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";

const ENV_HTTP_BIND: &str = "ORGROLES_HTTP_BIND";
const ENV_BOOTSTRAP: &str = "ORGROLES_BOOTSTRAP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapEntry {
    pub org_id: OrgId,
    pub template_type: TemplateType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub bind: SocketAddr,
    pub bootstrap: Vec<BootstrapEntry>,
}

impl AdapterConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_env_var_map(|key| env::var(key).ok())
    }

    pub fn from_env_var_map<F>(get: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = get(ENV_HTTP_BIND)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|err| format!("invalid {ENV_HTTP_BIND} '{bind_raw}': {err}"))?;
        let bootstrap = match get(ENV_BOOTSTRAP) {
            Some(raw) => parse_bootstrap(&raw)?,
            None => Vec::new(),
        };
        Ok(Self { bind, bootstrap })
    }
}

/// Parses `org_1=embassy,org_2=consulate`. Blank entries are ignored.
pub fn parse_bootstrap(raw: &str) -> Result<Vec<BootstrapEntry>, String> {
    let mut out = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (org, template) = entry
            .split_once('=')
            .ok_or_else(|| format!("invalid {ENV_BOOTSTRAP} entry '{entry}': expected org=template"))?;
        let org_id = OrgId::new(org.trim())
            .map_err(|err| format!("invalid {ENV_BOOTSTRAP} org id '{org}': {err}"))?;
        let template_type = TemplateType::parse(template.trim())
            .ok_or_else(|| format!("invalid {ENV_BOOTSTRAP} template '{template}'"))?;
        out.push(BootstrapEntry {
            org_id,
            template_type,
        });
    }
    Ok(out)
}

// ---- request bodies ----

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateBody {
    pub template_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePositionBody {
    #[serde(default)]
    pub code: Option<String>,
    pub title: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    pub level: i64,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub ministry_group_id: Option<String>,
    #[serde(default)]
    pub role_module_codes: Vec<String>,
    #[serde(default)]
    pub is_required: bool,
}

/// Omitted fields stay unchanged; `null` clears the optional ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePositionBody {
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<LocalizedText>>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub grade: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ministry_group_id: Option<Option<String>>,
    #[serde(default)]
    pub role_module_codes: Option<Vec<String>>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveBody {
    pub direction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMinistryGroupBody {
    #[serde(default)]
    pub code: Option<String>,
    pub label: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub parent_code: Option<String>,
}

// ---- response bodies ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub organizations: usize,
    pub positions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionView {
    pub org_id: String,
    pub position_id: String,
    pub code: String,
    pub title: LocalizedText,
    pub description: Option<LocalizedText>,
    pub level: u32,
    pub grade: Option<PositionGrade>,
    pub ministry_group_id: Option<String>,
    pub role_module_codes: Vec<String>,
    pub is_required: bool,
    pub is_active: bool,
    pub created_at_ns: u64,
    pub updated_at_ns: u64,
}

impl From<&PositionRecord> for PositionView {
    fn from(p: &PositionRecord) -> Self {
        Self {
            org_id: p.org_id.as_str().to_string(),
            position_id: p.position_id.as_str().to_string(),
            code: p.code.as_str().to_string(),
            title: p.title.clone(),
            description: p.description.clone(),
            level: p.level,
            grade: p.grade,
            ministry_group_id: p.ministry_group_id.as_ref().map(|g| g.as_str().to_string()),
            role_module_codes: p.role_module_codes.clone(),
            is_required: p.is_required,
            is_active: p.is_active,
            created_at_ns: p.created_at.0,
            updated_at_ns: p.updated_at.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinistryGroupView {
    pub group_id: String,
    pub code: String,
    pub label: LocalizedText,
    pub description: Option<LocalizedText>,
    pub icon: Option<String>,
    pub sort_order: i64,
    pub parent_code: Option<String>,
    pub is_active: bool,
}

impl From<&MinistryGroupRecord> for MinistryGroupView {
    fn from(g: &MinistryGroupRecord) -> Self {
        Self {
            group_id: g.group_id.as_str().to_string(),
            code: g.code.as_str().to_string(),
            label: g.label.clone(),
            description: g.description.clone(),
            icon: g.icon.clone(),
            sort_order: g.sort_order,
            parent_code: g.parent_code.as_ref().map(|c| c.as_str().to_string()),
            is_active: g.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgConfigView {
    pub template_type: TemplateType,
    pub is_customized: bool,
    pub initialized_at_ns: u64,
}

impl From<&OrgRoleConfigRecord> for OrgConfigView {
    fn from(c: &OrgRoleConfigRecord) -> Self {
        Self {
            template_type: c.template_type,
            is_customized: c.is_customized,
            initialized_at_ns: c.initialized_at.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullConfigResponse {
    pub org_id: String,
    pub config: Option<OrgConfigView>,
    pub positions: Vec<PositionView>,
    pub ministry_groups: Vec<MinistryGroupView>,
    pub role_modules: Vec<RoleModuleDefinition>,
}

impl From<&OrgRoleFullConfig> for FullConfigResponse {
    fn from(full: &OrgRoleFullConfig) -> Self {
        Self {
            org_id: full.org_id.as_str().to_string(),
            config: full.config.as_ref().map(OrgConfigView::from),
            positions: full.positions.iter().map(PositionView::from).collect(),
            ministry_groups: full.ministry_groups.iter().map(MinistryGroupView::from).collect(),
            role_modules: full.role_modules.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateView {
    pub template_type: TemplateType,
    pub label: StaticText,
    pub description: StaticText,
    pub icon: &'static str,
    pub positions: Vec<SeedPosition>,
    pub ministry_groups: Vec<MinistryGroupSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCategoryView {
    pub code: &'static str,
    pub label: Option<StaticText>,
    pub icon: Option<&'static str>,
    pub tasks: Vec<TaskDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionTasksResponse {
    pub position_id: String,
    pub role_module_codes: Vec<String>,
    pub tasks: Vec<TaskDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeBucketView {
    pub grade: PositionGrade,
    pub count: usize,
    pub positions: Vec<PositionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinistryBucketView {
    /// `None` is the unassigned bucket.
    pub group: Option<MinistryGroupView>,
    pub count: usize,
    pub positions: Vec<PositionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinistryViewResponse {
    pub buckets: Vec<MinistryBucketView>,
    pub positions_in_nested_groups: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomeView {
    Initialized {
        template_type: TemplateType,
        positions_created: u32,
        positions_removed: u32,
        ministry_groups_created: u32,
    },
    Reset {
        template_type: TemplateType,
        positions_created: u32,
        positions_removed: u32,
        ministry_groups_created: u32,
    },
    PositionCreated {
        position: PositionView,
    },
    PositionUpdated {
        position: PositionView,
    },
    PositionDeleted {
        position_id: String,
    },
    PositionMoved {
        position_id: String,
        level_from: u32,
        level: u32,
        swapped_with: Option<String>,
    },
    MinistryGroupCreated {
        group: MinistryGroupView,
    },
    MinistryGroupDeleted {
        group_id: String,
        positions_unassigned: u32,
        groups_promoted: u32,
    },
}

impl From<&OrgRolesOutcome> for OutcomeView {
    fn from(outcome: &OrgRolesOutcome) -> Self {
        match outcome {
            OrgRolesOutcome::Initialized(r) => OutcomeView::Initialized {
                template_type: r.template_type,
                positions_created: r.positions_created,
                positions_removed: r.positions_removed,
                ministry_groups_created: r.ministry_groups_created,
            },
            OrgRolesOutcome::Reset(r) => OutcomeView::Reset {
                template_type: r.template_type,
                positions_created: r.positions_created,
                positions_removed: r.positions_removed,
                ministry_groups_created: r.ministry_groups_created,
            },
            OrgRolesOutcome::PositionCreated(p) => OutcomeView::PositionCreated {
                position: PositionView::from(p),
            },
            OrgRolesOutcome::PositionUpdated(p) => OutcomeView::PositionUpdated {
                position: PositionView::from(p),
            },
            OrgRolesOutcome::PositionDeleted(id) => OutcomeView::PositionDeleted {
                position_id: id.as_str().to_string(),
            },
            OrgRolesOutcome::PositionMoved(m) => OutcomeView::PositionMoved {
                position_id: m.position_id.as_str().to_string(),
                level_from: m.level_from,
                level: m.level,
                swapped_with: m.swapped_with.as_ref().map(|id| id.as_str().to_string()),
            },
            OrgRolesOutcome::MinistryGroupCreated(g) => OutcomeView::MinistryGroupCreated {
                group: MinistryGroupView::from(g),
            },
            OrgRolesOutcome::MinistryGroupDeleted(d) => OutcomeView::MinistryGroupDeleted {
                group_id: d.group_id.as_str().to_string(),
                positions_unassigned: d.positions_unassigned,
                groups_promoted: d.groups_promoted,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResponse {
    pub status: String,
    pub operation_id: String,
    pub reason_code: u32,
    pub outcome: OutcomeView,
}

// ---- errors ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub kind: String,
    pub reason_code: Option<u32>,
    pub message: String,
}

/// HTTP status plus JSON error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, kind: &str, reason_code: Option<u32>, message: String) -> Self {
        Self {
            status,
            body: ErrorBody {
                status: status.as_u16(),
                kind: kind.to_string(),
                reason_code,
                message,
            },
        }
    }

    pub fn refused(kind: CatalogErrorKind, message: String) -> Self {
        Self::new(
            status_for_kind(kind),
            kind.as_str(),
            Some(refuse_reason_code(kind).0),
            message,
        )
    }

    pub fn malformed(message: String) -> Self {
        Self::refused(CatalogErrorKind::InvalidInput, message)
    }

    pub fn storage(err: &StorageError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "StorageFailure",
            None,
            err.to_string(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::malformed(rejection.body_text())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Catalog(e) => ApiError::refused(e.kind(), e.to_string()),
            other => {
                error!(error = %other, "org roles storage failure");
                ApiError::storage(&other)
            }
        }
    }
}

pub fn status_for_kind(kind: CatalogErrorKind) -> StatusCode {
    match kind {
        CatalogErrorKind::NotFound | CatalogErrorKind::NotInitialized => StatusCode::NOT_FOUND,
        CatalogErrorKind::AlreadyInitialized
        | CatalogErrorKind::DuplicateCode
        | CatalogErrorKind::RequiredPosition => StatusCode::CONFLICT,
        CatalogErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        CatalogErrorKind::UnknownTemplate
        | CatalogErrorKind::InvalidModuleCode
        | CatalogErrorKind::InvalidLevel
        | CatalogErrorKind::InvalidMinistryGroup => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

// ---- runtime ----

/// Transport facade over the org roles service. Safe to share across handler tasks.
#[derive(Debug)]
pub struct AdapterRuntime {
    service: OrgRolesService,
    next_correlation_id: AtomicU64,
}

impl Default for AdapterRuntime {
    fn default() -> Self {
        Self::new(OrgRolesService::new())
    }
}

impl AdapterRuntime {
    pub fn new(service: OrgRolesService) -> Self {
        Self {
            service,
            next_correlation_id: AtomicU64::new(1),
        }
    }

    pub fn service(&self) -> &OrgRolesService {
        &self.service
    }

    /// Initializes each listed organization that has no configuration yet.
    pub fn bootstrap(&self, entries: &[BootstrapEntry]) -> Result<u32, String> {
        let mut initialized = 0;
        for entry in entries {
            let existing = self
                .service
                .full_config(&entry.org_id)
                .map_err(|err| err.to_string())?;
            if existing.config.is_some() {
                info!(
                    org_id = %entry.org_id.as_str(),
                    "bootstrap skipped, organization already initialized"
                );
                continue;
            }
            self.initialize(
                entry.org_id.as_str(),
                TemplateBody {
                    template_type: entry.template_type.as_str().to_string(),
                },
            )
            .map_err(|err| {
                format!(
                    "bootstrap of {} failed: {} {}",
                    entry.org_id.as_str(),
                    err.body.kind,
                    err.body.message
                )
            })?;
            initialized += 1;
        }
        Ok(initialized)
    }

    pub fn health(&self) -> Result<HealthResponse, ApiError> {
        let positions = self.service.list_all_positions()?;
        Ok(HealthResponse {
            status: "ok".to_string(),
            organizations: self.service.initialized_org_count()?,
            positions: positions.len(),
        })
    }

    pub fn list_templates(&self) -> Vec<TemplateView> {
        templates::list_templates()
            .iter()
            .map(|t| TemplateView {
                template_type: t.template_type,
                label: t.label,
                description: t.description,
                icon: t.icon,
                positions: t.seed_positions().into_iter().copied().collect(),
                ministry_groups: t.ministry_groups.to_vec(),
            })
            .collect()
    }

    pub fn list_role_modules(&self) -> Vec<RoleModuleDefinition> {
        modules::list_role_modules().to_vec()
    }

    pub fn list_tasks(&self) -> Vec<TaskCategoryView> {
        tasks::tasks_by_category()
            .into_iter()
            .map(|(code, defs)| {
                let category = tasks::task_category(code);
                TaskCategoryView {
                    code,
                    label: category.map(|c| c.label),
                    icon: category.map(|c| c.icon),
                    tasks: defs.into_iter().copied().collect(),
                }
            })
            .collect()
    }

    pub fn list_all_positions(&self) -> Result<Vec<PositionView>, ApiError> {
        Ok(self
            .service
            .list_all_positions()?
            .iter()
            .map(PositionView::from)
            .collect())
    }

    pub fn full_config(&self, org_id: &str) -> Result<FullConfigResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        Ok(FullConfigResponse::from(&self.service.full_config(&org_id)?))
    }

    pub fn grade_view(&self, org_id: &str) -> Result<Vec<GradeBucketView>, ApiError> {
        let org_id = parse_org_id(org_id)?;
        let full = self.service.full_config(&org_id)?;
        Ok(projection::by_grade(&full.positions)
            .into_iter()
            .map(|b| GradeBucketView {
                grade: b.grade,
                count: b.count(),
                positions: b.positions.into_iter().map(PositionView::from).collect(),
            })
            .collect())
    }

    pub fn ministry_view(&self, org_id: &str) -> Result<MinistryViewResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        let full = self.service.full_config(&org_id)?;
        let view = projection::by_ministry(&full.positions, &full.ministry_groups);
        Ok(MinistryViewResponse {
            positions_in_nested_groups: view.positions_in_nested_groups,
            buckets: view
                .buckets
                .into_iter()
                .map(|b| MinistryBucketView {
                    group: b.group.map(MinistryGroupView::from),
                    count: b.count(),
                    positions: b.positions.into_iter().map(PositionView::from).collect(),
                })
                .collect(),
        })
    }

    pub fn position_tasks(
        &self,
        org_id: &str,
        position_id: &str,
    ) -> Result<PositionTasksResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        let position_id = parse_position_id(position_id)?;
        let rec = self.service.position(&org_id, &position_id)?;
        let tasks = self.service.position_tasks(&org_id, &position_id)?;
        Ok(PositionTasksResponse {
            position_id: rec.position_id.as_str().to_string(),
            role_module_codes: rec.role_module_codes,
            tasks: tasks.into_iter().copied().collect(),
        })
    }

    pub fn initialize(&self, org_id: &str, body: TemplateBody) -> Result<OperationResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        self.execute(OrgRolesOperation::Initialize(InitializeRequest {
            org_id,
            template_type: body.template_type,
        }))
    }

    pub fn reset(&self, org_id: &str, body: TemplateBody) -> Result<OperationResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        self.execute(OrgRolesOperation::Reset(ResetRequest {
            org_id,
            template_type: body.template_type,
        }))
    }

    pub fn create_position(
        &self,
        org_id: &str,
        body: CreatePositionBody,
    ) -> Result<OperationResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        self.execute(OrgRolesOperation::CreatePosition(CreatePositionRequest {
            org_id,
            code: body.code.as_deref().map(parse_code).transpose()?,
            title: body.title,
            description: body.description,
            level: body.level,
            grade: body.grade.as_deref().map(parse_grade).transpose()?,
            ministry_group_id: body
                .ministry_group_id
                .as_deref()
                .map(parse_group_id)
                .transpose()?,
            role_module_codes: body.role_module_codes,
            is_required: body.is_required,
        }))
    }

    pub fn update_position(
        &self,
        org_id: &str,
        position_id: &str,
        body: UpdatePositionBody,
    ) -> Result<OperationResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        let position_id = parse_position_id(position_id)?;
        let patch = PositionPatch {
            title: body.title,
            description: to_patch(body.description, Ok)?,
            level: body.level,
            grade: to_patch(body.grade, |g| parse_grade(&g))?,
            ministry_group_id: to_patch(body.ministry_group_id, |g| parse_group_id(&g))?,
            role_module_codes: body.role_module_codes,
            is_required: body.is_required,
            is_active: body.is_active,
        };
        self.execute(OrgRolesOperation::UpdatePosition(UpdatePositionRequest {
            org_id,
            position_id,
            patch,
        }))
    }

    pub fn delete_position(
        &self,
        org_id: &str,
        position_id: &str,
    ) -> Result<OperationResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        let position_id = parse_position_id(position_id)?;
        self.execute(OrgRolesOperation::DeletePosition(DeletePositionRequest {
            org_id,
            position_id,
        }))
    }

    pub fn move_position_level(
        &self,
        org_id: &str,
        position_id: &str,
        body: MoveBody,
    ) -> Result<OperationResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        let position_id = parse_position_id(position_id)?;
        let direction = match body.direction.trim().to_ascii_lowercase().as_str() {
            "up" => MoveDirection::Up,
            "down" => MoveDirection::Down,
            other => {
                return Err(ApiError::malformed(format!(
                    "direction must be 'up' or 'down', got '{other}'"
                )))
            }
        };
        self.execute(OrgRolesOperation::MovePositionLevel(
            MovePositionLevelRequest {
                org_id,
                position_id,
                direction,
            },
        ))
    }

    pub fn create_ministry_group(
        &self,
        org_id: &str,
        body: CreateMinistryGroupBody,
    ) -> Result<OperationResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        self.execute(OrgRolesOperation::CreateMinistryGroup(
            CreateMinistryGroupRequest {
                org_id,
                code: body.code.as_deref().map(parse_code).transpose()?,
                label: body.label,
                description: body.description,
                icon: body.icon,
                sort_order: body.sort_order,
                parent_code: body.parent_code.as_deref().map(parse_code).transpose()?,
            },
        ))
    }

    pub fn delete_ministry_group(
        &self,
        org_id: &str,
        group_id: &str,
    ) -> Result<OperationResponse, ApiError> {
        let org_id = parse_org_id(org_id)?;
        let group_id = parse_group_id(group_id)?;
        self.execute(OrgRolesOperation::DeleteMinistryGroup(
            DeleteMinistryGroupRequest { org_id, group_id },
        ))
    }

    fn execute(&self, op: OrgRolesOperation) -> Result<OperationResponse, ApiError> {
        // Body validation is left to the runtime so malformed bodies are refused and audited.
        let req = OrgRolesRequest {
            schema_version: ORGROLES_CONTRACT_VERSION,
            correlation_id: CorrelationId(
                self.next_correlation_id.fetch_add(1, Ordering::Relaxed) as u128,
            ),
            now: MonotonicTimeNs(system_time_now_ns()),
            operation_id: op.operation_id().to_string(),
            request: op,
        };
        match self.service.execute(&req)? {
            OrgRolesResponse::Ok(ok) => Ok(OperationResponse {
                status: "ok".to_string(),
                operation_id: ok.operation_id,
                reason_code: ok.reason_code.0,
                outcome: OutcomeView::from(&ok.outcome),
            }),
            OrgRolesResponse::Refuse(r) => Err(ApiError::refused(r.kind, r.message)),
        }
    }
}

fn to_patch<T, U, F>(field: Option<Option<T>>, convert: F) -> Result<Patch<U>, ApiError>
where
    F: FnOnce(T) -> Result<U, ApiError>,
{
    match field {
        None => Ok(Patch::Unchanged),
        Some(None) => Ok(Patch::Clear),
        Some(Some(v)) => convert(v).map(Patch::Set),
    }
}

fn invalid(err: ContractViolation) -> ApiError {
    ApiError::malformed(err.to_string())
}

fn parse_org_id(raw: &str) -> Result<OrgId, ApiError> {
    OrgId::new(raw.trim()).map_err(invalid)
}

fn parse_position_id(raw: &str) -> Result<PositionId, ApiError> {
    PositionId::new(raw.trim()).map_err(invalid)
}

fn parse_group_id(raw: &str) -> Result<MinistryGroupId, ApiError> {
    MinistryGroupId::new(raw.trim()).map_err(invalid)
}

fn parse_code(raw: &str) -> Result<CatalogCode, ApiError> {
    CatalogCode::new(raw.trim()).map_err(invalid)
}

fn parse_grade(raw: &str) -> Result<PositionGrade, ApiError> {
    PositionGrade::parse(raw.trim())
        .ok_or_else(|| ApiError::malformed(format!("unknown grade '{raw}'")))
}

fn system_time_now_ns() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(1);
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos.max(1) as u64
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use orgroles_os::orgroles::reason_codes;

    use super::*;

    fn title(fr: &str) -> LocalizedText {
        LocalizedText::from_pairs([("fr", fr)]).unwrap()
    }

    fn create_body(fr: &str, level: i64) -> CreatePositionBody {
        CreatePositionBody {
            code: None,
            title: title(fr),
            description: None,
            level,
            grade: None,
            ministry_group_id: None,
            role_module_codes: vec!["consultation".to_string()],
            is_required: false,
        }
    }

    fn template(t: &str) -> TemplateBody {
        TemplateBody {
            template_type: t.to_string(),
        }
    }

    fn created_position(resp: OperationResponse) -> PositionView {
        match resp.outcome {
            OutcomeView::PositionCreated { position } => position,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn config_defaults_and_bootstrap_parsing() {
        let empty = AdapterConfig::from_env_var_map(|_| None).unwrap();
        assert_eq!(empty.bind.to_string(), DEFAULT_HTTP_BIND);
        assert!(empty.bootstrap.is_empty());

        let vars: BTreeMap<&str, &str> = [
            ("ORGROLES_HTTP_BIND", "0.0.0.0:9090"),
            ("ORGROLES_BOOTSTRAP", " org_1=embassy, ,org_2=consulate "),
        ]
        .into_iter()
        .collect();
        let cfg = AdapterConfig::from_env_var_map(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.bind.port(), 9090);
        assert_eq!(cfg.bootstrap.len(), 2);
        assert_eq!(cfg.bootstrap[1].org_id.as_str(), "org_2");
        assert_eq!(cfg.bootstrap[1].template_type, TemplateType::Consulate);
    }

    #[test]
    fn malformed_bootstrap_fails_startup() {
        assert!(parse_bootstrap("org_1").is_err());
        assert!(parse_bootstrap("org_1=villa").is_err());
        assert!(parse_bootstrap("=embassy").is_err());
        assert!(AdapterConfig::from_env_var_map(|k| {
            (k == "ORGROLES_HTTP_BIND").then(|| "not-an-addr".to_string())
        })
        .is_err());
    }

    #[test]
    fn bootstrap_skips_initialized_orgs() {
        let rt = AdapterRuntime::default();
        let entries = parse_bootstrap("org_1=embassy,org_2=honorary_consulate").unwrap();
        assert_eq!(rt.bootstrap(&entries).unwrap(), 2);
        assert_eq!(rt.bootstrap(&entries).unwrap(), 0);
        let health = rt.health().unwrap();
        assert_eq!(health.organizations, 2);
        assert_eq!(health.positions, 14);
    }

    #[test]
    fn health_counts_initialized_orgs_without_positions() {
        let rt = AdapterRuntime::default();
        rt.initialize("org_1", template("custom")).unwrap();
        assert!(rt.create_position("org_2", create_body("Attaché", 3)).is_err());
        rt.initialize("org_3", template("embassy")).unwrap();

        let health = rt.health().unwrap();
        assert_eq!(health.organizations, 2);
        assert_eq!(health.positions, 11);
    }

    #[test]
    fn refusals_map_to_http_status() {
        let rt = AdapterRuntime::default();
        let err = rt.create_position("org_1", create_body("Attaché", 3)).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body.kind, "NotFound");

        rt.initialize("org_1", template("embassy")).unwrap();
        let err = rt.initialize("org_1", template("embassy")).unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(
            err.body.reason_code,
            Some(reason_codes::ORGROLES_REFUSE_ALREADY_INITIALIZED.0)
        );

        let err = rt.create_position("org_1", create_body("Attaché", 0)).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.body.kind, "InvalidLevel");

        let err = rt.create_position("org_1", create_body("???", 3)).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.kind, "InvalidInput");

        let err = rt.reset("org_2", template("embassy")).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body.kind, "NotInitialized");

        let err = rt
            .move_position_level(
                "org_1",
                "pos_x",
                MoveBody {
                    direction: "sideways".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn every_kind_has_a_status() {
        for kind in [
            CatalogErrorKind::NotFound,
            CatalogErrorKind::AlreadyInitialized,
            CatalogErrorKind::NotInitialized,
            CatalogErrorKind::UnknownTemplate,
            CatalogErrorKind::DuplicateCode,
            CatalogErrorKind::InvalidModuleCode,
            CatalogErrorKind::InvalidLevel,
            CatalogErrorKind::InvalidMinistryGroup,
            CatalogErrorKind::RequiredPosition,
            CatalogErrorKind::InvalidInput,
        ] {
            let status = status_for_kind(kind);
            assert!(status.is_client_error(), "{kind:?} -> {status}");
        }
        let err = ApiError::from(StorageError::Unavailable {
            reason: "lock poisoned".to_string(),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.reason_code, None);
    }

    #[test]
    fn update_body_distinguishes_absent_and_null() {
        let body: UpdatePositionBody =
            serde_json::from_str(r#"{"grade": null, "level": 4}"#).unwrap();
        assert_eq!(body.grade, Some(None));
        assert_eq!(body.description, None);
        assert_eq!(body.level, Some(4));

        let body: UpdatePositionBody =
            serde_json::from_str(r#"{"grade": "chief", "ministry_group_id": null}"#).unwrap();
        assert_eq!(body.grade, Some(Some("chief".to_string())));
        assert_eq!(body.ministry_group_id, Some(None));
    }

    #[test]
    fn position_lifecycle_through_runtime() {
        let rt = AdapterRuntime::default();
        rt.initialize("org_1", template("custom")).unwrap();

        let a = created_position(rt.create_position("org_1", create_body("Analyste", 2)).unwrap());
        let b = created_position(rt.create_position("org_1", create_body("Archiviste", 5)).unwrap());
        assert_eq!(a.code, "analyste");

        let patched = rt
            .update_position(
                "org_1",
                &a.position_id,
                serde_json::from_str(r#"{"grade": "counselor"}"#).unwrap(),
            )
            .unwrap();
        match patched.outcome {
            OutcomeView::PositionUpdated { position } => {
                assert_eq!(position.grade, Some(PositionGrade::Counselor))
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let moved = rt
            .move_position_level(
                "org_1",
                &b.position_id,
                MoveBody {
                    direction: "up".to_string(),
                },
            )
            .unwrap();
        assert_eq!(
            moved.reason_code,
            reason_codes::ORGROLES_OK_MOVE_POSITION_LEVEL.0
        );
        match moved.outcome {
            OutcomeView::PositionMoved {
                level_from,
                level,
                swapped_with,
                ..
            } => {
                assert_eq!((level_from, level), (5, 2));
                assert_eq!(swapped_with.as_deref(), Some(a.position_id.as_str()));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let grades = rt.grade_view("org_1").unwrap();
        assert_eq!(grades.len(), 4);
        assert_eq!(grades[1].grade, PositionGrade::Counselor);
        assert_eq!(grades[1].count, 1);
        assert_eq!(grades[2].count, 1);

        let tasks = rt.position_tasks("org_1", &b.position_id).unwrap();
        assert!(tasks.tasks.iter().all(|t| !t.code.is_empty()));
        assert!(!tasks.tasks.is_empty());

        rt.delete_position("org_1", &a.position_id).unwrap();
        let full = rt.full_config("org_1").unwrap();
        assert_eq!(full.positions.len(), 1);
        assert!(full.config.unwrap().is_customized);
    }

    #[test]
    fn ministry_view_and_group_lifecycle() {
        let rt = AdapterRuntime::default();
        rt.initialize("org_1", template("embassy")).unwrap();

        let view = rt.ministry_view("org_1").unwrap();
        let codes: Vec<Option<&str>> = view
            .buckets
            .iter()
            .map(|b| b.group.as_ref().map(|g| g.code.as_str()))
            .collect();
        assert_eq!(
            codes,
            vec![
                Some("presidence"),
                Some("mae"),
                Some("finances"),
                Some("defense"),
                Some("interieur"),
                None,
            ]
        );
        assert_eq!(view.positions_in_nested_groups, 2);

        let body: CreateMinistryGroupBody =
            serde_json::from_str(r#"{"label": {"fr": "Culture"}, "sort_order": 8}"#).unwrap();
        let created = rt.create_ministry_group("org_1", body).unwrap();
        let group_id = match created.outcome {
            OutcomeView::MinistryGroupCreated { group } => {
                assert_eq!(group.code, "culture");
                group.group_id
            }
            other => panic!("unexpected outcome: {other:?}"),
        };
        rt.delete_ministry_group("org_1", &group_id).unwrap();
        let err = rt.delete_ministry_group("org_1", &group_id).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(!rt.full_config("org_1").unwrap().config.unwrap().is_customized);
    }

    #[test]
    fn catalogs_are_listed() {
        let rt = AdapterRuntime::default();
        assert_eq!(rt.list_templates().len(), 9);
        assert_eq!(rt.list_role_modules().len(), 14);
        let categories = rt.list_tasks();
        assert!(categories.iter().all(|c| c.label.is_some()));
        let total: usize = categories.iter().map(|c| c.tasks.len()).sum();
        assert_eq!(total, tasks::list_tasks().len());
    }
}
