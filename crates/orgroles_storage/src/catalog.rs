#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use orgroles_engines::codes::{derive_code, disambiguate, OrgRolesConfig};
use orgroles_engines::modules::{self, RoleModuleDefinition};
use orgroles_engines::templates::{self, OrganizationTemplate};
use orgroles_kernel_contracts::audit::{AuditEvent, AuditEventId, AuditEventInput, CorrelationId};
use orgroles_kernel_contracts::catalog::{
    CatalogCode, CatalogError, MinistryGroupId, MinistryGroupRecord, OrgId, OrgRoleConfigRecord,
    PositionId, PositionRecord, POSITION_LEVEL_MAX,
};
use orgroles_kernel_contracts::orgroles::{
    CreateMinistryGroupRequest, CreatePositionRequest, MinistryGroupDeleteResult, MoveDirection,
    PositionMoveResult, TemplateApplyResult, UpdatePositionRequest,
};
use orgroles_kernel_contracts::{ContractViolation, MonotonicTimeNs, Validate};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("foreign key violation on {table}: {key}")]
    ForeignKeyViolation { table: &'static str, key: String },
    #[error("duplicate key on {table}: {key}")]
    DuplicateKey { table: &'static str, key: String },
    #[error("append-only violation on {table}")]
    AppendOnlyViolation { table: &'static str },
    #[error("contract violation: {0}")]
    ContractViolation(ContractViolation),
    /// Caller-visible domain refusal. Everything else is a storage failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("catalog store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<ContractViolation> for StorageError {
    fn from(v: ContractViolation) -> Self {
        StorageError::ContractViolation(v)
    }
}

/// Consistent read of one organization's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRoleFullConfig {
    pub org_id: OrgId,
    pub config: Option<OrgRoleConfigRecord>,
    /// Ordered by `(level, created_seq)`.
    pub positions: Vec<PositionRecord>,
    /// Ordered by `(sort_order, code)`.
    pub ministry_groups: Vec<MinistryGroupRecord>,
    pub role_modules: &'static [RoleModuleDefinition],
}

impl OrgRoleFullConfig {
    /// Snapshot of an organization nothing has been written for.
    pub fn uninitialized(org_id: OrgId) -> Self {
        Self {
            org_id,
            config: None,
            positions: Vec::new(),
            ministry_groups: Vec::new(),
            role_modules: modules::list_role_modules(),
        }
    }
}

fn derived_id(prefix: &str, org_id: &OrgId, code: &CatalogCode, seq: u64) -> String {
    let mut h = Sha256::new();
    h.update(org_id.as_str().as_bytes());
    h.update(b":");
    h.update(code.as_str().as_bytes());
    h.update(b":");
    h.update(seq.to_be_bytes());
    let digest = h.finalize();
    let hex: String = digest.iter().take(12).map(|b| format!("{b:02x}")).collect();
    format!("{prefix}_{hex}")
}

fn resolve_template(name: &str) -> Result<&'static OrganizationTemplate, CatalogError> {
    templates::template_by_name(name).ok_or_else(|| CatalogError::UnknownTemplate {
        template_type: name.to_string(),
    })
}

fn check_level(level: i64) -> Result<u32, CatalogError> {
    if level <= 0 || level > POSITION_LEVEL_MAX {
        return Err(CatalogError::InvalidLevel { level });
    }
    u32::try_from(level).map_err(|_| CatalogError::InvalidLevel { level })
}

fn check_modules(codes: &[String]) -> Result<(), CatalogError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for c in codes {
        if !seen.insert(c.as_str()) {
            return Err(CatalogError::InvalidModuleCode {
                code: c.clone(),
                reason: "listed more than once",
            });
        }
        if !modules::is_known_module(c) {
            return Err(CatalogError::InvalidModuleCode {
                code: c.clone(),
                reason: "not in the role module catalog",
            });
        }
    }
    Ok(())
}

fn touched_at(now: MonotonicTimeNs, created_at: MonotonicTimeNs) -> MonotonicTimeNs {
    MonotonicTimeNs(now.0.max(created_at.0))
}

/// In-memory catalog tables. Every mutation validates fully before its first write.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    config: OrgRolesConfig,
    org_configs: BTreeMap<OrgId, OrgRoleConfigRecord>,
    positions: BTreeMap<(OrgId, PositionId), PositionRecord>,
    ministry_groups: BTreeMap<(OrgId, MinistryGroupId), MinistryGroupRecord>,
    next_seq: u64,

    audit_events: Vec<AuditEvent>,
    next_audit_event_id: u64,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new_in_memory()
    }
}

impl CatalogStore {
    pub fn new_in_memory() -> Self {
        Self::with_config(OrgRolesConfig::mvp_v1())
    }

    pub fn with_config(config: OrgRolesConfig) -> Self {
        Self {
            config,
            org_configs: BTreeMap::new(),
            positions: BTreeMap::new(),
            ministry_groups: BTreeMap::new(),
            next_seq: 1,
            audit_events: Vec::new(),
            next_audit_event_id: 1,
        }
    }

    // ------------------------
    // Template lifecycle
    // ------------------------

    pub fn initialize(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        template_type: &str,
    ) -> Result<TemplateApplyResult, StorageError> {
        if self.org_configs.contains_key(org_id) {
            return Err(CatalogError::AlreadyInitialized {
                org_id: org_id.as_str().to_string(),
            }
            .into());
        }
        let tpl = resolve_template(template_type)?;
        let config = OrgRoleConfigRecord::v1(org_id.clone(), tpl.template_type, now)?;

        let mut seq = self.next_seq;

        // Seed groups whose code the org does not already use; positions link to either.
        let mut group_ids: BTreeMap<String, MinistryGroupId> = self
            .ministry_groups_for_org(org_id)
            .into_iter()
            .map(|g| (g.code.as_str().to_string(), g.group_id.clone()))
            .collect();
        let mut new_groups: Vec<MinistryGroupRecord> = Vec::new();
        for g in tpl.ministry_groups {
            if group_ids.contains_key(g.code) {
                continue;
            }
            let code = CatalogCode::new(g.code)?;
            let parent_code = match g.parent_code {
                Some(p) => {
                    let parent = CatalogCode::new(p)?;
                    let parent_is_top_level = self
                        .group_by_code(org_id, &parent)
                        .map(MinistryGroupRecord::is_top_level)
                        .or_else(|| {
                            new_groups
                                .iter()
                                .find(|n| n.code == parent)
                                .map(MinistryGroupRecord::is_top_level)
                        });
                    match parent_is_top_level {
                        Some(true) => Some(parent),
                        Some(false) => {
                            return Err(CatalogError::InvalidParent {
                                parent_code: p.to_string(),
                                reason: "parent group is itself nested",
                            }
                            .into())
                        }
                        None => {
                            return Err(CatalogError::InvalidParent {
                                parent_code: p.to_string(),
                                reason: "parent group not found in organization",
                            }
                            .into())
                        }
                    }
                }
                None => None,
            };
            let group_id = MinistryGroupId::new(derived_id("mg", org_id, &code, seq))?;
            let rec = MinistryGroupRecord::v1(
                org_id.clone(),
                group_id.clone(),
                code,
                g.label.to_localized()?,
                Some(g.description.to_localized()?),
                Some(g.icon.to_string()),
                g.sort_order,
                parent_code,
                seq,
                now,
            )?;
            seq += 1;
            group_ids.insert(g.code.to_string(), group_id);
            new_groups.push(rec);
        }

        let seeded = self.build_seed_positions(now, org_id, tpl, Some(&group_ids), &mut seq)?;

        let result = TemplateApplyResult {
            template_type: tpl.template_type,
            positions_created: seeded.len() as u32,
            positions_removed: 0,
            ministry_groups_created: new_groups.len() as u32,
        };

        for g in new_groups {
            self.ministry_groups
                .insert((org_id.clone(), g.group_id.clone()), g);
        }
        for p in seeded {
            self.positions
                .insert((org_id.clone(), p.position_id.clone()), p);
        }
        self.org_configs.insert(org_id.clone(), config);
        self.next_seq = seq;
        Ok(result)
    }

    /// Replaces every position of the org with the template seed set. Ministry groups survive.
    pub fn reset(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        template_type: &str,
    ) -> Result<TemplateApplyResult, StorageError> {
        let current = self
            .org_configs
            .get(org_id)
            .ok_or_else(|| CatalogError::NotInitialized {
                org_id: org_id.as_str().to_string(),
            })?;
        let tpl = resolve_template(template_type)?;

        let mut config = current.clone();
        config.template_type = tpl.template_type;
        config.is_customized = false;
        config.initialized_at = now;
        config.validate()?;

        let mut seq = self.next_seq;
        let seeded = self.build_seed_positions(now, org_id, tpl, None, &mut seq)?;

        let before = self.positions.len();
        self.positions.retain(|(o, _), _| o != org_id);
        let removed = before - self.positions.len();

        let result = TemplateApplyResult {
            template_type: tpl.template_type,
            positions_created: seeded.len() as u32,
            positions_removed: removed as u32,
            ministry_groups_created: 0,
        };
        for p in seeded {
            self.positions
                .insert((org_id.clone(), p.position_id.clone()), p);
        }
        self.org_configs.insert(org_id.clone(), config);
        self.next_seq = seq;
        Ok(result)
    }

    fn build_seed_positions(
        &self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        tpl: &OrganizationTemplate,
        group_links: Option<&BTreeMap<String, MinistryGroupId>>,
        seq: &mut u64,
    ) -> Result<Vec<PositionRecord>, StorageError> {
        let mut taken: BTreeSet<String> = BTreeSet::new();
        let mut out = Vec::new();
        for sp in tpl.seed_positions() {
            let title = sp.title.to_localized()?;
            let base = derive_code(&title, &self.config)?;
            let code = disambiguate(&base, &self.config, |c| taken.contains(c))?;
            taken.insert(code.as_str().to_string());

            let role_module_codes: Vec<String> =
                sp.role_module_codes.iter().map(|m| m.to_string()).collect();
            check_modules(&role_module_codes)?;
            let ministry_group_id = match (group_links, sp.ministry_code) {
                (Some(links), Some(mc)) => links.get(mc).cloned(),
                _ => None,
            };

            let position_id = PositionId::new(derived_id("pos", org_id, &code, *seq))?;
            out.push(PositionRecord::v1(
                org_id.clone(),
                position_id,
                code,
                title,
                Some(sp.description.to_localized()?),
                sp.level,
                sp.grade,
                ministry_group_id,
                role_module_codes,
                sp.is_required,
                true,
                *seq,
                now,
            )?);
            *seq += 1;
        }
        Ok(out)
    }

    // ------------------------
    // Positions
    // ------------------------

    pub fn create_position(
        &mut self,
        now: MonotonicTimeNs,
        req: &CreatePositionRequest,
    ) -> Result<PositionRecord, StorageError> {
        req.validate().map_err(CatalogError::from)?;
        let org_id = &req.org_id;
        self.require_config(org_id)?;

        let code = match &req.code {
            Some(c) => c.clone(),
            None => derive_code(&req.title, &self.config).map_err(CatalogError::from)?,
        };
        if self.position_by_code(org_id, &code).is_some() {
            return Err(CatalogError::DuplicateCode {
                entity: "position",
                code: code.as_str().to_string(),
            }
            .into());
        }
        let level = check_level(req.level)?;
        check_modules(&req.role_module_codes)?;
        if let Some(g) = &req.ministry_group_id {
            self.check_group_ref(org_id, g)?;
        }

        let seq = self.next_seq;
        let rec = PositionRecord::v1(
            org_id.clone(),
            PositionId::new(derived_id("pos", org_id, &code, seq))?,
            code,
            req.title.clone(),
            req.description.clone(),
            level,
            req.grade,
            req.ministry_group_id.clone(),
            req.role_module_codes.clone(),
            req.is_required,
            true,
            seq,
            now,
        )?;
        self.insert_position(rec.clone())?;
        self.next_seq += 1;
        self.mark_customized(org_id);
        Ok(rec)
    }

    /// Keyed insert of a fully built record. Holds the same catalog invariants as
    /// `create_position` but leaves the customized flag and sequence counter alone.
    pub fn insert_position(&mut self, rec: PositionRecord) -> Result<(), StorageError> {
        rec.validate()?;
        self.require_config(&rec.org_id)?;
        let key = (rec.org_id.clone(), rec.position_id.clone());
        if self.positions.contains_key(&key) {
            return Err(StorageError::DuplicateKey {
                table: "positions",
                key: rec.position_id.as_str().to_string(),
            });
        }
        if self.position_by_code(&rec.org_id, &rec.code).is_some() {
            return Err(CatalogError::DuplicateCode {
                entity: "position",
                code: rec.code.as_str().to_string(),
            }
            .into());
        }
        check_modules(&rec.role_module_codes)?;
        if let Some(g) = &rec.ministry_group_id {
            if !self
                .ministry_groups
                .contains_key(&(rec.org_id.clone(), g.clone()))
            {
                return Err(StorageError::ForeignKeyViolation {
                    table: "positions.ministry_group_id",
                    key: g.as_str().to_string(),
                });
            }
        }
        self.positions.insert(key, rec);
        Ok(())
    }

    pub fn update_position(
        &mut self,
        now: MonotonicTimeNs,
        req: &UpdatePositionRequest,
    ) -> Result<PositionRecord, StorageError> {
        req.validate().map_err(CatalogError::from)?;
        let org_id = &req.org_id;
        self.require_config(org_id)?;
        let current = self.require_position(org_id, &req.position_id)?;
        let patch = &req.patch;

        let mut next = current.clone();
        if let Some(t) = &patch.title {
            next.title = t.clone();
        }
        next.description = patch.description.resolve(&current.description);
        if let Some(level) = patch.level {
            next.level = check_level(level)?;
        }
        next.grade = patch.grade.resolve(&current.grade);
        if let Some(g) = patch.ministry_group_id.as_set() {
            self.check_group_ref(org_id, g)?;
        }
        next.ministry_group_id = patch.ministry_group_id.resolve(&current.ministry_group_id);
        if let Some(codes) = &patch.role_module_codes {
            check_modules(codes)?;
            next.role_module_codes = codes.clone();
        }
        if let Some(r) = patch.is_required {
            next.is_required = r;
        }
        if let Some(a) = patch.is_active {
            next.is_active = a;
        }
        next.updated_at = touched_at(now, current.created_at);
        next.validate()?;

        self.positions
            .insert((org_id.clone(), req.position_id.clone()), next.clone());
        self.mark_customized(org_id);
        Ok(next)
    }

    pub fn delete_position(
        &mut self,
        org_id: &OrgId,
        position_id: &PositionId,
    ) -> Result<PositionId, StorageError> {
        self.require_config(org_id)?;
        let current = self.require_position(org_id, position_id)?;
        if current.is_required {
            return Err(CatalogError::RequiredPosition {
                position_id: position_id.as_str().to_string(),
            }
            .into());
        }
        self.positions
            .remove(&(org_id.clone(), position_id.clone()));
        self.mark_customized(org_id);
        Ok(position_id.clone())
    }

    /// Swaps levels with the earliest-created position at the next distinct level in `direction`.
    /// No neighbor means no change.
    pub fn move_position_level(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        position_id: &PositionId,
        direction: MoveDirection,
    ) -> Result<PositionMoveResult, StorageError> {
        self.require_config(org_id)?;
        let target = self.require_position(org_id, position_id)?;
        let level_from = target.level;

        let others = self
            .org_positions(org_id)
            .into_iter()
            .filter(|p| &p.position_id != position_id);
        let neighbor = match direction {
            MoveDirection::Up => others
                .filter(|p| p.level < level_from)
                .min_by_key(|p| (std::cmp::Reverse(p.level), p.created_seq)),
            MoveDirection::Down => others
                .filter(|p| p.level > level_from)
                .min_by_key(|p| (p.level, p.created_seq)),
        };
        let Some(neighbor) = neighbor else {
            return Ok(PositionMoveResult {
                position_id: position_id.clone(),
                level_from,
                level: level_from,
                swapped_with: None,
            });
        };

        let mut moved = target.clone();
        let mut partner = neighbor.clone();
        moved.level = partner.level;
        partner.level = level_from;
        moved.updated_at = touched_at(now, moved.created_at);
        partner.updated_at = touched_at(now, partner.created_at);
        moved.validate()?;
        partner.validate()?;

        let result = PositionMoveResult {
            position_id: position_id.clone(),
            level_from,
            level: moved.level,
            swapped_with: Some(partner.position_id.clone()),
        };
        self.positions
            .insert((org_id.clone(), moved.position_id.clone()), moved);
        self.positions
            .insert((org_id.clone(), partner.position_id.clone()), partner);
        self.mark_customized(org_id);
        Ok(result)
    }

    // ------------------------
    // Ministry groups
    // ------------------------

    pub fn create_ministry_group(
        &mut self,
        now: MonotonicTimeNs,
        req: &CreateMinistryGroupRequest,
    ) -> Result<MinistryGroupRecord, StorageError> {
        req.validate().map_err(CatalogError::from)?;
        let org_id = &req.org_id;

        let code = match &req.code {
            Some(c) => c.clone(),
            None => derive_code(&req.label, &self.config).map_err(CatalogError::from)?,
        };
        if self.group_by_code(org_id, &code).is_some() {
            return Err(CatalogError::DuplicateCode {
                entity: "ministry_group",
                code: code.as_str().to_string(),
            }
            .into());
        }
        if let Some(parent_code) = &req.parent_code {
            if parent_code == &code {
                return Err(CatalogError::InvalidParent {
                    parent_code: parent_code.as_str().to_string(),
                    reason: "group cannot be its own parent",
                }
                .into());
            }
            let parent = self.group_by_code(org_id, parent_code).ok_or_else(|| {
                CatalogError::InvalidParent {
                    parent_code: parent_code.as_str().to_string(),
                    reason: "parent group not found in organization",
                }
            })?;
            if !parent.is_top_level() {
                return Err(CatalogError::InvalidParent {
                    parent_code: parent_code.as_str().to_string(),
                    reason: "parent group is itself nested",
                }
                .into());
            }
        }

        let seq = self.next_seq;
        let rec = MinistryGroupRecord::v1(
            org_id.clone(),
            MinistryGroupId::new(derived_id("mg", org_id, &code, seq))?,
            code,
            req.label.clone(),
            req.description.clone(),
            req.icon.clone(),
            req.sort_order,
            req.parent_code.clone(),
            seq,
            now,
        )?;
        let key = (org_id.clone(), rec.group_id.clone());
        if self.ministry_groups.contains_key(&key) {
            return Err(StorageError::DuplicateKey {
                table: "ministry_groups",
                key: rec.group_id.as_str().to_string(),
            });
        }
        self.ministry_groups.insert(key, rec.clone());
        self.next_seq += 1;
        Ok(rec)
    }

    /// Removes the group, unassigns its positions and promotes its child groups to top level.
    pub fn delete_ministry_group(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        group_id: &MinistryGroupId,
    ) -> Result<MinistryGroupDeleteResult, StorageError> {
        let key = (org_id.clone(), group_id.clone());
        let code = self
            .ministry_groups
            .get(&key)
            .map(|g| g.code.clone())
            .ok_or_else(|| CatalogError::NotFound {
                entity: "ministry_group",
                key: group_id.as_str().to_string(),
            })?;

        let mut positions_unassigned: u32 = 0;
        for ((o, _), p) in self.positions.iter_mut() {
            if o == org_id && p.ministry_group_id.as_ref() == Some(group_id) {
                p.ministry_group_id = None;
                p.updated_at = touched_at(now, p.created_at);
                positions_unassigned += 1;
            }
        }
        let mut groups_promoted: u32 = 0;
        for ((o, _), g) in self.ministry_groups.iter_mut() {
            if o == org_id && g.parent_code.as_ref() == Some(&code) {
                g.parent_code = None;
                groups_promoted += 1;
            }
        }
        self.ministry_groups.remove(&key);

        Ok(MinistryGroupDeleteResult {
            group_id: group_id.clone(),
            positions_unassigned,
            groups_promoted,
        })
    }

    // ------------------------
    // Reads
    // ------------------------

    pub fn org_config(&self, org_id: &OrgId) -> Option<&OrgRoleConfigRecord> {
        self.org_configs.get(org_id)
    }

    pub fn position(&self, org_id: &OrgId, position_id: &PositionId) -> Option<&PositionRecord> {
        self.positions.get(&(org_id.clone(), position_id.clone()))
    }

    pub fn ministry_group(
        &self,
        org_id: &OrgId,
        group_id: &MinistryGroupId,
    ) -> Option<&MinistryGroupRecord> {
        self.ministry_groups.get(&(org_id.clone(), group_id.clone()))
    }

    /// Ordered by `(level, created_seq)`.
    pub fn positions_for_org(&self, org_id: &OrgId) -> Vec<&PositionRecord> {
        let mut out = self.org_positions(org_id);
        out.sort_by_key(|p| p.sort_key());
        out
    }

    /// Ordered by `(sort_order, code)`.
    pub fn ministry_groups_for_org(&self, org_id: &OrgId) -> Vec<&MinistryGroupRecord> {
        let mut out: Vec<&MinistryGroupRecord> = self
            .ministry_groups
            .iter()
            .filter(|((o, _), _)| o == org_id)
            .map(|(_, g)| g)
            .collect();
        out.sort_by(|a, b| (a.sort_order, &a.code).cmp(&(b.sort_order, &b.code)));
        out
    }

    pub fn full_config(&self, org_id: &OrgId) -> OrgRoleFullConfig {
        OrgRoleFullConfig {
            org_id: org_id.clone(),
            config: self.org_config(org_id).cloned(),
            positions: self
                .positions_for_org(org_id)
                .into_iter()
                .cloned()
                .collect(),
            ministry_groups: self
                .ministry_groups_for_org(org_id)
                .into_iter()
                .cloned()
                .collect(),
            role_modules: modules::list_role_modules(),
        }
    }

    /// Every organization's positions, grouped by org and ordered within each.
    pub fn list_all_positions(&self) -> Vec<&PositionRecord> {
        let mut out: Vec<&PositionRecord> = self.positions.values().collect();
        out.sort_by(|a, b| (&a.org_id, a.sort_key()).cmp(&(&b.org_id, b.sort_key())));
        out
    }

    fn org_positions(&self, org_id: &OrgId) -> Vec<&PositionRecord> {
        self.positions
            .iter()
            .filter(|((o, _), _)| o == org_id)
            .map(|(_, p)| p)
            .collect()
    }

    fn position_by_code(&self, org_id: &OrgId, code: &CatalogCode) -> Option<&PositionRecord> {
        self.org_positions(org_id)
            .into_iter()
            .find(|p| &p.code == code)
    }

    fn group_by_code(&self, org_id: &OrgId, code: &CatalogCode) -> Option<&MinistryGroupRecord> {
        self.ministry_groups
            .iter()
            .find(|((o, _), g)| o == org_id && &g.code == code)
            .map(|(_, g)| g)
    }

    fn require_config(&self, org_id: &OrgId) -> Result<&OrgRoleConfigRecord, CatalogError> {
        self.org_configs
            .get(org_id)
            .ok_or_else(|| CatalogError::NotFound {
                entity: "org_config",
                key: org_id.as_str().to_string(),
            })
    }

    fn require_position(
        &self,
        org_id: &OrgId,
        position_id: &PositionId,
    ) -> Result<&PositionRecord, CatalogError> {
        self.position(org_id, position_id)
            .ok_or_else(|| CatalogError::NotFound {
                entity: "position",
                key: position_id.as_str().to_string(),
            })
    }

    fn check_group_ref(&self, org_id: &OrgId, group_id: &MinistryGroupId) -> Result<(), CatalogError> {
        if self.ministry_group(org_id, group_id).is_some() {
            return Ok(());
        }
        let elsewhere = self
            .ministry_groups
            .keys()
            .any(|(o, g)| g == group_id && o != org_id);
        Err(CatalogError::InvalidMinistryGroup {
            key: group_id.as_str().to_string(),
            reason: if elsewhere {
                "ministry group belongs to another organization"
            } else {
                "ministry group not found in organization"
            },
        })
    }

    fn mark_customized(&mut self, org_id: &OrgId) {
        if let Some(c) = self.org_configs.get_mut(org_id) {
            c.is_customized = true;
        }
    }

    // ------------------------
    // Audit ledger (append-only)
    // ------------------------

    pub(crate) fn append_audit_event(
        &mut self,
        input: AuditEventInput,
    ) -> Result<AuditEventId, StorageError> {
        input.validate()?;
        let event_id = AuditEventId(self.next_audit_event_id);
        let ev = AuditEvent::from_input_v1(event_id, input)?;
        self.next_audit_event_id = self.next_audit_event_id.saturating_add(1);
        self.audit_events.push(ev);
        Ok(event_id)
    }

    pub fn audit_events(&self) -> &[AuditEvent] {
        &self.audit_events
    }

    pub fn audit_events_by_org(&self, org_id: &str) -> Vec<&AuditEvent> {
        self.audit_events
            .iter()
            .filter(|e| e.org_id.as_deref() == Some(org_id))
            .collect()
    }

    pub fn audit_events_by_correlation(&self, correlation_id: CorrelationId) -> Vec<&AuditEvent> {
        self.audit_events
            .iter()
            .filter(|e| e.correlation_id == correlation_id)
            .collect()
    }

    pub fn attempt_overwrite_audit_event(&mut self, _event_id: AuditEventId) -> Result<(), StorageError> {
        Err(StorageError::AppendOnlyViolation {
            table: "audit_events",
        })
    }
}
