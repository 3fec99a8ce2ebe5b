#![forbid(unsafe_code)]

use orgroles_kernel_contracts::audit::{AuditEvent, AuditEventId, AuditEventInput, CorrelationId};
use orgroles_kernel_contracts::catalog::{
    MinistryGroupId, MinistryGroupRecord, OrgId, OrgRoleConfigRecord, PositionId, PositionRecord,
};
use orgroles_kernel_contracts::orgroles::{
    CreateMinistryGroupRequest, CreatePositionRequest, MinistryGroupDeleteResult, MoveDirection,
    PositionMoveResult, TemplateApplyResult, UpdatePositionRequest,
};
use orgroles_kernel_contracts::MonotonicTimeNs;

use crate::catalog::{CatalogStore, OrgRoleFullConfig, StorageError};

/// Typed repository interface for the org roles catalog tables.
pub trait OrgRolesCatalogRepo {
    fn initialize_row(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        template_type: &str,
    ) -> Result<TemplateApplyResult, StorageError>;
    fn reset_row(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        template_type: &str,
    ) -> Result<TemplateApplyResult, StorageError>;

    fn create_position_row(
        &mut self,
        now: MonotonicTimeNs,
        req: &CreatePositionRequest,
    ) -> Result<PositionRecord, StorageError>;
    fn insert_position_row(&mut self, record: PositionRecord) -> Result<(), StorageError>;
    fn update_position_row(
        &mut self,
        now: MonotonicTimeNs,
        req: &UpdatePositionRequest,
    ) -> Result<PositionRecord, StorageError>;
    fn delete_position_row(
        &mut self,
        org_id: &OrgId,
        position_id: &PositionId,
    ) -> Result<PositionId, StorageError>;
    fn move_position_level_row(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        position_id: &PositionId,
        direction: MoveDirection,
    ) -> Result<PositionMoveResult, StorageError>;

    fn create_ministry_group_row(
        &mut self,
        now: MonotonicTimeNs,
        req: &CreateMinistryGroupRequest,
    ) -> Result<MinistryGroupRecord, StorageError>;
    fn delete_ministry_group_row(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        group_id: &MinistryGroupId,
    ) -> Result<MinistryGroupDeleteResult, StorageError>;

    fn org_config_row(&self, org_id: &OrgId) -> Option<&OrgRoleConfigRecord>;
    fn position_row(&self, org_id: &OrgId, position_id: &PositionId) -> Option<&PositionRecord>;
    fn positions_for_org_rows(&self, org_id: &OrgId) -> Vec<&PositionRecord>;
    fn ministry_groups_for_org_rows(&self, org_id: &OrgId) -> Vec<&MinistryGroupRecord>;
    fn full_config_row(&self, org_id: &OrgId) -> OrgRoleFullConfig;
    fn all_position_rows(&self) -> Vec<&PositionRecord>;
}

/// Typed repository interface for append-only audit persistence.
pub trait OrgRolesAuditRepo {
    fn append_audit_row(&mut self, input: AuditEventInput) -> Result<AuditEventId, StorageError>;
    fn audit_rows(&self) -> &[AuditEvent];
    fn audit_rows_by_correlation(&self, correlation_id: CorrelationId) -> Vec<&AuditEvent>;
    fn audit_rows_by_org(&self, org_id: &str) -> Vec<&AuditEvent>;
}

impl OrgRolesCatalogRepo for CatalogStore {
    fn initialize_row(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        template_type: &str,
    ) -> Result<TemplateApplyResult, StorageError> {
        self.initialize(now, org_id, template_type)
    }

    fn reset_row(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        template_type: &str,
    ) -> Result<TemplateApplyResult, StorageError> {
        self.reset(now, org_id, template_type)
    }

    fn create_position_row(
        &mut self,
        now: MonotonicTimeNs,
        req: &CreatePositionRequest,
    ) -> Result<PositionRecord, StorageError> {
        self.create_position(now, req)
    }

    fn insert_position_row(&mut self, record: PositionRecord) -> Result<(), StorageError> {
        self.insert_position(record)
    }

    fn update_position_row(
        &mut self,
        now: MonotonicTimeNs,
        req: &UpdatePositionRequest,
    ) -> Result<PositionRecord, StorageError> {
        self.update_position(now, req)
    }

    fn delete_position_row(
        &mut self,
        org_id: &OrgId,
        position_id: &PositionId,
    ) -> Result<PositionId, StorageError> {
        self.delete_position(org_id, position_id)
    }

    fn move_position_level_row(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        position_id: &PositionId,
        direction: MoveDirection,
    ) -> Result<PositionMoveResult, StorageError> {
        self.move_position_level(now, org_id, position_id, direction)
    }

    fn create_ministry_group_row(
        &mut self,
        now: MonotonicTimeNs,
        req: &CreateMinistryGroupRequest,
    ) -> Result<MinistryGroupRecord, StorageError> {
        self.create_ministry_group(now, req)
    }

    fn delete_ministry_group_row(
        &mut self,
        now: MonotonicTimeNs,
        org_id: &OrgId,
        group_id: &MinistryGroupId,
    ) -> Result<MinistryGroupDeleteResult, StorageError> {
        self.delete_ministry_group(now, org_id, group_id)
    }

    fn org_config_row(&self, org_id: &OrgId) -> Option<&OrgRoleConfigRecord> {
        self.org_config(org_id)
    }

    fn position_row(&self, org_id: &OrgId, position_id: &PositionId) -> Option<&PositionRecord> {
        self.position(org_id, position_id)
    }

    fn positions_for_org_rows(&self, org_id: &OrgId) -> Vec<&PositionRecord> {
        self.positions_for_org(org_id)
    }

    fn ministry_groups_for_org_rows(&self, org_id: &OrgId) -> Vec<&MinistryGroupRecord> {
        self.ministry_groups_for_org(org_id)
    }

    fn full_config_row(&self, org_id: &OrgId) -> OrgRoleFullConfig {
        self.full_config(org_id)
    }

    fn all_position_rows(&self) -> Vec<&PositionRecord> {
        self.list_all_positions()
    }
}

impl OrgRolesAuditRepo for CatalogStore {
    fn append_audit_row(&mut self, input: AuditEventInput) -> Result<AuditEventId, StorageError> {
        self.append_audit_event(input)
    }

    fn audit_rows(&self) -> &[AuditEvent] {
        self.audit_events()
    }

    fn audit_rows_by_correlation(&self, correlation_id: CorrelationId) -> Vec<&AuditEvent> {
        self.audit_events_by_correlation(correlation_id)
    }

    fn audit_rows_by_org(&self, org_id: &str) -> Vec<&AuditEvent> {
        self.audit_events_by_org(org_id)
    }
}
