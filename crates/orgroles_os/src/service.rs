#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use orgroles_engines::codes::OrgRolesConfig;
use orgroles_engines::modules;
use orgroles_engines::tasks::TaskDefinition;
use orgroles_kernel_contracts::audit::AuditEvent;
use orgroles_kernel_contracts::catalog::{CatalogError, OrgId, PositionId, PositionRecord};
use orgroles_kernel_contracts::orgroles::{OrgRolesRequest, OrgRolesResponse};
use orgroles_kernel_contracts::Validate;
use orgroles_storage::catalog::{CatalogStore, OrgRoleFullConfig, StorageError};
use tracing::debug;

use crate::orgroles::OrgRolesRuntime;

type Shard = Arc<Mutex<CatalogStore>>;

/// Per-organization single-writer front of the catalog store.
///
/// Each organization owns one `CatalogStore` behind its own mutex. A mutation holds that
/// mutex for its whole validate-then-write unit, and reads clone under the same mutex, so
/// no caller observes half of a level swap. Organizations never contend past the map lookup.
#[derive(Debug)]
pub struct OrgRolesService {
    runtime: OrgRolesRuntime,
    config: OrgRolesConfig,
    shards: RwLock<BTreeMap<OrgId, Shard>>,
}

impl Default for OrgRolesService {
    fn default() -> Self {
        Self::new()
    }
}

impl OrgRolesService {
    pub fn new() -> Self {
        Self::with_config(OrgRolesConfig::mvp_v1())
    }

    pub fn with_config(config: OrgRolesConfig) -> Self {
        Self {
            runtime: OrgRolesRuntime,
            config,
            shards: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn execute(&self, req: &OrgRolesRequest) -> Result<OrgRolesResponse, StorageError> {
        let org_id = req.request.org_id();
        org_id.validate().map_err(StorageError::ContractViolation)?;
        let shard = self.shard_for_write(org_id)?;
        let mut store = lock(&shard)?;
        self.runtime.run(&mut store, req)
    }

    /// Unknown organizations read as an empty, uninitialized catalog.
    pub fn full_config(&self, org_id: &OrgId) -> Result<OrgRoleFullConfig, StorageError> {
        match self.shard_for_read(org_id)? {
            Some(shard) => Ok(lock(&shard)?.full_config(org_id)),
            None => Ok(OrgRoleFullConfig::uninitialized(org_id.clone())),
        }
    }

    pub fn position(
        &self,
        org_id: &OrgId,
        position_id: &PositionId,
    ) -> Result<PositionRecord, StorageError> {
        let not_found = || {
            StorageError::Catalog(CatalogError::NotFound {
                entity: "position",
                key: position_id.as_str().to_string(),
            })
        };
        let shard = self.shard_for_read(org_id)?.ok_or_else(not_found)?;
        let store = lock(&shard)?;
        store
            .position(org_id, position_id)
            .cloned()
            .ok_or_else(not_found)
    }

    /// Tasks granted to a position through its role modules.
    pub fn position_tasks(
        &self,
        org_id: &OrgId,
        position_id: &PositionId,
    ) -> Result<Vec<&'static TaskDefinition>, StorageError> {
        let rec = self.position(org_id, position_id)?;
        Ok(modules::resolve_position_tasks(&rec.role_module_codes))
    }

    /// Every organization's positions, grouped by organization.
    pub fn list_all_positions(&self) -> Result<Vec<PositionRecord>, StorageError> {
        let shards: Vec<Shard> = self
            .shards
            .read()
            .map_err(|_| unavailable("org shard map lock poisoned"))?
            .values()
            .cloned()
            .collect();
        let mut out = Vec::new();
        for shard in shards {
            let store = lock(&shard)?;
            out.extend(store.list_all_positions().into_iter().cloned());
        }
        Ok(out)
    }

    /// Organizations that have applied a template, whether or not they hold positions.
    pub fn initialized_org_count(&self) -> Result<usize, StorageError> {
        let shards: Vec<(OrgId, Shard)> = self
            .shards
            .read()
            .map_err(|_| unavailable("org shard map lock poisoned"))?
            .iter()
            .map(|(org_id, shard)| (org_id.clone(), Arc::clone(shard)))
            .collect();
        let mut count = 0;
        for (org_id, shard) in shards {
            if lock(&shard)?.org_config(&org_id).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn audit_events(&self, org_id: &OrgId) -> Result<Vec<AuditEvent>, StorageError> {
        match self.shard_for_read(org_id)? {
            Some(shard) => Ok(lock(&shard)?
                .audit_events_by_org(org_id.as_str())
                .into_iter()
                .cloned()
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    fn shard_for_read(&self, org_id: &OrgId) -> Result<Option<Shard>, StorageError> {
        Ok(self
            .shards
            .read()
            .map_err(|_| unavailable("org shard map lock poisoned"))?
            .get(org_id)
            .cloned())
    }

    fn shard_for_write(&self, org_id: &OrgId) -> Result<Shard, StorageError> {
        if let Some(shard) = self.shard_for_read(org_id)? {
            return Ok(shard);
        }
        let mut shards = self
            .shards
            .write()
            .map_err(|_| unavailable("org shard map lock poisoned"))?;
        let shard = shards.entry(org_id.clone()).or_insert_with(|| {
            debug!(org_id = %org_id.as_str(), "opening org roles catalog shard");
            Arc::new(Mutex::new(CatalogStore::with_config(self.config)))
        });
        Ok(shard.clone())
    }
}

fn lock(shard: &Shard) -> Result<MutexGuard<'_, CatalogStore>, StorageError> {
    shard
        .lock()
        .map_err(|_| unavailable("org catalog lock poisoned"))
}

fn unavailable(reason: &str) -> StorageError {
    StorageError::Unavailable {
        reason: reason.to_string(),
    }
}
