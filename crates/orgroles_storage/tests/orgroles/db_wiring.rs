#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use orgroles_kernel_contracts::audit::{
    AuditEventId, AuditEventInput, AuditEventType, AuditPayloadMin, AuditSeverity, CorrelationId,
    PayloadKey, PayloadValue,
};
use orgroles_kernel_contracts::catalog::{
    CatalogCode, CatalogError, CatalogErrorKind, LocalizedText, MinistryGroupId, OrgId,
    PositionGrade, PositionId, PositionRecord, TemplateType,
};
use orgroles_kernel_contracts::orgroles::{
    CreateMinistryGroupRequest, CreatePositionRequest, MoveDirection, Patch, PositionPatch,
    UpdatePositionRequest,
};
use orgroles_kernel_contracts::{MonotonicTimeNs, ReasonCodeId};
use orgroles_storage::catalog::{CatalogStore, StorageError};
use orgroles_storage::repo::{OrgRolesAuditRepo, OrgRolesCatalogRepo};

fn org(id: &str) -> OrgId {
    OrgId::new(id).unwrap()
}

fn fr(s: &str) -> LocalizedText {
    LocalizedText::from_pairs([("fr", s)]).unwrap()
}

fn modules(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

fn create_req(org_id: &OrgId, title: &str, level: i64, module_codes: &[&str]) -> CreatePositionRequest {
    CreatePositionRequest {
        org_id: org_id.clone(),
        code: None,
        title: fr(title),
        description: None,
        level,
        grade: None,
        ministry_group_id: None,
        role_module_codes: modules(module_codes),
        is_required: false,
    }
}

fn group_req(org_id: &OrgId, code: &str, sort_order: i64, parent: Option<&str>) -> CreateMinistryGroupRequest {
    CreateMinistryGroupRequest {
        org_id: org_id.clone(),
        code: Some(CatalogCode::new(code).unwrap()),
        label: fr(code),
        description: None,
        icon: None,
        sort_order,
        parent_code: parent.map(|p| CatalogCode::new(p).unwrap()),
    }
}

fn catalog_kind<T: std::fmt::Debug>(res: Result<T, StorageError>) -> CatalogErrorKind {
    match res {
        Err(StorageError::Catalog(e)) => e.kind(),
        other => panic!("expected a catalog refusal, got {other:?}"),
    }
}

fn snapshot(s: &CatalogStore, org_id: &OrgId) -> Vec<PositionRecord> {
    s.positions_for_org_rows(org_id).into_iter().cloned().collect()
}

fn shape(s: &CatalogStore, org_id: &OrgId) -> Vec<(LocalizedText, u32, Option<PositionGrade>, Vec<String>, bool)> {
    s.positions_for_org_rows(org_id)
        .into_iter()
        .map(|p| {
            (
                p.title.clone(),
                p.level,
                p.grade,
                p.role_module_codes.clone(),
                p.is_required,
            )
        })
        .collect()
}

/// Custom-template org with fixture positions at the given levels, in creation order.
/// Direct inserts leave the customized flag untouched.
fn seed_levels(s: &mut CatalogStore, org_id: &OrgId, levels: &[u32]) -> Vec<PositionId> {
    s.initialize_row(MonotonicTimeNs(10), org_id, "custom").unwrap();
    levels
        .iter()
        .enumerate()
        .map(|(i, level)| {
            let id = PositionId::new(format!("pos_fixture_{i}")).unwrap();
            s.insert_position_row(
                PositionRecord::v1(
                    org_id.clone(),
                    id.clone(),
                    CatalogCode::new(format!("poste_{i}")).unwrap(),
                    fr(&format!("Poste {i}")),
                    None,
                    *level,
                    None,
                    None,
                    modules(&["consultation"]),
                    false,
                    true,
                    100 + i as u64,
                    MonotonicTimeNs(20),
                )
                .unwrap(),
            )
            .unwrap();
            id
        })
        .collect()
}

fn level_of(s: &CatalogStore, org_id: &OrgId, id: &PositionId) -> u32 {
    s.position_row(org_id, id).unwrap().level
}

#[test]
fn at_orgroles_db_01_initialize_embassy_seeds_template() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");

    let res = s.initialize_row(MonotonicTimeNs(100), &o, "embassy").unwrap();
    assert_eq!(res.template_type, TemplateType::Embassy);
    assert_eq!(res.positions_created, 11);
    assert_eq!(res.ministry_groups_created, 7);

    let cfg = s.org_config_row(&o).unwrap();
    assert!(!cfg.is_customized);
    assert_eq!(cfg.initialized_at, MonotonicTimeNs(100));
    assert_eq!(s.positions_for_org_rows(&o).len(), 11);

    let ambassador = s
        .positions_for_org_rows(&o)
        .into_iter()
        .find(|p| p.code.as_str() == "ambassadeur")
        .cloned()
        .unwrap();
    assert_eq!(ambassador.level, 1);
    assert!(ambassador.is_required);
    assert_eq!(ambassador.grade, Some(PositionGrade::Chief));
    let group = ambassador.ministry_group_id.unwrap();
    let linked = s
        .ministry_groups_for_org_rows(&o)
        .into_iter()
        .find(|g| g.group_id == group)
        .unwrap();
    assert_eq!(linked.code.as_str(), "presidence");
}

#[test]
fn at_orgroles_db_02_initialize_refuses_twice_and_unknown_template() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");

    assert_eq!(
        catalog_kind(s.initialize_row(MonotonicTimeNs(1), &o, "palace")),
        CatalogErrorKind::UnknownTemplate
    );
    assert!(s.org_config_row(&o).is_none());

    s.initialize_row(MonotonicTimeNs(2), &o, "consulate").unwrap();
    // already-initialized wins over an unknown template name
    assert_eq!(
        catalog_kind(s.initialize_row(MonotonicTimeNs(3), &o, "palace")),
        CatalogErrorKind::AlreadyInitialized
    );
    assert_eq!(s.positions_for_org_rows(&o).len(), 12);
}

#[test]
fn at_orgroles_db_03_scenario_create_derives_code_and_flips_customized() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "embassy").unwrap();

    let p = s
        .create_position_row(
            MonotonicTimeNs(2),
            &create_req(&o, "Attaché culturel", 4, &["culture_events"]),
        )
        .unwrap();
    assert_eq!(p.code.as_str(), "attache_culturel");
    assert!(p.is_active);
    assert_eq!(p.grade, None);
    assert!(s.org_config_row(&o).unwrap().is_customized);
    assert_eq!(s.positions_for_org_rows(&o).len(), 12);
}

#[test]
fn at_orgroles_db_04_duplicate_code_leaves_catalog_unchanged() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "embassy").unwrap();
    s.create_position_row(
        MonotonicTimeNs(2),
        &create_req(&o, "Attaché culturel", 4, &["culture_events"]),
    )
    .unwrap();
    let before = snapshot(&s, &o);

    let mut dup = create_req(&o, "Autre attaché", 5, &["consultation"]);
    dup.code = Some(CatalogCode::new("attache_culturel").unwrap());
    assert_eq!(
        catalog_kind(s.create_position_row(MonotonicTimeNs(3), &dup)),
        CatalogErrorKind::DuplicateCode
    );

    // a derived collision is refused too, never silently suffixed
    let derived = create_req(&o, "Attaché Culturel!", 5, &["consultation"]);
    assert_eq!(
        catalog_kind(s.create_position_row(MonotonicTimeNs(4), &derived)),
        CatalogErrorKind::DuplicateCode
    );
    assert_eq!(snapshot(&s, &o), before);
}

#[test]
fn at_orgroles_db_05_module_validity_on_create_and_update() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "embassy").unwrap();

    assert_eq!(
        catalog_kind(s.create_position_row(
            MonotonicTimeNs(2),
            &create_req(&o, "Fantôme", 3, &["not_a_real_code"]),
        )),
        CatalogErrorKind::InvalidModuleCode
    );
    assert_eq!(
        catalog_kind(s.create_position_row(
            MonotonicTimeNs(2),
            &create_req(&o, "Doublon", 3, &["finance", "finance"]),
        )),
        CatalogErrorKind::InvalidModuleCode
    );
    let too_long = "m".repeat(65);
    for bad in ["", "   ", too_long.as_str()] {
        assert_eq!(
            catalog_kind(s.create_position_row(
                MonotonicTimeNs(2),
                &create_req(&o, "Fantôme", 3, &[bad]),
            )),
            CatalogErrorKind::InvalidModuleCode
        );
    }

    let target = s.positions_for_org_rows(&o)[0].clone();
    let res = s.update_position_row(
        MonotonicTimeNs(3),
        &UpdatePositionRequest {
            org_id: o.clone(),
            position_id: target.position_id.clone(),
            patch: PositionPatch {
                role_module_codes: Some(modules(&["not_a_real_code"])),
                ..Default::default()
            },
        },
    );
    assert_eq!(catalog_kind(res), CatalogErrorKind::InvalidModuleCode);
    let blank = s.update_position_row(
        MonotonicTimeNs(3),
        &UpdatePositionRequest {
            org_id: o.clone(),
            position_id: target.position_id.clone(),
            patch: PositionPatch {
                role_module_codes: Some(modules(&[""])),
                ..Default::default()
            },
        },
    );
    assert_eq!(catalog_kind(blank), CatalogErrorKind::InvalidModuleCode);
    let after = s.position_row(&o, &target.position_id).unwrap();
    assert_eq!(after.role_module_codes, target.role_module_codes);
    assert!(!s.org_config_row(&o).unwrap().is_customized);

    for p in s.positions_for_org_rows(&o) {
        for m in &p.role_module_codes {
            assert!(orgroles_engines::modules::is_known_module(m));
        }
    }
}

#[test]
fn at_orgroles_db_06_invalid_levels_are_refused() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "custom").unwrap();

    for level in [0, -1, 1_000_001] {
        assert_eq!(
            catalog_kind(s.create_position_row(
                MonotonicTimeNs(2),
                &create_req(&o, "Agent", level, &["reception"]),
            )),
            CatalogErrorKind::InvalidLevel
        );
    }
    assert!(s.positions_for_org_rows(&o).is_empty());
    assert!(!s.org_config_row(&o).unwrap().is_customized);
}

#[test]
fn at_orgroles_db_07_update_patch_sets_clears_and_keeps_fields() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "embassy").unwrap();
    let g = s
        .create_ministry_group_row(MonotonicTimeNs(2), &group_req(&o, "culture", 10, None))
        .unwrap();
    let p = s
        .create_position_row(
            MonotonicTimeNs(3),
            &create_req(&o, "Attaché culturel", 4, &["culture_events"]),
        )
        .unwrap();

    let updated = s
        .update_position_row(
            MonotonicTimeNs(4),
            &UpdatePositionRequest {
                org_id: o.clone(),
                position_id: p.position_id.clone(),
                patch: PositionPatch {
                    level: Some(3),
                    grade: Patch::Set(PositionGrade::Counselor),
                    ministry_group_id: Patch::Set(g.group_id.clone()),
                    ..Default::default()
                },
            },
        )
        .unwrap();
    assert_eq!(updated.level, 3);
    assert_eq!(updated.grade, Some(PositionGrade::Counselor));
    assert_eq!(updated.ministry_group_id, Some(g.group_id.clone()));
    assert_eq!(updated.title, p.title);
    assert_eq!(updated.code, p.code);
    assert_eq!(updated.updated_at, MonotonicTimeNs(4));

    let cleared = s
        .update_position_row(
            MonotonicTimeNs(5),
            &UpdatePositionRequest {
                org_id: o.clone(),
                position_id: p.position_id.clone(),
                patch: PositionPatch {
                    ministry_group_id: Patch::Clear,
                    is_active: Some(false),
                    ..Default::default()
                },
            },
        )
        .unwrap();
    assert_eq!(cleared.ministry_group_id, None);
    assert_eq!(cleared.grade, Some(PositionGrade::Counselor));
    assert!(!cleared.is_active);

    let missing = s.update_position_row(
        MonotonicTimeNs(6),
        &UpdatePositionRequest {
            org_id: o.clone(),
            position_id: PositionId::new("pos_missing").unwrap(),
            patch: PositionPatch {
                level: Some(2),
                ..Default::default()
            },
        },
    );
    assert_eq!(catalog_kind(missing), CatalogErrorKind::NotFound);
}

#[test]
fn at_orgroles_db_08_ministry_reference_must_be_same_org() {
    let mut s = CatalogStore::new_in_memory();
    let a = org("org_a");
    let b = org("org_b");
    s.initialize_row(MonotonicTimeNs(1), &a, "custom").unwrap();
    s.initialize_row(MonotonicTimeNs(1), &b, "custom").unwrap();
    let foreign = s
        .create_ministry_group_row(MonotonicTimeNs(2), &group_req(&b, "finances", 1, None))
        .unwrap();

    let mut req = create_req(&a, "Payeur", 5, &["finance"]);
    req.ministry_group_id = Some(foreign.group_id.clone());
    let res = s.create_position_row(MonotonicTimeNs(3), &req);
    assert!(matches!(
        res,
        Err(StorageError::Catalog(CatalogError::InvalidMinistryGroup {
            reason: "ministry group belongs to another organization",
            ..
        }))
    ));

    req.ministry_group_id = Some(MinistryGroupId::new("mg_missing").unwrap());
    assert_eq!(
        catalog_kind(s.create_position_row(MonotonicTimeNs(3), &req)),
        CatalogErrorKind::InvalidMinistryGroup
    );
    assert!(s.positions_for_org_rows(&a).is_empty());
}

#[test]
fn at_orgroles_db_09_required_position_delete_is_refused() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "embassy").unwrap();
    let before = snapshot(&s, &o);

    for p in before.iter().filter(|p| p.is_required) {
        assert_eq!(
            catalog_kind(s.delete_position_row(&o, &p.position_id)),
            CatalogErrorKind::RequiredPosition
        );
    }
    assert_eq!(snapshot(&s, &o), before);
    assert!(!s.org_config_row(&o).unwrap().is_customized);

    let optional = before.iter().find(|p| !p.is_required).unwrap();
    let deleted = s.delete_position_row(&o, &optional.position_id).unwrap();
    assert_eq!(deleted, optional.position_id);
    assert!(s.position_row(&o, &optional.position_id).is_none());
    assert!(s.org_config_row(&o).unwrap().is_customized);
    assert_eq!(
        catalog_kind(s.delete_position_row(&o, &optional.position_id)),
        CatalogErrorKind::NotFound
    );
}

#[test]
fn at_orgroles_db_10_move_level_is_noop_at_extremes() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    let ids = seed_levels(&mut s, &o, &[1, 2, 5]);
    let cfg_before = s.org_config_row(&o).cloned().unwrap();
    let before = snapshot(&s, &o);

    let top = s
        .move_position_level_row(MonotonicTimeNs(50), &o, &ids[0], MoveDirection::Up)
        .unwrap();
    assert_eq!(top.level, 1);
    assert_eq!(top.level_from, 1);
    assert!(!top.swapped());

    let bottom = s
        .move_position_level_row(MonotonicTimeNs(51), &o, &ids[2], MoveDirection::Down)
        .unwrap();
    assert_eq!(bottom.level, 5);
    assert!(bottom.swapped_with.is_none());

    assert_eq!(snapshot(&s, &o), before);
    assert_eq!(s.org_config_row(&o).unwrap(), &cfg_before);
    assert!(!cfg_before.is_customized);
}

#[test]
fn at_orgroles_db_11_move_level_swaps_exactly_two_positions() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    let ids = seed_levels(&mut s, &o, &[1, 2, 2, 5]);
    assert!(!s.org_config_row(&o).unwrap().is_customized);

    let res = s
        .move_position_level_row(MonotonicTimeNs(60), &o, &ids[3], MoveDirection::Up)
        .unwrap();
    assert_eq!(res.level_from, 5);
    assert_eq!(res.level, 2);
    // earliest-created of the two level-2 positions is the partner
    assert_eq!(res.swapped_with.as_ref(), Some(&ids[1]));

    let levels: Vec<u32> = ids.iter().map(|id| level_of(&s, &o, id)).collect();
    assert_eq!(levels, vec![1, 5, 2, 2]);
    let mut multiset = levels.clone();
    multiset.sort_unstable();
    assert_eq!(multiset, vec![1, 2, 2, 5]);
    assert!(s.org_config_row(&o).unwrap().is_customized);

    let down = s
        .move_position_level_row(MonotonicTimeNs(61), &o, &ids[0], MoveDirection::Down)
        .unwrap();
    assert_eq!(down.level, 2);
    assert_eq!(down.swapped_with.as_ref(), Some(&ids[2]));
    let levels: Vec<u32> = ids.iter().map(|id| level_of(&s, &o, id)).collect();
    assert_eq!(levels, vec![2, 5, 1, 2]);
}

#[test]
fn at_orgroles_db_12_ministry_delete_unassigns_and_promotes_children() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "embassy").unwrap();
    let count_before = s.positions_for_org_rows(&o).len();
    let cfg_before = s.org_config_row(&o).cloned().unwrap();

    let finances = s
        .ministry_groups_for_org_rows(&o)
        .into_iter()
        .find(|g| g.code.as_str() == "finances")
        .cloned()
        .unwrap();
    let tresor = s
        .ministry_groups_for_org_rows(&o)
        .into_iter()
        .find(|g| g.code.as_str() == "tresor_public")
        .cloned()
        .unwrap();

    let res = s
        .delete_ministry_group_row(MonotonicTimeNs(5), &o, &finances.group_id)
        .unwrap();
    assert_eq!(res.positions_unassigned, 0);
    assert_eq!(res.groups_promoted, 2);
    let promoted = s
        .ministry_groups_for_org_rows(&o)
        .into_iter()
        .find(|g| g.group_id == tresor.group_id)
        .unwrap();
    assert!(promoted.is_top_level());

    let res = s
        .delete_ministry_group_row(MonotonicTimeNs(6), &o, &tresor.group_id)
        .unwrap();
    assert_eq!(res.positions_unassigned, 1);
    assert!(s
        .positions_for_org_rows(&o)
        .iter()
        .all(|p| p.ministry_group_id.as_ref() != Some(&tresor.group_id)));
    assert_eq!(s.positions_for_org_rows(&o).len(), count_before);
    // ministry-group operations leave the customized flag alone
    assert_eq!(s.org_config_row(&o).unwrap(), &cfg_before);

    assert_eq!(
        catalog_kind(s.delete_ministry_group_row(MonotonicTimeNs(7), &o, &tresor.group_id)),
        CatalogErrorKind::NotFound
    );
}

#[test]
fn at_orgroles_db_13_ministry_nesting_is_capped_at_one_level() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.create_ministry_group_row(MonotonicTimeNs(1), &group_req(&o, "finances", 1, None))
        .unwrap();
    s.create_ministry_group_row(MonotonicTimeNs(2), &group_req(&o, "budget", 2, Some("finances")))
        .unwrap();

    let too_deep = s.create_ministry_group_row(
        MonotonicTimeNs(3),
        &group_req(&o, "paie", 3, Some("budget")),
    );
    assert!(matches!(
        too_deep,
        Err(StorageError::Catalog(CatalogError::InvalidParent { .. }))
    ));
    assert_eq!(catalog_kind(too_deep), CatalogErrorKind::InvalidMinistryGroup);

    let orphan = s.create_ministry_group_row(
        MonotonicTimeNs(4),
        &group_req(&o, "paie", 3, Some("absent")),
    );
    assert_eq!(catalog_kind(orphan), CatalogErrorKind::InvalidMinistryGroup);

    let dup = s.create_ministry_group_row(MonotonicTimeNs(5), &group_req(&o, "budget", 9, None));
    assert_eq!(catalog_kind(dup), CatalogErrorKind::DuplicateCode);
    assert_eq!(s.ministry_groups_for_org_rows(&o).len(), 2);
}

#[test]
fn at_orgroles_db_14_scenario_reset_restores_template_seed_set() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "embassy").unwrap();
    let seeded_codes: Vec<String> = s
        .positions_for_org_rows(&o)
        .iter()
        .map(|p| p.code.as_str().to_string())
        .collect();
    s.create_position_row(
        MonotonicTimeNs(2),
        &create_req(&o, "Attaché culturel", 4, &["culture_events"]),
    )
    .unwrap();
    let groups_before = s.ministry_groups_for_org_rows(&o).len();

    let res = s.reset_row(MonotonicTimeNs(3), &o, "embassy").unwrap();
    assert_eq!(res.positions_removed, 12);
    assert_eq!(res.positions_created, 11);
    assert_eq!(res.ministry_groups_created, 0);

    let cfg = s.org_config_row(&o).unwrap();
    assert!(!cfg.is_customized);
    assert_eq!(cfg.initialized_at, MonotonicTimeNs(3));

    let codes: Vec<String> = s
        .positions_for_org_rows(&o)
        .iter()
        .map(|p| p.code.as_str().to_string())
        .collect();
    assert_eq!(codes, seeded_codes);
    assert!(!codes.iter().any(|c| c == "attache_culturel"));
    assert!(s
        .positions_for_org_rows(&o)
        .iter()
        .all(|p| p.ministry_group_id.is_none()));
    assert_eq!(s.ministry_groups_for_org_rows(&o).len(), groups_before);
}

#[test]
fn at_orgroles_db_15_reset_twice_yields_identical_shape() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    s.initialize_row(MonotonicTimeNs(1), &o, "general_consulate").unwrap();

    s.reset_row(MonotonicTimeNs(2), &o, "general_consulate").unwrap();
    let first = shape(&s, &o);
    let first_codes: Vec<CatalogCode> = s.positions_for_org_rows(&o).iter().map(|p| p.code.clone()).collect();
    s.reset_row(MonotonicTimeNs(3), &o, "general_consulate").unwrap();
    let second = shape(&s, &o);
    let second_codes: Vec<CatalogCode> = s.positions_for_org_rows(&o).iter().map(|p| p.code.clone()).collect();

    assert_eq!(first.len(), 15);
    assert_eq!(first, second);
    assert_eq!(first_codes, second_codes);
}

#[test]
fn at_orgroles_db_16_reset_can_switch_template_and_requires_initialize() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    assert_eq!(
        catalog_kind(s.reset_row(MonotonicTimeNs(1), &o, "embassy")),
        CatalogErrorKind::NotInitialized
    );

    s.initialize_row(MonotonicTimeNs(2), &o, "embassy").unwrap();
    assert_eq!(
        catalog_kind(s.reset_row(MonotonicTimeNs(3), &o, "palace")),
        CatalogErrorKind::UnknownTemplate
    );
    assert_eq!(s.positions_for_org_rows(&o).len(), 11);

    let res = s.reset_row(MonotonicTimeNs(4), &o, "honorary_consulate").unwrap();
    assert_eq!(res.positions_created, 3);
    assert_eq!(
        s.org_config_row(&o).unwrap().template_type,
        TemplateType::HonoraryConsulate
    );
}

#[test]
fn at_orgroles_db_17_position_operations_require_initialized_org() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    let res = s.create_position_row(MonotonicTimeNs(1), &create_req(&o, "Agent", 1, &["reception"]));
    assert!(matches!(
        res,
        Err(StorageError::Catalog(CatalogError::NotFound {
            entity: "org_config",
            ..
        }))
    ));
    assert!(s.positions_for_org_rows(&o).is_empty());
}

#[test]
fn at_orgroles_db_18_organizations_are_isolated() {
    let mut s = CatalogStore::new_in_memory();
    let a = org("org_a");
    let b = org("org_b");
    s.initialize_row(MonotonicTimeNs(1), &a, "embassy").unwrap();
    s.initialize_row(MonotonicTimeNs(1), &b, "embassy").unwrap();

    // same code may exist in two organizations
    s.create_position_row(MonotonicTimeNs(2), &create_req(&a, "Attaché culturel", 4, &["culture_events"]))
        .unwrap();
    s.create_position_row(MonotonicTimeNs(2), &create_req(&b, "Attaché culturel", 4, &["culture_events"]))
        .unwrap();

    let a_pos = s.positions_for_org_rows(&a)[0].position_id.clone();
    assert_eq!(
        catalog_kind(s.delete_position_row(&b, &a_pos)),
        CatalogErrorKind::NotFound
    );

    s.reset_row(MonotonicTimeNs(3), &a, "custom").unwrap();
    assert!(s.positions_for_org_rows(&a).is_empty());
    assert_eq!(s.positions_for_org_rows(&b).len(), 12);

    let all = s.all_position_rows();
    assert_eq!(all.len(), 12);
    assert!(all.iter().all(|p| p.org_id == b));

    let full = s.full_config_row(&b);
    assert_eq!(full.positions.len(), 12);
    assert_eq!(full.ministry_groups.len(), 7);
    assert_eq!(full.role_modules.len(), 14);
    assert!(full.config.unwrap().is_customized);
}

#[test]
fn at_orgroles_db_19_direct_insert_holds_catalog_invariants() {
    let mut s = CatalogStore::new_in_memory();
    let o = org("org_1");
    let rec = |o: &OrgId, id: &str, code: &str, group: Option<&str>, module_codes: &[&str]| {
        PositionRecord::v1(
            o.clone(),
            PositionId::new(id).unwrap(),
            CatalogCode::new(code).unwrap(),
            fr("Poste"),
            None,
            1,
            None,
            group.map(|g| MinistryGroupId::new(g).unwrap()),
            modules(module_codes),
            false,
            true,
            1,
            MonotonicTimeNs(1),
        )
        .unwrap()
    };

    // no config yet
    assert_eq!(
        catalog_kind(s.insert_position_row(rec(&o, "pos_a", "poste_a", None, &[]))),
        CatalogErrorKind::NotFound
    );
    s.initialize_row(MonotonicTimeNs(1), &o, "custom").unwrap();

    s.insert_position_row(rec(&o, "pos_a", "poste_a", None, &["consultation"]))
        .unwrap();
    assert!(matches!(
        s.insert_position_row(rec(&o, "pos_a", "poste_z", None, &[])),
        Err(StorageError::DuplicateKey { table: "positions", .. })
    ));
    assert_eq!(
        catalog_kind(s.insert_position_row(rec(&o, "pos_b", "poste_a", None, &[]))),
        CatalogErrorKind::DuplicateCode
    );
    assert_eq!(
        catalog_kind(s.insert_position_row(rec(&o, "pos_c", "poste_c", None, &["not_a_real_code"]))),
        CatalogErrorKind::InvalidModuleCode
    );
    assert!(matches!(
        s.insert_position_row(rec(&o, "pos_d", "poste_d", Some("mg_missing"), &[])),
        Err(StorageError::ForeignKeyViolation { .. })
    ));
    assert_eq!(s.positions_for_org_rows(&o).len(), 1);
    assert!(!s.org_config_row(&o).unwrap().is_customized);
}

#[test]
fn at_orgroles_db_20_audit_ledger_is_append_only() {
    let mut s = CatalogStore::new_in_memory();
    let mut entries = BTreeMap::new();
    entries.insert(
        PayloadKey::new("state_from").unwrap(),
        PayloadValue::new("UNINITIALIZED").unwrap(),
    );
    entries.insert(
        PayloadKey::new("state_to").unwrap(),
        PayloadValue::new("INITIALIZED").unwrap(),
    );
    let input = AuditEventInput::v1(
        MonotonicTimeNs(10),
        Some("org_1".to_string()),
        "ORGROLES_OP_001_INITIALIZE".to_string(),
        AuditEventType::StateTransition,
        ReasonCodeId(0x4F52_0001),
        AuditSeverity::Info,
        CorrelationId(7),
        AuditPayloadMin::v1(entries).unwrap(),
    )
    .unwrap();

    let id = s.append_audit_row(input.clone()).unwrap();
    assert_eq!(id, AuditEventId(1));
    let id2 = s.append_audit_row(input).unwrap();
    assert_eq!(id2, AuditEventId(2));

    assert_eq!(s.audit_rows().len(), 2);
    assert_eq!(s.audit_rows_by_org("org_1").len(), 2);
    assert!(s.audit_rows_by_org("org_2").is_empty());
    assert_eq!(s.audit_rows_by_correlation(CorrelationId(7)).len(), 2);

    assert!(matches!(
        s.attempt_overwrite_audit_event(id),
        Err(StorageError::AppendOnlyViolation {
            table: "audit_events"
        })
    ));
}
