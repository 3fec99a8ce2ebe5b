#![forbid(unsafe_code)]

use orgroles_kernel_contracts::catalog::{MinistryGroupRecord, PositionGrade, PositionRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeBucket<'a> {
    pub grade: PositionGrade,
    pub positions: Vec<&'a PositionRecord>,
}

impl GradeBucket<'_> {
    pub fn count(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinistryBucket<'a> {
    /// `None` is the trailing "unassigned" bucket.
    pub group: Option<&'a MinistryGroupRecord>,
    pub positions: Vec<&'a PositionRecord>,
}

impl MinistryBucket<'_> {
    pub fn count(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinistryView<'a> {
    pub buckets: Vec<MinistryBucket<'a>>,
    /// Positions attached to a nested group. Nested groups get no bucket of their own.
    pub positions_in_nested_groups: usize,
}

fn sorted(mut v: Vec<&PositionRecord>) -> Vec<&PositionRecord> {
    v.sort_by_key(|p| p.sort_key());
    v
}

/// Four buckets in `chief, counselor, agent, external` order. Ungraded positions display as agent.
pub fn by_grade(positions: &[PositionRecord]) -> Vec<GradeBucket<'_>> {
    PositionGrade::DISPLAY_ORDER
        .into_iter()
        .map(|grade| GradeBucket {
            grade,
            positions: sorted(
                positions
                    .iter()
                    .filter(|p| p.grade.unwrap_or(PositionGrade::Agent) == grade)
                    .collect(),
            ),
        })
        .collect()
}

/// One bucket per top-level group ordered by `(sort_order, code)`, then the unassigned bucket.
pub fn by_ministry<'a>(
    positions: &'a [PositionRecord],
    groups: &'a [MinistryGroupRecord],
) -> MinistryView<'a> {
    let mut top: Vec<&MinistryGroupRecord> = groups.iter().filter(|g| g.is_top_level()).collect();
    top.sort_by(|a, b| (a.sort_order, &a.code).cmp(&(b.sort_order, &b.code)));

    let mut buckets: Vec<MinistryBucket<'a>> = top
        .into_iter()
        .map(|g| MinistryBucket {
            group: Some(g),
            positions: sorted(
                positions
                    .iter()
                    .filter(|p| p.ministry_group_id.as_ref() == Some(&g.group_id))
                    .collect(),
            ),
        })
        .collect();
    buckets.push(MinistryBucket {
        group: None,
        positions: sorted(
            positions
                .iter()
                .filter(|p| p.ministry_group_id.is_none())
                .collect(),
        ),
    });

    let positions_in_nested_groups = positions
        .iter()
        .filter(|p| {
            p.ministry_group_id.as_ref().is_some_and(|id| {
                groups
                    .iter()
                    .any(|g| &g.group_id == id && !g.is_top_level())
            })
        })
        .count();

    MinistryView {
        buckets,
        positions_in_nested_groups,
    }
}
