//! FILENAME: core/matrix-engine/src/measure_headers.rs
//! Measure Headers - keeps the synthetic "which measure" column level in sync.
//!
//! When measures are projected without a column grouping that already
//! separates them, the column hierarchy ends in a synthetic level whose
//! sources are the value sources and whose nodes carry one header per
//! measure. After value sources change, that level has to be updated, added
//! or removed:
//!
//! | has header level | header needed | transition |
//! |---|---|---|
//! | yes | yes | Update |
//! | yes | no  | Remove |
//! | no  | yes | Add    |
//! | no  | no  | None   |
//!
//! A header is needed for 1+ measures when there is no dynamic column group,
//! and for 2+ measures when there is one.

use std::sync::Arc;

use dataview::matrix::source_index_tag;
use dataview::matrix_utils::{find_measure_header_level, visit_nodes_mut, VisitControl};
use dataview::{DataViewHierarchy, DataViewHierarchyLevel, DataViewMatrixNode, DataViewMetadataColumn, NodeRef};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureHeaderTransition {
    Update,
    Remove,
    Add,
    None,
}

/// Decides how the column hierarchy must change for `value_sources`.
pub fn measure_header_transition(
    columns: &DataViewHierarchy,
    value_sources: &[DataViewMetadataColumn],
) -> MeasureHeaderTransition {
    let header_level = find_measure_header_level(columns);
    let dynamic_levels = columns.levels.len() - usize::from(header_level.is_some());
    let required = if dynamic_levels > 0 { 2 } else { 1 };
    let needed = value_sources.len() >= required;

    match (header_level.is_some(), needed) {
        (true, true) => MeasureHeaderTransition::Update,
        (true, false) => MeasureHeaderTransition::Remove,
        (false, true) => MeasureHeaderTransition::Add,
        (false, false) => MeasureHeaderTransition::None,
    }
}

/// Returns the column hierarchy with its measure header level matching
/// `value_sources`. The input is returned as-is when nothing changes.
pub fn update_measure_headers(
    columns: &Arc<DataViewHierarchy>,
    value_sources: &[DataViewMetadataColumn],
) -> Arc<DataViewHierarchy> {
    let transition = measure_header_transition(columns, value_sources);
    if transition == MeasureHeaderTransition::None {
        return Arc::clone(columns);
    }
    debug!(
        "measure headers: {:?} for {} value sources",
        transition,
        value_sources.len()
    );

    let mut hierarchy = DataViewHierarchy::clone(columns);
    let measure_count = value_sources.len();

    match transition {
        MeasureHeaderTransition::Update => {
            let header_level = hierarchy.levels.len() - 1;
            hierarchy.levels[header_level].sources = value_sources.to_vec();
            for_each_measure_header_parent_mut(&mut hierarchy.root, header_level, &mut |parent: &mut DataViewMatrixNode| {
                parent.children = Some(measure_header_nodes(header_level, measure_count, parent.is_subtotal));
            });
        }
        MeasureHeaderTransition::Remove => {
            let header_level = hierarchy.levels.len() - 1;
            hierarchy.levels.pop();
            for_each_measure_header_parent_mut(&mut hierarchy.root, header_level, &mut |parent: &mut DataViewMatrixNode| {
                parent.children = None;
            });
        }
        MeasureHeaderTransition::Add => {
            let header_level = hierarchy.levels.len();
            hierarchy
                .levels
                .push(DataViewHierarchyLevel::new(value_sources.to_vec()));
            visit_nodes_mut(&mut hierarchy.root, &mut |node: &mut DataViewMatrixNode| {
                if node.is_leaf() {
                    node.children = Some(measure_header_nodes(header_level, measure_count, node.is_subtotal));
                    return VisitControl::SkipChildren;
                }
                VisitControl::Continue
            });
        }
        MeasureHeaderTransition::None => {}
    }

    Arc::new(hierarchy)
}

/// Visits every node whose children sit at `header_level`. Header nodes
/// themselves and anything below them are never entered.
fn for_each_measure_header_parent_mut<F>(root: &mut NodeRef, header_level: usize, f: &mut F)
where
    F: FnMut(&mut DataViewMatrixNode),
{
    visit_nodes_mut(root, &mut |node: &mut DataViewMatrixNode| {
        let is_parent = node
            .children
            .as_ref()
            .and_then(|children| children.first())
            .map_or(false, |child| child.level == Some(header_level));
        if is_parent {
            f(node);
            return VisitControl::SkipChildren;
        }
        VisitControl::Continue
    });
}

/// One header node per measure. The first omits its source index.
fn measure_header_nodes(level: usize, count: usize, is_subtotal: bool) -> Vec<NodeRef> {
    (0..count)
        .map(|i| {
            Arc::new(DataViewMatrixNode {
                level: Some(level),
                level_source_index: source_index_tag(i),
                is_subtotal,
                ..Default::default()
            })
        })
        .collect()
}
