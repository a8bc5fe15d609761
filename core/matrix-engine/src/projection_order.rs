//! FILENAME: core/matrix-engine/src/projection_order.rs
//! Projection Order - reshapes a matrix to the user's field order.
//!
//! Given a prototype matrix and the per-role projection ordering, produces a
//! matrix whose measures and composite group fields follow that order.
//!
//! Algorithm:
//! 1. Measure reprojection: reorder (and drop) value sources, move every row
//!    leaf's intersection values to their new slots, sync measure headers.
//! 2. Composite group reordering: permute multi-field levels of the row and
//!    column hierarchies, role by role.
//!
//! Step 2 reads the columns produced by step 1, so the order is fixed.
//! Neither step mutates the prototype; untouched subtrees are shared.

use std::sync::Arc;

use dataview::matrix::source_index_tag;
use dataview::matrix_utils::{
    find_measure_header_level, for_each_leaf_node_mut_where, leaf_count, node_values_span,
};
use dataview::{
    DataViewHierarchy, DataViewMatrix, DataViewMatrixNode, DataViewMatrixNodeValue, DataViewMetadataColumn,
    MatrixRoleMapping, NodeValues, ProjectionOrdering, RoleMapping, SelectIndex,
};
use log::{debug, warn};

use crate::composite_groups::reorder_matrix_hierarchy_composite_groups;
use crate::context::TransformContext;
use crate::error::TransformError;
use crate::measure_headers::update_measure_headers;

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Applies `ordering` to `prototype`.
///
/// Never fails: if an internal invariant is violated the prototype is
/// returned unchanged (and a warning is logged), so the visual keeps
/// rendering the unreordered data.
pub fn apply(
    prototype: &Arc<DataViewMatrix>,
    mapping: &MatrixRoleMapping,
    ordering: Option<&ProjectionOrdering>,
    ctx: &mut TransformContext,
) -> Arc<DataViewMatrix> {
    match try_apply(prototype, mapping, ordering, ctx) {
        Ok(matrix) => matrix,
        Err(err) => {
            warn!("projection ordering not applied: {}", err);
            Arc::clone(prototype)
        }
    }
}

/// Like [`apply`], but reports invariant violations. `ctx` is only updated
/// when the whole transform succeeds.
pub fn try_apply(
    prototype: &Arc<DataViewMatrix>,
    mapping: &MatrixRoleMapping,
    ordering: Option<&ProjectionOrdering>,
    ctx: &mut TransformContext,
) -> Result<Arc<DataViewMatrix>, TransformError> {
    let Some(ordering) = ordering else {
        return Ok(Arc::clone(prototype));
    };

    let mut local = TransformContext::new();
    let projected = project_measures(prototype, mapping, ordering, &mut local)?;
    let base: &DataViewMatrix = projected.as_ref().unwrap_or(&**prototype);
    let reordered = reorder_composite_groups(base, mapping, ordering, &mut local)?;

    ctx.hierarchy_trees_rewritten |= local.hierarchy_trees_rewritten;

    Ok(match (projected, reordered) {
        (_, Some(matrix)) | (Some(matrix), None) => Arc::new(matrix),
        (None, None) => Arc::clone(prototype),
    })
}

// ============================================================================
// MEASURE REPROJECTION
// ============================================================================

/// Reorders the measures of `matrix` to the combined ordering of its value
/// roles. Returns `None` when the measures already match.
pub fn project_measures(
    matrix: &DataViewMatrix,
    mapping: &MatrixRoleMapping,
    ordering: &ProjectionOrdering,
    ctx: &mut TransformContext,
) -> Result<Option<DataViewMatrix>, TransformError> {
    let role_names = get_matrix_values_role_names(mapping);
    if role_names.is_empty() {
        return Ok(None);
    }
    let Some(combined) = get_combined_projection_ordering(&role_names, ordering) else {
        return Ok(None);
    };

    let value_sources = &matrix.value_sources;
    if value_sources.is_empty() || value_sources_match_ordering(value_sources, &combined) {
        return Ok(None);
    }

    let projected = project_value_sources(value_sources, &combined);
    let unchanged = projected.len() == value_sources.len()
        && projected.iter().enumerate().all(|(slot, &original)| slot == original);
    if unchanged {
        return Ok(None);
    }

    let instance_count = column_group_instance_count(&matrix.columns, value_sources.len())?;
    let rows = reproject_row_values(&matrix.rows, value_sources.len(), instance_count, &projected)?;
    let new_value_sources: Vec<DataViewMetadataColumn> =
        projected.iter().map(|&original| value_sources[original].clone()).collect();
    let columns = update_measure_headers(&matrix.columns, &new_value_sources);

    debug!(
        "reprojected measures {:?} -> {:?}",
        value_sources.iter().map(|s| s.index).collect::<Vec<_>>(),
        new_value_sources.iter().map(|s| s.index).collect::<Vec<_>>()
    );
    ctx.hierarchy_trees_rewritten = true;

    Ok(Some(DataViewMatrix {
        rows: Arc::new(rows),
        columns,
        value_sources: new_value_sources,
    }))
}

/// Roles that feed the matrix values, in encounter order.
pub fn get_matrix_values_role_names(mapping: &MatrixRoleMapping) -> Vec<String> {
    let mut role_names = Vec::new();
    if let Some(values) = &mapping.values {
        values.visit_select_roles(&mut |role: &str| role_names.push(role.to_string()));
    }
    role_names
}

/// Concatenates the orderings of `role_names`. `None` if none of them has one.
pub fn get_combined_projection_ordering(
    role_names: &[String],
    ordering: &ProjectionOrdering,
) -> Option<Vec<SelectIndex>> {
    let mut combined: Option<Vec<SelectIndex>> = None;
    for role_name in role_names {
        if let Some(role_ordering) = ordering.get(role_name) {
            combined.get_or_insert_with(Vec::new).extend_from_slice(role_ordering);
        }
    }
    combined
}

fn value_sources_match_ordering(value_sources: &[DataViewMetadataColumn], combined: &[SelectIndex]) -> bool {
    value_sources.len() == combined.len()
        && value_sources
            .iter()
            .zip(combined)
            .all(|(source, &select_index)| source.index == Some(select_index))
}

/// Left-joins the value sources against the ordering and returns the
/// original indices of the survivors in projected order. Repeated select
/// indices in the ordering are matched left to right.
fn project_value_sources(value_sources: &[DataViewMetadataColumn], combined: &[SelectIndex]) -> Vec<usize> {
    let mut used = vec![false; combined.len()];
    let mut joined: Vec<(usize, usize)> = Vec::with_capacity(value_sources.len());

    for (original, source) in value_sources.iter().enumerate() {
        let Some(select_index) = source.index else {
            continue;
        };
        if let Some(position) = (0..combined.len()).find(|&p| !used[p] && combined[p] == select_index) {
            used[position] = true;
            joined.push((position, original));
        }
    }

    joined.sort_by_key(|&(position, _)| position);
    joined.into_iter().map(|(_, original)| original).collect()
}

/// Number of column group instances, i.e. column leaves that own a block of
/// value slots. Under a measure header level each instance has one header
/// leaf per measure.
fn column_group_instance_count(
    columns: &DataViewHierarchy,
    value_source_count: usize,
) -> Result<usize, TransformError> {
    let leaves = leaf_count(&columns.root);
    if find_measure_header_level(columns).is_none() {
        return Ok(leaves);
    }
    if leaves % value_source_count != 0 {
        return Err(TransformError::ValueCountNotMultiple {
            count: leaves,
            value_sources: value_source_count,
        });
    }
    Ok(leaves / value_source_count)
}

/// Moves every row leaf's intersection values to the projected slots.
///
/// A leaf's values form `instance_count * original_len` slots; each column
/// group instance block is rebuilt as `instance_count * projected.len()`
/// slots. Leaves may be sparse, including missing trailing slots, but no
/// leaf may reach past the last instance. Leaves without values stay shared.
fn reproject_row_values(
    rows: &DataViewHierarchy,
    original_len: usize,
    instance_count: usize,
    projected: &[usize],
) -> Result<DataViewHierarchy, TransformError> {
    let mut hierarchy = rows.clone();
    let projecting_len = projected.len();
    let mut failure: Option<TransformError> = None;

    for_each_leaf_node_mut_where(
        &mut hierarchy.root,
        &mut |node: &DataViewMatrixNode| node.values.as_ref().map_or(false, |v| !v.is_empty()),
        &mut |leaf: &mut DataViewMatrixNode| {
            if failure.is_some() {
                return;
            }
            let Some(old_values) = leaf.values.as_ref() else {
                return;
            };

            let count = node_values_span(old_values).div_ceil(original_len);
            if count > instance_count {
                failure = Some(TransformError::InconsistentValueCount {
                    expected: instance_count,
                    found: count,
                });
                return;
            }

            if projecting_len == 0 {
                leaf.values = None;
                return;
            }

            let mut new_values = NodeValues::default();
            for instance in 0..count {
                for (slot, &original) in projected.iter().enumerate() {
                    if let Some(value) = old_values.get(&(instance * original_len + original)) {
                        new_values.insert(
                            instance * projecting_len + slot,
                            DataViewMatrixNodeValue {
                                value_source_index: source_index_tag(slot),
                                ..value.clone()
                            },
                        );
                    }
                }
            }
            leaf.values = Some(new_values);
        },
    );

    match failure {
        Some(err) => Err(err),
        None => Ok(hierarchy),
    }
}

// ============================================================================
// COMPOSITE GROUP REORDERING
// ============================================================================

/// Reorders composite group levels of rows and columns. Returns `None` when
/// neither hierarchy changed.
pub fn reorder_composite_groups(
    matrix: &DataViewMatrix,
    mapping: &MatrixRoleMapping,
    ordering: &ProjectionOrdering,
    ctx: &mut TransformContext,
) -> Result<Option<DataViewMatrix>, TransformError> {
    let rows = reorder_hierarchy_for_roles(&matrix.rows, mapping.rows.as_ref(), ordering)?;
    let columns = reorder_hierarchy_for_roles(&matrix.columns, mapping.columns.as_ref(), ordering)?;

    if rows.is_none() && columns.is_none() {
        return Ok(None);
    }
    debug!(
        "reordered composite groups (rows: {}, columns: {})",
        rows.is_some(),
        columns.is_some()
    );
    ctx.hierarchy_trees_rewritten = true;

    Ok(Some(DataViewMatrix {
        rows: rows.map_or_else(|| Arc::clone(&matrix.rows), Arc::new),
        columns: columns.map_or_else(|| Arc::clone(&matrix.columns), Arc::new),
        value_sources: matrix.value_sources.clone(),
    }))
}

/// Runs the per-role reorder for every role bound to one hierarchy, feeding
/// each role the previous role's result.
fn reorder_hierarchy_for_roles(
    hierarchy: &DataViewHierarchy,
    role_mapping: Option<&RoleMapping>,
    ordering: &ProjectionOrdering,
) -> Result<Option<DataViewHierarchy>, TransformError> {
    let Some(role_mapping) = role_mapping else {
        return Ok(None);
    };
    let mut roles: Vec<String> = Vec::new();
    role_mapping.visit_roles(&mut |role: &str| roles.push(role.to_string()));

    let mut transformed: Option<DataViewHierarchy> = None;
    for role in &roles {
        let current = transformed.as_ref().unwrap_or(hierarchy);
        if let Some(next) = reorder_matrix_hierarchy_composite_groups(current, role, ordering)? {
            transformed = Some(next);
        }
    }
    Ok(transformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataview::{DataViewHierarchyLevel, PrimitiveValue};

    fn values_mapping() -> MatrixRoleMapping {
        MatrixRoleMapping {
            rows: Some(RoleMapping::for_role("Rows")),
            columns: Some(RoleMapping::for_role("Columns")),
            values: Some(RoleMapping::Select(vec![
                RoleMapping::for_role("Values"),
                RoleMapping::for_role("Tooltips"),
            ])),
        }
    }

    fn source(name: &str, index: usize) -> DataViewMetadataColumn {
        DataViewMetadataColumn::measure(name, index, "Values")
    }

    #[test]
    fn test_values_role_names_and_combined_ordering() {
        let roles = get_matrix_values_role_names(&values_mapping());
        assert_eq!(roles, vec!["Values", "Tooltips"]);

        let ordering = ProjectionOrdering::new()
            .with_role("Values", vec![3, 2])
            .with_role("Tooltips", vec![5]);
        assert_eq!(get_combined_projection_ordering(&roles, &ordering), Some(vec![3, 2, 5]));
        assert_eq!(get_combined_projection_ordering(&roles, &ProjectionOrdering::new()), None);
        assert!(get_matrix_values_role_names(&MatrixRoleMapping::default()).is_empty());
    }

    #[test]
    fn test_project_value_sources_left_join() {
        let sources = vec![source("A", 1), source("B", 2), source("C", 3)];
        // C first, A dropped, unknown 9 ignored.
        assert_eq!(project_value_sources(&sources, &[3, 9, 2]), vec![2, 1]);
        assert!(value_sources_match_ordering(&sources, &[1, 2, 3]));
        assert!(!value_sources_match_ordering(&sources, &[1, 2]));
    }

    #[test]
    fn test_duplicate_measures_keep_distinct_slots() {
        let sources = vec![source("A", 1), source("A", 1), source("B", 2)];
        assert_eq!(project_value_sources(&sources, &[2, 1, 1]), vec![2, 0, 1]);
    }

    #[test]
    fn test_reproject_blocks_per_column_instance() {
        let rows = DataViewHierarchy::new(
            DataViewMatrixNode::root(vec![DataViewMatrixNode::group(0, "North").with_values(
                vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()],
                2,
            )]),
            vec![DataViewHierarchyLevel::new(vec![DataViewMetadataColumn::grouping("Region", 0, "Rows")])],
        );
        let swapped = reproject_row_values(&rows, 2, 2, &[1, 0]).unwrap();
        let leaf = &swapped.root.children.as_ref().unwrap()[0];
        let values = leaf.values.as_ref().unwrap();
        assert_eq!(values[&0].value, PrimitiveValue::Number(2.0));
        assert_eq!(values[&0].value_source_index, None);
        assert_eq!(values[&1].value, PrimitiveValue::Number(1.0));
        assert_eq!(values[&1].value_source_index, Some(1));
        assert_eq!(values[&2].value, PrimitiveValue::Number(4.0));
        assert_eq!(values[&3].value, PrimitiveValue::Number(3.0));

        let dropped = reproject_row_values(&rows, 2, 2, &[1]).unwrap();
        let values = dropped.root.children.as_ref().unwrap()[0].values.clone().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[&0].value, PrimitiveValue::Number(2.0));
        assert_eq!(values[&1].value, PrimitiveValue::Number(4.0));

        let cleared = reproject_row_values(&rows, 2, 2, &[]).unwrap();
        assert!(cleared.root.children.as_ref().unwrap()[0].values.is_none());
    }

    #[test]
    fn test_reproject_detects_inconsistent_leaves() {
        let rows = DataViewHierarchy::new(
            DataViewMatrixNode::root(vec![
                DataViewMatrixNode::group(0, "North").with_values(vec![1.0.into(), 2.0.into()], 2),
                DataViewMatrixNode::group(0, "South").with_values(
                    vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()],
                    2,
                ),
            ]),
            vec![],
        );
        assert_eq!(
            reproject_row_values(&rows, 2, 1, &[1, 0]).err(),
            Some(TransformError::InconsistentValueCount { expected: 1, found: 2 })
        );
    }

    #[test]
    fn test_column_group_instance_count() {
        let header = |tag: Option<usize>| DataViewMatrixNode {
            level: Some(1),
            level_source_index: tag,
            ..Default::default()
        };
        let years = |headers: usize| {
            DataViewHierarchy::new(
                DataViewMatrixNode::root(vec![
                    DataViewMatrixNode::group(0, 2020.0)
                        .with_children((0..headers).map(|i| header(source_index_tag(i))).collect()),
                    DataViewMatrixNode::group(0, 2021.0)
                        .with_children((0..headers).map(|i| header(source_index_tag(i))).collect()),
                ]),
                vec![
                    DataViewHierarchyLevel::new(vec![DataViewMetadataColumn::grouping("Year", 0, "Columns")]),
                    DataViewHierarchyLevel::new(vec![source("A", 1), source("B", 2)]),
                ],
            )
        };

        assert_eq!(column_group_instance_count(&years(2), 2), Ok(2));
        assert_eq!(
            column_group_instance_count(&years(2), 3),
            Err(TransformError::ValueCountNotMultiple { count: 4, value_sources: 3 })
        );
        assert_eq!(column_group_instance_count(&DataViewHierarchy::default(), 1), Ok(1));
    }

    #[test]
    fn test_sparse_values_keep_holes() {
        let mut leaf = DataViewMatrixNode::group(0, "North");
        let mut values = NodeValues::default();
        values.insert(
            1,
            DataViewMatrixNodeValue {
                value: 7.0.into(),
                value_source_index: Some(1),
                highlight: None,
            },
        );
        leaf.values = Some(values);
        let rows = DataViewHierarchy::new(DataViewMatrixNode::root(vec![leaf]), vec![]);

        let swapped = reproject_row_values(&rows, 2, 1, &[1, 0]).unwrap();
        let values = swapped.root.children.as_ref().unwrap()[0].values.clone().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[&0].value, PrimitiveValue::Number(7.0));
        assert_eq!(values[&0].value_source_index, None);
    }

    fn sparse_leaf(name: &str, slots: &[(usize, f64)]) -> DataViewMatrixNode {
        let mut leaf = DataViewMatrixNode::group(0, name);
        let values: NodeValues = slots
            .iter()
            .map(|&(slot, v)| {
                (
                    slot,
                    DataViewMatrixNodeValue {
                        value: v.into(),
                        value_source_index: source_index_tag(slot % 2),
                        highlight: None,
                    },
                )
            })
            .collect();
        leaf.values = Some(values);
        leaf
    }

    #[test]
    fn test_sparse_leaf_missing_trailing_slot() {
        let rows = DataViewHierarchy::new(
            DataViewMatrixNode::root(vec![
                DataViewMatrixNode::group(0, "North").with_values(vec![1.0.into(), 2.0.into()], 2),
                sparse_leaf("South", &[(0, 5.0)]),
            ]),
            vec![],
        );
        let swapped = reproject_row_values(&rows, 2, 1, &[1, 0]).unwrap();
        let leaves = swapped.root.children.as_ref().unwrap();
        let south = leaves[1].values.as_ref().unwrap();
        assert_eq!(south.len(), 1);
        assert_eq!(south[&1].value, PrimitiveValue::Number(5.0));
        assert_eq!(south[&1].value_source_index, Some(1));

        // A sparse leaf listed before the dense ones is accepted as well.
        let rows = DataViewHierarchy::new(
            DataViewMatrixNode::root(vec![
                sparse_leaf("South", &[(0, 5.0)]),
                DataViewMatrixNode::group(0, "North").with_values(vec![1.0.into(), 2.0.into()], 2),
            ]),
            vec![],
        );
        assert!(reproject_row_values(&rows, 2, 1, &[1, 0]).is_ok());
    }

    #[test]
    fn test_sparse_leaf_past_last_instance_is_inconsistent() {
        let rows = DataViewHierarchy::new(
            DataViewMatrixNode::root(vec![
                DataViewMatrixNode::group(0, "North").with_values(vec![1.0.into(), 2.0.into()], 2),
                sparse_leaf("South", &[(2, 5.0)]),
            ]),
            vec![],
        );
        assert_eq!(
            reproject_row_values(&rows, 2, 1, &[1, 0]).err(),
            Some(TransformError::InconsistentValueCount { expected: 1, found: 2 })
        );

        let rows = DataViewHierarchy::new(
            DataViewMatrixNode::root(vec![
                sparse_leaf("South", &[(2, 5.0)]),
                DataViewMatrixNode::group(0, "North").with_values(vec![1.0.into(), 2.0.into()], 2),
            ]),
            vec![],
        );
        assert_eq!(
            reproject_row_values(&rows, 2, 1, &[1, 0]).err(),
            Some(TransformError::InconsistentValueCount { expected: 1, found: 2 })
        );
    }

    #[test]
    fn test_leaves_without_values_stay_shared() {
        let rows = DataViewHierarchy::new(
            DataViewMatrixNode::root(vec![
                DataViewMatrixNode::group(0, "North").with_values(vec![1.0.into(), 2.0.into()], 2),
                DataViewMatrixNode::group(0, "South"),
            ]),
            vec![],
        );
        let swapped = reproject_row_values(&rows, 2, 1, &[1, 0]).unwrap();
        let old_leaves = rows.root.children.as_ref().unwrap();
        let new_leaves = swapped.root.children.as_ref().unwrap();
        assert!(!Arc::ptr_eq(&old_leaves[0], &new_leaves[0]));
        assert!(Arc::ptr_eq(&old_leaves[1], &new_leaves[1]));
    }
}
