//! FILENAME: core/matrix-engine/src/composite_groups.rs
//! Composite Groups - reorders the fields sharing one hierarchy level.
//!
//! A composite group level has 2+ sources (e.g. Country + Year). When the
//! user reorders those fields, the level's `sources` and every node's
//! `level_values` at that level are permuted to the projected order.
//!
//! Levels are scanned deepest first. The first level that needs a reorder
//! starts the copy-on-write clone of the hierarchy; shallower levels are
//! then reordered on the already-cloned tree.

use dataview::matrix::source_index_tag;
use dataview::matrix_utils::for_each_node_at_level_mut;
use dataview::{
    DataViewHierarchy, DataViewHierarchyLevel, DataViewMatrixLevelValue, DataViewMatrixNode, LevelValues,
    ProjectionOrdering,
};
use log::trace;

use crate::error::TransformError;

/// Moves the source at `original_index` of a level to `new_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceIndexMapping {
    pub original_index: usize,
    pub new_index: usize,
}

/// Reorders every composite level of `hierarchy` that holds 2+ fields of
/// `role`. Returns `None` when nothing had to move.
pub fn reorder_matrix_hierarchy_composite_groups(
    hierarchy: &DataViewHierarchy,
    role: &str,
    ordering: &ProjectionOrdering,
) -> Result<Option<DataViewHierarchy>, TransformError> {
    let Some(role_ordering) = ordering.get(role) else {
        return Ok(None);
    };
    if role_ordering.len() < 2 || hierarchy.levels.is_empty() {
        return Ok(None);
    }

    let mut transformed: Option<DataViewHierarchy> = None;

    for level_index in (0..hierarchy.levels.len()).rev() {
        let Some(mapping) =
            create_matrix_hierarchy_level_sources_position_mapping(&hierarchy.levels[level_index], role, ordering)?
        else {
            continue;
        };
        trace!("composite group: role '{}' level {} mapping {:?}", role, level_index, mapping);

        let target = transformed.get_or_insert_with(|| hierarchy.clone());

        let source_count = target.levels[level_index].sources.len();
        let mut old_to_new: Vec<Option<usize>> = (0..source_count).map(Some).collect();
        for m in &mapping {
            old_to_new[m.original_index] = Some(m.new_index);
        }

        let old_sources = target.levels[level_index].sources.clone();
        let new_sources = &mut target.levels[level_index].sources;
        for m in &mapping {
            new_sources[m.new_index] = old_sources[m.original_index].clone();
        }

        let mut failure = None;
        for_each_node_at_level_mut(&mut target.root, level_index, &mut |node: &mut DataViewMatrixNode| {
            if failure.is_none() {
                if let Err(err) = reorder_node_level_values(node, level_index, source_count, &old_to_new) {
                    failure = Some(err);
                }
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }
    }

    Ok(transformed)
}

/// Computes where each of `role`'s sources at `level` moves to.
///
/// Sources of other roles keep their positions; the role's sources are
/// redistributed over the positions they already occupy, in projection
/// order. Returns `None` if fewer than 2 of the level's sources belong to
/// `role` or if the order already matches.
pub fn create_matrix_hierarchy_level_sources_position_mapping(
    level: &DataViewHierarchyLevel,
    role: &str,
    ordering: &ProjectionOrdering,
) -> Result<Option<Vec<SourceIndexMapping>>, TransformError> {
    if level.sources.len() < 2 {
        return Ok(None);
    }
    let Some(role_ordering) = ordering.get(role) else {
        return Ok(None);
    };

    // The same field may be projected more than once into a composite group.
    let mut deduped: Vec<usize> = Vec::with_capacity(role_ordering.len());
    for &select_index in role_ordering {
        if !deduped.contains(&select_index) {
            deduped.push(select_index);
        }
    }

    // (position in level, position in projection)
    let mut role_sources: Vec<(usize, usize)> = Vec::new();
    for (source_index, source) in level.sources.iter().enumerate() {
        if !source.has_role(role) {
            continue;
        }
        let projected = source
            .index
            .and_then(|select_index| deduped.iter().position(|&s| s == select_index));
        match projected {
            Some(position) => role_sources.push((source_index, position)),
            None => {
                return Err(TransformError::MissingProjectedSource {
                    role: role.to_string(),
                    select_index: source.index,
                });
            }
        }
    }

    if role_sources.len() < 2 {
        return Ok(None);
    }

    let slots: Vec<usize> = role_sources.iter().map(|&(slot, _)| slot).collect();
    let mut sorted = role_sources;
    sorted.sort_by_key(|&(_, position)| position);

    let mapping: Vec<SourceIndexMapping> = sorted
        .iter()
        .zip(slots)
        .map(|(&(original_index, _), new_index)| SourceIndexMapping {
            original_index,
            new_index,
        })
        .collect();

    if mapping.iter().all(|m| m.original_index == m.new_index) {
        return Ok(None);
    }
    Ok(Some(mapping))
}

/// Permutes a node's level values to the new source order and refreshes the
/// scalar mirrors. Entries with no mapping sort last, in their old order.
fn reorder_node_level_values(
    node: &mut DataViewMatrixNode,
    level: usize,
    source_count: usize,
    old_to_new: &[Option<usize>],
) -> Result<(), TransformError> {
    let remap = |index: usize| old_to_new.get(index).copied().flatten();

    let Some(level_values) = node.level_values.as_mut() else {
        // Single-value node on a composite level: only the index moves.
        if let Some(new_index) = remap(node.source_index()) {
            node.level_source_index = source_index_tag(new_index);
        }
        return Ok(());
    };
    if level_values.is_empty() {
        return Ok(());
    }
    if level_values.len() != source_count {
        return Err(TransformError::LevelValueMismatch {
            level,
            expected: source_count,
            found: level_values.len(),
        });
    }

    let mut keyed: Vec<(Option<usize>, DataViewMatrixLevelValue)> = level_values
        .drain(..)
        .map(|level_value| (remap(level_value.source_index()), level_value))
        .collect();
    keyed.sort_by_key(|(new_index, _)| new_index.map_or((1, 0), |i| (0, i)));

    let reordered: LevelValues = keyed
        .into_iter()
        .map(|(new_index, mut level_value)| {
            if let Some(new_index) = new_index {
                level_value.level_source_index = source_index_tag(new_index);
            }
            level_value
        })
        .collect();
    *level_values = reordered;
    node.sync_level_value_mirror();
    Ok(())
}
