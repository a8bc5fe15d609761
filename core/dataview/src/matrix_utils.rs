//! FILENAME: core/dataview/src/matrix_utils.rs
//! PURPOSE: Traversal helpers over matrix hierarchies.
//! CONTEXT: `visit_nodes_mut_if` is the one copy-on-write walker. Every transform
//! that rewrites nodes goes through it so that the cloning depth is decided in
//! a single place: a node is cloned only when the visitor enters it, and a
//! rejected node or a visitor that returns `SkipChildren` leaves the whole
//! subtree shared.

use std::sync::Arc;

use crate::matrix::{DataViewHierarchy, DataViewHierarchyLevel, DataViewMatrixNode, NodeRef, NodeValues};

/// Returned by mutable visitors to steer the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    /// Descend into the node's children.
    Continue,
    /// Do not enter (or clone) any descendant of this node.
    SkipChildren,
}

// ============================================================================
// READ-ONLY TRAVERSALS
// ============================================================================

/// Calls `f` for every leaf (a node without children), depth first.
pub fn for_each_leaf_node<F>(root: &DataViewMatrixNode, f: &mut F)
where
    F: FnMut(&DataViewMatrixNode),
{
    match &root.children {
        Some(children) if !children.is_empty() => {
            for child in children {
                for_each_leaf_node(child, f);
            }
        }
        _ => f(root),
    }
}

/// Calls `f` for every node whose `level` equals `level`. Descendants of a
/// matching node are not visited.
pub fn for_each_node_at_level<F>(root: &DataViewMatrixNode, level: usize, f: &mut F)
where
    F: FnMut(&DataViewMatrixNode),
{
    if root.level == Some(level) {
        f(root);
        return;
    }
    if let Some(children) = &root.children {
        for child in children {
            for_each_node_at_level(child, level, f);
        }
    }
}

/// Number of leaves under `root` (the root itself counts if it is a leaf).
pub fn leaf_count(root: &DataViewMatrixNode) -> usize {
    let mut count = 0;
    for_each_leaf_node(root, &mut |_: &DataViewMatrixNode| count += 1);
    count
}

// ============================================================================
// COPY-ON-WRITE TRAVERSALS
// ============================================================================

/// Walks the tree depth first, making every entered node unique with
/// `Arc::make_mut` before handing it to `f`.
///
/// A node that is still shared with another tree is cloned on entry; a node
/// already owned by this tree (cloned earlier in the same transform) is
/// mutated in place.
pub fn visit_nodes_mut<F>(node: &mut NodeRef, f: &mut F)
where
    F: FnMut(&mut DataViewMatrixNode) -> VisitControl,
{
    visit_nodes_mut_if(node, &mut |_: &DataViewMatrixNode| true, f);
}

/// Like [`visit_nodes_mut`], but `enter` sees each node through a shared
/// borrow first. A rejected node is neither cloned nor visited, and its
/// subtree stays shared.
pub fn visit_nodes_mut_if<E, F>(node: &mut NodeRef, enter: &mut E, f: &mut F)
where
    E: FnMut(&DataViewMatrixNode) -> bool,
    F: FnMut(&mut DataViewMatrixNode) -> VisitControl,
{
    if !enter(&**node) {
        return;
    }
    let node = Arc::make_mut(node);
    if f(node) == VisitControl::SkipChildren {
        return;
    }
    if let Some(children) = node.children.as_mut() {
        for child in children.iter_mut() {
            visit_nodes_mut_if(child, enter, f);
        }
    }
}

/// Mutable counterpart of [`for_each_leaf_node`]. Every node on a path to a
/// leaf is cloned if shared. Children that `f` attaches to a leaf are not
/// visited.
pub fn for_each_leaf_node_mut<F>(root: &mut NodeRef, f: &mut F)
where
    F: FnMut(&mut DataViewMatrixNode),
{
    for_each_leaf_node_mut_where(root, &mut |_: &DataViewMatrixNode| true, f);
}

/// Like [`for_each_leaf_node_mut`], restricted to the leaves `filter`
/// accepts. Rejected leaves are not cloned.
pub fn for_each_leaf_node_mut_where<P, F>(root: &mut NodeRef, filter: &mut P, f: &mut F)
where
    P: FnMut(&DataViewMatrixNode) -> bool,
    F: FnMut(&mut DataViewMatrixNode),
{
    visit_nodes_mut_if(
        root,
        &mut |node: &DataViewMatrixNode| !node.is_leaf() || filter(node),
        &mut |node: &mut DataViewMatrixNode| {
            if node.is_leaf() {
                f(node);
                return VisitControl::SkipChildren;
            }
            VisitControl::Continue
        },
    );
}

/// Mutable counterpart of [`for_each_node_at_level`]. Only the nodes at or
/// above `level` are cloned; subtrees below them stay shared.
pub fn for_each_node_at_level_mut<F>(root: &mut NodeRef, level: usize, f: &mut F)
where
    F: FnMut(&mut DataViewMatrixNode),
{
    visit_nodes_mut(root, &mut |node: &mut DataViewMatrixNode| {
        if node.level == Some(level) {
            f(node);
            return VisitControl::SkipChildren;
        }
        VisitControl::Continue
    });
}

// ============================================================================
// HIERARCHY QUERIES
// ============================================================================

/// A level is a measure header level when it has sources and all of them
/// are measures.
pub fn is_measure_header_level(level: &DataViewHierarchyLevel) -> bool {
    !level.sources.is_empty() && level.sources.iter().all(|s| s.is_measure)
}

/// Index of the measure header level, which is always the deepest level.
pub fn find_measure_header_level(hierarchy: &DataViewHierarchy) -> Option<usize> {
    let last = hierarchy.levels.len().checked_sub(1)?;
    is_measure_header_level(&hierarchy.levels[last]).then_some(last)
}

/// True if any level of the hierarchy is fed by more than one field.
pub fn contains_composite_group(hierarchy: &DataViewHierarchy) -> bool {
    hierarchy.levels.iter().any(|level| level.sources.len() >= 2)
}

/// Array-like length of an intersection values dictionary: highest key + 1.
pub fn node_values_span(values: &NodeValues) -> usize {
    values.keys().max().map_or(0, |max| max + 1)
}
