//! FILENAME: core/dataview/src/matrix.rs
//! DataView Matrix - hierarchical row/column groupings with intersection values.
//!
//! The tree is persistent: nodes are shared through `Arc`, and every
//! transform writes through `Arc::make_mut`. A write to a shared node clones
//! exactly that node (its children vector keeps pointing at the same child
//! `Arc`s), so any subtree a transform never touches keeps its identity and
//! can be compared with `Arc::ptr_eq` by consumers.
//!
//! Layout of a matrix:
//! - `rows`: hierarchy of row groupings, leaf nodes carry `values`
//! - `columns`: hierarchy of column groupings, the deepest level may be the
//!   synthetic measure header level
//! - `value_sources`: the measures, in intersection slot order

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::metadata::DataViewMetadataColumn;
use crate::value::PrimitiveValue;

/// Shared reference to a matrix node.
pub type NodeRef = Arc<DataViewMatrixNode>;

/// Level values of a composite group node. Most composite groups hold two
/// fields, so they stay inline.
pub type LevelValues = SmallVec<[DataViewMatrixLevelValue; 2]>;

/// Intersection values of a row leaf, keyed by intersection index
/// (`column group instance * value source count + value source`).
pub type NodeValues = FxHashMap<usize, DataViewMatrixNodeValue>;

// ============================================================================
// MATRIX
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMatrix {
    pub rows: Arc<DataViewHierarchy>,
    pub columns: Arc<DataViewHierarchy>,
    #[serde(default)]
    pub value_sources: Vec<DataViewMetadataColumn>,
}

impl DataViewMatrix {
    pub fn new(
        rows: DataViewHierarchy,
        columns: DataViewHierarchy,
        value_sources: Vec<DataViewMetadataColumn>,
    ) -> Self {
        DataViewMatrix {
            rows: Arc::new(rows),
            columns: Arc::new(columns),
            value_sources,
        }
    }
}

// ============================================================================
// HIERARCHY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewHierarchy {
    pub root: NodeRef,
    #[serde(default)]
    pub levels: Vec<DataViewHierarchyLevel>,
}

impl DataViewHierarchy {
    pub fn new(root: DataViewMatrixNode, levels: Vec<DataViewHierarchyLevel>) -> Self {
        DataViewHierarchy {
            root: Arc::new(root),
            levels,
        }
    }
}

/// One depth of a hierarchy. More than one source makes it a composite group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewHierarchyLevel {
    pub sources: Vec<DataViewMetadataColumn>,
}

impl DataViewHierarchyLevel {
    pub fn new(sources: Vec<DataViewMetadataColumn>) -> Self {
        DataViewHierarchyLevel { sources }
    }
}

// ============================================================================
// NODES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMatrixNode {
    /// Depth of the node. The root has none; its children are level 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,

    /// Which source of the level this node's value belongs to. `None` means 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_source_index: Option<usize>,

    /// One entry per level source, present on composite group nodes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_values: Option<LevelValues>,

    /// Mirror of the last `level_values` entry (or the only group value).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PrimitiveValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeRef>>,

    /// Intersection values, present on row leaves only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<NodeValues>,

    #[serde(default)]
    pub is_subtotal: bool,

    /// Opaque scope identity, referenced by data selectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl DataViewMatrixNode {
    /// Creates the (level-less) root of a hierarchy.
    pub fn root(children: Vec<DataViewMatrixNode>) -> Self {
        DataViewMatrixNode {
            children: Some(children.into_iter().map(Arc::new).collect()),
            ..Default::default()
        }
    }

    /// Creates a single-field group node at `level`.
    pub fn group(level: usize, value: impl Into<PrimitiveValue>) -> Self {
        DataViewMatrixNode {
            level: Some(level),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Creates a composite group node at `level`, one value per level source.
    /// The scalar mirrors follow the last entry.
    pub fn composite(level: usize, values: Vec<PrimitiveValue>) -> Self {
        let level_values: LevelValues = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| DataViewMatrixLevelValue {
                value,
                level_source_index: source_index_tag(i),
            })
            .collect();
        let mut node = DataViewMatrixNode {
            level: Some(level),
            level_values: Some(level_values),
            ..Default::default()
        };
        node.sync_level_value_mirror();
        node
    }

    pub fn with_children(mut self, children: Vec<DataViewMatrixNode>) -> Self {
        self.children = Some(children.into_iter().map(Arc::new).collect());
        self
    }

    /// Sets the intersection values of a row leaf from a dense slice.
    /// Slot `i` is tagged with `i % value_source_count`.
    pub fn with_values(mut self, values: Vec<PrimitiveValue>, value_source_count: usize) -> Self {
        let count = value_source_count.max(1);
        let map: NodeValues = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                (
                    i,
                    DataViewMatrixNodeValue {
                        value,
                        value_source_index: source_index_tag(i % count),
                        highlight: None,
                    },
                )
            })
            .collect();
        self.values = Some(map);
        self
    }

    pub fn with_subtotal(mut self, is_subtotal: bool) -> Self {
        self.is_subtotal = is_subtotal;
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// True if the node has no children (a leaf of its hierarchy).
    pub fn is_leaf(&self) -> bool {
        self.children.as_ref().map_or(true, |c| c.is_empty())
    }

    /// Effective level source index (absent means 0).
    pub fn source_index(&self) -> usize {
        self.level_source_index.unwrap_or(0)
    }

    /// Re-derives `value` and `level_source_index` from the last level value.
    pub fn sync_level_value_mirror(&mut self) {
        if let Some(last) = self.level_values.as_ref().and_then(|lv| lv.last()) {
            self.value = Some(last.value.clone());
            self.level_source_index = last.level_source_index;
        }
    }
}

/// One field's value within a composite group node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMatrixLevelValue {
    pub value: PrimitiveValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_source_index: Option<usize>,
}

impl DataViewMatrixLevelValue {
    pub fn source_index(&self) -> usize {
        self.level_source_index.unwrap_or(0)
    }
}

/// One intersection value at a row leaf.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMatrixNodeValue {
    pub value: PrimitiveValue,
    /// Which value source produced this value. `None` means 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_source_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<PrimitiveValue>,
}

impl DataViewMatrixNodeValue {
    pub fn source_index(&self) -> usize {
        self.value_source_index.unwrap_or(0)
    }
}

/// Index 0 is left implicit on source index fields.
pub fn source_index_tag(index: usize) -> Option<usize> {
    if index == 0 {
        None
    } else {
        Some(index)
    }
}
