//! FILENAME: core/dataview/src/lib.rs
//! DataView shared types.
//!
//! This crate holds the data model consumed and produced by the matrix
//! transforms, plus the selector-keyed store of formatting overrides.
//!
//! Layers:
//! - `value`, `metadata`, `matrix`: the DataView matrix model
//! - `matrix_utils`: traversals, including the copy-on-write walker
//! - `mapping`: role mappings and projection ordering (host input)
//! - `selector`, `expr`, `filter`, `descriptor`, `objects`: property definitions
//! - `evaluator`: effective property values for the property pane

pub mod value;
pub mod metadata;
pub mod matrix;
pub mod matrix_utils;
pub mod mapping;
pub mod selector;
pub mod expr;
pub mod filter;
pub mod descriptor;
pub mod objects;
pub mod evaluator;

pub use value::{coerce_numeric_text, PrimitiveValue};
pub use metadata::{DataViewMetadataColumn, SelectIndex};
pub use matrix::{
    DataViewHierarchy, DataViewHierarchyLevel, DataViewMatrix, DataViewMatrixLevelValue,
    DataViewMatrixNode, DataViewMatrixNodeValue, LevelValues, NodeRef, NodeValues,
};
pub use matrix_utils::VisitControl;
pub use mapping::{MatrixRoleMapping, ProjectionOrdering, RoleMapping};
pub use selector::{DataRepetitionSelector, Selector};
pub use expr::SQExpr;
pub use filter::{ComparisonKind, FilterCondition, SemanticFilter};
pub use descriptor::{
    DataViewObjectDescriptor, DataViewObjectDescriptors, DataViewPropertyDescriptor, PropertyTypeKind,
};
pub use objects::{
    DataViewObjectDefinition, DataViewObjectDefinitions, DataViewObjectPropertyDefinition,
    DataViewObjectPropertyDefinitions, DataViewObjectPropertyIdentifier, PropertyValue,
};
pub use evaluator::{evaluate_data_view_objects, DataViewObjects, EvaluatedProperty};
