//! FILENAME: core/matrix-engine/src/lib.rs
//! Matrix projection-ordering engine.
//!
//! Takes a prototype DataView matrix built in query order and reshapes it to
//! the order the user arranged the fields in.
//!
//! Layers:
//! - `projection_order`: entry points and measure reprojection
//! - `measure_headers`: the synthetic measure header column level
//! - `composite_groups`: multi-field levels of rows and columns
//! - `context`, `error`: side channel and invariant violations
//!
//! Every transform is copy-on-write: the prototype is never mutated and
//! subtrees a transform does not touch are shared with it.

pub mod composite_groups;
pub mod context;
pub mod error;
pub mod measure_headers;
pub mod projection_order;

pub use composite_groups::{
    create_matrix_hierarchy_level_sources_position_mapping, reorder_matrix_hierarchy_composite_groups,
    SourceIndexMapping,
};
pub use context::TransformContext;
pub use error::TransformError;
pub use measure_headers::{measure_header_transition, update_measure_headers, MeasureHeaderTransition};
pub use projection_order::{
    apply, get_combined_projection_ordering, get_matrix_values_role_names, project_measures,
    reorder_composite_groups, try_apply,
};
