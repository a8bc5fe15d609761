//! FILENAME: core/matrix-engine/src/context.rs

/// Side channel filled in by the transforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformContext {
    /// Set when node identities changed, so cached tree references held by
    /// the caller are stale.
    pub hierarchy_trees_rewritten: bool,
}

impl TransformContext {
    pub fn new() -> Self {
        TransformContext::default()
    }
}
