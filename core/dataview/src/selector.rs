//! FILENAME: core/dataview/src/selector.rs
//! PURPOSE: Selectors identify the visual element a property override applies to.
//! CONTEXT: Selectors are compared by value, never by reference. A missing
//! selector means "object-wide default".

use serde::{Deserialize, Serialize};

/// Identifies a repeated data element (a category instance or series).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataRepetitionSelector {
    /// A concrete scope identity (matches `DataViewMatrixNode::identity`).
    Identity(String),
    /// Every instance grouped by the given query names.
    Wildcard(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataRepetitionSelector>,
    /// Query name of a metadata column (e.g. a measure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    /// Static element id (e.g. a legend entry).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Selector {
    pub fn for_identity(identity: impl Into<String>) -> Self {
        Selector {
            data: vec![DataRepetitionSelector::Identity(identity.into())],
            ..Default::default()
        }
    }

    pub fn for_metadata(query_name: impl Into<String>) -> Self {
        Selector {
            metadata: Some(query_name.into()),
            ..Default::default()
        }
    }

    pub fn for_id(id: impl Into<String>) -> Self {
        Selector {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}
