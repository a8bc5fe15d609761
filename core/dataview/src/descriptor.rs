//! FILENAME: core/dataview/src/descriptor.rs
//! PURPOSE: Property type descriptors used to encode and evaluate object properties.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::objects::PropertyValue;

/// The value type of a formatting property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyTypeKind {
    Boolean,
    /// Plain text, and scripting sources.
    Text,
    Numeric,
    Fill,
    /// Formatting property that selects display units (thousands, millions).
    FormattingWithUnits,
    /// Any other formatting property (format strings, alignment).
    FormattingOther,
    Enumeration,
    Misc,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewPropertyDescriptor {
    #[serde(rename = "type")]
    pub kind: PropertyTypeKind,
    #[serde(default)]
    pub default: Option<PropertyValue>,
}

impl DataViewPropertyDescriptor {
    pub fn new(kind: PropertyTypeKind) -> Self {
        DataViewPropertyDescriptor { kind, default: None }
    }

    pub fn with_default(mut self, default: impl Into<PropertyValue>) -> Self {
        self.default = Some(default.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewObjectDescriptor {
    #[serde(default)]
    pub properties: FxHashMap<String, DataViewPropertyDescriptor>,
}

impl DataViewObjectDescriptor {
    pub fn with_property(mut self, name: impl Into<String>, descriptor: DataViewPropertyDescriptor) -> Self {
        self.properties.insert(name.into(), descriptor);
        self
    }
}

/// Descriptors of every formatting object a visual exposes, by object name.
pub type DataViewObjectDescriptors = FxHashMap<String, DataViewObjectDescriptor>;
