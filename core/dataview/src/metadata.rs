//! FILENAME: core/dataview/src/metadata.rs
//! PURPOSE: Metadata columns describing the fields projected into a DataView.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Select index of a projected field (its position in the query's select list).
pub type SelectIndex = usize;

/// Describes one projected field: a grouping column or a measure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMetadataColumn {
    /// Display name shown in headers.
    pub display_name: String,

    /// Fully qualified query name (e.g. "Sales.Revenue").
    #[serde(default)]
    pub query_name: Option<String>,

    /// Select index of the field. Projection orderings refer to fields by this.
    #[serde(default)]
    pub index: Option<SelectIndex>,

    /// Whether the field is a measure (aggregated value) rather than a grouping.
    #[serde(default)]
    pub is_measure: bool,

    /// Roles this field is bound to, keyed by role name.
    #[serde(default)]
    pub roles: FxHashMap<String, bool>,

    /// Group name for dynamic series columns.
    #[serde(default)]
    pub group_name: Option<String>,

    /// Format string (e.g. "#,##0.00").
    #[serde(default)]
    pub format: Option<String>,
}

impl DataViewMetadataColumn {
    pub fn new(display_name: impl Into<String>, index: SelectIndex) -> Self {
        DataViewMetadataColumn {
            display_name: display_name.into(),
            index: Some(index),
            ..Default::default()
        }
    }

    /// Creates a measure column bound to `role`.
    pub fn measure(display_name: impl Into<String>, index: SelectIndex, role: &str) -> Self {
        DataViewMetadataColumn::new(display_name, index)
            .with_role(role)
            .with_is_measure(true)
    }

    /// Creates a grouping column bound to `role`.
    pub fn grouping(display_name: impl Into<String>, index: SelectIndex, role: &str) -> Self {
        DataViewMetadataColumn::new(display_name, index).with_role(role)
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_string(), true);
        self
    }

    pub fn with_is_measure(mut self, is_measure: bool) -> Self {
        self.is_measure = is_measure;
        self
    }

    /// Returns true if the column is bound to `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.get(role).copied().unwrap_or(false)
    }
}
