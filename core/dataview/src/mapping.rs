//! FILENAME: core/dataview/src/mapping.rs
//! Role mappings and projection ordering.
//!
//! A matrix role mapping tells which visual roles feed the row hierarchy,
//! the column hierarchy and the intersection values. The projection ordering
//! is the user's field order per role, expressed as select indices.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::metadata::SelectIndex;

// ============================================================================
// ROLE MAPPING
// ============================================================================

/// How roles are bound into one axis of a DataView mapping.
///
/// Serialized the way the host writes mappings:
/// `{"for":{"in":"Values"}}`, `{"bind":{"to":"Y"}}`, `{"select":[...]}`,
/// `{"group":{"by":"Series","select":[...]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleMapping {
    /// All fields of a role.
    For {
        #[serde(rename = "in")]
        in_role: String,
    },
    /// A single field bound to a role.
    Bind { to: String },
    /// Several mappings side by side.
    Select(Vec<RoleMapping>),
    /// Values grouped by a series role.
    Group { by: String, select: Vec<RoleMapping> },
}

impl RoleMapping {
    pub fn for_role(role: impl Into<String>) -> Self {
        RoleMapping::For { in_role: role.into() }
    }

    pub fn bind(role: impl Into<String>) -> Self {
        RoleMapping::Bind { to: role.into() }
    }

    /// Visits every role name in encounter order, including group-by roles.
    pub fn visit_roles<F: FnMut(&str)>(&self, visitor: &mut F) {
        match self {
            RoleMapping::For { in_role } => visitor(in_role),
            RoleMapping::Bind { to } => visitor(to),
            RoleMapping::Select(items) => {
                for item in items {
                    item.visit_roles(visitor);
                }
            }
            RoleMapping::Group { by, select } => {
                visitor(by);
                for item in select {
                    item.visit_roles(visitor);
                }
            }
        }
    }

    /// Visits the roles that produce selected values. Group-by roles are
    /// grouping roles and are skipped.
    pub fn visit_select_roles<F: FnMut(&str)>(&self, visitor: &mut F) {
        match self {
            RoleMapping::For { in_role } => visitor(in_role),
            RoleMapping::Bind { to } => visitor(to),
            RoleMapping::Select(items) | RoleMapping::Group { select: items, .. } => {
                for item in items {
                    item.visit_select_roles(visitor);
                }
            }
        }
    }
}

/// Role mapping of a matrix DataView.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRoleMapping {
    #[serde(default)]
    pub rows: Option<RoleMapping>,
    #[serde(default)]
    pub columns: Option<RoleMapping>,
    #[serde(default)]
    pub values: Option<RoleMapping>,
}

// ============================================================================
// PROJECTION ORDERING
// ============================================================================

/// The user's field order per role, as select indices.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionOrdering(FxHashMap<String, Vec<SelectIndex>>);

impl ProjectionOrdering {
    pub fn new() -> Self {
        ProjectionOrdering::default()
    }

    pub fn with_role(mut self, role: impl Into<String>, order: Vec<SelectIndex>) -> Self {
        self.0.insert(role.into(), order);
        self
    }

    pub fn get(&self, role: &str) -> Option<&[SelectIndex]> {
        self.0.get(role).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<SelectIndex>)> for ProjectionOrdering {
    fn from_iter<I: IntoIterator<Item = (String, Vec<SelectIndex>)>>(iter: I) -> Self {
        ProjectionOrdering(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_mapping_json() {
        let mapping: MatrixRoleMapping = serde_json::from_str(
            r#"{
                "rows": { "for": { "in": "Rows" } },
                "columns": { "select": [ { "bind": { "to": "Columns" } }, { "for": { "in": "Series" } } ] },
                "values": { "group": { "by": "Series", "select": [ { "for": { "in": "Y" } }, { "for": { "in": "Size" } } ] } }
            }"#,
        )
        .unwrap();

        assert_eq!(mapping.rows, Some(RoleMapping::for_role("Rows")));

        let mut columns = Vec::new();
        mapping.columns.as_ref().unwrap().visit_roles(&mut |r: &str| columns.push(r.to_string()));
        assert_eq!(columns, vec!["Columns", "Series"]);

        let mut all = Vec::new();
        mapping.values.as_ref().unwrap().visit_roles(&mut |r: &str| all.push(r.to_string()));
        assert_eq!(all, vec!["Series", "Y", "Size"]);

        let mut selected = Vec::new();
        mapping.values.as_ref().unwrap().visit_select_roles(&mut |r: &str| selected.push(r.to_string()));
        assert_eq!(selected, vec!["Y", "Size"]);
    }

    #[test]
    fn test_projection_ordering_lookup() {
        let ordering: ProjectionOrdering =
            serde_json::from_str(r#"{ "Values": [2, 1], "Rows": [0] }"#).unwrap();
        assert_eq!(ordering.get("Values"), Some(&[2, 1][..]));
        assert_eq!(ordering.get("Missing"), None);
        assert_eq!(ordering, ProjectionOrdering::new().with_role("Values", vec![2, 1]).with_role("Rows", vec![0]));
    }
}
