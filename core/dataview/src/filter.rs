//! FILENAME: core/dataview/src/filter.rs
//! Semantic filters stored as property values (e.g. a slicer's selection).
//!
//! Two filters are equivalent when they describe the same predicate set:
//! clause order and the order of values inside an `In` list do not matter.

use serde::{Deserialize, Serialize};

use crate::value::PrimitiveValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonKind {
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

/// One predicate over a field, identified by query name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FilterCondition {
    /// Field value is one of `values`.
    In { field: String, values: Vec<PrimitiveValue> },
    /// Field value compares against `value`.
    Comparison {
        field: String,
        comparison: ComparisonKind,
        value: PrimitiveValue,
    },
    Not { condition: Box<FilterCondition> },
}

impl FilterCondition {
    pub fn is_equivalent(&self, other: &FilterCondition) -> bool {
        match (self, other) {
            (
                FilterCondition::In { field: fa, values: va },
                FilterCondition::In { field: fb, values: vb },
            ) => fa == fb && same_value_set(va, vb),
            (FilterCondition::Not { condition: a }, FilterCondition::Not { condition: b }) => {
                a.is_equivalent(b)
            }
            _ => self == other,
        }
    }
}

/// A conjunction of conditions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticFilter {
    #[serde(rename = "where")]
    pub conditions: Vec<FilterCondition>,
}

impl SemanticFilter {
    pub fn new(conditions: Vec<FilterCondition>) -> Self {
        SemanticFilter { conditions }
    }

    /// Logical equivalence: every clause of one filter has an equivalent
    /// clause in the other and vice versa.
    pub fn is_equivalent(&self, other: &SemanticFilter) -> bool {
        covers(&self.conditions, &other.conditions) && covers(&other.conditions, &self.conditions)
    }
}

fn covers(a: &[FilterCondition], b: &[FilterCondition]) -> bool {
    a.iter().all(|ca| b.iter().any(|cb| ca.is_equivalent(cb)))
}

fn same_value_set(a: &[PrimitiveValue], b: &[PrimitiveValue]) -> bool {
    a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_filter(field: &str, values: &[&str]) -> FilterCondition {
        FilterCondition::In {
            field: field.to_string(),
            values: values.iter().map(|v| PrimitiveValue::text(*v)).collect(),
        }
    }

    #[test]
    fn test_in_values_order_is_irrelevant() {
        let a = SemanticFilter::new(vec![in_filter("Geo.Country", &["CA", "US"])]);
        let b = SemanticFilter::new(vec![in_filter("Geo.Country", &["US", "CA"])]);
        assert_ne!(a, b);
        assert!(a.is_equivalent(&b));
    }

    #[test]
    fn test_clause_order_is_irrelevant() {
        let year = FilterCondition::Comparison {
            field: "Date.Year".to_string(),
            comparison: ComparisonKind::GreaterThan,
            value: 2019.0.into(),
        };
        let a = SemanticFilter::new(vec![year.clone(), in_filter("Geo.Country", &["CA"])]);
        let b = SemanticFilter::new(vec![in_filter("Geo.Country", &["CA"]), year]);
        assert!(a.is_equivalent(&b));
    }

    #[test]
    fn test_different_predicates_are_not_equivalent() {
        let a = SemanticFilter::new(vec![in_filter("Geo.Country", &["CA"])]);
        let b = SemanticFilter::new(vec![in_filter("Geo.Country", &["CA", "US"])]);
        let c = SemanticFilter::new(vec![FilterCondition::Not {
            condition: Box::new(in_filter("Geo.Country", &["CA"])),
        }]);
        assert!(!a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
    }
}
