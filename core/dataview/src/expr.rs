//! FILENAME: core/dataview/src/expr.rs
//! PURPOSE: Constant semantic-query expressions stored in property definitions.
//! CONTEXT: Property definitions keep user values as typed constant
//! expressions; consumers select on the variant, so encoding must be exact.

use serde::{Deserialize, Serialize};

use crate::value::PrimitiveValue;

/// A constant expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum SQExpr {
    Null,
    Boolean(bool),
    Text(String),
    Double(f64),
    Integer(i64),
}

impl SQExpr {
    pub fn text(s: impl Into<String>) -> Self {
        SQExpr::Text(s.into())
    }

    /// The value this expression evaluates to.
    pub fn evaluate(&self) -> PrimitiveValue {
        match self {
            SQExpr::Null => PrimitiveValue::Null,
            SQExpr::Boolean(b) => PrimitiveValue::Boolean(*b),
            SQExpr::Text(s) => PrimitiveValue::Text(s.clone()),
            SQExpr::Double(n) => PrimitiveValue::Number(*n),
            SQExpr::Integer(i) => PrimitiveValue::Number(*i as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_constants() {
        assert_eq!(SQExpr::Integer(4).evaluate(), PrimitiveValue::Number(4.0));
        assert_eq!(SQExpr::text("red").evaluate(), PrimitiveValue::text("red"));
        assert_eq!(SQExpr::Null.evaluate(), PrimitiveValue::Null);
    }

    #[test]
    fn test_tagged_json() {
        let json = serde_json::to_string(&SQExpr::Double(1.5)).unwrap();
        assert_eq!(json, r#"{"type":"double","value":1.5}"#);
    }
}
