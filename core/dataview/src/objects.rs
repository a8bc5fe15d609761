//! FILENAME: core/dataview/src/objects.rs
//! Object Property Definitions - sparse, selector-keyed formatting overrides.
//!
//! Layout: object name -> list of definitions, one per distinct selector.
//! A definition without a selector is the object-wide default.
//!
//! Unlike the matrix transforms, this store is mutated in place: entries are
//! created lazily by `ensure` and individual properties are removed by
//! `delete_property` without dropping the (possibly now empty) entry.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::descriptor::PropertyTypeKind;
use crate::expr::SQExpr;
use crate::filter::SemanticFilter;
use crate::selector::Selector;
use crate::value::{coerce_numeric_text, PrimitiveValue};

/// Property name -> definition.
pub type DataViewObjectPropertyDefinitions = FxHashMap<String, DataViewObjectPropertyDefinition>;

/// Object name -> definitions (one per selector).
pub type DataViewObjectDefinitions = FxHashMap<String, Vec<DataViewObjectDefinition>>;

// ============================================================================
// RAW VALUES
// ============================================================================

/// An image reference entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageValue {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub scaling: Option<String>,
}

/// A raw value as entered in the property pane, before encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Image(ImageValue),
}

impl PropertyValue {
    pub fn text(s: impl Into<String>) -> Self {
        PropertyValue::Text(s.into())
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Image(_) => true,
            other => other.to_primitive().map_or(false, |p| p.is_truthy()),
        }
    }

    /// Scalar view of the value; images have none.
    pub fn to_primitive(&self) -> Option<PrimitiveValue> {
        match self {
            PropertyValue::Null => Some(PrimitiveValue::Null),
            PropertyValue::Boolean(b) => Some(PrimitiveValue::Boolean(*b)),
            PropertyValue::Number(n) => Some(PrimitiveValue::Number(*n)),
            PropertyValue::Text(s) => Some(PrimitiveValue::Text(s.clone())),
            PropertyValue::Image(_) => None,
        }
    }

    fn as_numeric(&self) -> Option<f64> {
        self.to_primitive().and_then(|p| p.as_number())
    }

    fn to_text(&self) -> String {
        match self {
            PropertyValue::Image(image) => image.name.clone(),
            other => other
                .to_primitive()
                .map(|p| p.to_display_string())
                .unwrap_or_default(),
        }
    }

    /// Unary-plus number coercion: null and blank text are 0, booleans are
    /// 0/1, anything unparseable is NaN.
    fn coerce_number(&self) -> f64 {
        match self {
            PropertyValue::Null => 0.0,
            PropertyValue::Boolean(b) => f64::from(u8::from(*b)),
            PropertyValue::Number(n) => *n,
            PropertyValue::Text(s) => coerce_numeric_text(s),
            PropertyValue::Image(_) => f64::NAN,
        }
    }
}

impl From<PrimitiveValue> for PropertyValue {
    fn from(value: PrimitiveValue) -> Self {
        match value {
            PrimitiveValue::Null => PropertyValue::Null,
            PrimitiveValue::Boolean(b) => PropertyValue::Boolean(b),
            PrimitiveValue::Number(n) => PropertyValue::Number(n),
            PrimitiveValue::Text(s) => PropertyValue::Text(s),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

// ============================================================================
// DEFINITIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillSolidDefinition {
    pub color: SQExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillDefinition {
    pub solid: FillSolidDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDefinition {
    pub name: SQExpr,
    pub url: SQExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<SQExpr>,
}

/// A stored property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataViewObjectPropertyDefinition {
    Expr(SQExpr),
    Fill(FillDefinition),
    Image(ImageDefinition),
    Filter(SemanticFilter),
    /// A value kept as entered (no encoding applied).
    Raw(PropertyValue),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewObjectDefinition {
    #[serde(default)]
    pub selector: Option<Selector>,
    #[serde(default)]
    pub properties: DataViewObjectPropertyDefinitions,
}

impl DataViewObjectDefinition {
    pub fn new(selector: Option<Selector>) -> Self {
        DataViewObjectDefinition {
            selector,
            properties: FxHashMap::default(),
        }
    }
}

/// Addresses one property of one object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewObjectPropertyIdentifier {
    pub object_name: String,
    pub property_name: String,
}

impl DataViewObjectPropertyIdentifier {
    pub fn new(object_name: impl Into<String>, property_name: impl Into<String>) -> Self {
        DataViewObjectPropertyIdentifier {
            object_name: object_name.into(),
            property_name: property_name.into(),
        }
    }
}

// ============================================================================
// STORE OPERATIONS
// ============================================================================

/// Finds or creates the definition for `(object_name, selector)`.
/// Selectors match by value. New definitions start with no properties.
pub fn ensure<'a>(
    defns: &'a mut DataViewObjectDefinitions,
    object_name: &str,
    selector: Option<&Selector>,
) -> &'a mut DataViewObjectDefinition {
    let definitions = defns.entry(object_name.to_string()).or_default();
    let index = match definitions.iter().position(|d| d.selector.as_ref() == selector) {
        Some(index) => index,
        None => {
            definitions.push(DataViewObjectDefinition::new(selector.cloned()));
            definitions.len() - 1
        }
    };
    &mut definitions[index]
}

pub fn get_object_definition<'a>(
    defns: &'a DataViewObjectDefinitions,
    object_name: &str,
    selector: Option<&Selector>,
) -> Option<&'a DataViewObjectDefinition> {
    defns
        .get(object_name)?
        .iter()
        .find(|d| d.selector.as_ref() == selector)
}

fn get_object_definition_mut<'a>(
    defns: &'a mut DataViewObjectDefinitions,
    object_name: &str,
    selector: Option<&Selector>,
) -> Option<&'a mut DataViewObjectDefinition> {
    defns
        .get_mut(object_name)?
        .iter_mut()
        .find(|d| d.selector.as_ref() == selector)
}

/// The property map holding `property_id`'s object for `selector`.
pub fn get_property_container<'a>(
    defns: &'a DataViewObjectDefinitions,
    property_id: &DataViewObjectPropertyIdentifier,
    selector: Option<&Selector>,
) -> Option<&'a DataViewObjectPropertyDefinitions> {
    get_object_definition(defns, &property_id.object_name, selector).map(|d| &d.properties)
}

/// `None` means "use the default", never an error.
pub fn get_value<'a>(
    defns: &'a DataViewObjectDefinitions,
    property_id: &DataViewObjectPropertyIdentifier,
    selector: Option<&Selector>,
) -> Option<&'a DataViewObjectPropertyDefinition> {
    get_property_container(defns, property_id, selector)?.get(&property_id.property_name)
}

pub fn set_value(
    defns: &mut DataViewObjectDefinitions,
    property_id: &DataViewObjectPropertyIdentifier,
    selector: Option<&Selector>,
    value: DataViewObjectPropertyDefinition,
) {
    ensure(defns, &property_id.object_name, selector)
        .properties
        .insert(property_id.property_name.clone(), value);
}

/// Removes one property. The definition entry stays, even when emptied.
pub fn delete_property(
    defns: &mut DataViewObjectDefinitions,
    object_name: &str,
    selector: Option<&Selector>,
    property_name: &str,
) {
    if let Some(definition) = get_object_definition_mut(defns, object_name, selector) {
        definition.properties.remove(property_name);
    }
}

// ============================================================================
// EQUALITY
// ============================================================================

/// Structural equality, except semantic filters which compare by the
/// predicate set they describe.
pub fn properties_are_equal(
    a: &DataViewObjectPropertyDefinition,
    b: &DataViewObjectPropertyDefinition,
) -> bool {
    match (a, b) {
        (DataViewObjectPropertyDefinition::Filter(fa), DataViewObjectPropertyDefinition::Filter(fb)) => {
            fa.is_equivalent(fb)
        }
        _ => a == b,
    }
}

/// Same key set and pairwise-equal properties.
pub fn all_properties_are_equal(
    a: &DataViewObjectPropertyDefinitions,
    b: &DataViewObjectPropertyDefinitions,
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(name, value_a)| {
        b.get(name)
            .map_or(false, |value_b| properties_are_equal(value_a, value_b))
    })
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encodes a raw property-pane value into its stored representation,
/// dispatching on the property's type.
pub fn encode_property_value(value: PropertyValue, kind: PropertyTypeKind) -> DataViewObjectPropertyDefinition {
    use DataViewObjectPropertyDefinition as Def;

    match kind {
        PropertyTypeKind::Boolean => {
            // Anything that is not a boolean means "no value", stored as false.
            let flag = matches!(value, PropertyValue::Boolean(true));
            Def::Expr(SQExpr::Boolean(flag))
        }
        PropertyTypeKind::Text | PropertyTypeKind::FormattingOther => Def::Expr(SQExpr::Text(value.to_text())),
        PropertyTypeKind::Numeric => match value.as_numeric() {
            Some(n) => Def::Expr(SQExpr::Double(n)),
            None => Def::Raw(value),
        },
        PropertyTypeKind::Fill => {
            if value.is_truthy() {
                Def::Fill(FillDefinition {
                    solid: FillSolidDefinition {
                        color: SQExpr::Text(value.to_text()),
                    },
                })
            } else {
                Def::Raw(value)
            }
        }
        PropertyTypeKind::FormattingWithUnits => Def::Expr(SQExpr::Double(value.coerce_number())),
        PropertyTypeKind::Enumeration => match value.as_numeric() {
            Some(n) => Def::Expr(SQExpr::Double(n)),
            None => Def::Expr(SQExpr::Text(value.to_text())),
        },
        PropertyTypeKind::Misc => {
            if value.is_truthy() {
                Def::Expr(SQExpr::Text(value.to_text()))
            } else {
                Def::Raw(PropertyValue::Null)
            }
        }
        PropertyTypeKind::Image => match value {
            PropertyValue::Image(image) => Def::Image(ImageDefinition {
                name: SQExpr::Text(image.name),
                url: SQExpr::Text(image.url),
                scaling: image.scaling.map(SQExpr::Text),
            }),
            other => Def::Raw(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterCondition;

    fn color_id() -> DataViewObjectPropertyIdentifier {
        DataViewObjectPropertyIdentifier::new("dataPoint", "fill")
    }

    fn text(s: &str) -> DataViewObjectPropertyDefinition {
        DataViewObjectPropertyDefinition::Expr(SQExpr::text(s))
    }

    #[test]
    fn test_ensure_returns_same_entry() {
        let mut defns = DataViewObjectDefinitions::default();
        let selector = Selector::for_identity("row-1");

        let first: *const DataViewObjectDefinition = ensure(&mut defns, "dataPoint", Some(&selector));
        let second: *const DataViewObjectDefinition =
            ensure(&mut defns, "dataPoint", Some(&Selector::for_identity("row-1")));
        assert_eq!(first, second);
        assert_eq!(defns["dataPoint"].len(), 1);

        ensure(&mut defns, "dataPoint", None);
        assert_eq!(defns["dataPoint"].len(), 2);
        assert!(defns["dataPoint"][1].properties.is_empty());
    }

    #[test]
    fn test_lookup_by_selector_value() {
        let mut defns = DataViewObjectDefinitions::default();
        let selector = Selector::for_identity("row-1");
        set_value(&mut defns, &color_id(), Some(&selector), text("#ff0000"));
        set_value(&mut defns, &color_id(), None, text("#000000"));

        assert_eq!(
            get_value(&defns, &color_id(), Some(&Selector::for_identity("row-1"))),
            Some(&text("#ff0000"))
        );
        assert_eq!(get_value(&defns, &color_id(), None), Some(&text("#000000")));
        assert_eq!(get_value(&defns, &color_id(), Some(&Selector::for_identity("row-2"))), None);
        assert!(get_object_definition(&defns, "legend", None).is_none());
        assert!(get_property_container(&defns, &color_id(), None).is_some());
    }

    #[test]
    fn test_delete_property_keeps_siblings_and_entry() {
        let mut defns = DataViewObjectDefinitions::default();
        set_value(&mut defns, &color_id(), None, text("#ff0000"));
        set_value(
            &mut defns,
            &DataViewObjectPropertyIdentifier::new("dataPoint", "showAll"),
            None,
            DataViewObjectPropertyDefinition::Expr(SQExpr::Boolean(true)),
        );

        delete_property(&mut defns, "dataPoint", None, "missing");
        delete_property(&mut defns, "legend", None, "fill");
        delete_property(&mut defns, "dataPoint", None, "fill");

        assert_eq!(get_value(&defns, &color_id(), None), None);
        let show_all = DataViewObjectPropertyIdentifier::new("dataPoint", "showAll");
        assert!(get_value(&defns, &show_all, None).is_some());

        delete_property(&mut defns, "dataPoint", None, "showAll");
        let definition = get_object_definition(&defns, "dataPoint", None).unwrap();
        assert!(definition.properties.is_empty());
    }

    #[test]
    fn test_filters_compare_by_equivalence() {
        let in_list = |values: &[&str]| {
            DataViewObjectPropertyDefinition::Filter(SemanticFilter::new(vec![FilterCondition::In {
                field: "Geo.Country".to_string(),
                values: values.iter().map(|v| PrimitiveValue::text(*v)).collect(),
            }]))
        };
        assert!(properties_are_equal(&in_list(&["CA", "US"]), &in_list(&["US", "CA"])));
        assert!(!properties_are_equal(&in_list(&["CA"]), &in_list(&["US"])));
        assert!(properties_are_equal(&text("a"), &text("a")));
        assert!(!properties_are_equal(&text("a"), &in_list(&["a"])));
    }

    #[test]
    fn test_all_properties_compare_key_sets() {
        let mut a = DataViewObjectPropertyDefinitions::default();
        a.insert("fill".to_string(), text("red"));
        a.insert("show".to_string(), text("yes"));

        let mut b = a.clone();
        assert!(all_properties_are_equal(&a, &b));

        b.remove("show");
        b.insert("other".to_string(), text("yes"));
        assert!(!all_properties_are_equal(&a, &b));

        b.remove("other");
        assert!(!all_properties_are_equal(&a, &b));
    }

    #[test]
    fn test_encode_by_kind() {
        use DataViewObjectPropertyDefinition as Def;

        assert_eq!(encode_property_value(true.into(), PropertyTypeKind::Boolean), Def::Expr(SQExpr::Boolean(true)));
        assert_eq!(encode_property_value("yes".into(), PropertyTypeKind::Boolean), Def::Expr(SQExpr::Boolean(false)));
        assert_eq!(encode_property_value("Title".into(), PropertyTypeKind::Text), text("Title"));
        assert_eq!(encode_property_value("12".into(), PropertyTypeKind::Numeric), Def::Expr(SQExpr::Double(12.0)));
        assert_eq!(encode_property_value("abc".into(), PropertyTypeKind::Numeric), Def::Raw("abc".into()));
        assert_eq!(
            encode_property_value("#01B8AA".into(), PropertyTypeKind::Fill),
            Def::Fill(FillDefinition { solid: FillSolidDefinition { color: SQExpr::text("#01B8AA") } })
        );
        assert_eq!(encode_property_value("".into(), PropertyTypeKind::Fill), Def::Raw("".into()));
        assert_eq!(
            encode_property_value("1000".into(), PropertyTypeKind::FormattingWithUnits),
            Def::Expr(SQExpr::Double(1000.0))
        );
        assert_eq!(encode_property_value("0.00".into(), PropertyTypeKind::FormattingOther), text("0.00"));
        assert_eq!(encode_property_value("2".into(), PropertyTypeKind::Enumeration), Def::Expr(SQExpr::Double(2.0)));
        assert_eq!(encode_property_value("left".into(), PropertyTypeKind::Enumeration), text("left"));
        assert_eq!(encode_property_value("x".into(), PropertyTypeKind::Misc), text("x"));
        assert_eq!(encode_property_value(PropertyValue::Null, PropertyTypeKind::Misc), Def::Raw(PropertyValue::Null));
    }

    #[test]
    fn test_display_units_follow_host_number_grammar() {
        use DataViewObjectPropertyDefinition as Def;

        let encode = |raw: &str| match encode_property_value(raw.into(), PropertyTypeKind::FormattingWithUnits) {
            Def::Expr(SQExpr::Double(n)) => n,
            other => panic!("expected a double expression, got {:?}", other),
        };
        assert_eq!(encode("0x3E8"), 1000.0);
        assert_eq!(encode(" "), 0.0);
        assert!(encode("inf").is_nan());
        assert!(encode("NaN").is_nan());
        assert_eq!(encode("Infinity"), f64::INFINITY);
    }

    #[test]
    fn test_encode_image() {
        let image = PropertyValue::Image(ImageValue {
            name: "logo.png".to_string(),
            url: "data:image/png;base64,AA".to_string(),
            scaling: Some("fit".to_string()),
        });
        match encode_property_value(image, PropertyTypeKind::Image) {
            DataViewObjectPropertyDefinition::Image(def) => {
                assert_eq!(def.name, SQExpr::text("logo.png"));
                assert_eq!(def.scaling, Some(SQExpr::text("fit")));
            }
            other => panic!("expected image definition, got {:?}", other),
        }
        assert_eq!(
            encode_property_value(PropertyValue::Null, PropertyTypeKind::Image),
            DataViewObjectPropertyDefinition::Raw(PropertyValue::Null)
        );
    }
}
