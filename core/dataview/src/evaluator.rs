//! FILENAME: core/dataview/src/evaluator.rs
//! Object Evaluator - resolves stored definitions into effective values.
//!
//! The property pane shows what a visual will actually use: descriptor
//! defaults, overlaid by the object-wide definition, overlaid by the
//! definition for the requested selector. Only described properties are
//! evaluated.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::descriptor::{DataViewObjectDescriptors, DataViewPropertyDescriptor, PropertyTypeKind};
use crate::objects::{
    get_object_definition, DataViewObjectDefinitions, DataViewObjectPropertyDefinition, ImageValue,
    PropertyValue,
};
use crate::selector::Selector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillValue {
    pub solid_color: String,
}

/// The effective value of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvaluatedProperty {
    Value(PropertyValue),
    Fill(FillValue),
    Filter(crate::filter::SemanticFilter),
}

/// Property name -> effective value.
pub type DataViewObject = FxHashMap<String, EvaluatedProperty>;

/// Object name -> effective properties.
pub type DataViewObjects = FxHashMap<String, DataViewObject>;

/// Evaluates every described object for `selector` (or the object-wide
/// defaults when `selector` is `None`). Objects left without any property
/// are omitted.
pub fn evaluate_data_view_objects(
    defns: &DataViewObjectDefinitions,
    descriptors: &DataViewObjectDescriptors,
    selector: Option<&Selector>,
) -> DataViewObjects {
    let mut objects = DataViewObjects::default();

    for (object_name, descriptor) in descriptors {
        let mut object = DataViewObject::default();

        for (property_name, property) in &descriptor.properties {
            if let Some(default) = &property.default {
                object.insert(property_name.clone(), evaluate_default(property, default));
            }
        }

        let mut layers = vec![get_object_definition(defns, object_name, None)];
        if selector.is_some() {
            layers.push(get_object_definition(defns, object_name, selector));
        }

        for definition in layers.into_iter().flatten() {
            for (property_name, value) in &definition.properties {
                if descriptor.properties.contains_key(property_name) {
                    object.insert(property_name.clone(), evaluate_definition(value));
                }
            }
        }

        if !object.is_empty() {
            objects.insert(object_name.clone(), object);
        }
    }

    objects
}

fn evaluate_default(descriptor: &DataViewPropertyDescriptor, default: &PropertyValue) -> EvaluatedProperty {
    match (descriptor.kind, default) {
        (PropertyTypeKind::Fill, PropertyValue::Text(color)) if !color.is_empty() => {
            EvaluatedProperty::Fill(FillValue {
                solid_color: color.clone(),
            })
        }
        _ => EvaluatedProperty::Value(default.clone()),
    }
}

/// Evaluates a single stored definition.
pub fn evaluate_definition(definition: &DataViewObjectPropertyDefinition) -> EvaluatedProperty {
    match definition {
        DataViewObjectPropertyDefinition::Expr(expr) => EvaluatedProperty::Value(expr.evaluate().into()),
        DataViewObjectPropertyDefinition::Fill(fill) => EvaluatedProperty::Fill(FillValue {
            solid_color: fill.solid.color.evaluate().to_display_string(),
        }),
        DataViewObjectPropertyDefinition::Image(image) => {
            EvaluatedProperty::Value(PropertyValue::Image(ImageValue {
                name: image.name.evaluate().to_display_string(),
                url: image.url.evaluate().to_display_string(),
                scaling: image.scaling.as_ref().map(|s| s.evaluate().to_display_string()),
            }))
        }
        DataViewObjectPropertyDefinition::Filter(filter) => EvaluatedProperty::Filter(filter.clone()),
        DataViewObjectPropertyDefinition::Raw(value) => EvaluatedProperty::Value(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DataViewObjectDescriptor;
    use crate::objects::{encode_property_value, set_value, DataViewObjectPropertyIdentifier};

    fn create_test_descriptors() -> DataViewObjectDescriptors {
        let mut descriptors = DataViewObjectDescriptors::default();
        descriptors.insert(
            "dataPoint".to_string(),
            DataViewObjectDescriptor::default()
                .with_property(
                    "fill",
                    DataViewPropertyDescriptor::new(PropertyTypeKind::Fill).with_default("#01B8AA"),
                )
                .with_property("showAll", DataViewPropertyDescriptor::new(PropertyTypeKind::Boolean)),
        );
        descriptors.insert(
            "legend".to_string(),
            DataViewObjectDescriptor::default()
                .with_property("show", DataViewPropertyDescriptor::new(PropertyTypeKind::Boolean)),
        );
        descriptors
    }

    fn fill(color: &str) -> EvaluatedProperty {
        EvaluatedProperty::Fill(FillValue {
            solid_color: color.to_string(),
        })
    }

    #[test]
    fn test_defaults_only() {
        let objects =
            evaluate_data_view_objects(&DataViewObjectDefinitions::default(), &create_test_descriptors(), None);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects["dataPoint"]["fill"], fill("#01B8AA"));
        assert!(!objects.contains_key("legend"));
    }

    #[test]
    fn test_selector_overrides_object_default() {
        let fill_id = DataViewObjectPropertyIdentifier::new("dataPoint", "fill");
        let show_all = DataViewObjectPropertyIdentifier::new("dataPoint", "showAll");
        let selector = Selector::for_identity("row-2");

        let mut defns = DataViewObjectDefinitions::default();
        set_value(&mut defns, &fill_id, None, encode_property_value("#333333".into(), PropertyTypeKind::Fill));
        set_value(&mut defns, &show_all, None, encode_property_value(true.into(), PropertyTypeKind::Boolean));
        set_value(
            &mut defns,
            &fill_id,
            Some(&selector),
            encode_property_value("#FD625E".into(), PropertyTypeKind::Fill),
        );
        // Not described, so never evaluated.
        set_value(
            &mut defns,
            &DataViewObjectPropertyIdentifier::new("dataPoint", "unknown"),
            None,
            encode_property_value("x".into(), PropertyTypeKind::Text),
        );

        let descriptors = create_test_descriptors();
        let object_wide = evaluate_data_view_objects(&defns, &descriptors, None);
        assert_eq!(object_wide["dataPoint"]["fill"], fill("#333333"));
        assert!(!object_wide["dataPoint"].contains_key("unknown"));

        let row = evaluate_data_view_objects(&defns, &descriptors, Some(&selector));
        assert_eq!(row["dataPoint"]["fill"], fill("#FD625E"));
        assert_eq!(row["dataPoint"]["showAll"], EvaluatedProperty::Value(PropertyValue::Boolean(true)));
    }
}
