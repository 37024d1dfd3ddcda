//! Narrowing of the loose `extraAttributes` bag into per-type shapes, plus the
//! pieces every input type shares.

use crate::domains::core::json::null_as_default;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{Control, FieldView, PropertiesView, PropertyEditor, PropertyInput};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{NestedValidator, Validate, ValidationBuilder};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const DEFAULT_PLACEHOLDER: &str = "Value here...";

/// Attributes every input-capable type carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputAttributes {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub helper_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub required: bool,
    pub placeholder: Option<String>,
}

impl InputAttributes {
    pub fn labelled(label: &str, placeholder: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            helper_text: String::new(),
            required: false,
            placeholder: placeholder.map(str::to_string),
        }
    }

    pub fn label(&self) -> Option<String> {
        Some(self.label.clone()).filter(|l| !l.trim().is_empty())
    }

    pub fn helper_text(&self) -> Option<String> {
        Some(self.helper_text.clone()).filter(|h| !h.trim().is_empty())
    }

    /// Folds the shared attribute checks into `nested`.
    pub fn check(&self, nested: &mut NestedValidator) {
        nested.check(
            ValidationBuilder::new("label", Some(self.label.trim().to_string()))
                .required()
                .min_length(2)
                .max_length(50)
                .validate(),
        );
        nested.check(
            ValidationBuilder::new("helperText", Some(self.helper_text.clone()))
                .max_length(200)
                .validate(),
        );
        nested.check(
            ValidationBuilder::new("placeholder", self.placeholder.clone())
                .max_length(50)
                .validate(),
        );
    }

    pub fn properties(&self, with_placeholder: bool) -> Vec<PropertyInput> {
        let mut properties = vec![
            PropertyInput {
                key: "label",
                label: "Label",
                description: "The label of the field. It will be displayed above the field",
                editor: PropertyEditor::Text { max_length: 50 },
                value: json!(self.label),
            },
            PropertyInput {
                key: "helperText",
                label: "Helper text",
                description: "The helper text of the field. It will be displayed below the field",
                editor: PropertyEditor::Text { max_length: 200 },
                value: json!(self.helper_text),
            },
        ];
        if with_placeholder {
            properties.push(PropertyInput {
                key: "placeholder",
                label: "Placeholder",
                description: "The placeholder of the field",
                editor: PropertyEditor::Text { max_length: 50 },
                value: json!(self.placeholder),
            });
        }
        properties.push(PropertyInput {
            key: "required",
            label: "Required",
            description: "Submissions are rejected while this field is empty",
            editor: PropertyEditor::Switch,
            value: json!(self.required),
        });
        properties
    }

    /// Builds a view with the shared label, helper text and required marker.
    pub fn view(&self, instance: &FieldInstance, control: Control, disabled: bool, invalid: bool) -> FieldView {
        FieldView {
            field_id: instance.id.clone(),
            label: self.label(),
            helper_text: self.helper_text(),
            required: instance.is_required(),
            disabled,
            invalid,
            control,
        }
    }
}

impl Validate for InputAttributes {
    fn validate(&self) -> DomainResult<()> {
        let mut nested = NestedValidator::new();
        self.check(&mut nested);
        nested.validate()
    }
}

/// Presentational types carry no label or required flag.
pub fn presentational_view(instance: &FieldInstance, control: Control, disabled: bool) -> FieldView {
    FieldView {
        field_id: instance.id.clone(),
        label: None,
        helper_text: None,
        required: false,
        disabled,
        invalid: false,
        control,
    }
}

/// Reads a type-specific shape out of the bag.
///
/// A key the shape cannot read is dropped on its own and falls back to the
/// default, so one bad attribute never costs the field its label or
/// required flag.
pub fn narrow<T: DeserializeOwned + Default>(instance: &FieldInstance) -> T {
    let bag = &instance.extra_attributes;
    if let Ok(attrs) = serde_json::from_value(Value::Object(bag.clone())) {
        return attrs;
    }

    let mut accepted = Map::new();
    for (key, value) in bag {
        let mut candidate = accepted.clone();
        candidate.insert(key.clone(), value.clone());
        match serde_json::from_value::<T>(Value::Object(candidate.clone())) {
            Ok(_) => accepted = candidate,
            Err(e) => warn!(
                "Field {} ({}) has malformed attribute '{}', using its default: {}",
                instance.id,
                instance.field_type.as_str(),
                key,
                e
            ),
        }
    }
    serde_json::from_value(Value::Object(accepted)).unwrap_or_default()
}

fn to_map<T: Serialize>(attrs: &T) -> Map<String, Value> {
    match serde_json::to_value(attrs) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!("Field attributes did not serialize to an object");
            Map::new()
        }
    }
}

/// Writes typed attributes back over `bag`, keeping keys the type does not know.
pub fn widen<T: Serialize>(mut bag: Map<String, Value>, attrs: &T) -> Map<String, Value> {
    for (key, value) in to_map(attrs) {
        bag.insert(key, value);
    }
    bag
}

pub fn construct_with<T: Serialize>(id: &str, field_type: FieldType, attrs: &T) -> FieldInstance {
    FieldInstance::new(id, field_type, to_map(attrs))
}

/// Overlays `changes`, re-narrows, validates and writes the result back.
pub fn apply<T>(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance>
where
    T: DeserializeOwned + Serialize + Validate,
{
    let mut merged = instance.extra_attributes.clone();
    for (key, value) in changes {
        merged.insert(key.clone(), value.clone());
    }

    let attrs: T = serde_json::from_value(Value::Object(merged.clone())).map_err(|e| {
        DomainError::Validation(ValidationError::custom(&format!(
            "Attributes of {} field {} do not fit its type: {}",
            instance.field_type.as_str(),
            instance.id,
            e
        )))
    })?;
    attrs.validate()?;

    Ok(FieldInstance {
        id: instance.id.clone(),
        field_type: instance.field_type.clone(),
        extra_attributes: widen(merged, &attrs),
    })
}

pub fn properties_view(instance: &FieldInstance, properties: Vec<PropertyInput>) -> PropertiesView {
    PropertiesView {
        field_id: instance.id.clone(),
        field_type: instance.field_type.as_str().to_string(),
        properties,
    }
}

/// Required fields need a non-empty value.
pub fn has_value(instance: &FieldInstance, value: &str) -> bool {
    !instance.is_required() || !value.is_empty()
}

/// Plain text rendering of a stored value.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Text attribute for presentational types: non-empty with bounded length.
pub fn check_text(nested: &mut NestedValidator, field: &str, value: &str, min: usize, max: usize) {
    nested.check(
        ValidationBuilder::new(field, Some(value.trim().to_string()))
            .required()
            .min_length(min)
            .max_length(max)
            .validate(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(attrs: Value) -> FieldInstance {
        FieldInstance::new("1", FieldType::TextField, attrs.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_apply_keeps_unknown_keys() {
        let field = instance(json!({"label": "Name", "legacyWidth": 3}));
        let mut changes = Map::new();
        changes.insert("required".to_string(), json!(true));

        let updated = apply::<InputAttributes>(&field, &changes).unwrap();
        assert_eq!(updated.extra_attributes["legacyWidth"], json!(3));
        assert_eq!(updated.extra_attributes["required"], json!(true));
        assert_eq!(updated.extra_attributes["label"], json!("Name"));
        // input untouched
        assert!(field.extra_attributes.get("required").is_none());
    }

    #[test]
    fn test_apply_rejects_invalid_changes() {
        let field = instance(json!({"label": "Name"}));

        let mut short = Map::new();
        short.insert("label".to_string(), json!("N"));
        assert!(matches!(
            apply::<InputAttributes>(&field, &short),
            Err(DomainError::Validation(ValidationError::MinLength { .. }))
        ));

        let mut wrong_type = Map::new();
        wrong_type.insert("required".to_string(), json!("yes"));
        match apply::<InputAttributes>(&field, &wrong_type) {
            Err(DomainError::Validation(ValidationError::Custom(message))) => {
                assert!(message.contains("TextField field 1"), "{}", message);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_narrow_drops_only_the_malformed_key() {
        let field = instance(json!({"label": 12, "required": true, "placeholder": "Your name"}));
        let attrs: InputAttributes = narrow(&field);
        assert_eq!(attrs.label, "");
        assert!(attrs.required);
        assert_eq!(attrs.placeholder.as_deref(), Some("Your name"));
    }

    #[test]
    fn test_null_text_attributes_keep_required_field_required() {
        let field = instance(json!({"label": "First Name", "required": true, "helperText": null}));
        let attrs: InputAttributes = narrow(&field);
        assert_eq!(attrs.label, "First Name");
        assert_eq!(attrs.helper_text, "");
        assert!(attrs.required);

        assert!(!has_value(&field, ""));
        assert!(has_value(&field, "Jane"));

        let view = attrs.view(&field, Control::Separator, false, false);
        assert!(view.required);
        assert_eq!(view.label.as_deref(), Some("First Name"));
    }

    #[test]
    fn test_mistyped_required_agrees_with_instance() {
        let field = instance(json!({"label": "Age", "required": "yes"}));
        let attrs: InputAttributes = narrow(&field);
        assert_eq!(attrs.required, field.is_required());
        assert_eq!(attrs.label, "Age");
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_text(&json!(12.5)), "12.5");
        assert_eq!(value_text(&json!(["a", "", "b"])), "a, b");
    }
}
