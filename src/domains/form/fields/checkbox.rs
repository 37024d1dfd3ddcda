use super::attributes::{self, InputAttributes};
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{Control, DesignerButton, FieldView, PropertiesView, RuntimeInput};
use crate::errors::DomainResult;
use serde_json::{Map, Value};

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::CheckboxField,
    button: DesignerButton { label: "CheckBox Field", icon: "check-square" },
    construct,
    designer_view,
    form_view,
    properties_view,
    apply_properties,
    validate,
    display,
};

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(
        id,
        FieldType::CheckboxField,
        &InputAttributes::labelled("Checkbox field", None),
    )
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    let attrs: InputAttributes = attributes::narrow(instance);
    attrs.view(instance, Control::Checkbox { checked: false }, true, false)
}

fn form_view(instance: &FieldInstance, input: &RuntimeInput<'_>) -> FieldView {
    let attrs: InputAttributes = attributes::narrow(instance);
    let checked = input.value == Some("true");
    attrs.view(instance, Control::Checkbox { checked }, false, input.invalid)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: InputAttributes = attributes::narrow(instance);
    attributes::properties_view(instance, attrs.properties(false))
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<InputAttributes>(instance, changes)
}

/// A required checkbox must be ticked.
fn validate(instance: &FieldInstance, value: &str) -> bool {
    attributes::has_value(instance, value) && !(instance.is_required() && value == "false")
}

fn display(_: &FieldInstance, value: &Value) -> String {
    match value {
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::String(s) if s == "true" => "Yes".to_string(),
        Value::String(s) if s == "false" => "No".to_string(),
        other => attributes::value_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_checkbox_must_be_checked() {
        let mut field = construct("c");
        field.extra_attributes.insert("required".to_string(), json!(true));
        assert!(validate(&field, "true"));
        assert!(!validate(&field, "false"));
        assert!(!validate(&field, ""));

        let optional = construct("c");
        assert!(validate(&optional, "false"));
    }

    #[test]
    fn test_display() {
        let field = construct("c");
        assert_eq!(display(&field, &json!(true)), "Yes");
        assert_eq!(display(&field, &json!("false")), "No");
    }
}
