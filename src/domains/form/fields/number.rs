use super::attributes::{self, InputAttributes};
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{
    Control, DesignerButton, FieldView, InputType, PropertiesView, RuntimeInput,
};
use crate::errors::DomainResult;
use serde_json::{Map, Value};

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::NumberField,
    button: DesignerButton { label: "Number Field", icon: "hash" },
    construct,
    designer_view,
    form_view,
    properties_view,
    apply_properties,
    validate,
    display: |_, value| attributes::value_text(value),
};

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(
        id,
        FieldType::NumberField,
        &InputAttributes::labelled("Number field", Some("0")),
    )
}

fn control(attrs: &InputAttributes, value: &str) -> Control {
    Control::TextInput {
        input_type: InputType::Number,
        placeholder: attrs.placeholder.clone(),
        value: value.to_string(),
    }
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    let attrs: InputAttributes = attributes::narrow(instance);
    attrs.view(instance, control(&attrs, ""), true, false)
}

fn form_view(instance: &FieldInstance, input: &RuntimeInput<'_>) -> FieldView {
    let attrs: InputAttributes = attributes::narrow(instance);
    attrs.view(instance, control(&attrs, input.value.unwrap_or_default()), false, input.invalid)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: InputAttributes = attributes::narrow(instance);
    attributes::properties_view(instance, attrs.properties(true))
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<InputAttributes>(instance, changes)
}

// The runtime input constrains keystrokes; a required number only needs a value.
fn validate(instance: &FieldInstance, value: &str) -> bool {
    attributes::has_value(instance, value)
}
