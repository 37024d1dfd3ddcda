use super::attributes::{self, InputAttributes, DEFAULT_PLACEHOLDER};
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{
    Control, DesignerButton, FieldView, PropertiesView, PropertyEditor, PropertyInput, RuntimeInput,
    SelectOption,
};
use crate::errors::{DomainResult, ValidationError};
use crate::validation::{NestedValidator, Validate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::SelectField,
    button: DesignerButton { label: "Select Field", icon: "list" },
    construct,
    designer_view,
    form_view,
    properties_view,
    apply_properties,
    validate,
    display,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SelectAttributes {
    #[serde(flatten)]
    input: InputAttributes,
    options: Vec<SelectOption>,
}

impl SelectAttributes {
    fn label_for(&self, value: &str) -> Option<&str> {
        self.options.iter().find(|o| o.value == value).map(|o| o.label.as_str())
    }
}

impl Validate for SelectAttributes {
    fn validate(&self) -> DomainResult<()> {
        let mut nested = NestedValidator::new();
        self.input.check(&mut nested);
        if self.options.is_empty() {
            nested.add_error(ValidationError::required("options"));
        }
        if self.options.iter().any(|o| o.value.trim().is_empty() || o.label.trim().is_empty()) {
            nested.add_error(ValidationError::invalid_value("options", "every option needs a label and a value"));
        }
        let mut seen = HashSet::new();
        if !self.options.iter().all(|o| seen.insert(o.value.as_str())) {
            nested.add_error(ValidationError::unique("options"));
        }
        nested.validate()
    }
}

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(
        id,
        FieldType::SelectField,
        &SelectAttributes {
            input: InputAttributes::labelled("Select field", Some(DEFAULT_PLACEHOLDER)),
            options: vec![SelectOption { label: "Option 1".to_string(), value: "option-1".to_string() }],
        },
    )
}

fn control(attrs: &SelectAttributes, selected: Option<&str>) -> Control {
    Control::Select {
        placeholder: attrs.input.placeholder.clone(),
        options: attrs.options.clone(),
        selected: selected.filter(|v| !v.is_empty()).map(str::to_string),
    }
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    let attrs: SelectAttributes = attributes::narrow(instance);
    attrs.input.view(instance, control(&attrs, None), true, false)
}

fn form_view(instance: &FieldInstance, input: &RuntimeInput<'_>) -> FieldView {
    let attrs: SelectAttributes = attributes::narrow(instance);
    attrs.input.view(instance, control(&attrs, input.value), false, input.invalid)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: SelectAttributes = attributes::narrow(instance);
    let mut properties = attrs.input.properties(true);
    properties.push(PropertyInput {
        key: "options",
        label: "Options",
        description: "Choices offered to the submitter, in display order",
        editor: PropertyEditor::OptionList,
        value: json!(attrs.options),
    });
    attributes::properties_view(instance, properties)
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<SelectAttributes>(instance, changes)
}

/// A required select only accepts one of its own option values.
fn validate(instance: &FieldInstance, value: &str) -> bool {
    let attrs: SelectAttributes = attributes::narrow(instance);
    !instance.is_required() || attrs.label_for(value).is_some()
}

fn display(instance: &FieldInstance, value: &Value) -> String {
    let attrs: SelectAttributes = attributes::narrow(instance);
    let raw = attributes::value_text(value);
    match attrs.label_for(&raw) {
        Some(label) => label.to_string(),
        None => raw,
    }
}
