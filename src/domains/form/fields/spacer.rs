use super::attributes;
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{
    Control, DesignerButton, FieldView, PropertiesView, PropertyEditor, PropertyInput, RuntimeInput,
};
use crate::errors::DomainResult;
use crate::validation::{Validate, ValidationBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::SpacerField,
    button: DesignerButton { label: "Spacer Field", icon: "separator-horizontal" },
    construct,
    designer_view,
    form_view,
    properties_view,
    apply_properties,
    validate: |_, _| true,
    display: |_, value| attributes::value_text(value),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SpacerAttributes {
    /// Pixels.
    height: u32,
}

impl Default for SpacerAttributes {
    fn default() -> Self {
        Self { height: 20 }
    }
}

impl Validate for SpacerAttributes {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("height", Some(self.height)).range(5, 200).validate()
    }
}

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(id, FieldType::SpacerField, &SpacerAttributes::default())
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    let attrs: SpacerAttributes = attributes::narrow(instance);
    attributes::presentational_view(instance, Control::Spacer { height: attrs.height }, true)
}

fn form_view(instance: &FieldInstance, _: &RuntimeInput<'_>) -> FieldView {
    let attrs: SpacerAttributes = attributes::narrow(instance);
    attributes::presentational_view(instance, Control::Spacer { height: attrs.height }, false)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: SpacerAttributes = attributes::narrow(instance);
    attributes::properties_view(
        instance,
        vec![PropertyInput {
            key: "height",
            label: "Height (px)",
            description: "Vertical gap between the surrounding fields",
            editor: PropertyEditor::Number { min: 5.0, max: 200.0 },
            value: json!(attrs.height),
        }],
    )
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<SpacerAttributes>(instance, changes)
}
