use super::attributes;
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{
    Control, DesignerButton, FieldView, PropertiesView, PropertyEditor, PropertyInput, RuntimeInput,
};
use crate::errors::DomainResult;
use crate::validation::{NestedValidator, Validate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::SubTitleField,
    button: DesignerButton { label: "SubTitle Field", icon: "heading-2" },
    construct,
    designer_view,
    form_view,
    properties_view,
    apply_properties,
    validate: |_, _| true,
    display: |_, value| attributes::value_text(value),
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SubTitleAttributes {
    #[serde(rename = "subTitle")]
    sub_title: String,
}

impl Validate for SubTitleAttributes {
    fn validate(&self) -> DomainResult<()> {
        let mut nested = NestedValidator::new();
        attributes::check_text(&mut nested, "subTitle", &self.sub_title, 2, 50);
        nested.validate()
    }
}

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(
        id,
        FieldType::SubTitleField,
        &SubTitleAttributes { sub_title: "SubTitle field".to_string() },
    )
}

fn view(instance: &FieldInstance, disabled: bool) -> FieldView {
    let attrs: SubTitleAttributes = attributes::narrow(instance);
    attributes::presentational_view(instance, Control::Heading { level: 2, text: attrs.sub_title }, disabled)
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    view(instance, true)
}

fn form_view(instance: &FieldInstance, _: &RuntimeInput<'_>) -> FieldView {
    view(instance, false)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: SubTitleAttributes = attributes::narrow(instance);
    attributes::properties_view(
        instance,
        vec![PropertyInput {
            key: "subTitle",
            label: "SubTitle",
            description: "Secondary heading",
            editor: PropertyEditor::Text { max_length: 50 },
            value: json!(attrs.sub_title),
        }],
    )
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<SubTitleAttributes>(instance, changes)
}
