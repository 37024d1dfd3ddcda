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
    field_type: FieldType::ParagraphField,
    button: DesignerButton { label: "Paragraph Field", icon: "pilcrow" },
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
struct ParagraphAttributes {
    text: String,
}

impl Validate for ParagraphAttributes {
    fn validate(&self) -> DomainResult<()> {
        let mut nested = NestedValidator::new();
        attributes::check_text(&mut nested, "text", &self.text, 2, 500);
        nested.validate()
    }
}

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(
        id,
        FieldType::ParagraphField,
        &ParagraphAttributes { text: "Text here".to_string() },
    )
}

fn view(instance: &FieldInstance, disabled: bool) -> FieldView {
    let attrs: ParagraphAttributes = attributes::narrow(instance);
    attributes::presentational_view(instance, Control::Paragraph { text: attrs.text }, disabled)
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    view(instance, true)
}

fn form_view(instance: &FieldInstance, _: &RuntimeInput<'_>) -> FieldView {
    view(instance, false)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: ParagraphAttributes = attributes::narrow(instance);
    attributes::properties_view(
        instance,
        vec![PropertyInput {
            key: "text",
            label: "Text",
            description: "Body text shown between fields",
            editor: PropertyEditor::TextArea { max_length: 500 },
            value: json!(attrs.text),
        }],
    )
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<ParagraphAttributes>(instance, changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_bounds() {
        let field = construct("p");
        let mut changes = Map::new();
        changes.insert("text".to_string(), json!("x".repeat(501)));
        assert!(apply_properties(&field, &changes).is_err());

        changes.insert("text".to_string(), json!("Please answer honestly."));
        let updated = apply_properties(&field, &changes).unwrap();
        assert_eq!(
            form_view(&updated, &RuntimeInput::default()).control,
            Control::Paragraph { text: "Please answer honestly.".to_string() }
        );
    }
}
