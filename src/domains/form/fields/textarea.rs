use super::attributes::{self, InputAttributes, DEFAULT_PLACEHOLDER};
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{
    Control, DesignerButton, FieldView, PropertiesView, PropertyEditor, PropertyInput, RuntimeInput,
};
use crate::errors::DomainResult;
use crate::validation::{NestedValidator, Validate, ValidationBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::TextAreaField,
    button: DesignerButton { label: "TextArea Field", icon: "align-left" },
    construct,
    designer_view,
    form_view,
    properties_view,
    apply_properties,
    validate,
    display: |_, value| attributes::value_text(value),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TextAreaAttributes {
    #[serde(flatten)]
    input: InputAttributes,
    rows: u32,
}

impl Default for TextAreaAttributes {
    fn default() -> Self {
        Self { input: InputAttributes::default(), rows: 3 }
    }
}

impl Validate for TextAreaAttributes {
    fn validate(&self) -> DomainResult<()> {
        let mut nested = NestedValidator::new();
        self.input.check(&mut nested);
        nested.check(ValidationBuilder::new("rows", Some(self.rows)).range(1, 10).validate());
        nested.validate()
    }
}

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(
        id,
        FieldType::TextAreaField,
        &TextAreaAttributes {
            input: InputAttributes::labelled("Text area", Some(DEFAULT_PLACEHOLDER)),
            rows: 3,
        },
    )
}

fn control(attrs: &TextAreaAttributes, value: &str) -> Control {
    Control::TextArea {
        rows: attrs.rows,
        placeholder: attrs.input.placeholder.clone(),
        value: value.to_string(),
    }
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    let attrs: TextAreaAttributes = attributes::narrow(instance);
    attrs.input.view(instance, control(&attrs, ""), true, false)
}

fn form_view(instance: &FieldInstance, input: &RuntimeInput<'_>) -> FieldView {
    let attrs: TextAreaAttributes = attributes::narrow(instance);
    attrs.input.view(instance, control(&attrs, input.value.unwrap_or_default()), false, input.invalid)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: TextAreaAttributes = attributes::narrow(instance);
    let mut properties = attrs.input.properties(true);
    properties.push(PropertyInput {
        key: "rows",
        label: "Rows",
        description: "Visible height of the text area",
        editor: PropertyEditor::Number { min: 1.0, max: 10.0 },
        value: json!(attrs.rows),
    });
    attributes::properties_view(instance, properties)
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<TextAreaAttributes>(instance, changes)
}

fn validate(instance: &FieldInstance, value: &str) -> bool {
    attributes::has_value(instance, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_bounds() {
        let field = construct("t");
        assert_eq!(field.extra_attributes["rows"], json!(3));

        let mut changes = Map::new();
        changes.insert("rows".to_string(), json!(12));
        assert!(apply_properties(&field, &changes).is_err());

        changes.insert("rows".to_string(), json!(6));
        let updated = apply_properties(&field, &changes).unwrap();
        match designer_view(&updated).control {
            Control::TextArea { rows, .. } => assert_eq!(rows, 6),
            other => panic!("unexpected control {:?}", other),
        }
    }
}
