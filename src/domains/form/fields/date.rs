use super::attributes::{self, InputAttributes};
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{Control, DesignerButton, FieldView, PropertiesView, RuntimeInput};
use crate::errors::DomainResult;
use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::DateField,
    button: DesignerButton { label: "Date Field", icon: "calendar" },
    construct,
    designer_view,
    form_view,
    properties_view,
    apply_properties,
    validate,
    display,
};

const DISPLAY_FORMAT: &str = "%d/%m/%Y";

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(
        id,
        FieldType::DateField,
        &InputAttributes::labelled("Date field", None),
    )
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    let attrs: InputAttributes = attributes::narrow(instance);
    attrs.view(instance, Control::DatePicker { value: None }, true, false)
}

fn form_view(instance: &FieldInstance, input: &RuntimeInput<'_>) -> FieldView {
    let attrs: InputAttributes = attributes::narrow(instance);
    let value = input.value.filter(|v| !v.is_empty()).map(str::to_string);
    attrs.view(instance, Control::DatePicker { value }, false, input.invalid)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: InputAttributes = attributes::narrow(instance);
    attributes::properties_view(instance, attrs.properties(false))
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<InputAttributes>(instance, changes)
}

fn validate(instance: &FieldInstance, value: &str) -> bool {
    attributes::has_value(instance, value)
}

/// Stored dates are ISO timestamps or plain `YYYY-MM-DD`; anything else is shown as-is.
fn display(_: &FieldInstance, value: &Value) -> String {
    let raw = attributes::value_text(value);
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return ts.format(DISPLAY_FORMAT).to_string();
    }
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => date.format(DISPLAY_FORMAT).to_string(),
        Err(_) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_formats() {
        let field = construct("d");
        assert_eq!(display(&field, &json!("2024-03-01T10:00:00.000Z")), "01/03/2024");
        assert_eq!(display(&field, &json!("2024-12-25")), "25/12/2024");
        assert_eq!(display(&field, &json!("next tuesday")), "next tuesday");
    }

    #[test]
    fn test_no_placeholder_property() {
        let keys: Vec<&str> = properties_view(&construct("d")).properties.iter().map(|p| p.key).collect();
        assert!(!keys.contains(&"placeholder"));
    }
}
