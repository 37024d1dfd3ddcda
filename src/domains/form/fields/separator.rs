use super::attributes;
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{Control, DesignerButton, FieldView, RuntimeInput};
use crate::errors::DomainResult;
use serde_json::{Map, Value};

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::SeparatorField,
    button: DesignerButton { label: "Separator Field", icon: "minus" },
    construct: |id| FieldInstance::new(id, FieldType::SeparatorField, Map::new()),
    designer_view: |instance| attributes::presentational_view(instance, Control::Separator, true),
    form_view,
    properties_view: |instance| attributes::properties_view(instance, Vec::new()),
    apply_properties,
    validate: |_, _| true,
    display: |_, value| attributes::value_text(value),
};

fn form_view(instance: &FieldInstance, _: &RuntimeInput<'_>) -> FieldView {
    attributes::presentational_view(instance, Control::Separator, false)
}

// Nothing to edit; changes are kept verbatim in the bag.
fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    let mut updated = instance.clone();
    for (key, value) in changes {
        updated.extra_attributes.insert(key.clone(), value.clone());
    }
    Ok(updated)
}
