//! Dispatch table from a field type to its views, validator and constructor.
//!
//! Lookups never fail: a tag without an entry yields [`FieldLookup::Unknown`]
//! and every helper below degrades to a visible placeholder instead.

use crate::domains::form::fields;
use crate::domains::form::types::{FieldInstance, FieldType, TypeTag};
use crate::domains::form::view::{DesignerButton, FieldView, PropertiesView, RuntimeInput};
use crate::errors::{DomainError, DomainResult};
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};

/// The capabilities one field type registers.
pub struct FieldTypeEntry {
    pub field_type: FieldType,
    pub button: DesignerButton,
    /// Builds a fresh instance with type-specific default attributes. Pure.
    pub construct: fn(&str) -> FieldInstance,
    pub designer_view: fn(&FieldInstance) -> FieldView,
    pub form_view: fn(&FieldInstance, &RuntimeInput<'_>) -> FieldView,
    pub properties_view: fn(&FieldInstance) -> PropertiesView,
    pub apply_properties: fn(&FieldInstance, &Map<String, Value>) -> DomainResult<FieldInstance>,
    /// Synchronous, side-effect free.
    pub validate: fn(&FieldInstance, &str) -> bool,
    /// Renders a stored submission value for tables and exports.
    pub display: fn(&FieldInstance, &Value) -> String,
}

pub enum FieldLookup {
    Registered(&'static FieldTypeEntry),
    Unknown(String),
}

impl FieldLookup {
    pub fn entry(&self) -> Option<&'static FieldTypeEntry> {
        match self {
            FieldLookup::Registered(entry) => Some(entry),
            FieldLookup::Unknown(_) => None,
        }
    }
}

pub fn entry(field_type: FieldType) -> &'static FieldTypeEntry {
    match field_type {
        FieldType::TextField => &fields::text::ENTRY,
        FieldType::NumberField => &fields::number::ENTRY,
        FieldType::TextAreaField => &fields::textarea::ENTRY,
        FieldType::DateField => &fields::date::ENTRY,
        FieldType::SelectField => &fields::select::ENTRY,
        FieldType::CheckboxField => &fields::checkbox::ENTRY,
        FieldType::TelephoneField => &fields::telephone::ENTRY,
        FieldType::FileUploadField => &fields::file_upload::ENTRY,
        FieldType::TitleField => &fields::title::ENTRY,
        FieldType::SubTitleField => &fields::subtitle::ENTRY,
        FieldType::ParagraphField => &fields::paragraph::ENTRY,
        FieldType::SeparatorField => &fields::separator::ENTRY,
        FieldType::SpacerField => &fields::spacer::ENTRY,
    }
}

pub fn lookup(tag: &TypeTag) -> FieldLookup {
    match tag {
        TypeTag::Registered(field_type) => FieldLookup::Registered(entry(*field_type)),
        TypeTag::Unregistered(raw) => FieldLookup::Unknown(raw.clone()),
    }
}

pub fn construct(field_type: FieldType, id: &str) -> FieldInstance {
    (entry(field_type).construct)(id)
}

pub fn designer_view(instance: &FieldInstance) -> FieldView {
    match lookup(&instance.field_type) {
        FieldLookup::Registered(entry) => (entry.designer_view)(instance),
        FieldLookup::Unknown(tag) => {
            warn!("Designer: field {} has unsupported type {}", instance.id, tag);
            FieldView::unsupported(instance)
        }
    }
}

pub fn form_view(instance: &FieldInstance, input: &RuntimeInput<'_>) -> FieldView {
    match lookup(&instance.field_type) {
        FieldLookup::Registered(entry) => (entry.form_view)(instance, input),
        FieldLookup::Unknown(tag) => {
            warn!("Form: field {} has unsupported type {}", instance.id, tag);
            let mut view = FieldView::unsupported(instance);
            view.invalid = input.invalid;
            view
        }
    }
}

pub fn properties_view(instance: &FieldInstance) -> DomainResult<PropertiesView> {
    match lookup(&instance.field_type) {
        FieldLookup::Registered(entry) => Ok((entry.properties_view)(instance)),
        FieldLookup::Unknown(tag) => Err(DomainError::UnknownFieldType(tag)),
    }
}

/// Applies edited properties, returning the updated instance. The input is untouched.
pub fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    match lookup(&instance.field_type) {
        FieldLookup::Registered(entry) => (entry.apply_properties)(instance, changes),
        FieldLookup::Unknown(tag) => Err(DomainError::UnknownFieldType(tag)),
    }
}

/// Validates a runtime value. An unknown type passes only when it is not required.
pub fn validate(instance: &FieldInstance, value: &str) -> bool {
    match lookup(&instance.field_type) {
        FieldLookup::Registered(entry) => (entry.validate)(instance, value),
        FieldLookup::Unknown(_) => !instance.is_required(),
    }
}

pub fn display_value(instance: &FieldInstance, value: &Value) -> String {
    match lookup(&instance.field_type) {
        FieldLookup::Registered(entry) => (entry.display)(instance, value),
        FieldLookup::Unknown(_) => fields::attributes::value_text(value),
    }
}

/// Toolbox item as handed to the designer sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolboxItem {
    #[serde(rename = "type")]
    pub field_type: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub is_input: bool,
}

/// Every registered type, in toolbox order.
pub fn toolbox() -> Vec<ToolboxItem> {
    FieldType::ALL
        .iter()
        .map(|t| {
            let entry = entry(*t);
            ToolboxItem {
                field_type: entry.field_type.as_str(),
                label: entry.button.label,
                icon: entry.button.icon,
                is_input: entry.field_type.is_input(),
            }
        })
        .collect()
}
