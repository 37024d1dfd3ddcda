//! Renderer-agnostic view models for the three faces of a field.
//!
//! The host UI draws these; the core only decides what they contain. A field
//! type builds each face independently, so a designer preview can change
//! without touching the runtime input or the properties editor.

use crate::domains::form::types::FieldInstance;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Number,
    Tel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// The control a field presents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    TextInput {
        input_type: InputType,
        placeholder: Option<String>,
        value: String,
    },
    TextArea {
        rows: u32,
        placeholder: Option<String>,
        value: String,
    },
    Select {
        placeholder: Option<String>,
        options: Vec<SelectOption>,
        selected: Option<String>,
    },
    Checkbox {
        checked: bool,
    },
    DatePicker {
        value: Option<String>,
    },
    FileInput {
        multiple: bool,
        accept: Vec<String>,
        file_names: Vec<String>,
    },
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    Separator,
    Spacer {
        height: u32,
    },
    /// Visible marker for a schema entry whose type is not registered.
    Unsupported {
        type_tag: String,
    },
}

/// A rendered field: the designer preview or the live runtime input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub field_id: String,
    pub label: Option<String>,
    pub helper_text: Option<String>,
    pub required: bool,
    /// Designer previews are always disabled.
    pub disabled: bool,
    /// Set on runtime inputs that failed the last submit attempt.
    pub invalid: bool,
    pub control: Control,
}

impl FieldView {
    pub fn unsupported(instance: &FieldInstance) -> Self {
        Self {
            field_id: instance.id.clone(),
            label: Some(format!("Unsupported field type: {}", instance.field_type.as_str())),
            helper_text: None,
            required: instance.is_required(),
            disabled: true,
            invalid: false,
            control: Control::Unsupported {
                type_tag: instance.field_type.as_str().to_string(),
            },
        }
    }
}

/// What a runtime input currently holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeInput<'a> {
    pub value: Option<&'a str>,
    pub file_names: &'a [String],
    pub invalid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyEditor {
    Text { max_length: usize },
    TextArea { max_length: usize },
    Switch,
    Number { min: f64, max: f64 },
    OptionList,
    StringList,
}

/// One editable attribute in the properties panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyInput {
    /// Key inside `extraAttributes`.
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub editor: PropertyEditor,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertiesView {
    pub field_id: String,
    pub field_type: String,
    pub properties: Vec<PropertyInput>,
}

/// Entry in the designer's field toolbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DesignerButton {
    pub label: &'static str,
    pub icon: &'static str,
}
