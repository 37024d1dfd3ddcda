use super::attributes::{self, InputAttributes};
use crate::domains::form::registry::FieldTypeEntry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::{
    Control, DesignerButton, FieldView, PropertiesView, PropertyEditor, PropertyInput, RuntimeInput,
};
use crate::errors::{DomainResult, ValidationError};
use crate::validation::{validate_file_extension, validate_file_size, NestedValidator, Validate, ValidationBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub(crate) static ENTRY: FieldTypeEntry = FieldTypeEntry {
    field_type: FieldType::FileUploadField,
    button: DesignerButton { label: "File Upload", icon: "upload" },
    construct,
    designer_view,
    form_view,
    properties_view,
    apply_properties,
    validate,
    display,
};

const BYTES_PER_MB: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FileUploadAttributes {
    #[serde(flatten)]
    input: InputAttributes,
    multiple: bool,
    /// Allowed extensions; empty accepts anything.
    accept: Vec<String>,
    max_size_mb: u32,
}

impl Default for FileUploadAttributes {
    fn default() -> Self {
        Self {
            input: InputAttributes::default(),
            multiple: false,
            accept: Vec::new(),
            max_size_mb: 10,
        }
    }
}

impl Validate for FileUploadAttributes {
    fn validate(&self) -> DomainResult<()> {
        let mut nested = NestedValidator::new();
        self.input.check(&mut nested);
        nested.check(ValidationBuilder::new("maxSizeMb", Some(self.max_size_mb)).range(1, 50).validate());
        nested.validate()
    }
}

/// What a file must satisfy before it is added to a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadConstraints {
    pub multiple: bool,
    pub accept: Vec<String>,
    pub max_size_bytes: usize,
}

impl UploadConstraints {
    pub fn check(&self, file_name: &str, size: usize) -> DomainResult<()> {
        if !self.accept.is_empty() && !validate_file_extension(file_name, &self.accept) {
            return Err(ValidationError::format(
                "file",
                &format!("{} is not one of the accepted types ({})", file_name, self.accept.join(", ")),
            )
            .into());
        }
        if !validate_file_size(size, self.max_size_bytes) {
            return Err(ValidationError::invalid_value(
                "file",
                &format!("{} exceeds the {} MB limit", file_name, self.max_size_bytes / BYTES_PER_MB),
            )
            .into());
        }
        Ok(())
    }
}

pub fn constraints(instance: &FieldInstance) -> UploadConstraints {
    let attrs: FileUploadAttributes = attributes::narrow(instance);
    UploadConstraints {
        multiple: attrs.multiple,
        accept: attrs.accept,
        max_size_bytes: attrs.max_size_mb as usize * BYTES_PER_MB,
    }
}

fn construct(id: &str) -> FieldInstance {
    attributes::construct_with(
        id,
        FieldType::FileUploadField,
        &FileUploadAttributes {
            input: InputAttributes::labelled("File upload", None),
            ..FileUploadAttributes::default()
        },
    )
}

fn control(attrs: &FileUploadAttributes, file_names: &[String]) -> Control {
    Control::FileInput {
        multiple: attrs.multiple,
        accept: attrs.accept.clone(),
        file_names: file_names.to_vec(),
    }
}

fn designer_view(instance: &FieldInstance) -> FieldView {
    let attrs: FileUploadAttributes = attributes::narrow(instance);
    attrs.input.view(instance, control(&attrs, &[]), true, false)
}

fn form_view(instance: &FieldInstance, input: &RuntimeInput<'_>) -> FieldView {
    let attrs: FileUploadAttributes = attributes::narrow(instance);
    attrs.input.view(instance, control(&attrs, input.file_names), false, input.invalid)
}

fn properties_view(instance: &FieldInstance) -> PropertiesView {
    let attrs: FileUploadAttributes = attributes::narrow(instance);
    let mut properties = attrs.input.properties(false);
    properties.push(PropertyInput {
        key: "multiple",
        label: "Multiple files",
        description: "Allow more than one file to be attached",
        editor: PropertyEditor::Switch,
        value: json!(attrs.multiple),
    });
    properties.push(PropertyInput {
        key: "accept",
        label: "Accepted types",
        description: "File extensions the submitter may upload, e.g. pdf or png",
        editor: PropertyEditor::StringList,
        value: json!(attrs.accept),
    });
    properties.push(PropertyInput {
        key: "maxSizeMb",
        label: "Maximum size (MB)",
        description: "Largest file accepted",
        editor: PropertyEditor::Number { min: 1.0, max: 50.0 },
        value: json!(attrs.max_size_mb),
    });
    attributes::properties_view(instance, properties)
}

fn apply_properties(instance: &FieldInstance, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
    attributes::apply::<FileUploadAttributes>(instance, changes)
}

/// The runtime value of an upload field is its comma-joined file names.
fn validate(instance: &FieldInstance, value: &str) -> bool {
    attributes::has_value(instance, value)
}

/// Stored references may be bare names, objects carrying a name or URL, or lists of either.
fn display(_: &FieldInstance, value: &Value) -> String {
    fn name_of(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(map) => ["name", "fileName", "filename", "url"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        }
    }

    match value {
        Value::Array(items) => items.iter().filter_map(name_of).collect::<Vec<_>>().join(", "),
        other => name_of(other).unwrap_or_else(|| attributes::value_text(other)),
    }
}
