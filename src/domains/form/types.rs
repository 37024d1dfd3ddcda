use crate::domains::core::json::list_or_json_string;
use crate::errors::{DomainError, DomainResult};
use crate::validation::{NestedValidator, Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Every field type the registry knows how to render and validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    TextField,
    NumberField,
    TextAreaField,
    DateField,
    SelectField,
    CheckboxField,
    TelephoneField,
    FileUploadField,
    TitleField,
    SubTitleField,
    ParagraphField,
    SeparatorField,
    SpacerField,
}

impl FieldType {
    pub const ALL: [FieldType; 13] = [
        FieldType::TextField,
        FieldType::NumberField,
        FieldType::TextAreaField,
        FieldType::DateField,
        FieldType::SelectField,
        FieldType::CheckboxField,
        FieldType::TelephoneField,
        FieldType::FileUploadField,
        FieldType::TitleField,
        FieldType::SubTitleField,
        FieldType::ParagraphField,
        FieldType::SeparatorField,
        FieldType::SpacerField,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::TextField => "TextField",
            FieldType::NumberField => "NumberField",
            FieldType::TextAreaField => "TextAreaField",
            FieldType::DateField => "DateField",
            FieldType::SelectField => "SelectField",
            FieldType::CheckboxField => "CheckboxField",
            FieldType::TelephoneField => "TelephoneField",
            FieldType::FileUploadField => "FileUploadField",
            FieldType::TitleField => "TitleField",
            FieldType::SubTitleField => "SubTitleField",
            FieldType::ParagraphField => "ParagraphField",
            FieldType::SeparatorField => "SeparatorField",
            FieldType::SpacerField => "SpacerField",
        }
    }

    /// Whether the type collects a value from the submitter.
    pub fn is_input(&self) -> bool {
        match self {
            FieldType::TextField
            | FieldType::NumberField
            | FieldType::TextAreaField
            | FieldType::DateField
            | FieldType::SelectField
            | FieldType::CheckboxField
            | FieldType::TelephoneField
            | FieldType::FileUploadField => true,
            FieldType::TitleField
            | FieldType::SubTitleField
            | FieldType::ParagraphField
            | FieldType::SeparatorField
            | FieldType::SpacerField => false,
        }
    }
}

impl FromStr for FieldType {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownFieldType(s.to_string()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type tag stored on a field instance.
///
/// Schemas outlive code, so a tag the registry does not know is kept verbatim
/// (and written back on save) instead of failing the whole form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    Registered(FieldType),
    Unregistered(String),
}

impl TypeTag {
    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Registered(t) => t.as_str(),
            TypeTag::Unregistered(raw) => raw,
        }
    }

    pub fn registered(&self) -> Option<FieldType> {
        match self {
            TypeTag::Registered(t) => Some(*t),
            TypeTag::Unregistered(_) => None,
        }
    }
}

impl From<String> for TypeTag {
    fn from(raw: String) -> Self {
        match FieldType::from_str(&raw) {
            Ok(t) => TypeTag::Registered(t),
            Err(_) => TypeTag::Unregistered(raw),
        }
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Registered(t) => t.as_str().to_string(),
            TypeTag::Unregistered(raw) => raw,
        }
    }
}

impl From<FieldType> for TypeTag {
    fn from(t: FieldType) -> Self {
        TypeTag::Registered(t)
    }
}

/// One configured field within a form's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: TypeTag,
    #[serde(default)]
    pub extra_attributes: Map<String, Value>,
}

impl FieldInstance {
    pub fn new(id: &str, field_type: impl Into<TypeTag>, extra_attributes: Map<String, Value>) -> Self {
        Self {
            id: id.to_string(),
            field_type: field_type.into(),
            extra_attributes,
        }
    }

    /// The configured label, when it is a non-empty string.
    pub fn label(&self) -> Option<&str> {
        self.extra_attributes
            .get("label")
            .and_then(Value::as_str)
            .filter(|label| !label.trim().is_empty())
    }

    /// Label for headers and messages, falling back to `Field {id}`.
    pub fn display_label(&self) -> String {
        match self.label() {
            Some(label) => label.to_string(),
            None => format!("Field {}", self.id),
        }
    }

    pub fn is_required(&self) -> bool {
        self.extra_attributes
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Unknown tags count as input so their stored values stay visible.
    pub fn is_input(&self) -> bool {
        match &self.field_type {
            TypeTag::Registered(t) => t.is_input(),
            TypeTag::Unregistered(_) => true,
        }
    }
}

/// The editable schema and metadata of one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "content", deserialize_with = "list_or_json_string")]
    pub fields: Vec<FieldInstance>,
    #[serde(default)]
    pub published: bool,
    #[serde(alias = "shareURL", alias = "shareUrl")]
    pub share_identifier: String,
    #[serde(default)]
    pub business_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub visits: u64,
    #[serde(default)]
    pub submissions: u64,
}

impl FormDocument {
    pub fn field(&self, id: &str) -> Option<&FieldInstance> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    /// Fields that collect values, in schema order.
    pub fn input_fields(&self) -> impl Iterator<Item = &FieldInstance> {
        self.fields.iter().filter(|f| f.is_input())
    }

    pub fn summary(&self) -> FormSummary {
        FormSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            published: self.published,
            share_identifier: self.share_identifier.clone(),
            created_at: self.created_at,
            visits: self.visits,
            submissions: self.submissions,
        }
    }
}

/// List entry for a business's forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(alias = "shareURL", alias = "shareUrl")]
    pub share_identifier: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub visits: u64,
    #[serde(default)]
    pub submissions: u64,
}

/// Aggregate engagement figures across a set of forms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStats {
    pub visits: u64,
    pub submissions: u64,
    /// Percentage of visits that ended in a submission.
    pub submission_rate: f64,
    pub bounce_rate: f64,
}

impl FormStats {
    pub fn from_summaries<'a>(forms: impl IntoIterator<Item = &'a FormSummary>) -> Self {
        let (visits, submissions) = forms
            .into_iter()
            .fold((0u64, 0u64), |(v, s), form| (v + form.visits, s + form.submissions));

        let submission_rate = if visits > 0 {
            submissions as f64 / visits as f64 * 100.0
        } else {
            0.0
        };
        let bounce_rate = if visits > 0 { 100.0 - submission_rate } else { 0.0 };

        Self { visits, submissions, submission_rate, bounce_rate }
    }
}

/// Request body for creating a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub business_id: Option<String>,
}

impl Validate for NewForm {
    fn validate(&self) -> DomainResult<()> {
        let mut nested = NestedValidator::new();
        nested.check(
            ValidationBuilder::new("name", Some(self.name.trim().to_string()))
                .required()
                .min_length(4)
                .max_length(100)
                .validate(),
        );
        if let Some(description) = &self.description {
            nested.check(
                ValidationBuilder::new("description", Some(description.clone()))
                    .max_length(500)
                    .validate(),
            );
        }
        nested.validate()
    }
}

/// Request body for persisting an edited schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFormRequest {
    pub id: String,
    pub name: String,
    pub fields: Vec<FieldInstance>,
    pub share_identifier: String,
    pub business_id: Option<String>,
}

impl From<&FormDocument> for SaveFormRequest {
    fn from(doc: &FormDocument) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            fields: doc.fields.clone(),
            share_identifier: doc.share_identifier.clone(),
            business_id: doc.business_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_type_tag_round_trips() {
        let field: FieldInstance = serde_json::from_value(json!({
            "id": "7",
            "type": "SignatureField",
            "extraAttributes": {"label": "Sign here", "required": true}
        })).unwrap();
        assert_eq!(field.field_type, TypeTag::Unregistered("SignatureField".to_string()));
        assert!(field.is_input());
        assert!(field.is_required());

        let back = serde_json::to_value(&field).unwrap();
        assert_eq!(back["type"], json!("SignatureField"));
    }

    #[test]
    fn test_display_label_fallback() {
        let labelled = FieldInstance::new("1", FieldType::TextField, json!({"label": "First Name"}).as_object().unwrap().clone());
        assert_eq!(labelled.display_label(), "First Name");

        let blank = FieldInstance::new("2", FieldType::TextField, json!({"label": "  "}).as_object().unwrap().clone());
        assert_eq!(blank.display_label(), "Field 2");

        let bare = FieldInstance::new("3", FieldType::SelectField, Map::new());
        assert_eq!(bare.display_label(), "Field 3");
        assert!(!bare.is_required());
    }

    #[test]
    fn test_form_document_accepts_stringified_content() {
        let doc: FormDocument = serde_json::from_value(json!({
            "id": "42",
            "name": "Contact",
            "content": "[{\"id\":\"1\",\"type\":\"TextField\",\"extraAttributes\":{\"label\":\"Name\"}}]",
            "published": true,
            "shareURL": "abc-123",
            "createdAt": "2024-03-01T10:00:00Z"
        })).unwrap();
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.fields[0].field_type, TypeTag::Registered(FieldType::TextField));
        assert_eq!(doc.share_identifier, "abc-123");
        assert!(doc.published);
    }

    #[test]
    fn test_presentational_fields_excluded_from_inputs() {
        let doc = FormDocument {
            id: "1".to_string(),
            name: "Survey".to_string(),
            description: None,
            fields: vec![
                FieldInstance::new("t", FieldType::TitleField, Map::new()),
                FieldInstance::new("a", FieldType::TextField, Map::new()),
                FieldInstance::new("s", FieldType::SeparatorField, Map::new()),
                FieldInstance::new("b", FieldType::DateField, Map::new()),
            ],
            published: false,
            share_identifier: "share".to_string(),
            business_id: None,
            created_at: Utc::now(),
            visits: 0,
            submissions: 0,
        };
        let ids: Vec<&str> = doc.input_fields().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(doc.position("s"), Some(2));
    }

    #[test]
    fn test_form_stats() {
        let summary = |visits, submissions| FormSummary {
            id: "x".to_string(),
            name: "x".to_string(),
            description: None,
            published: true,
            share_identifier: "x".to_string(),
            created_at: Utc::now(),
            visits,
            submissions,
        };
        let forms = vec![summary(30, 6), summary(10, 4)];
        let stats = FormStats::from_summaries(&forms);
        assert_eq!(stats.visits, 40);
        assert_eq!(stats.submissions, 10);
        assert!((stats.submission_rate - 25.0).abs() < f64::EPSILON);
        assert!((stats.bounce_rate - 75.0).abs() < f64::EPSILON);

        let empty = FormStats::from_summaries(&Vec::new());
        assert_eq!(empty.submission_rate, 0.0);
    }

    #[test]
    fn test_new_form_validation() {
        let ok = NewForm { name: "Contact us".to_string(), description: None, business_id: None };
        assert!(ok.validate().is_ok());
        let short = NewForm { name: "ab".to_string(), description: None, business_id: None };
        assert!(short.validate().is_err());
    }
}
