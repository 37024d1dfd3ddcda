//! Aligns stored submissions with the current form schema.
//!
//! Columns come from the form's input fields in schema order, never from the
//! key order of any submission, so every row has the same shape even when the
//! schema changed after some submissions were stored.

use crate::domains::core::backend::FormsBackend;
use crate::domains::form::registry;
use crate::domains::form::types::{FieldInstance, FormDocument};
use crate::domains::submission::types::{Submission, SubmissionContent};
use crate::errors::ServiceResult;
use crate::types::FormIdentifier;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use serde_json::Value;

/// Shown in a cell whose field has no stored value.
pub const NOT_PROVIDED: &str = "not provided";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub field_id: String,
    pub label: String,
    pub field_type: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub field_id: String,
    pub display: String,
    pub provided: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub submission_id: String,
    pub submitted_at: DateTime<Utc>,
    pub cells: Vec<Cell>,
    /// Labels of required fields with no value, in column order.
    pub missing_required: Vec<String>,
}

impl Row {
    pub fn display(&self, field_id: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|c| c.field_id == field_id)
            .map(|c| c.display.as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionTable {
    pub form_id: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

pub fn columns(form: &FormDocument) -> Vec<Column> {
    form.input_fields()
        .map(|field| Column {
            field_id: field.id.clone(),
            label: field.display_label(),
            field_type: field.field_type.as_str().to_string(),
            required: field.is_required(),
        })
        .collect()
}

/// A stored value counts only when it is present and not null.
fn stored<'a>(content: &'a SubmissionContent, field_id: &str) -> Option<&'a Value> {
    content.get(field_id).filter(|v| !v.is_null())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Labels of required input fields whose value is absent or empty.
///
/// Computed from `content` on every call; callers editing a submission must
/// call it again after each change.
pub fn missing_required(form: &FormDocument, content: &SubmissionContent) -> Vec<String> {
    form.input_fields()
        .filter(|field| field.is_required())
        .filter(|field| stored(content, &field.id).map_or(true, is_blank))
        .map(FieldInstance::display_label)
        .collect()
}

pub fn reconcile_row(form: &FormDocument, submission: &Submission) -> Row {
    let cells = form
        .input_fields()
        .map(|field| match stored(&submission.content, &field.id) {
            Some(value) => Cell {
                field_id: field.id.clone(),
                display: registry::display_value(field, value),
                provided: true,
            },
            None => Cell {
                field_id: field.id.clone(),
                display: NOT_PROVIDED.to_string(),
                provided: false,
            },
        })
        .collect();

    Row {
        submission_id: submission.id.clone(),
        submitted_at: submission.created_at,
        cells,
        missing_required: missing_required(form, &submission.content),
    }
}

pub fn reconcile(form: &FormDocument, submissions: &[Submission]) -> SubmissionTable {
    SubmissionTable {
        form_id: form.id.clone(),
        columns: columns(form),
        rows: submissions.iter().map(|s| reconcile_row(form, s)).collect(),
    }
}

/// Fetches the current schema and every stored submission of a form, then aligns them.
pub async fn fetch_table(backend: &dyn FormsBackend, form_id: &str) -> ServiceResult<SubmissionTable> {
    let form = backend.fetch_form(&FormIdentifier::Id(form_id.to_string())).await?;
    let submissions = backend.list_submissions(&form.id).await?;
    debug!("Reconciling {} submission(s) against {} field(s)", submissions.len(), form.fields.len());
    Ok(reconcile(&form, &submissions))
}
