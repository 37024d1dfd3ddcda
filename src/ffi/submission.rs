// FFI entry points for stored submissions and public submission flows.

use crate::domains::form::types::FormDocument;
use crate::domains::form::view::FieldView;
use crate::domains::submission::editor::SubmissionEditor;
use crate::domains::submission::export::{self, CsvOptions};
use crate::domains::submission::flow::{FlowSnapshot, SubmissionFlow};
use crate::domains::submission::reconcile;
use crate::domains::submission::types::{Submission, UploadedFile};
use crate::errors::ServiceError;
use crate::ffi::error::FFIError;
use crate::ffi::{block_on_async, handle_status_result, parse_payload, write_result};
use crate::globals;
use crate::types::FormIdentifier;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::os::raw::{c_char, c_int};
use std::path::PathBuf;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormIdPayload {
    form_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportPayload {
    form_id: String,
    path: String,
    #[serde(default)]
    delimiter: Option<char>,
    #[serde(default)]
    with_bom: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportResponse {
    path: String,
    rows: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload {
    form_id: String,
    submission_id: String,
    /// A null value clears the stored answer.
    changes: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    submission: Submission,
    missing_required: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenFlowPayload {
    identifier: FormIdentifier,
    #[serde(default)]
    submitter_id: Option<String>,
}

#[derive(Serialize)]
struct OpenFlowResponse {
    handle: u64,
    form: FormDocument,
    views: Vec<FieldView>,
}

#[derive(Deserialize)]
struct FlowHandlePayload {
    handle: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetValuePayload {
    handle: u64,
    field_id: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFilePayload {
    handle: u64,
    field_id: String,
    file_name: String,
    #[serde(default)]
    mime_type: Option<String>,
    /// base64 encoded
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveFilePayload {
    handle: u64,
    field_id: String,
    file_name: String,
}

#[derive(Serialize)]
struct RemovedResponse {
    removed: bool,
}

// --- Stored submissions ---

/// `{"formId": "..."}` -> reconciled table (columns in form order, one row per submission)
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_submissions_table(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FormIdPayload = parse_payload(payload_json)?;
        let backend = globals::get_backend()?;
        let table = block_on_async(reconcile::fetch_table(backend.as_ref(), &p.form_id))?;
        write_result(result, &table)
    })
}

/// `{"formId": "...", "path": "/tmp/out.csv", "delimiter": ";", "withBom": true}`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_submissions_export_csv(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: ExportPayload = parse_payload(payload_json)?;
        let delimiter = match p.delimiter {
            None => b',',
            Some(c) if c.is_ascii() => c as u8,
            Some(c) => return Err(FFIError::invalid_argument(&format!("delimiter '{}' is not ASCII", c))),
        };
        let backend = globals::get_backend()?;
        let table = block_on_async(reconcile::fetch_table(backend.as_ref(), &p.form_id))?;
        let path = PathBuf::from(&p.path);
        export::export_to_file(&table, &path, CsvOptions { delimiter, with_bom: p.with_bom })?;
        write_result(result, &ExportResponse { path: p.path, rows: table.rows.len() })
    })
}

/// `{"formId": "...", "submissionId": "...", "changes": {"fieldId": "value"}}`
/// Sends the full merged content and reports required fields still missing.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_submission_update(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: UpdatePayload = parse_payload(payload_json)?;
        let backend = globals::get_backend()?;
        let response = block_on_async(async {
            let form = backend.fetch_form(&FormIdentifier::Id(p.form_id.clone())).await?;
            let mut editor = SubmissionEditor::fetch(backend.as_ref(), &p.form_id, &p.submission_id).await?;
            for (field_id, value) in p.changes {
                if value.is_null() {
                    editor.clear_value(&field_id);
                } else {
                    editor.set_value(&field_id, value);
                }
            }
            let missing_required = editor.missing_required(&form);
            let submission = editor.save(backend.as_ref()).await?;
            Ok::<_, ServiceError>(UpdateResponse { submission, missing_required })
        })?;
        write_result(result, &response)
    })
}

// --- Submission flows ---

/// `{"identifier": {"kind": "share", "value": "..."}, "submitterId": "..."}` -> handle, form and views
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_open(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: OpenFlowPayload = parse_payload(payload_json)?;
        let backend = globals::get_backend()?;
        let flow = block_on_async(SubmissionFlow::open(backend, &p.identifier, p.submitter_id))?;
        let form = flow.form().clone();
        let views = flow.field_views();
        let handle = globals::register_flow(flow)?;
        write_result(result, &OpenFlowResponse { handle, form, views })
    })
}

/// `{"handle": n, "fieldId": "...", "value": "..."}` -> snapshot
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_set_value(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: SetValuePayload = parse_payload(payload_json)?;
        let flow = globals::get_flow(p.handle)?;
        flow.set_value(&p.field_id, &p.value)?;
        write_result(result, &flow.snapshot())
    })
}

/// `{"handle": n, "fieldId": "...", "fileName": "...", "mimeType": null, "data": "<base64>"}` -> snapshot
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_add_file(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: AddFilePayload = parse_payload(payload_json)?;
        let bytes = STANDARD
            .decode(p.data.as_bytes())
            .map_err(|e| FFIError::invalid_argument(&format!("file data is not base64: {}", e)))?;
        let flow = globals::get_flow(p.handle)?;
        flow.add_file(&p.field_id, UploadedFile { file_name: p.file_name, mime_type: p.mime_type, bytes })?;
        write_result(result, &flow.snapshot())
    })
}

/// `{"handle": n, "fieldId": "...", "fileName": "..."}` -> `{"removed": bool}`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_remove_file(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: RemoveFilePayload = parse_payload(payload_json)?;
        let flow = globals::get_flow(p.handle)?;
        let removed = flow.remove_file(&p.field_id, &p.file_name)?;
        write_result(result, &RemovedResponse { removed })
    })
}

/// `{"handle": n}` -> runtime field views in form order
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_views(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FlowHandlePayload = parse_payload(payload_json)?;
        let flow = globals::get_flow(p.handle)?;
        write_result(result, &flow.field_views())
    })
}

/// `{"handle": n}` -> snapshot with the receipt. A validation failure returns
/// RequiredFieldsMissing with the offending field ids in `details`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_submit(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FlowHandlePayload = parse_payload(payload_json)?;
        let flow = globals::get_flow(p.handle)?;
        block_on_async(flow.submit())?;
        let snapshot: FlowSnapshot = flow.snapshot();
        write_result(result, &snapshot)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_reset(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FlowHandlePayload = parse_payload(payload_json)?;
        let flow = globals::get_flow(p.handle)?;
        flow.reset()?;
        write_result(result, &flow.snapshot())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_snapshot(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FlowHandlePayload = parse_payload(payload_json)?;
        let flow = globals::get_flow(p.handle)?;
        write_result(result, &flow.snapshot())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_flow_close(payload_json: *const c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FlowHandlePayload = parse_payload(payload_json)?;
        globals::remove_flow(p.handle)
    })
}
