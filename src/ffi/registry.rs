// FFI entry points over the field type registry. None of these need `forms_initialize`.

use crate::domains::form::registry;
use crate::domains::form::types::{FieldInstance, FieldType};
use crate::domains::form::view::RuntimeInput;
use crate::ffi::{handle_json_result, handle_status_result, parse_payload, write_result};
use crate::ffi::error::FFIError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::os::raw::{c_char, c_int};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConstructPayload {
    field_type: String,
    id: String,
}

#[derive(Deserialize)]
struct FieldPayload {
    field: FieldInstance,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormViewPayload {
    field: FieldInstance,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    file_names: Vec<String>,
    #[serde(default)]
    invalid: bool,
}

#[derive(Deserialize)]
struct ApplyPropertiesPayload {
    field: FieldInstance,
    changes: Map<String, Value>,
}

#[derive(Deserialize)]
struct ValidatePayload {
    field: FieldInstance,
    #[serde(default)]
    value: String,
}

#[derive(Serialize)]
struct ValidateResponse {
    valid: bool,
}

/// Every registered field type in toolbox order.
/// Returns a JSON string that must be freed with forms_free_string()
#[unsafe(no_mangle)]
pub extern "C" fn forms_toolbox() -> *mut c_char {
    handle_json_result(|| Ok(registry::toolbox()))
}

/// `{"fieldType": "TextField", "id": "..."}` -> field instance with the type's defaults
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_field_construct(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: ConstructPayload = parse_payload(payload_json)?;
        let field_type = FieldType::from_str(&p.field_type).map_err(FFIError::from)?;
        write_result(result, &registry::construct(field_type, &p.id))
    })
}

/// `{"field": {...}}` -> disabled designer preview
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_field_designer_view(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FieldPayload = parse_payload(payload_json)?;
        write_result(result, &registry::designer_view(&p.field))
    })
}

/// `{"field": {...}, "value": "...", "fileNames": [], "invalid": false}` -> runtime input view
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_field_form_view(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FormViewPayload = parse_payload(payload_json)?;
        let input = RuntimeInput {
            value: p.value.as_deref(),
            file_names: &p.file_names,
            invalid: p.invalid,
        };
        write_result(result, &registry::form_view(&p.field, &input))
    })
}

/// `{"field": {...}}` -> editable properties of the field's type
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_field_properties_view(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FieldPayload = parse_payload(payload_json)?;
        let view = registry::properties_view(&p.field)?;
        write_result(result, &view)
    })
}

/// `{"field": {...}, "changes": {...}}` -> updated field instance
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_field_apply_properties(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: ApplyPropertiesPayload = parse_payload(payload_json)?;
        let updated = registry::apply_properties(&p.field, &p.changes)?;
        write_result(result, &updated)
    })
}

/// `{"field": {...}, "value": "..."}` -> `{"valid": bool}`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_field_validate(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: ValidatePayload = parse_payload(payload_json)?;
        write_result(result, &ValidateResponse { valid: registry::validate(&p.field, &p.value) })
    })
}
