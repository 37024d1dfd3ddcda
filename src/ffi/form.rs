// FFI entry points for designer sessions and the form catalog.
//
// A session is opened with `forms_session_create` and addressed by the returned
// handle until `forms_session_close`.

use crate::domains::form::editor::{CommandOutcome, EditorCommand, EditorSnapshot};
use crate::domains::form::service::FormSession;
use crate::domains::form::types::{FormDocument, NewForm};
use crate::ffi::{block_on_async, handle_json_result, handle_status_result, parse_payload, write_result};
use crate::globals;
use crate::types::FormIdentifier;
use serde::{Deserialize, Serialize};
use std::os::raw::{c_char, c_int};

#[derive(Deserialize)]
struct HandlePayload {
    handle: u64,
}

#[derive(Deserialize)]
struct LoadPayload {
    handle: u64,
    identifier: FormIdentifier,
}

#[derive(Deserialize)]
struct ApplyPayload {
    handle: u64,
    command: EditorCommand,
}

#[derive(Serialize)]
struct HandleResponse {
    handle: u64,
}

#[derive(Serialize)]
struct ApplyResponse {
    outcome: CommandOutcome,
    snapshot: EditorSnapshot,
}

#[derive(Serialize)]
struct SaveResponse {
    saved: FormDocument,
    snapshot: EditorSnapshot,
}

#[derive(Serialize)]
struct PublishResponse {
    published: bool,
    snapshot: EditorSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    deleted_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
    #[serde(default)]
    business_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormIdPayload {
    form_id: String,
}

/// Open an empty designer session.
/// Writes `{"handle": n}` into `result`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_create(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let backend = globals::get_backend()?;
        let handle = globals::register_session(FormSession::new(backend))?;
        write_result(result, &HandleResponse { handle })
    })
}

/// `{"handle": n, "identifier": {"kind": "id", "value": "..."}}` -> snapshot after loading
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_load(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: LoadPayload = parse_payload(payload_json)?;
        let session = globals::get_session(p.handle)?;
        block_on_async(session.load(&p.identifier))?;
        write_result(result, &session.snapshot())
    })
}

/// `{"handle": n, "command": {"command": "add_field", ...}}` -> outcome and snapshot
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_apply(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: ApplyPayload = parse_payload(payload_json)?;
        let session = globals::get_session(p.handle)?;
        let outcome = session.apply(p.command)?;
        write_result(result, &ApplyResponse { outcome, snapshot: session.snapshot() })
    })
}

/// `{"handle": n}` -> saved document and snapshot
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_save(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: HandlePayload = parse_payload(payload_json)?;
        let session = globals::get_session(p.handle)?;
        let saved = block_on_async(session.save())?;
        write_result(result, &SaveResponse { saved, snapshot: session.snapshot() })
    })
}

/// `{"handle": n}` -> `{"published": true, "snapshot": ...}`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_publish(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: HandlePayload = parse_payload(payload_json)?;
        let session = globals::get_session(p.handle)?;
        let published = block_on_async(session.publish())?;
        write_result(result, &PublishResponse { published, snapshot: session.snapshot() })
    })
}

/// `{"handle": n}` -> `{"published": false, "snapshot": ...}`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_unpublish(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: HandlePayload = parse_payload(payload_json)?;
        let session = globals::get_session(p.handle)?;
        let published = block_on_async(session.unpublish())?;
        write_result(result, &PublishResponse { published, snapshot: session.snapshot() })
    })
}

/// Delete the loaded form on the backend. The session stays open, unloaded.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_delete(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: HandlePayload = parse_payload(payload_json)?;
        let session = globals::get_session(p.handle)?;
        let deleted_id = block_on_async(session.delete())?;
        write_result(result, &DeleteResponse { deleted_id })
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_snapshot(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: HandlePayload = parse_payload(payload_json)?;
        let session = globals::get_session(p.handle)?;
        write_result(result, &session.snapshot())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_session_close(payload_json: *const c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: HandlePayload = parse_payload(payload_json)?;
        globals::remove_session(p.handle)
    })
}

// --- Catalog ---

/// `{"businessId": "..."}` -> form summaries
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_catalog_refresh(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: RefreshPayload = parse_payload(payload_json)?;
        let catalog = globals::get_catalog_service()?;
        let forms = block_on_async(catalog.refresh(p.business_id.as_deref()))?;
        write_result(result, &forms)
    })
}

/// `{"name": "...", "description": "...", "businessId": "..."}` -> created form
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_catalog_create(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let new_form: NewForm = parse_payload(payload_json)?;
        let catalog = globals::get_catalog_service()?;
        let created = block_on_async(catalog.create_form(new_form))?;
        write_result(result, &created)
    })
}

/// `{"formId": "..."}`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_catalog_delete(payload_json: *const c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: FormIdPayload = parse_payload(payload_json)?;
        let catalog = globals::get_catalog_service()?;
        block_on_async(catalog.delete_form(&p.form_id))
    })
}

/// Aggregate visits, submissions and rates over the last refreshed list.
/// Returns a JSON string that must be freed with forms_free_string()
#[unsafe(no_mangle)]
pub extern "C" fn forms_catalog_stats() -> *mut c_char {
    handle_json_result(|| Ok(globals::get_catalog_service()?.stats()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::core::backend::mock::MockFormsBackend;
    use crate::domains::core::backend::FormsBackend;
    use crate::ffi::error::ErrorCode;
    use crate::ffi::test_support::call;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    fn open_session(backend: Arc<MockFormsBackend>) -> u64 {
        let backend: Arc<dyn FormsBackend> = backend;
        globals::register_session(FormSession::new(backend)).unwrap()
    }

    fn stored_form() -> FormDocument {
        FormDocument {
            id: "form-1".to_string(),
            name: "Contact".to_string(),
            description: None,
            fields: Vec::new(),
            published: false,
            share_identifier: "share-form-1".to_string(),
            business_id: None,
            created_at: Utc::now(),
            visits: 0,
            submissions: 0,
        }
    }

    #[test]
    fn test_load_edit_save_through_handle() {
        let backend = Arc::new(MockFormsBackend::new().with_form(stored_form()));
        let handle = open_session(backend.clone());

        let (code, snapshot) = call(
            forms_session_load,
            json!({"handle": handle, "identifier": {"kind": "id", "value": "form-1"}}),
        );
        assert_eq!(code, 0);
        assert_eq!(snapshot["dirty"], false);

        let (code, applied) = call(
            forms_session_apply,
            json!({"handle": handle, "command": {"command": "add_field", "index": 0, "field_type": "TextField"}}),
        );
        assert_eq!(code, 0);
        assert_eq!(applied["outcome"]["outcome"], "field_added");
        assert_eq!(applied["snapshot"]["dirty"], true);

        let (code, saved) = call(forms_session_save, json!({"handle": handle}));
        assert_eq!(code, 0);
        assert_eq!(saved["snapshot"]["dirty"], false);
        assert_eq!(backend.stored_form("form-1").unwrap().fields.len(), 1);

        globals::remove_session(handle).unwrap();
    }

    #[test]
    fn test_publish_reports_state() {
        let backend = Arc::new(MockFormsBackend::new().with_form(stored_form()));
        let handle = open_session(backend.clone());
        call(forms_session_load, json!({"handle": handle, "identifier": {"kind": "id", "value": "form-1"}}));

        let (code, out) = call(forms_session_publish, json!({"handle": handle}));
        assert_eq!(code, 0);
        assert_eq!(out["published"], true);
        assert_eq!(backend.calls("set_published"), 1);

        globals::remove_session(handle).unwrap();
    }

    #[test]
    fn test_command_errors_map_to_codes() {
        let backend = Arc::new(MockFormsBackend::new());
        let handle = open_session(backend);

        let (code, _) = call(forms_session_apply, json!({"handle": handle, "command": {"command": "rename", "name": "x"}}));
        assert_eq!(code, ErrorCode::NoDocument as c_int);

        let (code, _) = call(forms_session_snapshot, json!({"handle": 0}));
        assert_eq!(code, ErrorCode::UnknownHandle as c_int);

        let input = std::ffi::CString::new(json!({"handle": handle}).to_string()).unwrap();
        assert_eq!(unsafe { forms_session_close(input.as_ptr()) }, 0);
        assert_eq!(unsafe { forms_session_close(input.as_ptr()) }, ErrorCode::UnknownHandle as c_int);
    }
}
