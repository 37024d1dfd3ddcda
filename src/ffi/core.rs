// Core FFI functions for library initialization and memory management

use crate::config::BackendConfig;
use crate::ffi::{block_on_async, handle_status_result, parse_payload, error::FFIError};
use std::ffi::{c_char, CString};
use std::os::raw::c_int;

/// Initialize the library from a JSON `BackendConfig`
/// (`{"base_url": "...", "session_token": "...", ...}`).
/// Returns 0 on success, non-zero on error
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_initialize(config_json: *const c_char) -> c_int {
    let result = std::panic::catch_unwind(|| {
        let config: BackendConfig = parse_payload(config_json)?;
        block_on_async(crate::initialize(config))
    });

    match result {
        Ok(ffi_result) => handle_status_result(|| ffi_result),
        Err(panic_payload) => {
            let panic_msg = if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_payload.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Panicked during FFI call, but panic message is not a string".to_string()
            };
            log::error!("[FFI Panic] in forms_initialize: {}", panic_msg);
            handle_status_result(|| Err(FFIError::internal(format!("Panic during initialization: {}", panic_msg))))
        }
    }
}

/// Whether `forms_initialize` has completed successfully
#[unsafe(no_mangle)]
pub extern "C" fn forms_is_initialized() -> bool {
    crate::globals::is_initialized()
}

/// Free a string previously returned by this library
#[unsafe(no_mangle)]
pub unsafe extern "C" fn forms_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::error::ErrorCode;

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let input = CString::new(r#"{"base_url": "ftp://example.com"}"#).unwrap();
        let code = unsafe { forms_initialize(input.as_ptr()) };
        assert_eq!(code, ErrorCode::ValidationFailed as c_int);
    }

    #[test]
    fn test_initialize_rejects_malformed_json() {
        let input = CString::new("{not json").unwrap();
        let code = unsafe { forms_initialize(input.as_ptr()) };
        assert_eq!(code, ErrorCode::InvalidArgument as c_int);
    }

    #[test]
    fn test_free_null_is_noop() {
        unsafe { forms_free_string(std::ptr::null_mut()) };
    }
}
