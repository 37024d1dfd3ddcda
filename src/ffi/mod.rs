//! C ABI over the forms core.
//!
//! Every entry point takes a JSON payload and, where it produces data, writes a
//! JSON string into `result` that the caller releases with `forms_free_string`.
//! The return value is an [`ErrorCode`]; zero means success.

use std::ffi::{CStr, CString};
use std::future::Future;
use std::os::raw::{c_char, c_int};
use serde::de::DeserializeOwned;
use serde::Serialize;
use crate::ffi::error::{ErrorCode, FFIError};

/// Ensure pointer is not null
macro_rules! ensure_ptr {
    ($ptr:expr) => {
        if $ptr.is_null() {
            return Err($crate::ffi::error::FFIError::new(
                $crate::ffi::error::ErrorCode::NullPointer,
                concat!("null pointer: ", stringify!($ptr)),
            ));
        }
    };
}

pub mod core;
pub mod error;
pub mod form;
pub mod registry;
pub mod submission;

pub use error::FFIResult;

/// Error handling helper for FFI boundaries (returns error code)
pub fn handle_status_result<F>(func: F) -> c_int
where
    F: FnOnce() -> FFIResult<()>,
{
    match func() {
        Ok(_) => ErrorCode::Success as c_int,
        Err(e) => {
            log::error!("[FFI] Code: {:?}, Message: {}, Details: {}",
                        e.code, e.message, e.details.as_deref().unwrap_or("None"));
            e.code as c_int
        }
    }
}

/// Serializes Ok(T) or the FFIError itself, so the caller can always parse the answer.
/// Returns a pointer to a C string (must be freed by the caller).
pub fn handle_json_result<F, T>(func: F) -> *mut c_char
where
    F: FnOnce() -> FFIResult<T>,
    T: Serialize,
{
    let json_string = match func() {
        Ok(value) => serde_json::to_string(&value),
        Err(ffi_error) => serde_json::to_string(&ffi_error),
    };

    let final_json = json_string.unwrap_or_else(|e| {
        log::error!("[FFI] Serialization failed: {}", e);
        serde_json::json!({
            "code": ErrorCode::InternalError,
            "message": format!("Failed to serialize result: {}", e),
            "details": null,
        })
        .to_string()
    });

    match CString::new(final_json) {
        Ok(c_string) => c_string.into_raw(),
        Err(e) => {
            log::error!("[FFI] Failed to create CString: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Runs a future to completion on the library runtime.
pub fn block_on_async<F, T, E>(future: F) -> FFIResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<FFIError>,
{
    crate::globals::runtime()?.block_on(future).map_err(Into::into)
}

/// Reads and deserializes a JSON payload argument.
pub(crate) unsafe fn parse_payload<T: DeserializeOwned>(payload_json: *const c_char) -> FFIResult<T> {
    ensure_ptr!(payload_json);
    let json = CStr::from_ptr(payload_json)
        .to_str()
        .map_err(|_| FFIError::new(ErrorCode::InvalidUtf8, "payload is not valid UTF-8"))?;
    serde_json::from_str(json).map_err(|e| FFIError::invalid_argument(&format!("invalid payload: {}", e)))
}

/// Serializes `value` into a newly allocated C string stored in `*result`.
pub(crate) unsafe fn write_result<T: Serialize>(result: *mut *mut c_char, value: &T) -> FFIResult<()> {
    ensure_ptr!(result);
    let json = serde_json::to_string(value).map_err(|e| FFIError::internal(format!("ser {e}")))?;
    *result = CString::new(json)?.into_raw();
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Calls an entry point with a JSON payload and returns its code and parsed result.
    pub fn call(
        f: unsafe extern "C" fn(*const c_char, *mut *mut c_char) -> c_int,
        payload: serde_json::Value,
    ) -> (c_int, serde_json::Value) {
        let input = CString::new(payload.to_string()).unwrap();
        let mut out: *mut c_char = std::ptr::null_mut();
        let code = unsafe { f(input.as_ptr(), &mut out) };
        let value = if out.is_null() {
            serde_json::Value::Null
        } else {
            let text = unsafe { CString::from_raw(out) }.into_string().unwrap();
            serde_json::from_str(&text).unwrap()
        };
        (code, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_result_codes() {
        assert_eq!(handle_status_result(|| Ok(())), 0);
        let code = handle_status_result(|| Err(FFIError::invalid_argument("bad")));
        assert_eq!(code, ErrorCode::InvalidArgument as c_int);
    }

    #[test]
    fn test_json_result_serializes_error() {
        let ptr = handle_json_result::<_, ()>(|| Err(FFIError::not_initialized("Forms backend")));
        let text = unsafe { CString::from_raw(ptr) }.into_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["code"], "NotInitialized");
    }

    #[test]
    fn test_parse_payload_rejects_null() {
        let err = unsafe { parse_payload::<serde_json::Value>(std::ptr::null()) }.err().unwrap();
        assert_eq!(err.code, ErrorCode::NullPointer);
    }
}
