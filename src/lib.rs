//! Core of a drag-and-drop form builder: the field type registry, the designer's
//! document state machine, reconciliation of stored submissions against the
//! current schema and the public submission flow.
//!
//! Hosts either use the Rust API directly or go through the JSON-over-C surface
//! in [`ffi`], which needs [`initialize`] (or `forms_initialize`) first.

// Public modules
pub mod config;
pub mod domains;
pub mod errors;
pub mod ffi;
pub mod globals;
pub mod types;
pub mod validation;

pub use config::BackendConfig;

/// Initialize logging, the forms backend and the catalog service.
/// This function must be called before any FFI function that talks to the backend.
pub async fn initialize(config: BackendConfig) -> ffi::FFIResult<()> {
    globals::initialize(config).await
}

/// Same as [`initialize`], reading `FORMS_*` variables (and `.env`) for the configuration.
pub async fn initialize_from_env() -> ffi::FFIResult<()> {
    let config = BackendConfig::from_env()?;
    initialize(config).await
}

/// Whether [`initialize`] has completed successfully
pub fn is_initialized() -> bool {
    globals::is_initialized()
}
