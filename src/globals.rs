use crate::config::BackendConfig;
use crate::domains::core::backend::{ApiFormsBackend, FormsBackend};
use crate::domains::form::service::{FormCatalogService, FormCatalogServiceImpl, FormSession};
use crate::domains::submission::flow::SubmissionFlow;
use crate::ffi::error::{FFIError, FFIResult};
use crate::validation::Validate;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;

lazy_static! {
    static ref INIT_MUTEX: tokio::sync::Mutex<()> = tokio::sync::Mutex::new(());
    static ref INITIALIZED: AtomicBool = AtomicBool::new(false);

    // Built on first use so FFI calls can block_on before initialize runs.
    static ref RUNTIME: Result<Runtime, String> = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("forms-core")
        .build()
        .map_err(|e| e.to_string());

    static ref BACKEND: Mutex<Option<Arc<dyn FormsBackend>>> = Mutex::new(None);
    static ref CATALOG_SERVICE: Mutex<Option<Arc<dyn FormCatalogService>>> = Mutex::new(None);

    // Handles given out to FFI hosts. Zero is never issued.
    static ref NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);
    static ref SESSIONS: Mutex<HashMap<u64, Arc<FormSession>>> = Mutex::new(HashMap::new());
    static ref FLOWS: Mutex<HashMap<u64, Arc<SubmissionFlow>>> = Mutex::new(HashMap::new());
}

// --- Getter Functions ---

pub fn runtime() -> FFIResult<&'static Runtime> {
    RUNTIME
        .as_ref()
        .map_err(|e| FFIError::internal(format!("Failed to create tokio runtime: {}", e)))
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

pub fn get_backend() -> FFIResult<Arc<dyn FormsBackend>> {
    BACKEND.lock().map_err(|_| FFIError::internal("BACKEND lock poisoned".to_string()))?.clone().ok_or_else(|| FFIError::not_initialized("Forms backend"))
}

pub fn get_catalog_service() -> FFIResult<Arc<dyn FormCatalogService>> {
    CATALOG_SERVICE.lock().map_err(|_| FFIError::internal("CATALOG_SERVICE lock poisoned".to_string()))?.clone().ok_or_else(|| FFIError::not_initialized("Form catalog service"))
}

// --- Handle tables ---

fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

pub fn register_session(session: FormSession) -> FFIResult<u64> {
    let handle = next_handle();
    SESSIONS.lock().map_err(|_| FFIError::internal("SESSIONS lock poisoned".to_string()))?.insert(handle, Arc::new(session));
    log::debug!("Opened editor session {}", handle);
    Ok(handle)
}

pub fn get_session(handle: u64) -> FFIResult<Arc<FormSession>> {
    SESSIONS
        .lock()
        .map_err(|_| FFIError::internal("SESSIONS lock poisoned".to_string()))?
        .get(&handle)
        .cloned()
        .ok_or_else(|| FFIError::unknown_handle("editor session", handle))
}

pub fn remove_session(handle: u64) -> FFIResult<()> {
    SESSIONS
        .lock()
        .map_err(|_| FFIError::internal("SESSIONS lock poisoned".to_string()))?
        .remove(&handle)
        .map(|_| log::debug!("Closed editor session {}", handle))
        .ok_or_else(|| FFIError::unknown_handle("editor session", handle))
}

pub fn register_flow(flow: SubmissionFlow) -> FFIResult<u64> {
    let handle = next_handle();
    FLOWS.lock().map_err(|_| FFIError::internal("FLOWS lock poisoned".to_string()))?.insert(handle, Arc::new(flow));
    log::debug!("Opened submission flow {}", handle);
    Ok(handle)
}

pub fn get_flow(handle: u64) -> FFIResult<Arc<SubmissionFlow>> {
    FLOWS
        .lock()
        .map_err(|_| FFIError::internal("FLOWS lock poisoned".to_string()))?
        .get(&handle)
        .cloned()
        .ok_or_else(|| FFIError::unknown_handle("submission flow", handle))
}

pub fn remove_flow(handle: u64) -> FFIResult<()> {
    FLOWS
        .lock()
        .map_err(|_| FFIError::internal("FLOWS lock poisoned".to_string()))?
        .remove(&handle)
        .map(|_| log::debug!("Closed submission flow {}", handle))
        .ok_or_else(|| FFIError::unknown_handle("submission flow", handle))
}

// --- Initialization ---

fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        #[cfg(debug_assertions)]
        std::env::set_var("RUST_LOG", "debug");
        #[cfg(not(debug_assertions))]
        std::env::set_var("RUST_LOG", "info");
    }
    // Another logger may already be installed by the host
    let _ = env_logger::try_init();
}

/// Installs the backend and the services built on it.
///
/// A second call after a successful one is a no-op.
pub async fn initialize(config: BackendConfig) -> FFIResult<()> {
    let _guard = INIT_MUTEX.lock().await;

    if INITIALIZED.load(Ordering::Acquire) {
        log::debug!("Library already initialized, skipping");
        return Ok(());
    }

    init_logging();
    config.validate().map_err(FFIError::from)?;
    let backend: Arc<dyn FormsBackend> = Arc::new(ApiFormsBackend::new(&config)?);
    log::info!("Initializing forms core against {}", config.base_url);

    install(backend)?;
    INITIALIZED.store(true, Ordering::Release);
    Ok(())
}

fn install(backend: Arc<dyn FormsBackend>) -> FFIResult<()> {
    let catalog: Arc<dyn FormCatalogService> = Arc::new(FormCatalogServiceImpl::new(backend.clone()));

    *BACKEND.lock().map_err(|_| FFIError::internal("BACKEND lock poisoned".to_string()))? = Some(backend);
    *CATALOG_SERVICE.lock().map_err(|_| FFIError::internal("CATALOG_SERVICE lock poisoned".to_string()))? = Some(catalog);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::core::backend::mock::MockFormsBackend;
    use crate::ffi::error::ErrorCode;

    #[test]
    fn test_session_handles_are_unique_and_removable() {
        let backend: Arc<dyn FormsBackend> = Arc::new(MockFormsBackend::new());
        let a = register_session(FormSession::new(backend.clone())).unwrap();
        let b = register_session(FormSession::new(backend)).unwrap();
        assert_ne!(a, b);
        assert!(get_session(a).is_ok());

        remove_session(a).unwrap();
        let err = get_session(a).err().unwrap();
        assert_eq!(err.code, ErrorCode::UnknownHandle);
        assert!(get_session(b).is_ok());
        remove_session(b).unwrap();
    }

    #[test]
    fn test_unknown_flow_handle() {
        assert_eq!(get_flow(0).err().unwrap().code, ErrorCode::UnknownHandle);
        assert_eq!(remove_flow(0).err().unwrap().code, ErrorCode::UnknownHandle);
    }

    #[test]
    fn test_runtime_available() {
        let value = runtime().unwrap().block_on(async { 7 });
        assert_eq!(value, 7);
    }
}
