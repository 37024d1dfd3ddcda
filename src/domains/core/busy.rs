use crate::errors::{ServiceError, ServiceResult};
use std::sync::atomic::{AtomicBool, Ordering};

/// At-most-one in-flight guard for a single kind of backend operation.
///
/// A second caller is rejected before any request is issued; the flag is
/// released when the returned guard is dropped, whatever the outcome.
#[derive(Debug)]
pub struct BusyFlag {
    operation: &'static str,
    busy: AtomicBool,
}

impl BusyFlag {
    pub const fn new(operation: &'static str) -> Self {
        Self {
            operation,
            busy: AtomicBool::new(false),
        }
    }

    pub fn try_acquire(&self) -> ServiceResult<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ServiceError::OperationInProgress(self.operation.to_string()))?;
        Ok(BusyGuard { busy: &self.busy })
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[must_use = "the operation is only marked busy while the guard is alive"]
pub struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
