use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use crate::errors::{DomainError, ServiceError, ValidationError};

/// Error codes for FFI boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Success (no error)
    Success = 0,

    // General errors (1-99)
    InvalidArgument = 2,
    NullPointer = 3,
    InvalidUtf8 = 4,
    InternalError = 6,
    NotInitialized = 7,
    UnknownHandle = 8,

    // Domain errors (200-299)
    EntityNotFound = 201,
    ValidationFailed = 204,
    UnknownFieldType = 209,
    DuplicateFieldId = 210,
    FieldNotFound = 211,
    NoDocument = 212,
    InvalidState = 213,

    // Service errors (300-399)
    NetworkError = 308,
    ConfigurationError = 310,
    ExternalServiceError = 311,
    OperationInProgress = 312,
    RequiredFieldsMissing = 313,
    NotPublished = 314,
    AlreadySubmitted = 315,
    ServerError = 316,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Error type for FFI boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FFIError {
    /// Error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (JSON string)
    pub details: Option<String>,
}

impl fmt::Display for FFIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for FFIError {}

impl FFIError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: &str, details: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: String) -> Self {
        Self::new(ErrorCode::InternalError, &message)
    }

    pub fn not_initialized(what: &str) -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            &format!("{} not initialized; call forms_initialize first", what),
        )
    }

    pub fn unknown_handle(kind: &str, handle: u64) -> Self {
        Self::with_details(
            ErrorCode::UnknownHandle,
            &format!("No open {} with handle {}", kind, handle),
            &json!({ "kind": kind, "handle": handle }).to_string(),
        )
    }
}

impl From<DomainError> for FFIError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::EntityNotFound(entity, id) => {
                Self::with_details(
                    ErrorCode::EntityNotFound,
                    &format!("Entity not found: {} with ID {}", entity, id),
                    &json!({ "entity": entity, "id": id }).to_string(),
                )
            },
            DomainError::Validation(val_err) => {
                val_err.into() // Delegate to From<ValidationError>
            },
            DomainError::UnknownFieldType(tag) => {
                Self::with_details(
                    ErrorCode::UnknownFieldType,
                    &format!("Unsupported field type: {}", tag),
                    &json!({ "type": tag }).to_string(),
                )
            },
            DomainError::DuplicateFieldId(id) => {
                Self::with_details(
                    ErrorCode::DuplicateFieldId,
                    &format!("A field with ID {} already exists in this form", id),
                    &json!({ "id": id }).to_string(),
                )
            },
            DomainError::FieldNotFound(id) => {
                Self::with_details(
                    ErrorCode::FieldNotFound,
                    &format!("Field not found: {}", id),
                    &json!({ "id": id }).to_string(),
                )
            },
            DomainError::NoDocument => Self::new(ErrorCode::NoDocument, "No form is loaded"),
            DomainError::InvalidState(msg) => Self::new(ErrorCode::InvalidState, &msg),
            DomainError::Internal(msg) => Self::new(ErrorCode::InternalError, &msg),
        }
    }
}

impl From<ServiceError> for FFIError {
    fn from(err: ServiceError) -> Self {
        let message = err.user_message();
        match err {
            ServiceError::Domain(domain_err) => {
                domain_err.into() // Delegate
            },
            ServiceError::OperationInProgress(operation) => {
                Self::with_details(
                    ErrorCode::OperationInProgress,
                    &message,
                    &json!({ "operation": operation }).to_string(),
                )
            },
            ServiceError::ValidationFailed { fields } => {
                Self::with_details(
                    ErrorCode::RequiredFieldsMissing,
                    &message,
                    &json!({ "fields": fields }).to_string(),
                )
            },
            ServiceError::NotPublished(form_id) => {
                Self::with_details(
                    ErrorCode::NotPublished,
                    &message,
                    &json!({ "formId": form_id }).to_string(),
                )
            },
            ServiceError::AlreadySubmitted => Self::new(ErrorCode::AlreadySubmitted, &message),
            ServiceError::Network(detail) => {
                Self::with_details(ErrorCode::NetworkError, &message, &json!({ "cause": detail }).to_string())
            },
            ServiceError::Server { status, .. } => {
                Self::with_details(ErrorCode::ServerError, &message, &json!({ "status": status }).to_string())
            },
            ServiceError::Configuration(_) => Self::new(ErrorCode::ConfigurationError, &message),
            ServiceError::ExternalService(_) => Self::new(ErrorCode::ExternalServiceError, &message),
        }
    }
}

impl From<ValidationError> for FFIError {
    fn from(err: ValidationError) -> Self {
        let details = match &err {
            ValidationError::Required { field } => json!({ "field": field, "type": "required" }),
            ValidationError::MinLength { field, min } => json!({ "field": field, "type": "min_length", "min": min }),
            ValidationError::MaxLength { field, max } => json!({ "field": field, "type": "max_length", "max": max }),
            ValidationError::Range { field, min, max } => {
                json!({ "field": field, "type": "range", "min": min, "max": max })
            },
            ValidationError::Format { field, reason } => json!({ "field": field, "type": "format", "reason": reason }),
            ValidationError::Unique { field } => json!({ "field": field, "type": "unique" }),
            ValidationError::InvalidValue { field, reason } => {
                json!({ "field": field, "type": "invalid_value", "reason": reason })
            },
            ValidationError::Custom(msg) => json!({ "type": "custom", "message": msg }),
        };
        Self::with_details(ErrorCode::ValidationFailed, &err.to_string(), &details.to_string())
    }
}

impl From<std::ffi::NulError> for FFIError {
    fn from(_: std::ffi::NulError) -> Self {
        Self::new(ErrorCode::InvalidUtf8, "String contains null bytes, cannot create CString")
    }
}

// Result type alias for FFI functions
pub type FFIResult<T> = Result<T, FFIError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_carries_field_ids() {
        let err: FFIError = ServiceError::ValidationFailed { fields: vec!["1".to_string(), "3".to_string()] }.into();
        assert_eq!(err.code, ErrorCode::RequiredFieldsMissing);
        assert_eq!(err.message, "Please check the form for errors");
        let details: serde_json::Value = serde_json::from_str(err.details.as_deref().unwrap()).unwrap();
        assert_eq!(details["fields"], json!(["1", "3"]));
    }

    #[test]
    fn test_domain_errors_delegate() {
        let err: FFIError = ServiceError::Domain(DomainError::Validation(ValidationError::max_length("label", 50))).into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("label"));

        let err: FFIError = DomainError::DuplicateFieldId("7".to_string()).into();
        assert_eq!(err.code, ErrorCode::DuplicateFieldId);
    }

    #[test]
    fn test_server_message_surfaces() {
        let err: FFIError = ServiceError::Server { status: 409, message: "Name already used".to_string() }.into();
        assert_eq!(err.code, ErrorCode::ServerError);
        assert_eq!(err.message, "Name already used");
        assert_eq!(err.code as i32, 316);
    }
}
