use std::fmt;
use serde::Serialize;
use thiserror::Error;

/// Domain-level errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum DomainError {
    #[error("Entity not found: {0} with ID {1}")]
    EntityNotFound(String, String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported field type: {0}")]
    UnknownFieldType(String),

    #[error("A field with ID {0} already exists in this form")]
    DuplicateFieldId(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("No form is loaded")]
    NoDocument,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Service-level errors (operations that talk to the forms backend)
#[derive(Debug, Error, Clone, Serialize)]
pub enum ServiceError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("{0} is already in progress")]
    OperationInProgress(String),

    #[error("Please fill in all required fields ({} invalid)", .fields.len())]
    ValidationFailed {
        fields: Vec<String>,
    },

    #[error("Form {0} is not published")]
    NotPublished(String),

    #[error("Form has already been submitted")]
    AlreadySubmitted,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned error {status}: {message}")]
    Server {
        status: u16,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl ServiceError {
    /// Text suitable for a user-facing toast.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Domain(DomainError::EntityNotFound(entity, _)) => {
                format!("{} not found", entity.to_lowercase())
            }
            ServiceError::Domain(DomainError::Validation(err)) => err.to_string(),
            ServiceError::Domain(err) => err.to_string(),
            ServiceError::OperationInProgress(op) => {
                format!("Please wait, {} is still in progress", op)
            }
            ServiceError::ValidationFailed { .. } => "Please check the form for errors".to_string(),
            ServiceError::NotPublished(_) => "This form is not accepting submissions".to_string(),
            ServiceError::AlreadySubmitted => "This form has already been submitted".to_string(),
            ServiceError::Network(_) => "Could not reach the server, please try again".to_string(),
            ServiceError::Server { message, .. } => message.clone(),
            ServiceError::Configuration(msg) => msg.clone(),
            ServiceError::ExternalService(msg) => msg.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::EntityNotFound(..)))
    }
}

/// Validation errors
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required {
        field: String,
    },

    #[error("Field '{field}' must be at least {min} characters")]
    MinLength {
        field: String,
        min: usize,
    },

    #[error("Field '{field}' cannot exceed {max} characters")]
    MaxLength {
        field: String,
        max: usize,
    },

    #[error("Field '{field}' must be between {min} and {max}")]
    Range {
        field: String,
        min: String,
        max: String,
    },

    #[error("Field '{field}' contains invalid format: {reason}")]
    Format {
        field: String,
        reason: String,
    },

    #[error("Field '{field}' must be unique")]
    Unique {
        field: String,
    },

    #[error("Field '{field}' contains an invalid value: {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    Custom(String),
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self::Required {
            field: field.to_string(),
        }
    }

    pub fn min_length(field: &str, min: usize) -> Self {
        Self::MinLength {
            field: field.to_string(),
            min,
        }
    }

    pub fn max_length(field: &str, max: usize) -> Self {
        Self::MaxLength {
            field: field.to_string(),
            max,
        }
    }

    pub fn range<T: fmt::Display>(field: &str, min: T, max: T) -> Self {
        Self::Range {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub fn format(field: &str, reason: &str) -> Self {
        Self::Format {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unique(field: &str) -> Self {
        Self::Unique {
            field: field.to_string(),
        }
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn custom(message: &str) -> Self {
        Self::Custom(message.to_string())
    }
}
