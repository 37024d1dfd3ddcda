use serde::{Deserialize, Serialize};
use std::fmt;

/// How a form is addressed when loading it from the backend.
///
/// Operators load by internal id; the public submission page loads by the
/// share identifier. Both resolve through the same endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FormIdentifier {
    Id(String),
    Share(String),
}

impl FormIdentifier {
    pub fn as_str(&self) -> &str {
        match self {
            FormIdentifier::Id(id) => id,
            FormIdentifier::Share(share) => share,
        }
    }

    pub fn is_share(&self) -> bool {
        matches!(self, FormIdentifier::Share(_))
    }
}

impl fmt::Display for FormIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormIdentifier::Id(id) => write!(f, "id:{}", id),
            FormIdentifier::Share(share) => write!(f, "share:{}", share),
        }
    }
}

/// Lifecycle of an asynchronous operation as seen by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Idle,
    InProgress,
    Succeeded,
    Failed,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Idle => "idle",
            OperationStatus::InProgress => "in_progress",
            OperationStatus::Succeeded => "succeeded",
            OperationStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(OperationStatus::Idle),
            "in_progress" => Some(OperationStatus::InProgress),
            "succeeded" => Some(OperationStatus::Succeeded),
            "failed" => Some(OperationStatus::Failed),
            _ => None,
        }
    }
}
