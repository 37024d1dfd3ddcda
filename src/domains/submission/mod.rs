pub mod editor;
pub mod export;
pub mod flow;
pub mod reconcile;
pub mod types;

pub use editor::SubmissionEditor;
pub use flow::{FlowSnapshot, FlowState, SubmissionFlow};
pub use reconcile::{reconcile, SubmissionTable, NOT_PROVIDED};
pub use types::{Submission, SubmissionContent, SubmissionPayload, SubmissionReceipt, UploadedFile};
