pub mod editor;
pub mod fields;
pub mod registry;
pub mod service;
pub mod types;
pub mod view;

pub use editor::{CommandOutcome, DocumentStatus, EditorCommand, EditorSnapshot, FormEditor};
pub use registry::{FieldLookup, FieldTypeEntry, ToolboxItem};
pub use service::{FormCatalogService, FormCatalogServiceImpl, FormSession};
pub use types::{FieldInstance, FieldType, FormDocument, FormStats, FormSummary, NewForm, TypeTag};
