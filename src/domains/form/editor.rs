use crate::domains::form::registry;
use crate::domains::form::types::{FieldInstance, FieldType, FormDocument};
use crate::errors::{DomainError, DomainResult};
use crate::types::OperationStatus;
use crate::validation::{validate_field_id, ValidationBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Unloaded,
    Loading,
    Loaded,
}

/// In-memory working copy of one form and its editing state.
///
/// All mutations are synchronous and touch only this value. Every mutation
/// bumps `revision`; a save clears `dirty` only when the document has not
/// changed since the save was issued.
#[derive(Debug, Clone)]
pub struct FormEditor {
    status: DocumentStatus,
    document: Option<FormDocument>,
    /// Held as an id so list mutations can never leave it pointing at a stale value.
    selected: Option<String>,
    dirty: bool,
    revision: u64,
    error: Option<String>,
    save_status: OperationStatus,
    publish_status: OperationStatus,
}

impl Default for FormEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormEditor {
    pub fn new() -> Self {
        Self {
            status: DocumentStatus::Unloaded,
            document: None,
            selected: None,
            dirty: false,
            revision: 0,
            error: None,
            save_status: OperationStatus::Idle,
            publish_status: OperationStatus::Idle,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn document(&self) -> Option<&FormDocument> {
        self.document.as_ref()
    }

    pub fn fields(&self) -> &[FieldInstance] {
        self.document.as_ref().map(|d| d.fields.as_slice()).unwrap_or_default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected_field(&self) -> Option<&FieldInstance> {
        let id = self.selected.as_deref()?;
        self.document.as_ref()?.field(id)
    }

    // --- load lifecycle ---

    pub fn begin_load(&mut self) {
        self.status = DocumentStatus::Loading;
        self.error = None;
    }

    /// Replaces the whole document and marks it clean.
    pub fn finish_load(&mut self, document: FormDocument) {
        self.document = Some(document);
        self.status = DocumentStatus::Loaded;
        self.selected = None;
        self.dirty = false;
        self.revision += 1;
        self.error = None;
        self.save_status = OperationStatus::Idle;
        self.publish_status = OperationStatus::Idle;
    }

    /// Leaves any previous document untouched.
    pub fn fail_load(&mut self, message: String) {
        self.status = if self.document.is_some() {
            DocumentStatus::Loaded
        } else {
            DocumentStatus::Unloaded
        };
        self.error = Some(message);
    }

    pub fn unload(&mut self) {
        *self = Self::new();
    }

    // --- mutations ---

    fn document_mut(&mut self) -> DomainResult<&mut FormDocument> {
        self.document.as_mut().ok_or(DomainError::NoDocument)
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    pub fn rename(&mut self, name: &str) -> DomainResult<()> {
        let name = name.trim();
        ValidationBuilder::new("name", Some(name.to_string()))
            .required()
            .max_length(100)
            .validate()?;
        self.document_mut()?.name = name.to_string();
        self.touch();
        Ok(())
    }

    /// Inserts at `index` (clamped to the end), keeping the order of every other field.
    pub fn insert_field(&mut self, index: usize, instance: FieldInstance) -> DomainResult<()> {
        validate_field_id(&instance.id)?;
        let doc = self.document_mut()?;
        if doc.field(&instance.id).is_some() {
            return Err(DomainError::DuplicateFieldId(instance.id));
        }
        let index = index.min(doc.fields.len());
        doc.fields.insert(index, instance);
        self.touch();
        Ok(())
    }

    /// Constructs a fresh field of `field_type` with a generated id and inserts it.
    pub fn add_field(&mut self, index: usize, field_type: FieldType) -> DomainResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.insert_field(index, registry::construct(field_type, &id))?;
        Ok(id)
    }

    /// Returns whether a field was removed. An unknown id is a no-op.
    pub fn remove_field(&mut self, id: &str) -> DomainResult<bool> {
        let doc = self.document_mut()?;
        let Some(position) = doc.position(id) else {
            return Ok(false);
        };
        doc.fields.remove(position);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.touch();
        Ok(true)
    }

    /// Replaces the field in place. The stored id always stays `id`.
    pub fn update_field(&mut self, id: &str, mut instance: FieldInstance) -> DomainResult<()> {
        let doc = self.document_mut()?;
        let position = doc
            .position(id)
            .ok_or_else(|| DomainError::FieldNotFound(id.to_string()))?;
        instance.id = id.to_string();
        doc.fields[position] = instance;
        self.touch();
        Ok(())
    }

    /// Runs property changes through the field type and stores the result.
    pub fn update_properties(&mut self, id: &str, changes: &Map<String, Value>) -> DomainResult<FieldInstance> {
        let current = self
            .document
            .as_ref()
            .ok_or(DomainError::NoDocument)?
            .field(id)
            .ok_or_else(|| DomainError::FieldNotFound(id.to_string()))?;
        let updated = registry::apply_properties(current, changes)?;
        self.update_field(id, updated.clone())?;
        Ok(updated)
    }

    pub fn move_field(&mut self, id: &str, to_index: usize) -> DomainResult<()> {
        let doc = self.document_mut()?;
        let from = doc
            .position(id)
            .ok_or_else(|| DomainError::FieldNotFound(id.to_string()))?;
        let field = doc.fields.remove(from);
        let to_index = to_index.min(doc.fields.len());
        doc.fields.insert(to_index, field);
        self.touch();
        Ok(())
    }

    pub fn select_field(&mut self, id: &str) -> DomainResult<()> {
        let doc = self.document.as_ref().ok_or(DomainError::NoDocument)?;
        if doc.field(id).is_none() {
            return Err(DomainError::FieldNotFound(id.to_string()));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // --- backend outcomes ---

    pub fn set_save_status(&mut self, status: OperationStatus) {
        self.save_status = status;
    }

    pub fn set_publish_status(&mut self, status: OperationStatus) {
        self.publish_status = status;
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    /// Records a completed save issued at `revision`. Local fields stay the
    /// working copy; edits made while the save was in flight keep the document dirty.
    pub fn mark_saved(&mut self, revision: u64, saved: &FormDocument) {
        if let Some(doc) = self.document.as_mut() {
            if doc.id == saved.id {
                doc.published = saved.published;
                if !saved.share_identifier.is_empty() {
                    doc.share_identifier = saved.share_identifier.clone();
                }
            }
        }
        if self.revision == revision {
            self.dirty = false;
        }
        self.error = None;
        self.save_status = OperationStatus::Succeeded;
    }

    pub fn set_published(&mut self, published: bool) -> DomainResult<()> {
        self.document_mut()?.published = published;
        self.error = None;
        self.publish_status = OperationStatus::Succeeded;
        Ok(())
    }

    /// Applies one serialized editor command.
    pub fn apply(&mut self, command: EditorCommand) -> DomainResult<CommandOutcome> {
        match command {
            EditorCommand::Rename { name } => self.rename(&name).map(|_| CommandOutcome::Done),
            EditorCommand::InsertField { index, field } => {
                self.insert_field(index, field).map(|_| CommandOutcome::Done)
            }
            EditorCommand::AddField { index, field_type } => {
                let field_type = field_type.parse::<FieldType>()?;
                self.add_field(index, field_type).map(|id| CommandOutcome::FieldAdded { id })
            }
            EditorCommand::RemoveField { id } => {
                self.remove_field(&id).map(|removed| CommandOutcome::Removed { removed })
            }
            EditorCommand::UpdateField { id, field } => {
                self.update_field(&id, field).map(|_| CommandOutcome::Done)
            }
            EditorCommand::UpdateProperties { id, changes } => self
                .update_properties(&id, &changes)
                .map(|field| CommandOutcome::FieldUpdated { field }),
            EditorCommand::MoveField { id, to_index } => {
                self.move_field(&id, to_index).map(|_| CommandOutcome::Done)
            }
            EditorCommand::SelectField { id } => self.select_field(&id).map(|_| CommandOutcome::Done),
            EditorCommand::ClearSelection => {
                self.clear_selection();
                Ok(CommandOutcome::Done)
            }
        }
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            status: self.status,
            document: self.document.clone(),
            selected_field_id: self.selected_field().map(|f| f.id.clone()),
            dirty: self.dirty,
            revision: self.revision,
            error: self.error.clone(),
            save_status: self.save_status.as_str(),
            publish_status: self.publish_status.as_str(),
        }
    }
}

/// Synchronous edits a host can send as JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    Rename { name: String },
    InsertField { index: usize, field: FieldInstance },
    AddField { index: usize, field_type: String },
    RemoveField { id: String },
    UpdateField { id: String, field: FieldInstance },
    UpdateProperties { id: String, changes: Map<String, Value> },
    MoveField { id: String, to_index: usize },
    SelectField { id: String },
    ClearSelection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Done,
    FieldAdded { id: String },
    Removed { removed: bool },
    FieldUpdated { field: FieldInstance },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSnapshot {
    pub status: DocumentStatus,
    pub document: Option<FormDocument>,
    pub selected_field_id: Option<String>,
    pub dirty: bool,
    pub revision: u64,
    pub error: Option<String>,
    pub save_status: &'static str,
    pub publish_status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::form::types::TypeTag;
    use chrono::Utc;
    use serde_json::json;

    fn field(id: &str, field_type: FieldType) -> FieldInstance {
        FieldInstance::new(id, field_type, Map::new())
    }

    fn loaded(fields: Vec<FieldInstance>) -> FormEditor {
        let mut editor = FormEditor::new();
        editor.begin_load();
        editor.finish_load(FormDocument {
            id: "form-1".to_string(),
            name: "Contact".to_string(),
            description: None,
            fields,
            published: false,
            share_identifier: "share-1".to_string(),
            business_id: Some("biz-1".to_string()),
            created_at: Utc::now(),
            visits: 0,
            submissions: 0,
        });
        editor
    }

    fn ids(editor: &FormEditor) -> Vec<&str> {
        editor.fields().iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_insert_then_remove_ghost() {
        let mut editor = loaded(vec![field("A", FieldType::TextField), field("B", FieldType::TextField)]);
        assert!(!editor.is_dirty());

        editor.insert_field(1, field("new", FieldType::NumberField)).unwrap();
        assert_eq!(ids(&editor), vec!["A", "new", "B"]);
        assert!(editor.is_dirty());

        let revision = editor.revision();
        assert!(!editor.remove_field("ghost").unwrap());
        assert_eq!(ids(&editor), vec!["A", "new", "B"]);
        assert_eq!(editor.revision(), revision);
    }

    #[test]
    fn test_insert_clamps_and_rejects_duplicates() {
        let mut editor = loaded(vec![field("A", FieldType::TextField)]);
        editor.insert_field(99, field("Z", FieldType::DateField)).unwrap();
        assert_eq!(ids(&editor), vec!["A", "Z"]);
        assert!(matches!(
            editor.insert_field(0, field("A", FieldType::TextField)),
            Err(DomainError::DuplicateFieldId(_))
        ));
        assert!(editor.insert_field(0, field("bad id", FieldType::TextField)).is_err());
    }

    #[test]
    fn test_mutations_require_document() {
        let mut editor = FormEditor::new();
        assert!(matches!(editor.rename("X form"), Err(DomainError::NoDocument)));
        assert!(matches!(editor.remove_field("a"), Err(DomainError::NoDocument)));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_update_keeps_id_and_position() {
        let mut editor = loaded(vec![field("A", FieldType::TextField), field("B", FieldType::TextField)]);
        editor.update_field("A", field("other", FieldType::TelephoneField)).unwrap();
        assert_eq!(ids(&editor), vec!["A", "B"]);
        assert_eq!(editor.fields()[0].field_type, TypeTag::Registered(FieldType::TelephoneField));
        assert!(matches!(
            editor.update_field("ghost", field("ghost", FieldType::TextField)),
            Err(DomainError::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_selection_follows_removal() {
        let mut editor = loaded(vec![field("A", FieldType::TextField), field("B", FieldType::TextField)]);
        editor.select_field("B").unwrap();
        assert_eq!(editor.selected_field().map(|f| f.id.as_str()), Some("B"));

        editor.move_field("B", 0).unwrap();
        assert_eq!(ids(&editor), vec!["B", "A"]);
        assert_eq!(editor.selected_field().map(|f| f.id.as_str()), Some("B"));

        editor.remove_field("B").unwrap();
        assert!(editor.selected_field().is_none());
        assert!(editor.select_field("B").is_err());
    }

    #[test]
    fn test_save_during_edit_stays_dirty() {
        let mut editor = loaded(vec![field("A", FieldType::TextField)]);
        editor.rename("Contact us").unwrap();
        let issued_at = editor.revision();
        let saved = editor.document().cloned().unwrap();

        editor.insert_field(1, field("B", FieldType::TextField)).unwrap();
        editor.mark_saved(issued_at, &saved);
        assert!(editor.is_dirty());
        assert_eq!(ids(&editor), vec!["A", "B"]);

        let issued_at = editor.revision();
        editor.mark_saved(issued_at, &saved);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_failed_load_keeps_previous_document() {
        let mut editor = loaded(vec![field("A", FieldType::TextField)]);
        editor.begin_load();
        editor.fail_load("form not found".to_string());
        assert_eq!(editor.status(), DocumentStatus::Loaded);
        assert_eq!(ids(&editor), vec!["A"]);
        assert_eq!(editor.error(), Some("form not found"));

        let mut empty = FormEditor::new();
        empty.begin_load();
        empty.fail_load("form not found".to_string());
        assert_eq!(empty.status(), DocumentStatus::Unloaded);
        assert!(empty.document().is_none());
    }

    #[test]
    fn test_commands_from_json() {
        let mut editor = loaded(vec![field("A", FieldType::TextField)]);

        let add: EditorCommand =
            serde_json::from_value(json!({"command": "add_field", "index": 0, "field_type": "SpacerField"})).unwrap();
        let CommandOutcome::FieldAdded { id } = editor.apply(add).unwrap() else {
            panic!("expected FieldAdded");
        };
        assert_eq!(editor.fields()[0].id, id);

        let props: EditorCommand = serde_json::from_value(json!({
            "command": "update_properties",
            "id": "A",
            "changes": {"label": "First Name", "required": true}
        }))
        .unwrap();
        editor.apply(props).unwrap();
        assert!(editor.document().unwrap().field("A").unwrap().is_required());

        let bad: EditorCommand =
            serde_json::from_value(json!({"command": "add_field", "index": 0, "field_type": "Nope"})).unwrap();
        assert!(matches!(editor.apply(bad), Err(DomainError::UnknownFieldType(_))));
    }
}
