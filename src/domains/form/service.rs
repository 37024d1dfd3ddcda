use crate::domains::core::backend::FormsBackend;
use crate::domains::core::busy::BusyFlag;
use crate::domains::form::editor::{CommandOutcome, EditorCommand, EditorSnapshot, FormEditor};
use crate::domains::form::types::{FormDocument, FormStats, FormSummary, NewForm, SaveFormRequest};
use crate::errors::{DomainError, ServiceError, ServiceResult};
use crate::types::{FormIdentifier, OperationStatus};
use crate::validation::Validate;
use async_trait::async_trait;
use log::{debug, error, info};
use std::sync::{Arc, Mutex, MutexGuard};

/// One designer session over a single form document.
///
/// Mutations go straight to the in-memory editor. At most one backend request
/// is in flight per document: a load, save, publish or delete issued while
/// another one is pending is rejected before any request is made.
pub struct FormSession {
    backend: Arc<dyn FormsBackend>,
    editor: Mutex<FormEditor>,
    loading: BusyFlag,
    saving: BusyFlag,
    publishing: BusyFlag,
    deleting: BusyFlag,
}

impl FormSession {
    pub fn new(backend: Arc<dyn FormsBackend>) -> Self {
        Self {
            backend,
            editor: Mutex::new(FormEditor::new()),
            loading: BusyFlag::new("load"),
            saving: BusyFlag::new("save"),
            publishing: BusyFlag::new("publish"),
            deleting: BusyFlag::new("delete"),
        }
    }

    // A panic mid-mutation leaves a consistent editor; keep using it.
    fn editor(&self) -> MutexGuard<'_, FormEditor> {
        self.editor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        self.editor().snapshot()
    }

    pub fn document(&self) -> Option<FormDocument> {
        self.editor().document().cloned()
    }

    pub fn is_dirty(&self) -> bool {
        self.editor().is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_busy()
    }

    fn ensure_idle(&self, others: [&BusyFlag; 3]) -> ServiceResult<()> {
        match others.into_iter().find(|flag| flag.is_busy()) {
            Some(flag) => Err(ServiceError::OperationInProgress(flag.operation().to_string())),
            None => Ok(()),
        }
    }

    /// Applies a synchronous edit.
    pub fn apply(&self, command: EditorCommand) -> ServiceResult<CommandOutcome> {
        Ok(self.editor().apply(command)?)
    }

    /// Fetches the form and replaces the working copy. On failure any previous
    /// document stays loaded and the error is recorded.
    pub async fn load(&self, identifier: &FormIdentifier) -> ServiceResult<FormDocument> {
        let _guard = self.loading.try_acquire()?;
        self.ensure_idle([&self.saving, &self.publishing, &self.deleting])?;
        self.editor().begin_load();

        match self.backend.fetch_form(identifier).await {
            Ok(document) => {
                info!("Loaded form {} ({} fields)", document.id, document.fields.len());
                self.editor().finish_load(document.clone());
                Ok(document)
            }
            Err(e) => {
                error!("Failed to load form {}: {}", identifier, e);
                self.editor().fail_load(e.user_message());
                Err(e)
            }
        }
    }

    /// Persists the working copy. Edits made while the request is in flight
    /// keep the document dirty.
    pub async fn save(&self) -> ServiceResult<FormDocument> {
        let _guard = self.saving.try_acquire()?;
        self.ensure_idle([&self.loading, &self.publishing, &self.deleting])?;

        let (request, revision) = {
            let mut editor = self.editor();
            let document = editor.document().ok_or(DomainError::NoDocument)?;
            let request = SaveFormRequest::from(document);
            let revision = editor.revision();
            editor.set_save_status(OperationStatus::InProgress);
            (request, revision)
        };
        debug!("Saving form {} at revision {}", request.id, revision);

        match self.backend.save_form(&request).await {
            Ok(saved) => {
                let mut editor = self.editor();
                editor.mark_saved(revision, &saved);
                info!("Saved form {} (dirty: {})", saved.id, editor.is_dirty());
                Ok(saved)
            }
            Err(e) => {
                error!("Failed to save form {}: {}", request.id, e);
                let mut editor = self.editor();
                editor.set_save_status(OperationStatus::Failed);
                editor.set_error(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn publish(&self) -> ServiceResult<bool> {
        self.set_published(true).await
    }

    pub async fn unpublish(&self) -> ServiceResult<bool> {
        self.set_published(false).await
    }

    /// Flips the publish gate. Asking for the current state is a successful no-op.
    async fn set_published(&self, published: bool) -> ServiceResult<bool> {
        let _guard = self.publishing.try_acquire()?;
        self.ensure_idle([&self.loading, &self.saving, &self.deleting])?;

        let form_id = {
            let mut editor = self.editor();
            let document = editor.document().ok_or(DomainError::NoDocument)?;
            if document.published == published {
                debug!("Form {} already has published={}", document.id, published);
                return Ok(published);
            }
            let form_id = document.id.clone();
            editor.set_publish_status(OperationStatus::InProgress);
            form_id
        };

        match self.backend.set_published(&form_id, published).await {
            Ok(now) => {
                info!("Form {} published={}", form_id, now);
                self.editor().set_published(now)?;
                Ok(now)
            }
            Err(e) => {
                error!("Failed to change publish state of form {}: {}", form_id, e);
                let mut editor = self.editor();
                editor.set_publish_status(OperationStatus::Failed);
                editor.set_error(e.user_message());
                Err(e)
            }
        }
    }

    /// Deletes the form on the backend and unloads it. Irreversible.
    pub async fn delete(&self) -> ServiceResult<String> {
        let _guard = self.deleting.try_acquire()?;
        self.ensure_idle([&self.loading, &self.saving, &self.publishing])?;

        let form_id = self
            .editor()
            .document()
            .map(|d| d.id.clone())
            .ok_or(DomainError::NoDocument)?;

        match self.backend.delete_form(&form_id).await {
            Ok(()) => {
                info!("Deleted form {}", form_id);
                self.editor().unload();
                Ok(form_id)
            }
            Err(e) => {
                error!("Failed to delete form {}: {}", form_id, e);
                self.editor().set_error(e.user_message());
                Err(e)
            }
        }
    }
}

/// Listing, creation and deletion of a business's forms.
#[async_trait]
pub trait FormCatalogService: Send + Sync {
    async fn refresh(&self, business_id: Option<&str>) -> ServiceResult<Vec<FormSummary>>;
    async fn create_form(&self, new_form: NewForm) -> ServiceResult<FormDocument>;
    async fn delete_form(&self, form_id: &str) -> ServiceResult<()>;
    fn forms(&self) -> Vec<FormSummary>;
    fn stats(&self) -> FormStats;
}

pub struct FormCatalogServiceImpl {
    backend: Arc<dyn FormsBackend>,
    forms: Mutex<Vec<FormSummary>>,
    deleting: BusyFlag,
}

impl FormCatalogServiceImpl {
    pub fn new(backend: Arc<dyn FormsBackend>) -> Self {
        Self {
            backend,
            forms: Mutex::new(Vec::new()),
            deleting: BusyFlag::new("delete"),
        }
    }

    fn forms_guard(&self) -> MutexGuard<'_, Vec<FormSummary>> {
        self.forms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FormCatalogService for FormCatalogServiceImpl {
    async fn refresh(&self, business_id: Option<&str>) -> ServiceResult<Vec<FormSummary>> {
        let forms = self.backend.list_forms(business_id).await?;
        debug!("Fetched {} forms", forms.len());
        *self.forms_guard() = forms.clone();
        Ok(forms)
    }

    async fn create_form(&self, new_form: NewForm) -> ServiceResult<FormDocument> {
        new_form.validate()?;
        let created = self.backend.create_form(&new_form).await?;
        info!("Created form {} ({})", created.id, created.name);
        self.forms_guard().push(created.summary());
        Ok(created)
    }

    async fn delete_form(&self, form_id: &str) -> ServiceResult<()> {
        let _guard = self.deleting.try_acquire()?;
        self.backend.delete_form(form_id).await?;
        info!("Deleted form {}", form_id);
        self.forms_guard().retain(|f| f.id != form_id);
        Ok(())
    }

    fn forms(&self) -> Vec<FormSummary> {
        self.forms_guard().clone()
    }

    fn stats(&self) -> FormStats {
        FormStats::from_summaries(self.forms_guard().iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::core::backend::mock::MockFormsBackend;
    use crate::domains::form::editor::DocumentStatus;
    use crate::domains::form::types::{FieldInstance, FieldType};
    use chrono::Utc;
    use serde_json::{json, Map};

    fn form(id: &str, fields: Vec<FieldInstance>) -> FormDocument {
        FormDocument {
            id: id.to_string(),
            name: "Contact".to_string(),
            description: None,
            fields,
            published: false,
            share_identifier: format!("share-{}", id),
            business_id: Some("biz-1".to_string()),
            created_at: Utc::now(),
            visits: 10,
            submissions: 4,
        }
    }

    fn text(id: &str) -> FieldInstance {
        FieldInstance::new(id, FieldType::TextField, json!({"label": id}).as_object().cloned().unwrap())
    }

    async fn loaded_session(backend: Arc<MockFormsBackend>) -> FormSession {
        let session = FormSession::new(backend);
        session.load(&FormIdentifier::Id("f1".to_string())).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_load_save_round_trip_preserves_order() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a"), text("b")])));
        let session = loaded_session(backend.clone()).await;

        session
            .apply(EditorCommand::InsertField {
                index: 1,
                field: FieldInstance::new("n", FieldType::NumberField, Map::new()),
            })
            .unwrap();
        session.apply(EditorCommand::MoveField { id: "a".to_string(), to_index: 2 }).unwrap();
        let before = session.document().unwrap().fields;
        assert!(session.is_dirty());

        session.save().await.unwrap();
        assert!(!session.is_dirty());
        assert_eq!(session.snapshot().save_status, "succeeded");

        let reloaded = FormSession::new(backend.clone());
        let doc = reloaded.load(&FormIdentifier::Share("share-f1".to_string())).await.unwrap();
        assert_eq!(doc.fields, before);
        assert_eq!(backend.calls("save_form"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_save_issues_one_request() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a")])));
        let session = loaded_session(backend.clone()).await;
        session.apply(EditorCommand::Rename { name: "Renamed".to_string() }).unwrap();

        let gate = backend.gate("save_form");
        let (first, second, _) = tokio::join!(session.save(), session.save(), async {
            gate.notify_one();
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(ServiceError::OperationInProgress(ref op)) if op == "save"));
        assert_eq!(backend.calls("save_form"), 1);
        assert!(!session.is_saving());
    }

    #[tokio::test]
    async fn test_edit_during_save_keeps_dirty() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a")])));
        let session = loaded_session(backend.clone()).await;
        session.apply(EditorCommand::Rename { name: "Renamed".to_string() }).unwrap();

        let gate = backend.gate("save_form");
        let (saved, _) = tokio::join!(session.save(), async {
            session
                .apply(EditorCommand::InsertField { index: 1, field: text("late") })
                .unwrap();
            gate.notify_one();
        });

        assert!(saved.is_ok());
        assert!(session.is_dirty());
        assert_eq!(session.document().unwrap().fields.len(), 2);
    }

    #[tokio::test]
    async fn test_load_rejected_while_save_pending() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a")])));
        let session = loaded_session(backend.clone()).await;
        session.apply(EditorCommand::InsertField { index: 1, field: text("b") }).unwrap();

        let gate = backend.gate("save_form");
        let (saved, loaded) = tokio::join!(session.save(), async {
            let loaded = session.load(&FormIdentifier::Id("f1".to_string())).await;
            gate.notify_one();
            loaded
        });

        assert!(saved.is_ok());
        assert!(matches!(loaded, Err(ServiceError::OperationInProgress(ref op)) if op == "save"));
        assert_eq!(backend.calls("fetch_form"), 1);
        assert!(!session.is_dirty());
        assert_eq!(session.document().unwrap().fields.len(), 2);
        assert_eq!(backend.stored_form("f1").unwrap().fields.len(), 2);
    }

    #[tokio::test]
    async fn test_save_and_publish_rejected_while_delete_pending() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a")])));
        let session = loaded_session(backend.clone()).await;
        session.apply(EditorCommand::Rename { name: "Renamed".to_string() }).unwrap();

        let gate = backend.gate("delete_form");
        let (deleted, (saved, published)) = tokio::join!(session.delete(), async {
            let saved = session.save().await;
            let published = session.publish().await;
            gate.notify_one();
            (saved, published)
        });

        assert_eq!(deleted.unwrap(), "f1");
        assert!(matches!(saved, Err(ServiceError::OperationInProgress(ref op)) if op == "delete"));
        assert!(matches!(published, Err(ServiceError::OperationInProgress(ref op)) if op == "delete"));
        assert_eq!(backend.calls("save_form"), 0);
        assert_eq!(backend.calls("set_published"), 0);
    }

    #[tokio::test]
    async fn test_failed_save_stays_dirty() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a")])));
        let session = loaded_session(backend.clone()).await;
        session.apply(EditorCommand::RemoveField { id: "a".to_string() }).unwrap();

        backend.fail_next(ServiceError::Server { status: 500, message: "Database unavailable".to_string() });
        assert!(session.save().await.is_err());

        let snapshot = session.snapshot();
        assert!(snapshot.dirty);
        assert_eq!(snapshot.save_status, "failed");
        assert_eq!(snapshot.error.as_deref(), Some("Database unavailable"));
    }

    #[tokio::test]
    async fn test_publish_is_idempotent() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a")])));
        let session = loaded_session(backend.clone()).await;

        assert!(session.publish().await.unwrap());
        assert!(session.publish().await.unwrap());
        assert!(session.document().unwrap().published);
        assert_eq!(backend.calls("set_published"), 1);

        assert!(!session.unpublish().await.unwrap());
        assert!(!session.document().unwrap().published);
        assert_eq!(backend.calls("set_published"), 2);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_document() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a")])));
        let session = loaded_session(backend.clone()).await;

        let err = session.load(&FormIdentifier::Id("missing".to_string())).await.unwrap_err();
        assert!(err.is_not_found());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, DocumentStatus::Loaded);
        assert_eq!(snapshot.document.map(|d| d.id), Some("f1".to_string()));
        assert_eq!(snapshot.error.as_deref(), Some("form not found"));
        assert_eq!(backend.calls("fetch_form"), 2);
    }

    #[tokio::test]
    async fn test_delete_unloads() {
        let backend = Arc::new(MockFormsBackend::new().with_form(form("f1", vec![text("a")])));
        let session = loaded_session(backend.clone()).await;

        assert_eq!(session.delete().await.unwrap(), "f1");
        assert!(session.document().is_none());
        assert!(backend.stored_form("f1").is_none());
        assert!(matches!(session.save().await, Err(ServiceError::Domain(DomainError::NoDocument))));
    }

    #[tokio::test]
    async fn test_catalog_create_delete_and_stats() {
        let backend = Arc::new(
            MockFormsBackend::new()
                .with_form(form("f1", vec![]))
                .with_form(form("f2", vec![])),
        );
        let catalog = FormCatalogServiceImpl::new(backend.clone());

        assert_eq!(catalog.refresh(Some("biz-1")).await.unwrap().len(), 2);
        let stats = catalog.stats();
        assert_eq!(stats.visits, 20);
        assert!((stats.submission_rate - 40.0).abs() < 1e-9);

        let created = catalog
            .create_form(NewForm {
                name: "Feedback".to_string(),
                description: None,
                business_id: Some("biz-1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(catalog.forms().len(), 3);

        catalog.delete_form(&created.id).await.unwrap();
        catalog.delete_form("f1").await.unwrap();
        let ids: Vec<String> = catalog.forms().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["f2".to_string()]);

        let invalid = NewForm { name: "ab".to_string(), description: None, business_id: None };
        assert!(catalog.create_form(invalid).await.is_err());
        assert_eq!(backend.calls("create_form"), 1);
    }
}
