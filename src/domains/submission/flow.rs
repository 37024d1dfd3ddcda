use crate::domains::core::backend::FormsBackend;
use crate::domains::core::busy::BusyFlag;
use crate::domains::form::fields::file_upload;
use crate::domains::form::registry;
use crate::domains::form::types::{FieldInstance, FieldType, FormDocument};
use crate::domains::form::view::{FieldView, RuntimeInput};
use crate::domains::submission::types::{FileGroup, SubmissionPayload, SubmissionReceipt, UploadedFile};
use crate::errors::{DomainError, ServiceError, ServiceResult, ValidationError};
use crate::types::FormIdentifier;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Editing,
    Validating,
    Submitting,
    /// Terminal until `reset`.
    Submitted,
}

#[derive(Debug)]
struct FlowInner {
    state: FlowState,
    values: HashMap<String, String>,
    files: HashMap<String, Vec<UploadedFile>>,
    invalid: BTreeSet<String>,
    error: Option<String>,
    receipt: Option<SubmissionReceipt>,
}

impl FlowInner {
    fn new() -> Self {
        Self {
            state: FlowState::Editing,
            values: HashMap::new(),
            files: HashMap::new(),
            invalid: BTreeSet::new(),
            error: None,
            receipt: None,
        }
    }

    fn file_names(&self, field_id: &str) -> Vec<String> {
        self.files
            .get(field_id)
            .map(|files| files.iter().map(|f| f.file_name.clone()).collect())
            .unwrap_or_default()
    }

    /// The string a field validates against: its value, or its comma-joined file names.
    fn validation_value(&self, field: &FieldInstance) -> String {
        if field.field_type.registered() == Some(FieldType::FileUploadField) {
            return self.file_names(&field.id).join(",");
        }
        self.values.get(&field.id).cloned().unwrap_or_default()
    }

    fn ensure_editable(&self) -> ServiceResult<()> {
        match self.state {
            FlowState::Editing => Ok(()),
            FlowState::Submitted => Err(ServiceError::AlreadySubmitted),
            FlowState::Validating | FlowState::Submitting => {
                Err(ServiceError::OperationInProgress("submit".to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub form_id: String,
    pub state: FlowState,
    pub values: HashMap<String, String>,
    pub files: HashMap<String, Vec<String>>,
    pub invalid_fields: Vec<String>,
    pub error: Option<String>,
    pub receipt: Option<SubmissionReceipt>,
}

/// Public submission of one published form.
///
/// Values and files are buffered per field id and only leave the process in
/// the single multipart request `submit` issues.
pub struct SubmissionFlow {
    backend: Arc<dyn FormsBackend>,
    form: FormDocument,
    submitter_id: Option<String>,
    inner: Mutex<FlowInner>,
    submitting: BusyFlag,
}

impl SubmissionFlow {
    pub fn new(backend: Arc<dyn FormsBackend>, form: FormDocument, submitter_id: Option<String>) -> Self {
        Self {
            backend,
            form,
            submitter_id,
            inner: Mutex::new(FlowInner::new()),
            submitting: BusyFlag::new("submit"),
        }
    }

    /// Fetches the form (usually by share identifier) and starts a flow over it.
    pub async fn open(
        backend: Arc<dyn FormsBackend>,
        identifier: &FormIdentifier,
        submitter_id: Option<String>,
    ) -> ServiceResult<Self> {
        let form = backend.fetch_form(identifier).await?;
        if !form.published {
            warn!("Opened unpublished form {}; submit will be refused", form.id);
        }
        Ok(Self::new(backend, form, submitter_id))
    }

    pub fn form(&self) -> &FormDocument {
        &self.form
    }

    fn inner(&self) -> MutexGuard<'_, FlowInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn input_field(&self, field_id: &str) -> ServiceResult<&FieldInstance> {
        self.form
            .field(field_id)
            .filter(|f| f.is_input())
            .ok_or_else(|| DomainError::FieldNotFound(field_id.to_string()).into())
    }

    pub fn state(&self) -> FlowState {
        self.inner().state
    }

    /// Buffers a value. A field flagged by the last submit is re-checked immediately.
    pub fn set_value(&self, field_id: &str, value: &str) -> ServiceResult<()> {
        let field = self.input_field(field_id)?;
        let mut inner = self.inner();
        inner.ensure_editable()?;
        inner.values.insert(field_id.to_string(), value.to_string());
        if inner.invalid.contains(field_id) && registry::validate(field, value) {
            inner.invalid.remove(field_id);
        }
        Ok(())
    }

    /// Attaches a file to an upload field, enforcing its accepted types and size limit.
    /// A single-file field keeps only the latest file.
    pub fn add_file(&self, field_id: &str, file: UploadedFile) -> ServiceResult<()> {
        let field = self.input_field(field_id)?;
        if field.field_type.registered() != Some(FieldType::FileUploadField) {
            return Err(DomainError::from(ValidationError::invalid_value(field_id, "field does not accept files")).into());
        }
        let limits = file_upload::constraints(field);
        limits.check(&file.file_name, file.size())?;

        let mut inner = self.inner();
        inner.ensure_editable()?;
        debug!("Attached {} ({} bytes) to field {}", file.file_name, file.size(), field_id);
        let files = inner.files.entry(field_id.to_string()).or_default();
        if !limits.multiple {
            files.clear();
        }
        files.push(file);
        inner.invalid.remove(field_id);
        Ok(())
    }

    pub fn remove_file(&self, field_id: &str, file_name: &str) -> ServiceResult<bool> {
        let mut inner = self.inner();
        inner.ensure_editable()?;
        let Some(files) = inner.files.get_mut(field_id) else {
            return Ok(false);
        };
        let before = files.len();
        files.retain(|f| f.file_name != file_name);
        Ok(files.len() != before)
    }

    /// Runtime views for every field, in schema order.
    pub fn field_views(&self) -> Vec<FieldView> {
        let inner = self.inner();
        self.form
            .fields
            .iter()
            .map(|field| {
                let file_names = inner.file_names(&field.id);
                let input = RuntimeInput {
                    value: inner.values.get(&field.id).map(String::as_str),
                    file_names: &file_names,
                    invalid: inner.invalid.contains(&field.id),
                };
                registry::form_view(field, &input)
            })
            .collect()
    }

    fn invalid_fields(&self, inner: &FlowInner) -> BTreeSet<String> {
        self.form
            .input_fields()
            .filter(|field| !registry::validate(field, &inner.validation_value(field)))
            .map(|field| field.id.clone())
            .collect()
    }

    fn build_payload(&self, inner: &FlowInner) -> SubmissionPayload {
        let mut content = Map::new();
        let mut files = Vec::new();
        for field in self.form.input_fields() {
            if field.field_type.registered() == Some(FieldType::FileUploadField) {
                if let Some(attached) = inner.files.get(&field.id).filter(|f| !f.is_empty()) {
                    files.push(FileGroup {
                        field_id: field.id.clone(),
                        multiple: file_upload::constraints(field).multiple,
                        files: attached.clone(),
                    });
                }
            } else if let Some(value) = inner.values.get(&field.id).filter(|v| !v.is_empty()) {
                content.insert(field.id.clone(), Value::String(value.clone()));
            }
        }
        SubmissionPayload {
            content,
            files,
            submitter_id: self.submitter_id.clone(),
            business_id: self.form.business_id.clone(),
        }
    }

    /// Validates every field and, when all pass, sends one multipart request.
    /// A second call while one is in flight is rejected without a request.
    pub async fn submit(&self) -> ServiceResult<SubmissionReceipt> {
        let _guard = self.submitting.try_acquire()?;

        let payload = {
            let mut inner = self.inner();
            match inner.state {
                FlowState::Submitted => return Err(ServiceError::AlreadySubmitted),
                FlowState::Validating | FlowState::Submitting => {
                    return Err(ServiceError::OperationInProgress("submit".to_string()))
                }
                FlowState::Editing => {}
            }
            if !self.form.published {
                inner.error = Some("This form is not accepting submissions".to_string());
                return Err(ServiceError::NotPublished(self.form.id.clone()));
            }

            inner.state = FlowState::Validating;
            let invalid = self.invalid_fields(&inner);
            if !invalid.is_empty() {
                debug!("Submit blocked, {} invalid field(s)", invalid.len());
                let err = ServiceError::ValidationFailed { fields: invalid.iter().cloned().collect() };
                inner.invalid = invalid;
                inner.error = Some(err.user_message());
                inner.state = FlowState::Editing;
                return Err(err);
            }

            inner.invalid.clear();
            inner.error = None;
            inner.state = FlowState::Submitting;
            self.build_payload(&inner)
        };

        match self.backend.submit(&self.form.id, payload).await {
            Ok(receipt) => {
                info!("Submitted form {} as submission {}", self.form.id, receipt.id);
                let mut inner = self.inner();
                inner.values.clear();
                inner.files.clear();
                inner.state = FlowState::Submitted;
                inner.receipt = Some(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                error!("Failed to submit form {}: {}", self.form.id, e);
                let mut inner = self.inner();
                inner.state = FlowState::Editing;
                inner.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Returns to an empty editing state.
    pub fn reset(&self) -> ServiceResult<()> {
        if self.submitting.is_busy() {
            return Err(ServiceError::OperationInProgress("submit".to_string()));
        }
        *self.inner() = FlowInner::new();
        Ok(())
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        let inner = self.inner();
        FlowSnapshot {
            form_id: self.form.id.clone(),
            state: inner.state,
            values: inner.values.clone(),
            files: inner
                .files
                .keys()
                .map(|id| (id.clone(), inner.file_names(id)))
                .collect(),
            invalid_fields: inner.invalid.iter().cloned().collect(),
            error: inner.error.clone(),
            receipt: inner.receipt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::core::backend::mock::MockFormsBackend;
    use crate::domains::form::types::TypeTag;
    use chrono::Utc;
    use serde_json::json;

    fn field(id: &str, field_type: FieldType, attrs: Value) -> FieldInstance {
        FieldInstance::new(id, TypeTag::Registered(field_type), attrs.as_object().cloned().unwrap_or_default())
    }

    fn form(published: bool) -> FormDocument {
        FormDocument {
            id: "f1".to_string(),
            name: "Application".to_string(),
            description: None,
            fields: vec![
                field("title", FieldType::TitleField, json!({"title": "Apply"})),
                field("name", FieldType::TextField, json!({"label": "Name", "required": true})),
                field(
                    "team",
                    FieldType::SelectField,
                    json!({"label": "Team", "required": true, "options": [{"label": "Ops", "value": "ops"}]}),
                ),
                field("cv", FieldType::FileUploadField, json!({"label": "CV", "accept": ["pdf"], "maxSizeMb": 1})),
                field(
                    "photos",
                    FieldType::FileUploadField,
                    json!({"label": "Photos", "multiple": true}),
                ),
            ],
            published,
            share_identifier: "apply".to_string(),
            business_id: Some("biz-1".to_string()),
            created_at: Utc::now(),
            visits: 0,
            submissions: 0,
        }
    }

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile { file_name: name.to_string(), mime_type: None, bytes: b"%PDF-1.4".to_vec() }
    }

    fn flow(backend: Arc<MockFormsBackend>, published: bool) -> SubmissionFlow {
        SubmissionFlow::new(backend, form(published), Some("user-7".to_string()))
    }

    #[tokio::test]
    async fn test_invalid_submit_marks_fields_and_sends_nothing() {
        let backend = Arc::new(MockFormsBackend::new());
        let flow = flow(backend.clone(), true);
        flow.set_value("team", "sales").unwrap();

        match flow.submit().await {
            Err(ServiceError::ValidationFailed { fields }) => {
                assert_eq!(fields, vec!["name".to_string(), "team".to_string()]);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(flow.state(), FlowState::Editing);
        assert_eq!(backend.calls("submit"), 0);
        let views = flow.field_views();
        assert!(views.iter().find(|v| v.field_id == "name").unwrap().invalid);

        flow.set_value("name", "Jane").unwrap();
        assert_eq!(flow.snapshot().invalid_fields, vec!["team".to_string()]);
    }

    #[tokio::test]
    async fn test_successful_submit_builds_one_payload() {
        let backend = Arc::new(MockFormsBackend::new());
        let flow = flow(backend.clone(), true);
        flow.set_value("name", "Jane").unwrap();
        flow.set_value("team", "ops").unwrap();
        flow.add_file("cv", pdf("old.pdf")).unwrap();
        flow.add_file("cv", pdf("cv.pdf")).unwrap();
        flow.add_file("photos", pdf("a.png")).unwrap();
        flow.add_file("photos", pdf("b.png")).unwrap();

        let receipt = flow.submit().await.unwrap();
        assert_eq!(receipt.form_id.as_deref(), Some("f1"));
        assert_eq!(backend.calls("submit"), 1);

        let payload = &backend.payloads()[0];
        assert_eq!(payload.content, json!({"name": "Jane", "team": "ops"}).as_object().cloned().unwrap());
        let parts: Vec<(String, String)> = payload
            .file_parts()
            .into_iter()
            .map(|(name, file)| (name, file.file_name.clone()))
            .collect();
        assert_eq!(
            parts,
            vec![
                ("cv".to_string(), "cv.pdf".to_string()),
                ("photos[0]".to_string(), "a.png".to_string()),
                ("photos[1]".to_string(), "b.png".to_string()),
            ]
        );
        assert_eq!(payload.submitter_id.as_deref(), Some("user-7"));
        assert_eq!(payload.business_id.as_deref(), Some("biz-1"));

        let snapshot = flow.snapshot();
        assert_eq!(snapshot.state, FlowState::Submitted);
        assert!(snapshot.values.is_empty());
        assert!(snapshot.files.is_empty());

        assert!(matches!(flow.set_value("name", "Again"), Err(ServiceError::AlreadySubmitted)));
        assert!(matches!(flow.submit().await, Err(ServiceError::AlreadySubmitted)));

        flow.reset().unwrap();
        assert_eq!(flow.state(), FlowState::Editing);
        flow.set_value("name", "Again").unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_rejected() {
        let backend = Arc::new(MockFormsBackend::new());
        let flow = flow(backend.clone(), true);
        flow.set_value("name", "Jane").unwrap();
        flow.set_value("team", "ops").unwrap();

        let gate = backend.gate("submit");
        let (first, second, _) = tokio::join!(flow.submit(), flow.submit(), async {
            gate.notify_one();
        });
        assert!(first.is_ok());
        assert!(matches!(second, Err(ServiceError::OperationInProgress(_))));
        assert_eq!(backend.calls("submit"), 1);
    }

    #[tokio::test]
    async fn test_unpublished_form_refuses_submit() {
        let backend = Arc::new(MockFormsBackend::new());
        let flow = flow(backend.clone(), false);
        flow.set_value("name", "Jane").unwrap();
        assert!(matches!(flow.submit().await, Err(ServiceError::NotPublished(_))));
        assert_eq!(backend.calls("submit"), 0);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_buffers() {
        let backend = Arc::new(MockFormsBackend::new());
        let flow = flow(backend.clone(), true);
        flow.set_value("name", "Jane").unwrap();
        flow.set_value("team", "ops").unwrap();

        backend.fail_next(ServiceError::Network("connection reset".to_string()));
        assert!(flow.submit().await.is_err());
        let snapshot = flow.snapshot();
        assert_eq!(snapshot.state, FlowState::Editing);
        assert_eq!(snapshot.values.get("name").map(String::as_str), Some("Jane"));
        assert!(snapshot.error.is_some());
    }

    #[test]
    fn test_file_constraints_and_field_checks() {
        let flow = flow(Arc::new(MockFormsBackend::new()), true);
        assert!(flow.add_file("cv", pdf("notes.txt")).is_err());
        let big = UploadedFile { file_name: "big.pdf".to_string(), mime_type: None, bytes: vec![0; 2 * 1024 * 1024] };
        assert!(flow.add_file("cv", big).is_err());
        assert!(flow.add_file("name", pdf("cv.pdf")).is_err());
        assert!(matches!(
            flow.set_value("title", "x"),
            Err(ServiceError::Domain(DomainError::FieldNotFound(_)))
        ));
        assert!(!flow.remove_file("cv", "cv.pdf").unwrap());
    }
}
