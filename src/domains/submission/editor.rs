use crate::domains::core::backend::FormsBackend;
use crate::domains::form::types::FormDocument;
use crate::domains::submission::reconcile;
use crate::domains::submission::types::{Submission, SubmissionContent};
use crate::errors::{DomainError, ServiceResult};
use log::info;
use serde_json::Value;

/// Operator-side edit buffer over one stored submission.
///
/// The backend replaces content wholesale, so `save` always sends the full
/// merged map: the stored content with every buffered change applied.
#[derive(Debug, Clone)]
pub struct SubmissionEditor {
    original: Submission,
    draft: SubmissionContent,
}

impl SubmissionEditor {
    pub fn new(submission: Submission) -> Self {
        let draft = submission.content.clone();
        Self { original: submission, draft }
    }

    /// Looks the submission up among the form's stored submissions.
    pub async fn fetch(backend: &dyn FormsBackend, form_id: &str, submission_id: &str) -> ServiceResult<Self> {
        let submission = backend
            .list_submissions(form_id)
            .await?
            .into_iter()
            .find(|s| s.id == submission_id)
            .ok_or_else(|| DomainError::EntityNotFound("Submission".to_string(), submission_id.to_string()))?;
        Ok(Self::new(submission))
    }

    pub fn submission(&self) -> &Submission {
        &self.original
    }

    pub fn draft(&self) -> &SubmissionContent {
        &self.draft
    }

    pub fn is_modified(&self) -> bool {
        self.draft != self.original.content
    }

    pub fn set_value(&mut self, field_id: &str, value: Value) {
        self.draft.insert(field_id.to_string(), value);
    }

    pub fn clear_value(&mut self, field_id: &str) {
        self.draft.remove(field_id);
    }

    pub fn discard(&mut self) {
        self.draft = self.original.content.clone();
    }

    /// Missing required labels for the current draft.
    pub fn missing_required(&self, form: &FormDocument) -> Vec<String> {
        reconcile::missing_required(form, &self.draft)
    }

    /// Sends the complete draft. On success the stored copy becomes the new baseline.
    pub async fn save(&mut self, backend: &dyn FormsBackend) -> ServiceResult<Submission> {
        let updated = backend.update_submission(&self.original.id, &self.draft).await?;
        info!("Updated submission {} ({} values)", updated.id, updated.content.len());
        self.draft = updated.content.clone();
        self.original = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::core::backend::mock::MockFormsBackend;
    use crate::domains::form::types::{FieldInstance, FieldType};
    use chrono::Utc;
    use serde_json::json;

    fn stored() -> Submission {
        Submission {
            id: "s1".to_string(),
            form_id: "f1".to_string(),
            content: json!({"1": "Jane", "2": "a", "old": "kept"}).as_object().cloned().unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_sends_full_merged_content() {
        let backend = MockFormsBackend::new().with_submission(stored());
        let mut editor = SubmissionEditor::new(stored());
        assert!(!editor.is_modified());

        editor.set_value("1", json!("Janet"));
        assert!(editor.is_modified());
        let saved = editor.save(&backend).await.unwrap();

        assert_eq!(saved.content.get("1"), Some(&json!("Janet")));
        assert_eq!(saved.content.get("2"), Some(&json!("a")));
        assert_eq!(saved.content.get("old"), Some(&json!("kept")));
        assert!(!editor.is_modified());
        assert_eq!(backend.calls("update_submission"), 1);
    }

    #[tokio::test]
    async fn test_fetch_unknown_submission() {
        let backend = MockFormsBackend::new().with_submission(stored());
        assert!(SubmissionEditor::fetch(&backend, "f1", "s1").await.is_ok());
        let err = SubmissionEditor::fetch(&backend, "f1", "s9").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_required_tracks_draft() {
        let form = FormDocument {
            id: "f1".to_string(),
            name: "Contact".to_string(),
            description: None,
            fields: vec![FieldInstance::new(
                "1",
                FieldType::TextField,
                json!({"label": "First Name", "required": true}).as_object().cloned().unwrap(),
            )],
            published: true,
            share_identifier: "share".to_string(),
            business_id: None,
            created_at: Utc::now(),
            visits: 0,
            submissions: 0,
        };
        let mut editor = SubmissionEditor::new(stored());
        assert!(editor.missing_required(&form).is_empty());

        editor.set_value("1", json!(""));
        assert_eq!(editor.missing_required(&form), vec!["First Name".to_string()]);

        editor.discard();
        assert!(editor.missing_required(&form).is_empty());
    }
}
