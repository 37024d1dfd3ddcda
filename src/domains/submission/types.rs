use crate::domains::core::json::lenient_object;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Submitted values keyed by field id. Keys outside the current schema are kept but not rendered.
pub type SubmissionContent = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    #[serde(default)]
    pub form_id: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub content: SubmissionContent,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A file attached to an upload field before submit.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    /// Sniffed from the bytes when absent.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// All files collected for one upload field.
#[derive(Debug, Clone, PartialEq)]
pub struct FileGroup {
    pub field_id: String,
    pub multiple: bool,
    pub files: Vec<UploadedFile>,
}

/// Everything one submit sends in its single multipart request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmissionPayload {
    pub content: SubmissionContent,
    pub files: Vec<FileGroup>,
    pub submitter_id: Option<String>,
    pub business_id: Option<String>,
}

impl SubmissionPayload {
    /// Multipart part names: the field id for a single-file field, `id[i]` for multi-file fields.
    pub fn file_parts(&self) -> Vec<(String, &UploadedFile)> {
        let mut parts = Vec::new();
        for group in &self.files {
            if group.multiple {
                for (i, file) in group.files.iter().enumerate() {
                    parts.push((format!("{}[{}]", group.field_id, i), file));
                }
            } else if let Some(file) = group.files.first() {
                parts.push((group.field_id.clone(), file));
            }
        }
        parts
    }

    pub fn content_json(&self) -> String {
        Value::Object(self.content.clone()).to_string()
    }
}

/// What the backend returns for a created submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: String,
    #[serde(default)]
    pub form_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(name: &str) -> UploadedFile {
        UploadedFile { file_name: name.to_string(), mime_type: None, bytes: vec![1, 2, 3] }
    }

    #[test]
    fn test_file_part_names() {
        let payload = SubmissionPayload {
            files: vec![
                FileGroup { field_id: "cv".to_string(), multiple: false, files: vec![file("cv.pdf")] },
                FileGroup {
                    field_id: "photos".to_string(),
                    multiple: true,
                    files: vec![file("a.png"), file("b.png")],
                },
            ],
            ..Default::default()
        };
        let names: Vec<String> = payload.file_parts().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["cv", "photos[0]", "photos[1]"]);
    }

    #[test]
    fn test_submission_accepts_string_content() {
        let submission: Submission = serde_json::from_value(json!({
            "id": "s1",
            "formId": "f1",
            "content": "{\"1\":\"Jane\"}",
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(submission.content.get("1"), Some(&json!("Jane")));
    }
}
