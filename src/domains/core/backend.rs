use crate::config::BackendConfig;
use crate::domains::form::types::{FormDocument, FormSummary, NewForm, SaveFormRequest};
use crate::domains::submission::types::{Submission, SubmissionContent, SubmissionPayload, SubmissionReceipt};
use crate::errors::{DomainError, ServiceError, ServiceResult};
use crate::types::FormIdentifier;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The forms backend as the core sees it. Each method issues exactly one request.
#[async_trait]
pub trait FormsBackend: Send + Sync {
    /// Resolves a form by internal id or share identifier.
    async fn fetch_form(&self, identifier: &FormIdentifier) -> ServiceResult<FormDocument>;

    async fn save_form(&self, request: &SaveFormRequest) -> ServiceResult<FormDocument>;

    /// Returns the backend's `published` flag after the change.
    async fn set_published(&self, form_id: &str, published: bool) -> ServiceResult<bool>;

    async fn delete_form(&self, form_id: &str) -> ServiceResult<()>;

    async fn list_forms(&self, business_id: Option<&str>) -> ServiceResult<Vec<FormSummary>>;

    async fn create_form(&self, form: &NewForm) -> ServiceResult<FormDocument>;

    async fn submit(&self, form_id: &str, payload: SubmissionPayload) -> ServiceResult<SubmissionReceipt>;

    async fn list_submissions(&self, form_id: &str) -> ServiceResult<Vec<Submission>>;

    /// Replaces the whole content map server-side.
    async fn update_submission(&self, submission_id: &str, content: &SubmissionContent) -> ServiceResult<Submission>;
}

/// `FormsBackend` over HTTP.
pub struct ApiFormsBackend {
    client: Client,
    base_url: String,
    session_token: Option<String>,
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
struct PublishResponse {
    published: bool,
}

#[derive(Serialize)]
struct UpdateSubmissionRequest<'a> {
    content: &'a SubmissionContent,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiFormsBackend {
    pub fn new(config: &BackendConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ServiceError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_token: config.session_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.session_token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> ServiceResult<Response> {
        self.authorized(builder).send().await.map_err(|e| {
            error!("Failed to {}: {}", action, e);
            ServiceError::Network(format!("Failed to {}: {}", action, e))
        })
    }

    /// Parses a 2xx body, or converts the failure. `missing` names the entity a 404 refers to.
    async fn read_json<T: DeserializeOwned>(
        response: Response,
        action: &str,
        missing: Option<(&str, &str)>,
    ) -> ServiceResult<T> {
        let response = Self::check(response, action, missing).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::ExternalService(format!("Failed to parse {} response: {}", action, e)))
    }

    async fn check(response: Response, action: &str, missing: Option<(&str, &str)>) -> ServiceResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some((entity, id)) = missing {
                return Err(DomainError::EntityNotFound(entity.to_string(), id.to_string()).into());
            }
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(status, &text);
        error!("Failed to {}: server returned {}: {}", action, status.as_u16(), message);
        Err(ServiceError::Server { status: status.as_u16(), message })
    }
}

/// Prefers the backend's `message` or `error` field, then the raw body, then the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string())
}

fn file_part(file_name: &str, mime_type: Option<&str>, bytes: Vec<u8>) -> ServiceResult<Part> {
    let mime = match mime_type {
        Some(m) => m.to_string(),
        None => infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string()),
    };
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(&mime)
        .map_err(|e| ServiceError::Domain(DomainError::Internal(format!("Invalid MIME type for upload: {}", e))))
}

#[async_trait]
impl FormsBackend for ApiFormsBackend {
    async fn fetch_form(&self, identifier: &FormIdentifier) -> ServiceResult<FormDocument> {
        debug!("Fetching form {}", identifier);
        let url = self.url(&format!("/forms/{}", urlencoding::encode(identifier.as_str())));
        let response = self.send(self.client.get(&url), "fetch form").await?;
        Self::read_json(response, "fetch form", Some(("Form", identifier.as_str()))).await
    }

    async fn save_form(&self, request: &SaveFormRequest) -> ServiceResult<FormDocument> {
        debug!("Saving form {} with {} fields", request.id, request.fields.len());
        let response = self
            .send(self.client.post(self.url("/forms/save")).json(request), "save form")
            .await?;
        Self::read_json(response, "save form", Some(("Form", request.id.as_str()))).await
    }

    async fn set_published(&self, form_id: &str, published: bool) -> ServiceResult<bool> {
        let path = if published { "/forms/publish" } else { "/forms/unpublish" };
        debug!("POST {} for form {}", path, form_id);
        let response = self
            .send(self.client.post(self.url(path)).json(&PublishRequest { id: form_id }), "publish form")
            .await?;
        let body: PublishResponse = Self::read_json(response, "publish form", Some(("Form", form_id))).await?;
        Ok(body.published)
    }

    async fn delete_form(&self, form_id: &str) -> ServiceResult<()> {
        debug!("Deleting form {}", form_id);
        let url = self.url(&format!("/forms/{}", urlencoding::encode(form_id)));
        let response = self.send(self.client.delete(&url), "delete form").await?;
        Self::check(response, "delete form", Some(("Form", form_id))).await?;
        Ok(())
    }

    async fn list_forms(&self, business_id: Option<&str>) -> ServiceResult<Vec<FormSummary>> {
        let mut request = self.client.get(self.url("/forms"));
        if let Some(business_id) = business_id {
            request = request.query(&[("businessId", business_id)]);
        }
        let response = self.send(request, "list forms").await?;
        Self::read_json(response, "list forms", None).await
    }

    async fn create_form(&self, form: &NewForm) -> ServiceResult<FormDocument> {
        debug!("Creating form '{}'", form.name);
        let response = self.send(self.client.post(self.url("/forms")).json(form), "create form").await?;
        Self::read_json(response, "create form", None).await
    }

    async fn submit(&self, form_id: &str, payload: SubmissionPayload) -> ServiceResult<SubmissionReceipt> {
        let parts = payload.file_parts();
        debug!("Submitting form {} with {} file part(s)", form_id, parts.len());

        let content = Part::text(payload.content_json())
            .mime_str("application/json")
            .map_err(|e| ServiceError::Domain(DomainError::Internal(format!("Invalid content part: {}", e))))?;
        let mut form = Form::new().part("content", content);
        for (name, file) in parts {
            form = form.part(name, file_part(&file.file_name, file.mime_type.as_deref(), file.bytes.clone())?);
        }
        if let Some(submitter_id) = &payload.submitter_id {
            form = form.text("submitterId", submitter_id.clone());
        }
        if let Some(business_id) = &payload.business_id {
            form = form.text("businessId", business_id.clone());
        }

        let url = self.url(&format!("/forms/{}/submit", urlencoding::encode(form_id)));
        let response = self.send(self.client.post(&url).multipart(form), "submit form").await?;
        Self::read_json(response, "submit form", Some(("Form", form_id))).await
    }

    async fn list_submissions(&self, form_id: &str) -> ServiceResult<Vec<Submission>> {
        let url = self.url(&format!("/forms/{}/submissions", urlencoding::encode(form_id)));
        let response = self.send(self.client.get(&url), "list submissions").await?;
        Self::read_json(response, "list submissions", Some(("Form", form_id))).await
    }

    async fn update_submission(&self, submission_id: &str, content: &SubmissionContent) -> ServiceResult<Submission> {
        debug!("Replacing content of submission {} ({} keys)", submission_id, content.len());
        let url = self.url(&format!("/submissions/{}", urlencoding::encode(submission_id)));
        let response = self
            .send(self.client.put(&url).json(&UpdateSubmissionRequest { content }), "update submission")
            .await?;
        Self::read_json(response, "update submission", Some(("Submission", submission_id))).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_sources() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message":"Form name taken"}"#),
            "Form name taken"
        );
        assert_eq!(error_message(StatusCode::FORBIDDEN, r#"{"error":"Not allowed"}"#), "Not allowed");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_message(StatusCode::INTERNAL_SERVER_ERROR, ""), "Internal Server Error");
    }

    #[test]
    fn test_client_trims_base_url() {
        let backend = ApiFormsBackend::new(&BackendConfig::new("https://forms.example.com/api/")).unwrap();
        assert_eq!(backend.url("/forms/save"), "https://forms.example.com/api/forms/save");
    }
}
