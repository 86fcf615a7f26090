//! HTTP client for the application record service.
//!
//! Every call the wizard makes to the service goes through `ApplicationApi`,
//! so the controller can run against a fake in tests.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::{BehavioralAnswer, ResumeAttachment};

pub const NO_RESPONSE_MESSAGE: &str = "No response from server. Please check your connection.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not read resume file: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The message shown to the candidate. `None` means the caller should use
    /// its own fallback.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ClientError::Api { message, .. } => Some(message.clone()),
            ClientError::Http(e) if e.is_connect() || e.is_timeout() => {
                Some(NO_RESPONSE_MESSAGE.to_string())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResume {
    pub filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteApplication {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub resume: Option<RemoteResume>,
    #[serde(default)]
    pub behavioral_responses: Vec<BehavioralAnswer>,
    pub status: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetailsPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponsesPayload<'a> {
    application_id: Uuid,
    responses: &'a [BehavioralAnswer],
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

#[async_trait]
pub trait ApplicationApi: Send + Sync {
    async fn save_candidate_details(
        &self,
        payload: &CandidateDetailsPayload,
    ) -> Result<RemoteApplication, ClientError>;

    async fn upload_resume(
        &self,
        application_id: Uuid,
        resume: &ResumeAttachment,
    ) -> Result<RemoteApplication, ClientError>;

    async fn save_behavioral_responses(
        &self,
        application_id: Uuid,
        responses: &[BehavioralAnswer],
    ) -> Result<RemoteApplication, ClientError>;

    async fn get_application(&self, id: Uuid) -> Result<RemoteApplication, ClientError>;

    async fn list_applications(&self) -> Result<Vec<RemoteSummary>, ClientError>;
}

#[derive(Clone)]
pub struct HttpApplicationClient {
    client: Client,
    base_url: String,
}

impl HttpApplicationClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Unwraps `{success, data}` or turns the failure body into `ClientError::Api`.
async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    decode_body(status.as_u16(), status.is_success(), &body)
}

fn decode_body<T: DeserializeOwned>(
    status: u16,
    success: bool,
    body: &str,
) -> Result<T, ClientError> {
    if success {
        let envelope: DataEnvelope<T> = serde_json::from_str(body)?;
        return Ok(envelope.data);
    }

    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
    warn!("Application service returned {status}: {message}");
    Err(ClientError::Api { status, message })
}

#[async_trait]
impl ApplicationApi for HttpApplicationClient {
    async fn save_candidate_details(
        &self,
        payload: &CandidateDetailsPayload,
    ) -> Result<RemoteApplication, ClientError> {
        let response = self
            .client
            .post(self.url("/candidate-details"))
            .json(payload)
            .send()
            .await?;
        read_data(response).await
    }

    async fn upload_resume(
        &self,
        application_id: Uuid,
        resume: &ResumeAttachment,
    ) -> Result<RemoteApplication, ClientError> {
        let bytes = tokio::fs::read(&resume.path).await?;
        debug!(
            "Uploading {} ({} bytes) for application {application_id}",
            resume.file_name,
            bytes.len()
        );
        let part = Part::bytes(bytes)
            .file_name(resume.file_name.clone())
            .mime_str(&resume.mime_type)?;
        let form = Form::new()
            .part("resume", part)
            .text("applicationId", application_id.to_string());

        let response = self
            .client
            .post(self.url("/resume-upload"))
            .multipart(form)
            .send()
            .await?;
        read_data(response).await
    }

    async fn save_behavioral_responses(
        &self,
        application_id: Uuid,
        responses: &[BehavioralAnswer],
    ) -> Result<RemoteApplication, ClientError> {
        let response = self
            .client
            .post(self.url("/behavioral-responses"))
            .json(&ResponsesPayload {
                application_id,
                responses,
            })
            .send()
            .await?;
        read_data(response).await
    }

    async fn get_application(&self, id: Uuid) -> Result<RemoteApplication, ClientError> {
        let response = self.client.get(self.url(&format!("/{id}"))).send().await?;
        read_data(response).await
    }

    async fn list_applications(&self) -> Result<Vec<RemoteSummary>, ClientError> {
        let response = self.client.get(self.url("")).send().await?;
        read_data(response).await
    }
}
