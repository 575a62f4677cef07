use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::state::{PendingUpload, ServerStatus, UploadReceipt};

/// The three operations the external document service offers.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn status(&self) -> Result<ServerStatus, ServiceError>;
    async fn upload(&self, file: &PendingUpload) -> Result<UploadReceipt, ServiceError>;
    async fn ask(&self, question: &str) -> Result<String, ServiceError>;
}

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    #[serde(default)]
    status: String,
    vector_store_loaded: bool,
    api_keys: ApiKeys,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeys {
    openai: bool,
    #[serde(default)]
    embedding_provider: String,
}

impl From<StatusResponse> for ServerStatus {
    fn from(resp: StatusResponse) -> Self {
        Self {
            status: resp.status,
            ready: resp.vector_store_loaded,
            provider_connected: resp.api_keys.openai,
            embedding_provider: resp.api_keys.embedding_provider,
        }
    }
}

/// [`DocumentService`] over HTTP with JSON payloads
#[derive(Clone)]
pub struct HttpDocumentService {
    client: Client,
    base_url: String,
}

impl HttpDocumentService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Turn a non-success response into `Rejected`, preferring the service's
/// `{ error }` text over the bare status line.
async fn rejection(response: Response) -> ServiceError {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => match status.canonical_reason() {
            Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
            None => format!("HTTP {}", status.as_u16()),
        },
    };
    warn!(status = status.as_u16(), %message, "document service rejected request");
    ServiceError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn status(&self) -> Result<ServerStatus, ServiceError> {
        let url = self.url("status");
        debug!(%url, "checking service status");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let status: StatusResponse = response.json().await?;
        Ok(status.into())
    }

    async fn upload(&self, file: &PendingUpload) -> Result<UploadReceipt, ServiceError> {
        let url = self.url("upload");
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ServiceError::FileRead {
                path: file.path.clone(),
                source,
            })?;
        debug!(%url, file = %file.file_name, size = bytes.len(), "uploading document");

        let part = Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str("application/pdf")?;
        let form = Form::new().part("pdf", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let receipt: UploadReceipt = response.json().await?;
        Ok(receipt)
    }

    async fn ask(&self, question: &str) -> Result<String, ServiceError> {
        let url = self.url("ask");
        debug!(%url, chars = question.chars().count(), "asking question");

        let response = self
            .client
            .post(&url)
            .json(&AskRequest { question })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let answer: AskResponse = response.json().await?;
        Ok(answer.answer)
    }
}
