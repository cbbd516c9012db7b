//! Backend contract and its HTTP implementation.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::QueryMode,
    error::OperationError,
    protocol::{IngestResponse, QueryRequest, QueryResponse, API_KEY_HEADER, INGEST_FILE_FIELD},
};

use crate::{batch::UploadFile, config::ClientConfig};

pub type BackendResult<T> = std::result::Result<T, OperationError>;

/// Request/response contract of the document question-answering service.
#[async_trait]
pub trait QaBackend: Send + Sync {
    async fn ingest(&self, files: &[UploadFile]) -> BackendResult<IngestResponse>;
    async fn query(&self, question: &str, mode: QueryMode) -> BackendResult<QueryResponse>;
    async fn run_evaluation(&self) -> BackendResult<serde_json::Value>;
}

pub struct HttpBackend {
    http: Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| anyhow::anyhow!("API key is not a valid header value: {e}"))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl QaBackend for HttpBackend {
    async fn ingest(&self, files: &[UploadFile]) -> BackendResult<IngestResponse> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.contents.clone())
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| OperationError::Transport(format!("invalid mime type: {e}")))?;
            form = form.part(INGEST_FILE_FIELD, part);
        }

        let response = self
            .http
            .post(self.config.endpoint("/ingest"))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn query(&self, question: &str, mode: QueryMode) -> BackendResult<QueryResponse> {
        let mut request = self.http.post(self.config.endpoint("/query"));
        if let Some(flag) = mode.query_flag() {
            request = request.query(&[("mode", flag)]);
        }
        let response = request
            .json(&QueryRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn run_evaluation(&self) -> BackendResult<serde_json::Value> {
        let response = self
            .http
            .post(self.config.endpoint("/eval/run"))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(OperationError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
        });
    }
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|e| OperationError::MalformedResponse(e.to_string()))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> OperationError {
    if let Some(status) = err.status() {
        return OperationError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
        };
    }
    if err.is_decode() {
        return OperationError::MalformedResponse(err.to_string());
    }
    OperationError::Transport(err.to_string())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
