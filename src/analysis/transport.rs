use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use super::wire::GenerateContentRequest;
use crate::config::AppConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

pub trait InferenceTransport: Send + Sync {
    fn send(&self, request: &GenerateContentRequest) -> TransportResult<TransportResponse>;
}

pub struct ReqwestTransport {
    client: Client,
    url: String,
    api_key: String,
}

impl ReqwestTransport {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client,
            url: generate_content_url(endpoint, model),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> TransportResult<Self> {
        let api_key = config.api_key().ok_or(TransportError::MissingApiKey)?;
        Self::new(
            config.endpoint(),
            config.model(),
            api_key,
            config.request_timeout(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl InferenceTransport for ReqwestTransport {
    fn send(&self, request: &GenerateContentRequest) -> TransportResult<TransportResponse> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(map_reqwest_error)?;
        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(error)
    }
}

fn generate_content_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        endpoint.trim_end_matches('/'),
        model
    )
}
