//! HTTP client for the progress-tracking API

pub use crate::api::ApiError;

use crate::api::ProgressApi;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tutor_common::config::ApiConfig;
use tutor_common::models::{BatchCreateRequest, BatchCreateResponse};
use tutor_common::{AuthSession, CatalogBook, Preset, ProgressItem, StudentId};

const USER_AGENT: &str = concat!("tutor-plan/", env!("CARGO_PKG_VERSION"));

/// Classify a transport-level reqwest failure
fn classify(e: reqwest::Error) -> ApiError {
    if e.is_connect() {
        ApiError::Connect(e.to_string())
    } else if e.is_timeout() {
        ApiError::Timeout(e.to_string())
    } else if e.is_decode() {
        ApiError::Decode(e.to_string())
    } else {
        ApiError::Transport(e.to_string())
    }
}

/// Progress API over HTTP with bearer authentication
pub struct HttpProgressApi {
    http_client: reqwest::Client,
    base_url: String,
    bearer: Option<String>,
}

impl HttpProgressApi {
    pub fn new(config: &ApiConfig, auth: &AuthSession) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer: auth.bearer_header(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.authorize(request).send().await.map_err(classify)?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "Progress API returned error status");
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(classify)?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET progress API");
        self.execute(self.http_client.get(&url)).await
    }
}

#[async_trait]
impl ProgressApi for HttpProgressApi {
    async fn master_catalog(&self) -> Result<Vec<CatalogBook>, ApiError> {
        let books: Vec<CatalogBook> = self.get("/dashboard/books/master").await?;
        tracing::info!(count = books.len(), "Loaded master catalog");
        Ok(books)
    }

    async fn presets(&self) -> Result<Vec<Preset>, ApiError> {
        self.get("/dashboard/presets").await
    }

    async fn batch_create_progress(
        &self,
        request: &BatchCreateRequest,
    ) -> Result<BatchCreateResponse, ApiError> {
        let url = self.url("/dashboard/progress/batch");
        tracing::debug!(url = %url, items = request.item_count(), "POST batch create");
        self.execute(self.http_client.post(&url).json(request)).await
    }

    async fn progress_list(&self, student_id: StudentId) -> Result<Vec<ProgressItem>, ApiError> {
        self.get(&format!("/dashboard/list/{}", student_id)).await
    }
}
