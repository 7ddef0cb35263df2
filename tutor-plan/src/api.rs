//! Progress-tracking API contract
//!
//! The planning core only depends on this trait; [`crate::client::HttpProgressApi`]
//! is the HTTP implementation and tests supply in-memory ones.

use async_trait::async_trait;
use thiserror::Error;
use tutor_common::models::{BatchCreateRequest, BatchCreateResponse};
use tutor_common::{CatalogBook, Preset, ProgressItem, StudentId};

/// Progress API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The connection could not be established; the request was not sent
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Parse error: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { code: 401 | 403, .. })
    }
}

/// Endpoints of the progress-tracking API used by the planning core
#[async_trait]
pub trait ProgressApi: Send + Sync {
    /// Full reference-book catalog
    async fn master_catalog(&self) -> Result<Vec<CatalogBook>, ApiError>;

    /// All presets
    async fn presets(&self) -> Result<Vec<Preset>, ApiError>;

    /// Create one progress row per catalog id and per custom book
    async fn batch_create_progress(
        &self,
        request: &BatchCreateRequest,
    ) -> Result<BatchCreateResponse, ApiError>;

    /// Current progress rows of a student
    async fn progress_list(&self, student_id: StudentId) -> Result<Vec<ProgressItem>, ApiError>;
}
