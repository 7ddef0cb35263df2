//! Batch submission of candidates
//!
//! Candidates are partitioned into catalog ids and custom books and sent in
//! exactly one batch-create request. After a successful create the student's
//! progress list is fetched again; the API owns the stored totals and
//! defaults, so nothing is merged locally.

use crate::api::ProgressApi;
use crate::candidates::Candidate;
use crate::error::{InvalidStateReason, PlanError, SubmissionError};
use tracing::{info, warn};
use tutor_common::models::BatchCreateRequest;
use tutor_common::{ProgressItem, StudentId};

/// Split candidates into the batch request, keeping relative order
pub fn partition(candidates: &[Candidate], student_id: StudentId) -> BatchCreateRequest {
    let mut catalog_ids = Vec::new();
    let mut custom_books = Vec::new();

    for candidate in candidates {
        match candidate.catalog_id {
            Some(id) if !candidate.is_custom => catalog_ids.push(id),
            _ => custom_books.push(candidate.to_custom_book()),
        }
    }

    BatchCreateRequest {
        student_id,
        catalog_ids,
        custom_books,
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub student_id: StudentId,
    /// Rows requested
    pub requested: usize,
    /// Rows the API reports as created, when its message says so
    pub added: Option<usize>,
    pub message: String,
    /// Refreshed progress list; `None` when the refresh failed
    pub progress: Option<Vec<ProgressItem>>,
}

/// Sends candidate batches to the progress API
pub struct BatchSubmitter<'a, A: ProgressApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: ProgressApi + ?Sized> BatchSubmitter<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Partition and submit; an empty slice is refused without a request
    pub async fn submit(
        &self,
        candidates: &[Candidate],
        student_id: StudentId,
    ) -> Result<SubmitReceipt, PlanError> {
        if candidates.is_empty() {
            return Err(InvalidStateReason::EmptyCandidateSet.into());
        }
        self.send(&partition(candidates, student_id)).await
    }

    /// Issue one batch-create call, then refresh the progress list
    pub async fn send(&self, request: &BatchCreateRequest) -> Result<SubmitReceipt, PlanError> {
        if request.item_count() == 0 {
            return Err(InvalidStateReason::EmptyCandidateSet.into());
        }

        info!(
            student_id = request.student_id,
            catalog = request.catalog_ids.len(),
            custom = request.custom_books.len(),
            "Submitting reference-book batch"
        );

        let response = self
            .api
            .batch_create_progress(request)
            .await
            .map_err(|e| {
                let error = SubmissionError::from(e);
                warn!(
                    student_id = request.student_id,
                    outcome = %error.outcome,
                    error = %error.source,
                    "Batch submission failed"
                );
                error
            })?;

        info!(
            student_id = request.student_id,
            message = %response.message,
            "Batch submission accepted"
        );

        let progress = match self.api.progress_list(request.student_id).await {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(
                    student_id = request.student_id,
                    error = %e,
                    "Batch created but progress refresh failed"
                );
                None
            }
        };

        Ok(SubmitReceipt {
            student_id: request.student_id,
            requested: request.item_count(),
            added: response.added_count(),
            message: response.message,
            progress,
        })
    }
}
