//! Error types for reference-book planning
//!
//! Three recoverable failure families reach the caller:
//! - [`ValidationError`]: a required custom-book field was empty
//! - [`InvalidStateReason`]: an operation was invoked in the wrong session state
//! - [`SubmissionError`]: the batch-create call failed; the candidates are kept

use crate::api::ApiError;
use std::fmt;
use thiserror::Error;

/// Result type for planning operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Planning error type
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid state: {0}")]
    InvalidState(InvalidStateReason),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Session, configuration or input error from tutor-common
    #[error("Common error: {0}")]
    Common(#[from] tutor_common::Error),
}

impl From<InvalidStateReason> for PlanError {
    fn from(reason: InvalidStateReason) -> Self {
        PlanError::InvalidState(reason)
    }
}

/// Required field of the custom-book form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Subject,
    Name,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormField::Subject => f.write_str("subject"),
            FormField::Name => f.write_str("name"),
        }
    }
}

/// A required custom-book field was empty after trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Validation error: {field} is required")]
pub struct ValidationError {
    pub field: FormField,
}

/// Why an operation was refused by the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidStateReason {
    #[error("nothing to submit, the candidate set is empty")]
    EmptyCandidateSet,

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("no add-books session is open")]
    SessionClosed,
}

/// Whether a failed submission may have created rows anyway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The request was refused or never reached the API; nothing was created
    NotCreated,
    /// The request may have been committed before the failure was observed
    Unknown,
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionOutcome::NotCreated => f.write_str("nothing was created"),
            SubmissionOutcome::Unknown => f.write_str("creation state unknown"),
        }
    }
}

/// The batch-create call failed
#[derive(Debug, Clone, Error)]
#[error("Submission failed ({outcome}): {source}")]
pub struct SubmissionError {
    #[source]
    pub source: ApiError,
    pub outcome: SubmissionOutcome,
}

impl SubmissionError {
    /// A retry cannot duplicate rows when nothing was created
    pub fn is_safe_to_retry(&self) -> bool {
        self.outcome == SubmissionOutcome::NotCreated
    }
}

impl From<ApiError> for SubmissionError {
    fn from(source: ApiError) -> Self {
        // The API commits the whole batch in one transaction, so an error
        // status means nothing was written. Failures after the request left
        // the client cannot tell.
        let outcome = match source {
            ApiError::Connect(_) | ApiError::Status { .. } => SubmissionOutcome::NotCreated,
            ApiError::Timeout(_) | ApiError::Decode(_) | ApiError::Transport(_) => {
                SubmissionOutcome::Unknown
            }
        };
        Self { source, outcome }
    }
}

impl From<ApiError> for PlanError {
    fn from(error: ApiError) -> Self {
        PlanError::Submission(error.into())
    }
}
