//! # Tutor Plan
//!
//! Reference-book planning for a student's learning plan:
//! - [`catalog`]: lookup and stable filtering over the master catalog
//! - [`preset`]: expansion of curated presets into candidates
//! - [`candidates`]: the deduplicated working set of books pending submission
//! - [`custom_entry`]: validation of free-form book entries
//! - [`submitter`]: partitioning and the single batch-create call
//! - [`session`]: the add-books session state machine
//! - [`api`] / [`client`]: the progress-tracking API contract and its HTTP client
//! - [`progress`], [`calendar`]: dashboard aggregation and the admission calendar grid

pub mod api;
pub mod calendar;
pub mod candidates;
pub mod catalog;
pub mod client;
pub mod custom_entry;
pub mod error;
pub mod preset;
pub mod progress;
pub mod session;
pub mod submitter;

pub use api::{ApiError, ProgressApi};
pub use candidates::{Candidate, CandidateOrigin, CandidateSet, CandidateSnapshot, CatalogAdd, TempId};
pub use catalog::{BookFilter, CatalogIndex, Classified};
pub use client::HttpProgressApi;
pub use custom_entry::{CustomBookDraft, CustomBookForm, CUSTOM_LEVEL};
pub use error::{
    FormField, InvalidStateReason, PlanError, Result, SubmissionError, SubmissionOutcome,
    ValidationError,
};
pub use preset::{ExpansionKey, PresetExpansion};
pub use session::{AddBooksSession, Finished, SessionState, SubmitTicket};
pub use submitter::{partition, BatchSubmitter, SubmitReceipt};
