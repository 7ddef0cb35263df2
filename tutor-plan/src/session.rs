//! Add-books session state machine
//!
//! ```text
//! Idle --open--> Open --begin_submit--> Submitting --finish(ok)--> Idle
//!                 ^                                 |
//!                 +----------- finish(err) ---------+
//! ```
//!
//! Submission is split in three steps so the candidate set stays editable
//! while the request is in flight:
//! 1. [`AddBooksSession::begin_submit`] moves to `Submitting` and returns a
//!    [`SubmitTicket`] holding the request
//! 2. [`SubmitTicket::send`] awaits the API without borrowing the session
//! 3. [`AddBooksSession::finish_submit`] applies the result
//!
//! A second `begin_submit` while `Submitting` is refused. A successful finish
//! clears the whole set, including anything added while the request was in
//! flight. Closing the session invalidates outstanding tickets; their results
//! are ignored on finish.

use crate::api::ProgressApi;
use crate::candidates::{Candidate, CandidateSet, CandidateSnapshot, CatalogAdd, TempId};
use crate::catalog::BookFilter;
use crate::custom_entry::CustomBookForm;
use crate::error::{InvalidStateReason, PlanError};
use crate::preset::PresetExpansion;
use crate::submitter::{partition, BatchSubmitter, SubmitReceipt};
use tracing::{debug, info};
use tutor_common::models::{BatchCreateRequest, StudentAssignment};
use tutor_common::{AuthSession, CatalogBook, Preset, StudentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Open,
    Submitting,
}

/// An in-flight submission
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    epoch: u64,
    id: u64,
    request: BatchCreateRequest,
}

impl SubmitTicket {
    pub fn request(&self) -> &BatchCreateRequest {
        &self.request
    }

    /// Perform the batch-create call for this ticket
    pub async fn send<A: ProgressApi + ?Sized>(&self, api: &A) -> Result<SubmitReceipt, PlanError> {
        BatchSubmitter::new(api).send(&self.request).await
    }
}

/// How a finished ticket was applied
#[derive(Debug, Clone, PartialEq)]
pub enum Finished {
    Submitted(SubmitReceipt),
    /// The ticket belonged to a session that has since been closed
    Ignored,
}

/// One "add reference books" session for one student
#[derive(Debug)]
pub struct AddBooksSession {
    student_id: StudentId,
    state: SessionState,
    candidates: CandidateSet,
    epoch: u64,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl AddBooksSession {
    /// Idle session for the student the auth session may act on
    pub fn new(
        auth: &AuthSession,
        requested: Option<StudentId>,
        assignments: &[StudentAssignment],
    ) -> Result<Self, PlanError> {
        let student_id = auth.session.authorize_student(requested, assignments)?;
        Ok(Self::for_student(student_id))
    }

    pub fn for_student(student_id: StudentId) -> Self {
        Self {
            student_id,
            state: SessionState::Idle,
            candidates: CandidateSet::new(),
            epoch: 0,
            in_flight: None,
            next_ticket: 0,
        }
    }

    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn snapshot(&self) -> CandidateSnapshot {
        self.candidates.snapshot()
    }

    /// Start with an empty candidate set; reopening an open session is a no-op
    pub fn open(&mut self) {
        if self.state == SessionState::Idle {
            self.candidates.clear();
            self.state = SessionState::Open;
            debug!(student_id = self.student_id, "Add-books session opened");
        }
    }

    /// Abandon the session, discarding candidates and any in-flight ticket
    pub fn close(&mut self) {
        if self.in_flight.is_some() {
            debug!(student_id = self.student_id, "Closing with a submission in flight");
        }
        self.candidates.clear();
        self.state = SessionState::Idle;
        self.in_flight = None;
        self.epoch += 1;
    }

    fn ensure_editable(&self) -> Result<(), PlanError> {
        match self.state {
            SessionState::Idle => Err(InvalidStateReason::SessionClosed.into()),
            SessionState::Open | SessionState::Submitting => Ok(()),
        }
    }

    pub fn add_from_catalog(&mut self, book: &CatalogBook) -> Result<CatalogAdd, PlanError> {
        self.ensure_editable()?;
        Ok(self.candidates.add_from_catalog(book))
    }

    pub fn add_from_preset(&mut self, preset: &Preset) -> Result<PresetExpansion, PlanError> {
        self.ensure_editable()?;
        Ok(self.candidates.add_from_preset(preset))
    }

    pub fn add_custom(&mut self, form: &CustomBookForm) -> Result<TempId, PlanError> {
        self.ensure_editable()?;
        Ok(self.candidates.add_custom(form)?)
    }

    pub fn remove(&mut self, temp_id: TempId) -> Result<Option<Candidate>, PlanError> {
        self.ensure_editable()?;
        Ok(self.candidates.remove(temp_id))
    }

    pub fn filter(&self, predicate: &BookFilter) -> Vec<&Candidate> {
        self.candidates.filter(predicate)
    }

    /// Enter `Submitting` and capture the request to send
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, PlanError> {
        match self.state {
            SessionState::Idle => return Err(InvalidStateReason::SessionClosed.into()),
            SessionState::Submitting => return Err(InvalidStateReason::SubmissionInFlight.into()),
            SessionState::Open => {}
        }
        if self.candidates.is_empty() {
            return Err(InvalidStateReason::EmptyCandidateSet.into());
        }

        self.next_ticket += 1;
        let ticket = SubmitTicket {
            epoch: self.epoch,
            id: self.next_ticket,
            request: partition(self.candidates.as_slice(), self.student_id),
        };
        self.in_flight = Some(ticket.id);
        self.state = SessionState::Submitting;
        Ok(ticket)
    }

    /// Apply a ticket's result
    ///
    /// Success clears the set unconditionally and returns to `Idle`. Failure
    /// keeps every candidate, returns to `Open` and hands back the error.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<SubmitReceipt, PlanError>,
    ) -> Result<Finished, PlanError> {
        if ticket.epoch != self.epoch || self.in_flight != Some(ticket.id) {
            debug!(student_id = self.student_id, ticket = ticket.id, "Ignoring result of stale ticket");
            return Ok(Finished::Ignored);
        }
        self.in_flight = None;

        match result {
            Ok(receipt) => {
                let cleared = self.candidates.len();
                self.candidates.clear();
                self.state = SessionState::Idle;
                info!(
                    student_id = self.student_id,
                    requested = receipt.requested,
                    cleared,
                    "Add-books submission complete"
                );
                Ok(Finished::Submitted(receipt))
            }
            Err(error) => {
                self.state = SessionState::Open;
                Err(error)
            }
        }
    }

    /// Begin, send and finish in one call
    pub async fn submit<A: ProgressApi + ?Sized>(&mut self, api: &A) -> Result<SubmitReceipt, PlanError> {
        let ticket = self.begin_submit()?;
        let result = ticket.send(api).await;
        match self.finish_submit(ticket, result)? {
            Finished::Submitted(receipt) => Ok(receipt),
            Finished::Ignored => Err(InvalidStateReason::SessionClosed.into()),
        }
    }
}
