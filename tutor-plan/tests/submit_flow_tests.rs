//! Add-books session flow against an in-memory progress API
//!
//! Tests cover:
//! - Mixed catalog / preset / custom submission in one request
//! - Candidate set cleared on success, kept on failure
//! - Double submit rejection and stale tickets after close
//! - Degraded refresh after a successful create

use async_trait::async_trait;
use std::sync::Mutex;
use tutor_common::models::{BatchCreateRequest, BatchCreateResponse};
use tutor_common::{CatalogBook, Preset, PresetBookRef, ProgressItem, StudentId};
use tutor_plan::{
    AddBooksSession, ApiError, CustomBookForm, Finished, InvalidStateReason, PlanError,
    PresetExpansion, ProgressApi, SessionState, SubmissionOutcome,
};

#[derive(Default)]
struct MockApi {
    requests: Mutex<Vec<BatchCreateRequest>>,
    create_error: Mutex<Option<ApiError>>,
    list_error: Mutex<Option<ApiError>>,
}

impl MockApi {
    fn failing_create(error: ApiError) -> Self {
        let api = Self::default();
        *api.create_error.lock().unwrap() = Some(error);
        api
    }

    fn requests(&self) -> Vec<BatchCreateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressApi for MockApi {
    async fn master_catalog(&self) -> Result<Vec<CatalogBook>, ApiError> {
        Ok(vec![book(1, "Book A"), book(2, "Book B")])
    }

    async fn presets(&self) -> Result<Vec<Preset>, ApiError> {
        Ok(vec![starter_pack()])
    }

    async fn batch_create_progress(
        &self,
        request: &BatchCreateRequest,
    ) -> Result<BatchCreateResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(error) = self.create_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(BatchCreateResponse {
            message: format!("{} items added", request.item_count()),
        })
    }

    async fn progress_list(&self, student_id: StudentId) -> Result<Vec<ProgressItem>, ApiError> {
        if let Some(error) = self.list_error.lock().unwrap().clone() {
            return Err(error);
        }
        let requests = self.requests.lock().unwrap();
        let mut items = Vec::new();
        for request in requests.iter().filter(|r| r.student_id == student_id) {
            for id in &request.catalog_ids {
                items.push(progress(student_id, &format!("catalog {}", id)));
            }
            for custom in &request.custom_books {
                items.push(progress(student_id, &custom.name));
            }
        }
        Ok(items)
    }
}

fn book(id: i64, name: &str) -> CatalogBook {
    CatalogBook {
        id,
        subject: "Math".into(),
        level: "Basic".into(),
        name: name.into(),
        duration_hours: 10.0,
    }
}

fn progress(student_id: StudentId, name: &str) -> ProgressItem {
    ProgressItem {
        id: 0,
        student_id: Some(student_id),
        subject: "Math".into(),
        level: None,
        book_name: name.into(),
        duration: Some(10.0),
        completed_units: 0,
        total_units: 1,
        is_planned: Some(true),
        is_done: Some(false),
    }
}

fn starter_pack() -> Preset {
    Preset {
        id: 5,
        name: "Starter Pack".into(),
        subject: "Math".into(),
        books: vec![
            PresetBookRef {
                catalog_id: Some(1),
                subject: "Math".into(),
                level: "Basic".into(),
                name: "Book A".into(),
                duration_hours: 10.0,
                is_from_catalog: true,
            },
            PresetBookRef {
                catalog_id: None,
                subject: "Math".into(),
                level: "Basic".into(),
                name: "Worksheet X".into(),
                duration_hours: 2.0,
                is_from_catalog: false,
            },
        ],
    }
}

fn open_session(student_id: StudentId) -> AddBooksSession {
    let mut session = AddBooksSession::for_student(student_id);
    session.open();
    session
}

#[tokio::test]
async fn test_mixed_submission_is_one_request() {
    let api = MockApi::default();
    let mut session = open_session(42);

    session.add_from_catalog(&book(1, "Book A")).unwrap();
    session.add_from_catalog(&book(2, "Book B")).unwrap();
    session
        .add_custom(&CustomBookForm::new("Math", "", "My Notes", "5"))
        .unwrap();

    let receipt = session.submit(&api).await.unwrap();

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].student_id, 42);
    assert_eq!(requests[0].catalog_ids, vec![1, 2]);
    assert_eq!(requests[0].custom_books.len(), 1);
    assert_eq!(requests[0].custom_books[0].level, "custom");
    assert_eq!(requests[0].custom_books[0].duration_hours, 5.0);

    assert_eq!(receipt.requested, 3);
    assert_eq!(receipt.added, Some(3));
    assert_eq!(receipt.progress.as_ref().map(Vec::len), Some(3));
    assert!(session.candidates().is_empty());
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_preset_then_catalog_duplicate() {
    let api = MockApi::default();
    let mut session = open_session(7);

    let outcome = session.add_from_preset(&starter_pack()).unwrap();
    assert_eq!(outcome.added_count(), 2);

    // Book A is already present through the preset
    session.add_from_catalog(&book(1, "Book A")).unwrap();
    assert_eq!(session.candidates().len(), 2);
    assert!(matches!(
        session.add_from_preset(&starter_pack()).unwrap(),
        PresetExpansion::NothingNew { skipped: 2 }
    ));

    session.submit(&api).await.unwrap();

    let request = &api.requests()[0];
    assert_eq!(request.catalog_ids, vec![1]);
    assert_eq!(request.custom_books[0].name, "Worksheet X");
}

#[tokio::test]
async fn test_refused_connection_keeps_candidates() {
    let api = MockApi::failing_create(ApiError::Connect("connection refused".into()));
    let mut session = open_session(7);
    session.add_from_catalog(&book(1, "Book A")).unwrap();
    session.add_from_catalog(&book(2, "Book B")).unwrap();

    let err = session.submit(&api).await.unwrap_err();

    match err {
        PlanError::Submission(e) => {
            assert_eq!(e.outcome, SubmissionOutcome::NotCreated);
            assert!(e.is_safe_to_retry());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(session.candidates().len(), 2);
    assert_eq!(session.state(), SessionState::Open);
}

#[tokio::test]
async fn test_timeout_outcome_is_unknown() {
    let api = MockApi::failing_create(ApiError::Timeout("deadline elapsed".into()));
    let mut session = open_session(7);
    session.add_from_catalog(&book(1, "Book A")).unwrap();

    let err = session.submit(&api).await.unwrap_err();

    assert!(matches!(
        err,
        PlanError::Submission(ref e) if e.outcome == SubmissionOutcome::Unknown
    ));
    assert_eq!(session.candidates().len(), 1);
}

#[tokio::test]
async fn test_retry_after_failure_sends_same_items() {
    let api = MockApi::failing_create(ApiError::Status {
        code: 500,
        body: "boom".into(),
    });
    let mut session = open_session(7);
    session.add_from_catalog(&book(1, "Book A")).unwrap();

    assert!(session.submit(&api).await.is_err());
    *api.create_error.lock().unwrap() = None;
    session.submit(&api).await.unwrap();

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[tokio::test]
async fn test_empty_set_makes_no_request() {
    let api = MockApi::default();
    let mut session = open_session(7);

    let err = session.submit(&api).await.unwrap_err();

    assert!(matches!(
        err,
        PlanError::InvalidState(InvalidStateReason::EmptyCandidateSet)
    ));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_ticket_flow_with_edits_in_flight() {
    let api = MockApi::default();
    let mut session = open_session(7);
    session.add_from_catalog(&book(1, "Book A")).unwrap();

    let ticket = session.begin_submit().unwrap();
    assert!(matches!(
        session.begin_submit(),
        Err(PlanError::InvalidState(InvalidStateReason::SubmissionInFlight))
    ));

    session.add_from_catalog(&book(2, "Book B")).unwrap();
    let result = ticket.send(&api).await;
    let finished = session.finish_submit(ticket, result).unwrap();

    assert!(matches!(finished, Finished::Submitted(_)));
    assert_eq!(api.requests()[0].catalog_ids, vec![1]);
    assert!(session.candidates().is_empty());
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_mixed_set_kept_when_create_fails() {
    let api = MockApi::failing_create(ApiError::Status {
        code: 503,
        body: "database unavailable".into(),
    });
    let mut session = open_session(7);
    session.add_from_catalog(&book(1, "Book A")).unwrap();
    session.add_from_catalog(&book(2, "Book B")).unwrap();
    session
        .add_custom(&CustomBookForm::new("Math", "Basic", "My Notes", "3"))
        .unwrap();
    let before: Vec<_> = session.candidates().iter().cloned().collect();

    let err = session.submit(&api).await.unwrap_err();

    assert!(matches!(err, PlanError::Submission(_)), "got {:?}", err);
    assert_eq!(api.requests().len(), 1);
    assert_eq!(api.requests()[0].catalog_ids, vec![1, 2]);
    assert_eq!(api.requests()[0].custom_books.len(), 1);
    assert_eq!(session.candidates().len(), 3);
    assert_eq!(session.candidates().as_slice(), before.as_slice());
    assert_eq!(session.state(), SessionState::Open);
}

#[tokio::test]
async fn test_close_discards_in_flight_result() {
    let api = MockApi::default();
    let mut session = open_session(7);
    session.add_from_catalog(&book(1, "Book A")).unwrap();

    let ticket = session.begin_submit().unwrap();
    session.close();
    let result = ticket.send(&api).await;

    assert_eq!(session.finish_submit(ticket, result).unwrap(), Finished::Ignored);
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.candidates().is_empty());
}

#[tokio::test]
async fn test_failed_refresh_still_succeeds() {
    let api = MockApi::default();
    *api.list_error.lock().unwrap() = Some(ApiError::Transport("reset".into()));
    let mut session = open_session(7);
    session.add_from_catalog(&book(1, "Book A")).unwrap();

    let receipt = session.submit(&api).await.unwrap();

    assert!(receipt.progress.is_none());
    assert!(session.candidates().is_empty());
}
