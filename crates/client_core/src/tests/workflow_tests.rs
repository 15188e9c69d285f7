use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use super::*;
use async_trait::async_trait;
use shared::protocol::{
    HealthStatus, ModelInfo, PredictionAnalysis, PredictionMetadata, PredictionSummary, RiskLevel,
};
use storage::{MemorySessionStore, ASSESSMENT_KEY, PREDICTION_KEY};

use crate::{error::PredictionErrorKind, form::REQUIRED_MESSAGE};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Recorded {
    Saved(&'static str),
    Navigated(Route),
}

type Log = Arc<Mutex<Vec<Recorded>>>;

enum Reply {
    Ok(PredictionResponse),
    Err(PredictionError),
    Hang,
}

struct ScriptedService {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedService {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionService for ScriptedService {
    async fn predict(&self, _form: &FormState) -> Result<PredictionResponse, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .expect("unexpected predict call");
        match reply {
            Reply::Ok(response) => Ok(response),
            Reply::Err(err) => Err(err),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, PredictionError> {
        Err(PredictionError::network("not scripted"))
    }

    async fn model_info(&self) -> Result<ModelInfo, PredictionError> {
        Err(PredictionError::network("not scripted"))
    }
}

struct RecordingStore {
    inner: MemorySessionStore,
    log: Log,
    fail_writes: bool,
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn put(&self, key: &'static str, value: String) -> storage::Result<()> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("quota exceeded".into()));
        }
        self.log.lock().expect("log lock").push(Recorded::Saved(key));
        self.inner.put(key, value).await
    }

    async fn get(&self, key: &'static str) -> storage::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn remove(&self, key: &'static str) -> storage::Result<()> {
        self.inner.remove(key).await
    }
}

struct RecordingNavigator {
    log: Log,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.log
            .lock()
            .expect("log lock")
            .push(Recorded::Navigated(route));
    }
}

fn sample_prediction() -> PredictionResponse {
    PredictionResponse {
        prediction: PredictionSummary {
            has_ckd: false,
            probability: 0.12,
            risk_level: RiskLevel::Low,
            ckd_stage: "Stage 1".into(),
        },
        analysis: PredictionAnalysis {
            key_factors: Vec::new(),
            recommendations: Vec::new(),
        },
        metadata: PredictionMetadata {
            model_version: "v1".into(),
            timestamp: "2025-01-01T00:00:00Z".into(),
            features_used: vec!["GFR".into()],
        },
    }
}

struct Harness {
    controller: WorkflowController,
    service: Arc<ScriptedService>,
    store: Arc<RecordingStore>,
    log: Log,
}

fn harness(replies: Vec<Reply>, fail_writes: bool) -> Harness {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let service = ScriptedService::new(replies);
    let store = Arc::new(RecordingStore {
        inner: MemorySessionStore::new(),
        log: log.clone(),
        fail_writes,
    });
    let navigator = Arc::new(RecordingNavigator { log: log.clone() });
    let controller = WorkflowController::new(
        service.clone(),
        store.clone(),
        navigator,
        ValidationMode::Lenient,
    );
    Harness {
        controller,
        service,
        store,
        log,
    }
}

fn fill(controller: &mut WorkflowController) {
    for (key, value) in [
        (FieldKey::SerumCreatinine, "1.2"),
        (FieldKey::Gfr, "85"),
        (FieldKey::Itching, "2"),
        (FieldKey::FastingBloodSugar, "95"),
        (FieldKey::BunLevels, "15"),
        (FieldKey::ProteinInUrine, "0.1"),
        (FieldKey::MuscleCramps, "1"),
    ] {
        controller.set_field(key, value);
    }
}

fn expect_failure(outcome: SubmitOutcome) -> WorkflowError {
    match outcome {
        SubmitOutcome::Failed(err) => err,
        other => panic!("expected failure, got {other:?}"),
    }
}

fn recorded(log: &Log) -> Vec<Recorded> {
    log.lock().expect("log lock").clone()
}

#[tokio::test]
async fn invalid_form_never_reaches_the_service() {
    let mut h = harness(Vec::new(), false);
    h.controller.set_field(FieldKey::Gfr, "85");

    let outcome = h.controller.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Invalid));
    assert_eq!(h.controller.state(), WorkflowState::Idle);
    assert_eq!(h.controller.form().errors().len(), 6);
    assert_eq!(
        h.controller.form().error(FieldKey::Itching),
        Some(REQUIRED_MESSAGE)
    );
    assert_eq!(h.service.calls(), 0);
    assert!(recorded(&h.log).is_empty());
}

#[tokio::test]
async fn success_persists_form_then_prediction_then_navigates_once() {
    let mut h = harness(vec![Reply::Ok(sample_prediction())], false);
    fill(&mut h.controller);

    let outcome = h.controller.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Submitted));
    assert_eq!(h.controller.state(), WorkflowState::Success);
    assert!(!h.controller.is_busy());
    assert_eq!(
        recorded(&h.log),
        vec![
            Recorded::Saved(ASSESSMENT_KEY),
            Recorded::Saved(PREDICTION_KEY),
            Recorded::Navigated(Route::Results),
        ]
    );
    assert_eq!(
        h.store.load_assessment().await.expect("load"),
        Some(h.controller.form().values().clone())
    );
    assert_eq!(
        h.store.load_prediction().await.expect("load"),
        Some(sample_prediction())
    );
}

#[tokio::test]
async fn service_failure_surfaces_message_and_persists_nothing() {
    let mut h = harness(
        vec![Reply::Err(PredictionError::http(422, "invalid GFR"))],
        false,
    );
    fill(&mut h.controller);

    let outcome = h.controller.submit().await;

    let err = expect_failure(outcome);
    assert_eq!(err.prediction_kind(), Some(PredictionErrorKind::Http));
    assert_eq!(h.controller.state(), WorkflowState::Failed);
    assert!(!h.controller.is_busy());
    assert_eq!(h.controller.form().submission_error(), Some("invalid GFR"));
    assert!(recorded(&h.log).is_empty());
    assert_eq!(h.store.load_prediction().await.expect("load"), None);
}

#[tokio::test]
async fn resubmission_after_failure_succeeds_without_residual_error() {
    let mut h = harness(
        vec![
            Reply::Err(PredictionError::http(422, "invalid GFR")),
            Reply::Ok(sample_prediction()),
        ],
        false,
    );
    fill(&mut h.controller);
    h.controller.set_field(FieldKey::Gfr, "abc");
    h.controller.submit().await;
    assert_eq!(h.controller.state(), WorkflowState::Failed);

    h.controller.set_field(FieldKey::Gfr, "85");
    assert_eq!(h.controller.state(), WorkflowState::Idle);
    assert_eq!(h.controller.form().submission_error(), None);

    let outcome = h.controller.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Submitted));
    assert_eq!(h.controller.state(), WorkflowState::Success);
    assert_eq!(h.controller.form().submission_error(), None);
    assert_eq!(h.service.calls(), 2);
    assert_eq!(
        recorded(&h.log)
            .iter()
            .filter(|entry| matches!(entry, Recorded::Navigated(_)))
            .count(),
        1
    );
}

#[tokio::test]
async fn unchanged_resubmission_clears_previous_error_before_retrying() {
    let mut h = harness(
        vec![
            Reply::Err(PredictionError::network("network request failed: refused")),
            Reply::Ok(sample_prediction()),
        ],
        false,
    );
    fill(&mut h.controller);
    h.controller.submit().await;
    assert!(h.controller.form().submission_error().is_some());

    let outcome = h.controller.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Submitted));
    assert_eq!(h.controller.form().submission_error(), None);
}

#[tokio::test]
async fn storage_failure_ends_in_failed_state_without_navigation() {
    let mut h = harness(vec![Reply::Ok(sample_prediction())], true);
    fill(&mut h.controller);

    let outcome = h.controller.submit().await;

    let err = expect_failure(outcome);
    assert!(matches!(err, WorkflowError::Storage(_)));
    assert_eq!(err.prediction_kind(), None);
    assert_eq!(h.controller.state(), WorkflowState::Failed);
    assert!(h
        .controller
        .form()
        .submission_error()
        .is_some_and(|message| message.starts_with("failed to save assessment results")));
    assert!(recorded(&h.log).is_empty());
}

#[tokio::test]
async fn cancelling_an_in_flight_submission_fails_with_cancelled_kind() {
    let mut h = harness(vec![Reply::Hang], false);
    fill(&mut h.controller);
    let (handle, signal) = cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let outcome = h.controller.submit_with_cancel(signal).await;

    let err = expect_failure(outcome);
    assert_eq!(err.prediction_kind(), Some(PredictionErrorKind::Cancelled));
    assert_eq!(h.controller.state(), WorkflowState::Failed);
    assert!(recorded(&h.log).is_empty());
}

#[tokio::test]
async fn dropped_cancel_handle_does_not_abort_submission() {
    let mut h = harness(vec![Reply::Ok(sample_prediction())], false);
    fill(&mut h.controller);
    let (handle, signal) = cancellation();
    drop(handle);
    assert!(!signal.is_cancelled());

    let outcome = h.controller.submit_with_cancel(signal).await;

    assert!(matches!(outcome, SubmitOutcome::Submitted));
}

#[tokio::test]
async fn submit_is_ignored_while_a_submission_is_in_flight() {
    let mut h = harness(Vec::new(), false);
    fill(&mut h.controller);
    h.controller.state = WorkflowState::Submitting;

    let outcome = h.controller.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Ignored));
    assert!(h.controller.is_busy());
    assert_eq!(h.service.calls(), 0);
}

#[tokio::test]
async fn dismissing_the_error_returns_to_idle() {
    let mut h = harness(
        vec![Reply::Err(PredictionError::http(500, "HTTP error: status 500"))],
        false,
    );
    fill(&mut h.controller);
    h.controller.submit().await;

    h.controller.dismiss_error();

    assert_eq!(h.controller.state(), WorkflowState::Idle);
    assert_eq!(h.controller.form().submission_error(), None);
}

#[tokio::test]
async fn channel_navigator_forwards_routes() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let service = ScriptedService::new(vec![Reply::Ok(sample_prediction())]);
    let mut controller = WorkflowController::new(
        service,
        Arc::new(MemorySessionStore::new()),
        Arc::new(tx),
        ValidationMode::Lenient,
    );
    fill(&mut controller);

    controller.submit().await;

    assert_eq!(rx.recv().await, Some(Route::Results));
    assert!(rx.try_recv().is_err());
}
