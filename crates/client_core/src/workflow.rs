//! Submission orchestration: validate, predict, persist, navigate.

use std::sync::Arc;

use shared::{domain::FormState, protocol::PredictionResponse, schema::FieldKey};
use storage::{SessionStore, StorageError};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::{
    client::PredictionService,
    error::{PredictionError, PredictionErrorKind},
    form::{FormStateManager, ValidationMode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Results,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

impl Navigator for mpsc::UnboundedSender<Route> {
    fn navigate(&self, route: Route) {
        if self.send(route).is_err() {
            warn!(?route, "navigation receiver dropped");
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error("failed to save assessment results: {0}")]
    Storage(#[from] StorageError),
}

impl WorkflowError {
    pub fn prediction_kind(&self) -> Option<PredictionErrorKind> {
        match self {
            Self::Prediction(err) => Some(err.kind),
            Self::Storage(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Validation failed; no request was sent.
    Invalid,
    /// Results were persisted and navigation was signalled.
    Submitted,
    Failed(WorkflowError),
    /// A submission was already in flight.
    Ignored,
}

/// Aborts an in-flight submission when the user navigates away.
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

#[derive(Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped uncancelled.
    pub async fn cancelled(&mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

pub struct WorkflowController {
    form: FormStateManager,
    state: WorkflowState,
    service: Arc<dyn PredictionService>,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl WorkflowController {
    pub fn new(
        service: Arc<dyn PredictionService>,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        mode: ValidationMode,
    ) -> Self {
        Self {
            form: FormStateManager::new(mode),
            state: WorkflowState::Idle,
            service,
            store,
            navigator,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Whether the submit control should render as disabled/busy.
    pub fn is_busy(&self) -> bool {
        self.state == WorkflowState::Submitting
    }

    pub fn form(&self) -> &FormStateManager {
        &self.form
    }

    pub fn set_field(&mut self, key: FieldKey, value: impl Into<String>) {
        self.form.set_field(key, value);
        if matches!(self.state, WorkflowState::Success | WorkflowState::Failed) {
            self.transition(WorkflowState::Idle);
        }
    }

    pub fn dismiss_error(&mut self) {
        self.form.dismiss_submission_error();
        if self.state == WorkflowState::Failed {
            self.transition(WorkflowState::Idle);
        }
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        self.run_submission(None).await
    }

    pub async fn submit_with_cancel(&mut self, cancel: CancelSignal) -> SubmitOutcome {
        self.run_submission(Some(cancel)).await
    }

    async fn run_submission(&mut self, cancel: Option<CancelSignal>) -> SubmitOutcome {
        if self.is_busy() {
            debug!("submission already in flight; ignoring submit");
            return SubmitOutcome::Ignored;
        }

        self.transition(WorkflowState::Validating);
        if !self.form.validate() {
            info!(
                missing = self.form.errors().len(),
                "assessment form failed validation"
            );
            self.transition(WorkflowState::Idle);
            return SubmitOutcome::Invalid;
        }

        self.form.dismiss_submission_error();
        self.transition(WorkflowState::Submitting);

        let form = self.form.values().clone();
        let result = match cancel {
            Some(mut cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(PredictionError::cancelled()),
                    result = self.service.predict(&form) => result,
                }
            }
            None => self.service.predict(&form).await,
        };

        let result = match result {
            Ok(prediction) => self
                .persist(&form, &prediction)
                .await
                .map_err(WorkflowError::from),
            Err(err) => Err(WorkflowError::from(err)),
        };

        match result {
            Ok(()) => {
                self.transition(WorkflowState::Success);
                self.navigator.navigate(Route::Results);
                SubmitOutcome::Submitted
            }
            Err(err) => {
                error!(kind = ?err.prediction_kind(), error = %err, "prediction error");
                self.form.set_submission_error(err.to_string());
                self.transition(WorkflowState::Failed);
                SubmitOutcome::Failed(err)
            }
        }
    }

    async fn persist(
        &self,
        form: &FormState,
        prediction: &PredictionResponse,
    ) -> Result<(), StorageError> {
        self.store.save_assessment(form).await?;
        self.store.save_prediction(prediction).await
    }

    fn transition(&mut self, next: WorkflowState) {
        debug!(from = ?self.state, to = ?next, "workflow transition");
        self.state = next;
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
