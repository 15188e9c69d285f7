//! Client side of the CKD risk assessment: form state, validation, the prediction
//! service client, and the submission workflow that ties them to session storage.

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod form;
pub mod report;
pub mod workflow;

pub use client::{PredictionClient, PredictionService};
pub use config::{load_settings, Settings};
pub use error::{ConfigError, PredictionError, PredictionErrorKind};
pub use form::{ErrorState, FormStateManager, ValidationMode};
pub use report::ResultsReport;
pub use workflow::{
    cancellation, CancelHandle, CancelSignal, Navigator, Route, SubmitOutcome, WorkflowController,
    WorkflowError, WorkflowState,
};
