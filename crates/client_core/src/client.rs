use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::FormState,
    error::ApiError,
    protocol::{HealthStatus, ModelInfo, PredictionRequest, PredictionResponse},
};
use tracing::{debug, info, warn};

use crate::{config::Settings, convert::to_prediction_request, error::PredictionError};

const PREDICT_PATH: &str = "/predict";
const HEALTH_PATH: &str = "/health";
const MODEL_INFO_PATH: &str = "/model-info";

#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, form: &FormState) -> Result<PredictionResponse, PredictionError>;
    async fn health_check(&self) -> Result<HealthStatus, PredictionError>;
    async fn model_info(&self) -> Result<ModelInfo, PredictionError>;
}

pub struct PredictionClient {
    http: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl PredictionClient {
    /// `base_url` must already be normalized (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_base_url.clone()).with_timeout(settings.request_timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&PredictionRequest>,
    ) -> Result<T, PredictionError> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(PredictionError::from_transport)?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(PredictionError::from_transport)?;
        debug!(%method, %url, status = status.as_u16(), "prediction service responded");

        let parsed = serde_json::from_slice::<Value>(&bytes);

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .ok()
                .and_then(ApiError::message_from)
                .unwrap_or_else(|| format!("HTTP error: status {}", status.as_u16()));
            warn!(%url, status = status.as_u16(), %message, "prediction service rejected request");
            return Err(PredictionError::http(status.as_u16(), message));
        }

        let body = parsed.map_err(|err| {
            PredictionError::decode(format!("response from {endpoint} is not valid JSON: {err}"))
        })?;
        serde_json::from_value(body).map_err(|err| {
            PredictionError::decode(format!("unexpected response shape from {endpoint}: {err}"))
        })
    }
}

#[async_trait]
impl PredictionService for PredictionClient {
    async fn predict(&self, form: &FormState) -> Result<PredictionResponse, PredictionError> {
        let request = to_prediction_request(form);
        let response: PredictionResponse = self
            .request(Method::POST, PREDICT_PATH, Some(&request))
            .await?;
        info!(
            risk_level = %response.prediction.risk_level,
            probability = response.prediction.probability,
            "prediction received"
        );
        Ok(response)
    }

    async fn health_check(&self) -> Result<HealthStatus, PredictionError> {
        self.request(Method::GET, HEALTH_PATH, None).await
    }

    async fn model_info(&self) -> Result<ModelInfo, PredictionError> {
        self.request(Method::GET, MODEL_INFO_PATH, None).await
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
