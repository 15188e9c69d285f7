//! View model for the results page, built from the persisted session.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use shared::{
    domain::FormState,
    protocol::{PredictionResponse, RiskLevel},
    schema::FieldKey,
};
use storage::{SessionStore, StorageError};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub key: FieldKey,
    pub label: &'static str,
    pub value: String,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsReport {
    pub risk_level: RiskLevel,
    pub has_ckd: bool,
    pub probability: f64,
    pub ckd_stage: String,
    pub key_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub model_version: String,
    pub timestamp: String,
    pub generated_at: Option<DateTime<Utc>>,
    /// Empty when the submitted form was not persisted or could not be read.
    pub inputs: Vec<FieldRow>,
}

impl ResultsReport {
    pub fn new(prediction: &PredictionResponse, assessment: Option<&FormState>) -> Self {
        let inputs = assessment
            .map(|form| {
                form.entries()
                    .map(|(key, value)| {
                        let spec = key.spec();
                        FieldRow {
                            key,
                            label: spec.label,
                            value: value.to_string(),
                            unit: spec.unit,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            risk_level: prediction.prediction.risk_level,
            has_ckd: prediction.prediction.has_ckd,
            probability: prediction.prediction.probability,
            ckd_stage: prediction.prediction.ckd_stage.clone(),
            key_factors: prediction.analysis.key_factors.clone(),
            recommendations: prediction.analysis.recommendations.clone(),
            model_version: prediction.metadata.model_version.clone(),
            timestamp: prediction.metadata.timestamp.clone(),
            generated_at: parse_timestamp(&prediction.metadata.timestamp),
            inputs,
        }
    }

    /// Returns `None` when no prediction has been stored yet.
    pub async fn from_session(store: &dyn SessionStore) -> Result<Option<Self>, StorageError> {
        let Some(prediction) = store.load_prediction().await? else {
            return Ok(None);
        };
        let assessment = store.load_assessment().await?;
        Ok(Some(Self::new(&prediction, assessment.as_ref())))
    }

    /// Probability as a whole percentage in `0..=100`.
    pub fn probability_percent(&self) -> u8 {
        if !self.probability.is_finite() {
            return 0;
        }
        (self.probability.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl fmt::Display for ResultsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CKD risk assessment")?;
        writeln!(
            f,
            "  Risk level:  {} ({}%)",
            self.risk_level,
            self.probability_percent()
        )?;
        writeln!(f, "  {}", self.risk_level.description())?;
        writeln!(
            f,
            "  CKD predicted: {}",
            if self.has_ckd { "yes" } else { "no" }
        )?;
        writeln!(f, "  Stage:       {}", self.ckd_stage)?;

        if !self.inputs.is_empty() {
            writeln!(f, "\nSubmitted values")?;
            for row in &self.inputs {
                writeln!(f, "  {}: {} {}", row.label, row.value, row.unit)?;
            }
        }
        if !self.key_factors.is_empty() {
            writeln!(f, "\nKey factors")?;
            for factor in &self.key_factors {
                writeln!(f, "  - {factor}")?;
            }
        }
        if !self.recommendations.is_empty() {
            writeln!(f, "\nRecommendations")?;
            for recommendation in &self.recommendations {
                writeln!(f, "  - {recommendation}")?;
            }
        }

        let generated = self
            .generated_at
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| self.timestamp.clone());
        write!(f, "\nModel {} at {generated}", self.model_version)
    }
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
