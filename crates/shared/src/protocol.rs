use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric feature vector posted to `/predict`.
///
/// Non-finite values serialize as JSON `null`; the service is responsible for rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "SerumCreatinine")]
    pub serum_creatinine: f64,
    #[serde(rename = "GFR")]
    pub gfr: f64,
    #[serde(rename = "Itching")]
    pub itching: f64,
    #[serde(rename = "FastingBloodSugar")]
    pub fasting_blood_sugar: f64,
    #[serde(rename = "BUNLevels")]
    pub bun_levels: f64,
    #[serde(rename = "ProteinInUrine")]
    pub protein_in_urine: f64,
    #[serde(rename = "MuscleCramps")]
    pub muscle_cramps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    /// Banding used by the prediction service.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.8 {
            Self::VeryHigh
        } else if probability >= 0.6 {
            Self::High
        } else if probability >= 0.4 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - continue routine screening",
            Self::Moderate => "Moderate risk - regular follow-up recommended",
            Self::High => "High risk - nephrology consultation advised",
            Self::VeryHigh => "Very high risk - immediate specialist consultation advised",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub has_ckd: bool,
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub ckd_stage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionAnalysis {
    pub key_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetadata {
    pub model_version: String,
    pub timestamp: String,
    pub features_used: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: PredictionSummary,
    pub analysis: PredictionAnalysis,
    pub metadata: PredictionMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub model_loaded: bool,
    pub expected_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<i64>>,
}
