//! Static description of the assessment inputs.
//!
//! The table is fixed at compile time. Bounds and step are presentation hints; only the
//! strict validation mode in `client_core` enforces them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldKey {
    SerumCreatinine,
    #[serde(rename = "GFR")]
    Gfr,
    Itching,
    FastingBloodSugar,
    #[serde(rename = "BUNLevels")]
    BunLevels,
    ProteinInUrine,
    MuscleCramps,
}

impl FieldKey {
    /// All keys in declaration order.
    pub const ALL: [FieldKey; 7] = [
        FieldKey::SerumCreatinine,
        FieldKey::Gfr,
        FieldKey::Itching,
        FieldKey::FastingBloodSugar,
        FieldKey::BunLevels,
        FieldKey::ProteinInUrine,
        FieldKey::MuscleCramps,
    ];

    /// Wire name used by the prediction service and the persisted form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SerumCreatinine => "SerumCreatinine",
            Self::Gfr => "GFR",
            Self::Itching => "Itching",
            Self::FastingBloodSugar => "FastingBloodSugar",
            Self::BunLevels => "BUNLevels",
            Self::ProteinInUrine => "ProteinInUrine",
            Self::MuscleCramps => "MuscleCramps",
        }
    }

    pub fn spec(self) -> &'static FieldSpec {
        field_spec(self)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown assessment field '{0}'")]
pub struct UnknownFieldKey(pub String);

impl FromStr for FieldKey {
    type Err = UnknownFieldKey;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .into_iter()
            .find(|key| key.as_str() == raw)
            .ok_or_else(|| UnknownFieldKey(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub min: f64,
    pub max: f64,
    pub step: Option<f64>,
}

impl FieldSpec {
    /// Whether `value` lies inside the declared `[min, max]` range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub static FIELDS: [FieldSpec; 7] = [
    FieldSpec {
        key: FieldKey::SerumCreatinine,
        label: "Serum Creatinine",
        placeholder: "Enter value in mg/dL",
        unit: "mg/dL",
        description: "Normal range: 0.7-1.3 mg/dL for men, 0.6-1.1 mg/dL for women",
        required: true,
        min: 0.5,
        max: 15.0,
        step: Some(0.1),
    },
    FieldSpec {
        key: FieldKey::Gfr,
        label: "Glomerular Filtration Rate (GFR)",
        placeholder: "Enter GFR value",
        unit: "mL/min/1.73m²",
        description: "Normal range: >90 mL/min/1.73m²",
        required: true,
        min: 15.0,
        max: 120.0,
        step: None,
    },
    FieldSpec {
        key: FieldKey::Itching,
        label: "Itching Severity",
        placeholder: "Rate from 0-10",
        unit: "scale",
        description: "0 = No itching, 10 = Severe constant itching",
        required: true,
        min: 0.0,
        max: 10.0,
        step: None,
    },
    FieldSpec {
        key: FieldKey::FastingBloodSugar,
        label: "Fasting Blood Sugar",
        placeholder: "Enter fasting glucose level",
        unit: "mg/dL",
        description: "Normal range: 70-100 mg/dL",
        required: true,
        min: 70.0,
        max: 400.0,
        step: None,
    },
    FieldSpec {
        key: FieldKey::BunLevels,
        label: "Blood Urea Nitrogen (BUN)",
        placeholder: "Enter BUN level",
        unit: "mg/dL",
        description: "Urea (mg/dL) / 2.14. Normal range: 7-20 mg/dL",
        required: true,
        min: 5.0,
        max: 100.0,
        step: None,
    },
    FieldSpec {
        key: FieldKey::ProteinInUrine,
        label: "Protein in Urine",
        placeholder: "Enter protein level",
        unit: "g/day",
        description: "Normal range: <0.15 g/day",
        required: true,
        min: 0.0,
        max: 5.0,
        step: Some(0.01),
    },
    FieldSpec {
        key: FieldKey::MuscleCramps,
        label: "Muscle Cramps Frequency",
        placeholder: "Times per week (0-7)",
        unit: "times/week",
        description: "How many times per week do you experience muscle cramps?",
        required: true,
        min: 0.0,
        max: 7.0,
        step: None,
    },
];

pub fn field_spec(key: FieldKey) -> &'static FieldSpec {
    // FIELDS is declared in FieldKey order.
    &FIELDS[key as usize]
}
