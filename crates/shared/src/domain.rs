use serde::{Deserialize, Serialize};

use crate::schema::FieldKey;

/// Raw user input for every assessment field, as typed.
///
/// Every key always has exactly one entry; an untouched field holds the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(rename = "SerumCreatinine")]
    pub serum_creatinine: String,
    #[serde(rename = "GFR")]
    pub gfr: String,
    #[serde(rename = "Itching")]
    pub itching: String,
    #[serde(rename = "FastingBloodSugar")]
    pub fasting_blood_sugar: String,
    #[serde(rename = "BUNLevels")]
    pub bun_levels: String,
    #[serde(rename = "ProteinInUrine")]
    pub protein_in_urine: String,
    #[serde(rename = "MuscleCramps")]
    pub muscle_cramps: String,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::SerumCreatinine => &self.serum_creatinine,
            FieldKey::Gfr => &self.gfr,
            FieldKey::Itching => &self.itching,
            FieldKey::FastingBloodSugar => &self.fasting_blood_sugar,
            FieldKey::BunLevels => &self.bun_levels,
            FieldKey::ProteinInUrine => &self.protein_in_urine,
            FieldKey::MuscleCramps => &self.muscle_cramps,
        }
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        let slot = match key {
            FieldKey::SerumCreatinine => &mut self.serum_creatinine,
            FieldKey::Gfr => &mut self.gfr,
            FieldKey::Itching => &mut self.itching,
            FieldKey::FastingBloodSugar => &mut self.fasting_blood_sugar,
            FieldKey::BunLevels => &mut self.bun_levels,
            FieldKey::ProteinInUrine => &mut self.protein_in_urine,
            FieldKey::MuscleCramps => &mut self.muscle_cramps,
        };
        *slot = value.into();
    }

    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// `(key, raw value)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (FieldKey, &str)> + '_ {
        FieldKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}
