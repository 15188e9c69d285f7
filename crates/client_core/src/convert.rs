//! String to number conversion for the prediction request.

use shared::{domain::FormState, protocol::PredictionRequest, schema::FieldKey};

/// Parses the longest numeric prefix of `raw`, after leading whitespace.
///
/// Mirrors a browser `parseFloat`: `"12abc"` is `12.0`, `"-Infinity"` is negative
/// infinity, and input without a leading number is NaN.
pub fn parse_float(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let mut mantissa_digits = 0;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
        mantissa_digits += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}

pub fn to_prediction_request(form: &FormState) -> PredictionRequest {
    let value = |key: FieldKey| parse_float(form.get(key));
    PredictionRequest {
        serum_creatinine: value(FieldKey::SerumCreatinine),
        gfr: value(FieldKey::Gfr),
        itching: value(FieldKey::Itching),
        fasting_blood_sugar: value(FieldKey::FastingBloodSugar),
        bun_levels: value(FieldKey::BunLevels),
        protein_in_urine: value(FieldKey::ProteinInUrine),
        muscle_cramps: value(FieldKey::MuscleCramps),
    }
}
