use super::*;
use shared::{
    protocol::{PredictionAnalysis, PredictionMetadata, PredictionSummary, RiskLevel},
    schema::FieldKey,
};

fn sample_form() -> FormState {
    FormState::new()
        .with(FieldKey::SerumCreatinine, "1.2")
        .with(FieldKey::Gfr, "85")
        .with(FieldKey::Itching, "2")
        .with(FieldKey::FastingBloodSugar, "95")
        .with(FieldKey::BunLevels, "15")
        .with(FieldKey::ProteinInUrine, "0.1")
        .with(FieldKey::MuscleCramps, "1")
}

fn sample_prediction(probability: f64) -> PredictionResponse {
    PredictionResponse {
        prediction: PredictionSummary {
            has_ckd: false,
            probability,
            risk_level: RiskLevel::from_probability(probability),
            ckd_stage: "Stage 1".into(),
        },
        analysis: PredictionAnalysis {
            key_factors: Vec::new(),
            recommendations: vec!["Annual kidney function screening".into()],
        },
        metadata: PredictionMetadata {
            model_version: "v1".into(),
            timestamp: "2025-01-01T00:00:00Z".into(),
            features_used: vec!["GFR".into()],
        },
    }
}

#[tokio::test]
async fn empty_store_loads_nothing() {
    let store = SqliteSessionStore::new("sqlite::memory:").await.expect("db");
    assert_eq!(store.load_assessment().await.expect("load"), None);
    assert_eq!(store.load_prediction().await.expect("load"), None);
}

#[tokio::test]
async fn sqlite_store_round_trips_both_slots() {
    let store = SqliteSessionStore::new("sqlite::memory:").await.expect("db");
    store.save_assessment(&sample_form()).await.expect("save form");
    store
        .save_prediction(&sample_prediction(0.12))
        .await
        .expect("save prediction");

    assert_eq!(
        store.load_assessment().await.expect("load form"),
        Some(sample_form())
    );
    assert_eq!(
        store.load_prediction().await.expect("load prediction"),
        Some(sample_prediction(0.12))
    );
}

#[tokio::test]
async fn repeated_loads_return_identical_values() {
    let store = MemorySessionStore::new();
    store.save_assessment(&sample_form()).await.expect("save form");
    store
        .save_prediction(&sample_prediction(0.5))
        .await
        .expect("save prediction");

    let first = (
        store.load_assessment().await.expect("load"),
        store.load_prediction().await.expect("load"),
    );
    let second = (
        store.load_assessment().await.expect("load"),
        store.load_prediction().await.expect("load"),
    );
    assert_eq!(first, second);
}

#[tokio::test]
async fn later_save_overwrites_earlier_one() {
    let store = SqliteSessionStore::new("sqlite::memory:").await.expect("db");
    store
        .save_prediction(&sample_prediction(0.12))
        .await
        .expect("first save");
    store
        .save_prediction(&sample_prediction(0.91))
        .await
        .expect("second save");

    let loaded = store.load_prediction().await.expect("load").expect("present");
    assert_eq!(loaded.prediction.probability, 0.91);
    assert_eq!(loaded.prediction.risk_level, RiskLevel::VeryHigh);
}

#[tokio::test]
async fn unreadable_value_is_reported_as_absent() {
    let store = MemorySessionStore::new();
    store
        .put(PREDICTION_KEY, "{not json".to_string())
        .await
        .expect("put raw");
    store
        .put(ASSESSMENT_KEY, r#"{"GFR":"85"}"#.to_string())
        .await
        .expect("put raw");

    assert_eq!(store.load_prediction().await.expect("load"), None);
    assert_eq!(store.load_assessment().await.expect("load"), None);
}

#[tokio::test]
async fn values_are_stored_as_plain_json_under_fixed_keys() {
    let store = SqliteSessionStore::new("sqlite::memory:").await.expect("db");
    store.save_assessment(&sample_form()).await.expect("save");

    let raw = store
        .get(ASSESSMENT_KEY)
        .await
        .expect("get")
        .expect("present");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("plain json");
    assert_eq!(value["GFR"], "85");
    assert_eq!(store.get(PREDICTION_KEY).await.expect("get"), None);
}

#[tokio::test]
async fn clear_removes_both_slots() {
    let store = SqliteSessionStore::new("sqlite::memory:").await.expect("db");
    store.save_assessment(&sample_form()).await.expect("save");
    store
        .save_prediction(&sample_prediction(0.3))
        .await
        .expect("save");

    store.clear().await.expect("clear");

    assert_eq!(store.load_assessment().await.expect("load"), None);
    assert_eq!(store.load_prediction().await.expect("load"), None);
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("session.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = SqliteSessionStore::new(&database_url).await.expect("db");
    store.save_assessment(&sample_form()).await.expect("save");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = SqliteSessionStore::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.load_assessment().await.expect("load"),
        Some(sample_form())
    );
}

#[test]
fn sqlite_path_skips_memory_urls() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/session.db?mode=rwc"),
        Some(PathBuf::from("./data/session.db"))
    );
}
