//! Integration tests: trained moisture model, forecasts and schedules.

use std::path::PathBuf;

use chrono::NaiveDate;
use irrigation_advisor::forecast::{FallbackForecast, ForecastDay, ForecastProvider, SimulatedForecast};
use irrigation_advisor::{
    AdvisorConfig, DecisionRule, ForecastError, ModelMoisture, MoistureSource, MoistureStrategy,
    ScheduleGenerator, decide,
};
use irrigation_learning::{RegressionEngine, TrainingConfig, TrainingData};
use irrigation_processing::{DatasetConfig, FeaturePreprocessor, Task, read_csv};
use pretty_assertions::assert_eq;

// ============================================================================
// Helper Functions
// ============================================================================

fn trained_engine() -> RegressionEngine {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../irrigation-processing/tests/fixtures/irrigation_sample.csv");
    let df = read_csv(path).expect("Failed to read fixture");
    let prepared = FeaturePreprocessor::default()
        .prepare(&df, Task::Regression)
        .unwrap();
    let data = TrainingData::try_from(&prepared).unwrap();

    let config = TrainingConfig::builder().n_estimators(10).build().unwrap();
    let mut engine = RegressionEngine::new(config);
    engine.train(&data).unwrap();
    engine
}

fn simulated_week() -> SimulatedForecast {
    SimulatedForecast::with_seed(7).starting(NaiveDate::from_ymd_opt(2025, 4, 7).unwrap())
}

struct Unreachable;

impl ForecastProvider for Unreachable {
    fn forecast(&self, _location: &str, _days: usize) -> irrigation_advisor::Result<Vec<ForecastDay>> {
        Err(ForecastError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        })
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

// ============================================================================
// Schedules
// ============================================================================

#[test]
fn test_schedule_from_trained_model() {
    let engine = trained_engine();
    let advisor = AdvisorConfig::default();
    let dataset = DatasetConfig::default();
    let model = ModelMoisture::new(&engine, &dataset, &advisor).unwrap();

    let forecast = simulated_week();
    let schedule = ScheduleGenerator::new(&forecast, &advisor)
        .with_moisture(MoistureStrategy::Model(model))
        .generate("Campinas", "SOJA", advisor.forecast_days);

    assert_eq!(schedule.len(), 7);
    assert_eq!(schedule.provider.as_deref(), Some("simulated"));
    assert_eq!(schedule.rows[0].date, "2025-04-07");
    assert_eq!(schedule.rows[0].weekday, "Segunda");

    for row in &schedule.rows {
        assert_eq!(row.moisture_source, MoistureSource::Model);
        assert!(row.predicted_moisture.is_finite());
        assert_eq!(row.should_irrigate, row.rule.should_irrigate());
        assert_eq!(row.should_irrigate, row.recommended_time.is_some());
    }
}

#[test]
fn test_model_and_empirical_paths_are_distinguishable() {
    let engine = trained_engine();
    let advisor = AdvisorConfig::default();
    let forecast = simulated_week();

    let model = ModelMoisture::new(&engine, &DatasetConfig::default(), &advisor).unwrap();
    let by_model = ScheduleGenerator::new(&forecast, &advisor)
        .with_moisture(MoistureStrategy::Model(model))
        .generate("Londrina", "MILHO", 3);
    let by_formula = ScheduleGenerator::new(&forecast, &advisor).generate("Londrina", "MILHO", 3);

    assert_eq!(by_model.len(), by_formula.len());
    assert!(by_model.rows.iter().all(|r| r.moisture_source == MoistureSource::Model));
    assert!(by_formula.rows.iter().all(|r| r.moisture_source == MoistureSource::Empirical));

    let dates = |s: &irrigation_advisor::Schedule| s.rows.iter().map(|r| r.date.clone()).collect::<Vec<_>>();
    assert_eq!(dates(&by_model), dates(&by_formula));
}

#[test]
fn test_loaded_engine_drives_schedule() {
    let engine = trained_engine();
    let dir = tempfile::tempdir().unwrap();
    engine.save(dir.path()).unwrap();
    let loaded = RegressionEngine::load(dir.path(), TrainingConfig::default()).unwrap();

    let advisor = AdvisorConfig::default();
    let dataset = DatasetConfig::default();
    let fresh = ModelMoisture::new(&engine, &dataset, &advisor).unwrap();
    let restored = ModelMoisture::new(&loaded, &dataset, &advisor).unwrap();

    for day in simulated_week().forecast("Cascavel", 5).unwrap() {
        let a = fresh.estimate(&day, "CAFÉ").unwrap();
        let b = restored.estimate(&day, "CAFÉ").unwrap();
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_unreachable_forecast_gives_empty_schedule() {
    let advisor = AdvisorConfig::default();
    let schedule = ScheduleGenerator::new(&Unreachable, &advisor).generate("Maringá", "SOJA", 7);
    assert!(schedule.is_empty());
    assert_eq!(schedule.provider, None);
}

#[test]
fn test_fallback_reports_simulated_source() {
    let advisor = AdvisorConfig::default();
    let forecast = FallbackForecast::new(Box::new(Unreachable), simulated_week());
    let schedule = ScheduleGenerator::new(&forecast, &advisor).generate("Maringá", "SOJA", 7);
    assert_eq!(schedule.len(), 7);
    assert_eq!(schedule.provider.as_deref(), Some("simulated"));
}

#[test]
fn test_schedule_json_shape() {
    let advisor = AdvisorConfig::default();
    let forecast = simulated_week();
    let schedule = ScheduleGenerator::new(&forecast, &advisor).generate("Piracicaba", "CAFÉ", 2);

    let json = serde_json::to_value(&schedule).unwrap();
    assert_eq!(json["location"], "Piracicaba");
    assert_eq!(json["rows"].as_array().unwrap().len(), 2);
    assert_eq!(json["rows"][0]["moisture_source"], "empirical");
    assert_eq!(json["rows"][0]["weekday"], "Segunda");
}

// ============================================================================
// Decisions
// ============================================================================

#[test]
fn test_decision_examples() {
    let exactly_adequate = decide(30.0, 0.0, 0.0);
    assert!(!exactly_adequate.should_irrigate);
    assert_eq!(exactly_adequate.rule, DecisionRule::Monitor);

    let critical = decide(15.0, 10.0, 0.0);
    assert!(critical.should_irrigate);
    assert!(critical.justification.contains("Umidade crítica"));

    let covered = decide(25.0, 80.0, 6.0);
    assert!(!covered.should_irrigate);
    assert_eq!(covered.rule, DecisionRule::RainCoverage);

    let dry = decide(25.0, 40.0, 1.0);
    assert!(dry.should_irrigate);
    assert_eq!(dry.rule, DecisionRule::BelowIdealLowRain);
}
