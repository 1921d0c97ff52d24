//! Integration tests: CSV fixture through preparation, training and persistence.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use irrigation_learning::{
    ArtifactPaths, ClassificationEngine, FeatureImportance, LearningError, ProgressUpdate,
    RegressionEngine, SplitStrategy, TrainingConfig, TrainingData, TrainingStage,
};
use irrigation_processing::{DatasetConfig, FeaturePreprocessor, Task, filter_by_crop, read_csv};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use pretty_assertions::assert_eq;

// ============================================================================
// Helper Functions
// ============================================================================

fn load_sample() -> DataFrame {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../irrigation-processing/tests/fixtures/irrigation_sample.csv");
    read_csv(path).expect("Failed to read fixture")
}

fn prepare(df: &DataFrame, task: Task) -> TrainingData {
    let prepared = FeaturePreprocessor::default().prepare(df, task).unwrap();
    TrainingData::try_from(&prepared).unwrap()
}

fn quick_config() -> TrainingConfig {
    TrainingConfig::builder().n_estimators(10).build().unwrap()
}

// ============================================================================
// Regression
// ============================================================================

#[test]
fn test_regression_end_to_end() {
    let data = prepare(&load_sample(), Task::Regression);
    let mut engine = RegressionEngine::new(quick_config());
    engine.train(&data).unwrap();

    let names: Vec<&str> = engine.roster().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Linear Regression",
            "Ridge Regression",
            "Lasso Regression",
            "Random Forest",
            "Gradient Boosting",
        ]
    );

    let best = engine
        .roster()
        .iter()
        .map(|t| t.metrics.test.r2)
        .fold(f64::NEG_INFINITY, f64::max);
    let chosen = engine.best_model_name().unwrap().to_string();
    let chosen_r2 = engine
        .roster()
        .iter()
        .find(|t| t.name == chosen)
        .unwrap()
        .metrics
        .test
        .r2;
    assert_eq!(chosen_r2, best);

    let row = engine
        .schema()
        .unwrap()
        .row()
        .set("Temperatura", 30.0)
        .category("Cultura", "SOJA")
        .build();
    assert!(engine.predict(&row).unwrap().is_finite());

    match engine.feature_importance() {
        FeatureImportance::Ranked { scores, .. } => {
            assert_eq!(scores.len(), data.n_features());
            let total: f64 = scores.iter().map(|s| s.importance_percent).sum();
            assert!((total - 100.0).abs() < 1e-6);
        }
        FeatureImportance::Unavailable => panic!("expected ranked importances"),
    }
}

#[test]
fn test_regression_save_and_load() {
    let data = prepare(&load_sample(), Task::Regression);
    let mut engine = RegressionEngine::new(quick_config());
    engine.train(&data).unwrap();

    let dir = tempfile::tempdir().unwrap();
    engine.save(dir.path()).unwrap();
    let paths = ArtifactPaths::new(dir.path(), Task::Regression);
    assert!(paths.model.exists() && paths.scaler.exists() && paths.schema.exists());
    assert!(!paths.pca.exists());

    let loaded = RegressionEngine::load(dir.path(), quick_config()).unwrap();
    assert_eq!(loaded.best_model_name(), engine.best_model_name());
    assert!(loaded.roster().is_empty());

    let row = engine.schema().unwrap().row().category("Cultura", "MILHO").build();
    let a = engine.predict(&row).unwrap();
    let b = loaded.predict(&row).unwrap();
    assert!((a - b).abs() < 1e-9);
}

#[test]
fn test_load_from_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        RegressionEngine::load(dir.path(), quick_config()),
        Err(LearningError::ArtifactNotFound { .. })
    ));
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_classification_end_to_end() {
    let data = prepare(&load_sample(), Task::Classification);
    let mut engine = ClassificationEngine::new(quick_config());

    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::default();
    let sink = Arc::clone(&updates);
    engine = engine.on_progress(Arc::new(move |u| sink.lock().unwrap().push(u)));
    engine.train(&data).unwrap();

    assert_eq!(engine.roster().len(), 5);
    assert_eq!(engine.split_strategy(), Some(SplitStrategy::Stratified));

    let best = engine
        .roster()
        .iter()
        .map(|t| t.metrics.test.f1)
        .fold(f64::NEG_INFINITY, f64::max);
    let (name, _) = engine.select_best().unwrap();
    let name = name.to_string();
    let chosen = engine.roster().iter().find(|t| t.name == name).unwrap();
    assert_eq!(chosen.metrics.test.f1, best);

    let row = engine
        .schema()
        .unwrap()
        .row()
        .set("Umidade do Solo", 20.0)
        .category("Cultura", "CAFÉ")
        .build();
    let label = engine.predict(&row).unwrap();
    assert!(label == 0.0 || label == 1.0);

    let updates = updates.lock().unwrap();
    assert_eq!(updates.first().unwrap().stage, TrainingStage::Splitting);
    assert_eq!(updates.last().unwrap().stage, TrainingStage::Complete);
}

#[test]
fn test_classification_save_and_load() {
    let data = prepare(&load_sample(), Task::Classification);
    let mut engine = ClassificationEngine::new(quick_config());
    engine.train(&data).unwrap();

    let dir = tempfile::tempdir().unwrap();
    engine.save(dir.path()).unwrap();
    let loaded = ClassificationEngine::load(dir.path(), quick_config()).unwrap();

    let schema = engine.schema().unwrap();
    for moisture in [15.0, 30.0, 45.0] {
        let row = schema.row().set("Umidade do Solo", moisture).build();
        assert_eq!(engine.predict(&row).unwrap(), loaded.predict(&row).unwrap());
    }
}

#[test]
fn test_classification_beyond_five_thousand_training_rows() {
    // 6300 rows leave 5040 in the training partition.
    let n = 6_300;
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        if j == 0 {
            10.0 + (i % 400) as f64 / 10.0
        } else {
            18.0 + (i % 13) as f64
        }
    });
    let y: Array1<f64> = x.column(0).mapv(|m| if m < 30.0 { 1.0 } else { 0.0 });
    let data = TrainingData::new(
        x,
        y,
        vec!["Umidade do Solo".to_string(), "Temperatura".to_string()],
    )
    .unwrap();

    let config = TrainingConfig::builder().n_estimators(1).build().unwrap();
    let mut engine = ClassificationEngine::new(config);
    engine.train(&data).unwrap();

    let names: Vec<&str> = engine.roster().iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"SVM"));
    assert_eq!(engine.roster().len(), 5);
    assert!(engine.roster().iter().all(|t| t.y_test.len() == 1_260));
    assert_eq!(engine.predict(&[12.0, 25.0]).unwrap(), 1.0);
    assert_eq!(engine.predict(&[48.0, 25.0]).unwrap(), 0.0);
}

#[test]
fn test_single_class_subset_is_rejected() {
    let df = load_sample();
    let config = DatasetConfig::default();
    let filtered = filter_by_crop(&df, &config, "SOJA").unwrap();
    let relay = filtered.column("Relay_On").unwrap().clone();
    let zeros = Column::new(relay.name().clone(), vec![0i64; filtered.height()]);
    let mut single = filtered.clone();
    single.with_column(zeros).unwrap();

    let data = prepare(&single, Task::Classification);
    let mut engine = ClassificationEngine::new(quick_config());
    let err = engine.train(&data).unwrap_err();
    assert!(matches!(err, LearningError::InsufficientClassDiversity { .. }));
    assert!(engine.roster().is_empty());
}
