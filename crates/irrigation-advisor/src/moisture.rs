//! Soil-moisture estimates for forecast days.
//!
//! Two named strategies exist and are never assumed equivalent:
//!
//! - [`EmpiricalMoisture`]: a bounded formula over the forecast fields only
//! - [`ModelMoisture`]: the trained regression engine, with the forecast
//!   mapped onto the training-time feature schema
//!
//! [`MoistureStrategy`] picks one and reports which produced each value.

use serde::{Deserialize, Serialize};
use tracing::warn;

use irrigation_learning::{LearningError, RegressionEngine};
use irrigation_processing::DatasetConfig;

use crate::config::AdvisorConfig;
use crate::forecast::ForecastDay;

/// Strategy that produced a moisture value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoistureSource {
    Model,
    Empirical,
}

impl std::fmt::Display for MoistureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Model => "model",
            Self::Empirical => "empirical",
        })
    }
}

/// Moisture from temperature and rain alone.
///
/// `30 - 0.8 * (temperature - 25) + 1.5 * rain_mm + 0.05 * rain_probability`,
/// clamped to [10, 50].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmpiricalMoisture;

impl EmpiricalMoisture {
    pub const BASE: f64 = 30.0;
    pub const MIN: f64 = 10.0;
    pub const MAX: f64 = 50.0;

    pub fn estimate(&self, temperature: f64, rain_probability: f64, rain_mm: f64) -> f64 {
        let moisture = Self::BASE - 0.8 * (temperature - 25.0)
            + 1.5 * rain_mm
            + 0.05 * rain_probability;
        moisture.clamp(Self::MIN, Self::MAX)
    }

    pub fn estimate_day(&self, day: &ForecastDay) -> f64 {
        self.estimate(day.temperature, day.rain_probability, day.rain_mm)
    }
}

/// Training columns fed from the forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastColumns {
    /// Default: "Temperatura"
    pub temperature: String,
    /// Default: "Probabilidade de Chuva"
    pub rain_probability: String,
    /// Default: "Chuva Real (mm)"
    pub rain_volume: String,
}

impl Default for ForecastColumns {
    fn default() -> Self {
        Self {
            temperature: "Temperatura".to_string(),
            rain_probability: "Probabilidade de Chuva".to_string(),
            rain_volume: "Chuva Real (mm)".to_string(),
        }
    }
}

/// Moisture predicted by a trained (or loaded) regression engine.
///
/// Each forecast day becomes one feature row: temperature, rain probability
/// and rain volume from the forecast, the requested crop's one-hot column, the
/// one-hot column of the crop's mid-cycle stage, and training means for the
/// remaining agronomic features.
#[derive(Debug, Clone)]
pub struct ModelMoisture<'a> {
    engine: &'a RegressionEngine,
    advisor: &'a AdvisorConfig,
    crop_prefix: String,
    stage_prefix: String,
    columns: ForecastColumns,
}

impl<'a> ModelMoisture<'a> {
    /// # Errors
    ///
    /// [`LearningError::NoTrainedModel`] if the engine was neither trained
    /// nor loaded.
    pub fn new(
        engine: &'a RegressionEngine,
        dataset: &DatasetConfig,
        advisor: &'a AdvisorConfig,
    ) -> Result<Self, LearningError> {
        if engine.schema().is_none() || engine.best_model_name().is_none() {
            return Err(LearningError::NoTrainedModel);
        }
        Ok(Self {
            engine,
            advisor,
            crop_prefix: dataset.crop_prefix.clone(),
            stage_prefix: dataset.stage_prefix.clone(),
            columns: ForecastColumns::default(),
        })
    }

    #[must_use]
    pub fn with_columns(mut self, columns: ForecastColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Feature row for one forecast day, in training order.
    pub fn feature_row(&self, day: &ForecastDay, crop: &str) -> Result<Vec<f64>, LearningError> {
        let schema = self.engine.schema().ok_or(LearningError::NoTrainedModel)?;
        let stage = self.advisor.default_stage(crop);
        Ok(schema
            .row()
            .set(&self.columns.temperature, day.temperature)
            .set(&self.columns.rain_probability, day.rain_probability)
            .set(&self.columns.rain_volume, day.rain_mm)
            .category(&self.crop_prefix, crop)
            .category(&self.stage_prefix, stage)
            .build())
    }

    pub fn estimate(&self, day: &ForecastDay, crop: &str) -> Result<f64, LearningError> {
        let row = self.feature_row(day, crop)?;
        let moisture = self.engine.predict(&row)?;
        if !moisture.is_finite() {
            return Err(LearningError::Computation(format!(
                "non-finite moisture prediction for {}",
                day.date
            )));
        }
        Ok(moisture)
    }
}

/// How schedule generation estimates moisture.
#[derive(Debug, Clone)]
pub enum MoistureStrategy<'a> {
    Empirical(EmpiricalMoisture),
    /// Model first; a failing day falls back to the empirical formula.
    Model(ModelMoisture<'a>),
}

impl Default for MoistureStrategy<'_> {
    fn default() -> Self {
        Self::Empirical(EmpiricalMoisture)
    }
}

impl MoistureStrategy<'_> {
    pub fn estimate(&self, day: &ForecastDay, crop: &str) -> (f64, MoistureSource) {
        match self {
            Self::Empirical(formula) => (formula.estimate_day(day), MoistureSource::Empirical),
            Self::Model(model) => match model.estimate(day, crop) {
                Ok(moisture) => (moisture, MoistureSource::Model),
                Err(e) => {
                    warn!(
                        "Model moisture failed for {} ({}); using empirical formula",
                        day.date, e
                    );
                    (EmpiricalMoisture.estimate_day(day), MoistureSource::Empirical)
                }
            },
        }
    }
}
