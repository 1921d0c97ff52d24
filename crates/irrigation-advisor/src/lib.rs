//! Irrigation Advisor
//!
//! Turns a soil-moisture estimate and a daily weather forecast into
//! irrigate/hold decisions, one per forecast day.
//!
//! # Overview
//!
//! - **Decisions**: [`DecisionEngine`] applies five ordered threshold rules and
//!   writes the recommendation and justification texts
//! - **Forecasts**: the [`forecast::ForecastProvider`] trait, with a seeded
//!   simulation, the Open-Meteo client and a fallback wrapper
//! - **Moisture**: [`MoistureStrategy`] picks the trained regression model
//!   ([`ModelMoisture`]) or the bounded formula ([`EmpiricalMoisture`]) and
//!   reports which one produced each value
//! - **Schedules**: [`ScheduleGenerator`] combines the three into a
//!   [`Schedule`] of [`RecommendationRow`]s
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use irrigation_advisor::{AdvisorConfig, MoistureStrategy, ModelMoisture, ScheduleGenerator};
//! use irrigation_advisor::forecast::SimulatedForecast;
//! use irrigation_learning::{RegressionEngine, TrainingConfig, TrainingData};
//! use irrigation_processing::{DatasetConfig, FeaturePreprocessor, Task, read_csv};
//!
//! let df = read_csv("dados_irrigacao.csv")?;
//! let prepared = FeaturePreprocessor::default().prepare(&df, Task::Regression)?;
//! let mut engine = RegressionEngine::new(TrainingConfig::default());
//! engine.train(&TrainingData::try_from(&prepared)?)?;
//!
//! let config = AdvisorConfig::default();
//! let model = ModelMoisture::new(&engine, &DatasetConfig::default(), &config)?;
//! let forecast = SimulatedForecast::with_seed(42);
//! let schedule = ScheduleGenerator::new(&forecast, &config)
//!     .with_moisture(MoistureStrategy::Model(model))
//!     .generate("Campinas", "SOJA", config.forecast_days);
//! ```
//!
//! # Error Handling
//!
//! Forecast failures are [`ForecastError`]s. Schedule generation never
//! returns them: a failed or empty forecast is logged and produces an empty
//! [`Schedule`].

pub mod config;
pub mod decision;
pub mod error;
pub mod forecast;
pub mod moisture;
pub mod schedule;

pub use config::{
    AdvisorConfig, AdvisorConfigBuilder, ConfigValidationError, DecisionThresholds,
};
pub use decision::{Decision, DecisionEngine, DecisionRule, decide};
pub use error::{ForecastError, Result};
pub use moisture::{EmpiricalMoisture, ForecastColumns, ModelMoisture, MoistureSource, MoistureStrategy};
pub use schedule::{RecommendationRow, Schedule, ScheduleGenerator, weekday_name};
