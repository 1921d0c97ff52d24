//! Multi-day irrigation schedules.
//!
//! For every forecast day the generator estimates soil moisture, applies the
//! decision rules and records the outcome as a [`RecommendationRow`]. A
//! failing or empty forecast yields an empty [`Schedule`], never an error.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AdvisorConfig;
use crate::decision::{DecisionEngine, DecisionRule};
use crate::forecast::{ForecastDay, ForecastProvider, round1};
use crate::moisture::{MoistureSource, MoistureStrategy};

const WEEKDAYS: [&str; 7] = [
    "Segunda", "Terça", "Quarta", "Quinta", "Sexta", "Sábado", "Domingo",
];

/// Portuguese weekday of a `YYYY-MM-DD` date, or "" when it does not parse.
pub fn weekday_name(date: &str) -> &'static str {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| WEEKDAYS[d.weekday().num_days_from_monday() as usize])
        .unwrap_or("")
}

/// One day of a schedule. Numbers are rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRow {
    pub date: String,
    pub weekday: String,
    pub temperature: f64,
    pub rain_probability: f64,
    pub rain_mm: f64,
    pub predicted_moisture: f64,
    pub should_irrigate: bool,
    pub recommended_time: Option<String>,
    pub recommendation: String,
    pub justification: String,
    pub rule: DecisionRule,
    pub moisture_source: MoistureSource,
}

/// Ordered recommendations for one location and crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub location: String,
    pub crop: String,
    /// Forecast provider that answered; `None` when the forecast failed.
    pub provider: Option<String>,
    pub rows: Vec<RecommendationRow>,
}

impl Schedule {
    fn empty(location: &str, crop: &str, provider: Option<&str>) -> Self {
        Self {
            location: location.to_string(),
            crop: crop.to_string(),
            provider: provider.map(str::to_string),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Rows that call for irrigation.
    pub fn irrigation_days(&self) -> impl Iterator<Item = &RecommendationRow> {
        self.rows.iter().filter(|r| r.should_irrigate)
    }
}

/// Builds schedules from a forecast provider and a moisture strategy.
///
/// # Example
///
/// ```rust,ignore
/// use irrigation_advisor::{AdvisorConfig, ScheduleGenerator};
/// use irrigation_advisor::forecast::SimulatedForecast;
///
/// let config = AdvisorConfig::default();
/// let forecast = SimulatedForecast::with_seed(42);
/// let schedule = ScheduleGenerator::new(&forecast, &config).generate("Campinas", "SOJA", 7);
/// for row in &schedule.rows {
///     println!("{} {} {}", row.date, row.weekday, row.recommendation);
/// }
/// ```
pub struct ScheduleGenerator<'a> {
    forecast: &'a dyn ForecastProvider,
    moisture: MoistureStrategy<'a>,
    decisions: DecisionEngine,
}

impl<'a> ScheduleGenerator<'a> {
    /// A generator using the empirical moisture formula.
    pub fn new(forecast: &'a dyn ForecastProvider, config: &AdvisorConfig) -> Self {
        Self {
            forecast,
            moisture: MoistureStrategy::default(),
            decisions: DecisionEngine::from_config(config),
        }
    }

    #[must_use]
    pub fn with_moisture(mut self, moisture: MoistureStrategy<'a>) -> Self {
        self.moisture = moisture;
        self
    }

    /// Schedule for up to `days` days.
    ///
    /// The forecast may return fewer days; those are all scheduled.
    pub fn generate(&self, location: &str, crop: &str, days: usize) -> Schedule {
        let (forecast, source) = match self.forecast.forecast_with_source(location, days) {
            Ok(result) => result,
            Err(e) => {
                warn!("Forecast for {} failed ({}); no schedule generated", location, e);
                return Schedule::empty(location, crop, None);
            }
        };
        if forecast.is_empty() {
            info!("Forecast for {} is empty; no schedule generated", location);
            return Schedule::empty(location, crop, Some(source));
        }

        let rows: Vec<RecommendationRow> = forecast
            .iter()
            .take(days)
            .map(|day| self.recommend(day, crop))
            .collect();
        info!(
            "Schedule for {} ({}): {} days, {} irrigation",
            location,
            crop,
            rows.len(),
            rows.iter().filter(|r| r.should_irrigate).count()
        );

        Schedule {
            location: location.to_string(),
            crop: crop.to_string(),
            provider: Some(source.to_string()),
            rows,
        }
    }

    /// Recommendation for a single forecast day.
    pub fn recommend(&self, day: &ForecastDay, crop: &str) -> RecommendationRow {
        let (moisture, moisture_source) = self.moisture.estimate(day, crop);
        let decision = self
            .decisions
            .decide(moisture, day.rain_probability, day.rain_mm);
        debug!(
            "{}: moisture {:.1}% ({}) -> {:?}",
            day.date, moisture, moisture_source, decision.rule
        );

        RecommendationRow {
            date: day.date.clone(),
            weekday: weekday_name(&day.date).to_string(),
            temperature: round1(day.temperature),
            rain_probability: round1(day.rain_probability),
            rain_mm: round1(day.rain_mm),
            predicted_moisture: round1(moisture),
            should_irrigate: decision.should_irrigate,
            recommended_time: decision.recommended_time,
            recommendation: decision.recommendation,
            justification: decision.justification,
            rule: decision.rule,
            moisture_source,
        }
    }
}
