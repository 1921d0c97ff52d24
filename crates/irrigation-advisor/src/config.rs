//! Configuration for decisions, forecasts and schedules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stage used when a crop has no registered stages.
pub const DEFAULT_STAGE: &str = "Vegetativo";
/// Open-Meteo forecast endpoint.
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
/// Pre-dawn irrigation slot.
pub const DEFAULT_IRRIGATION_TIME: &str = "03:00";

/// Cut-offs of the irrigation decision rules.
///
/// Moisture values are percent of soil volume, probabilities are percent,
/// volumes are millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    /// Above this moisture the soil needs no water.
    pub adequate_moisture: f64,
    /// Below this moisture irrigation is mandatory.
    pub critical_moisture: f64,
    /// Rain probability that, with a significant volume, replaces irrigation.
    pub high_rain_probability: f64,
    pub significant_rain_mm: f64,
    /// Rain probability below which rain is not counted on.
    pub moderate_rain_probability: f64,
    pub low_rain_mm: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            adequate_moisture: 30.0,
            critical_moisture: 20.0,
            high_rain_probability: 70.0,
            significant_rain_mm: 5.0,
            moderate_rain_probability: 50.0,
            low_rain_mm: 3.0,
        }
    }
}

impl DecisionThresholds {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let values = [
            ("adequate_moisture", self.adequate_moisture),
            ("critical_moisture", self.critical_moisture),
            ("high_rain_probability", self.high_rain_probability),
            ("significant_rain_mm", self.significant_rain_mm),
            ("moderate_rain_probability", self.moderate_rain_probability),
            ("low_rain_mm", self.low_rain_mm),
        ];
        for (field, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigValidationError::InvalidThreshold(field.to_string()));
            }
        }
        if self.critical_moisture >= self.adequate_moisture {
            return Err(ConfigValidationError::ThresholdOrder(
                "critical_moisture must be below adequate_moisture".to_string(),
            ));
        }
        if self.moderate_rain_probability >= self.high_rain_probability
            || self.high_rain_probability > 100.0
        {
            return Err(ConfigValidationError::ThresholdOrder(
                "moderate_rain_probability < high_rain_probability <= 100 is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Advisor settings: crops, municipalities, forecast access and thresholds.
///
/// # Example
///
/// ```rust,ignore
/// use irrigation_advisor::AdvisorConfig;
///
/// let config = AdvisorConfig::builder()
///     .forecast_days(5)
///     .forecast_timeout_secs(3)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Phenological stages per crop, in growth order.
    pub stages_by_crop: BTreeMap<String, Vec<String>>,

    /// Municipalities offered for forecasts.
    pub municipalities: Vec<String>,

    /// Days in a schedule.
    /// Default: 7
    pub forecast_days: usize,

    /// Recommended time-of-day on irrigation days.
    /// Default: "03:00"
    pub irrigation_time: String,

    /// Bound on one forecast request.
    /// Default: 10
    pub forecast_timeout_secs: u64,

    /// Default: "https://api.open-meteo.com/v1/forecast"
    pub forecast_url: String,

    pub thresholds: DecisionThresholds,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            stages_by_crop: default_stages(),
            municipalities: [
                "São Paulo",
                "Campinas",
                "Ribeirão Preto",
                "Piracicaba",
                "Londrina",
                "Cascavel",
                "Maringá",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            forecast_days: 7,
            irrigation_time: DEFAULT_IRRIGATION_TIME.to_string(),
            forecast_timeout_secs: 10,
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            thresholds: DecisionThresholds::default(),
        }
    }
}

fn default_stages() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, [&str; 5]); 3] = [
        (
            "SOJA",
            [
                "Germinação",
                "Vegetativo",
                "Florescimento",
                "Enchimento de Grãos",
                "Maturação",
            ],
        ),
        (
            "MILHO",
            [
                "Germinação",
                "Vegetativo",
                "Pendoamento",
                "Grãos Leitosos",
                "Maturação",
            ],
        ),
        (
            "CAFÉ",
            ["Vegetativo", "Floração", "Chumbinho", "Granação", "Maturação"],
        ),
    ];
    table
        .into_iter()
        .map(|(crop, stages)| {
            (
                crop.to_string(),
                stages.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

impl AdvisorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Stages of `crop`; unknown crops get `["Vegetativo"]`.
    pub fn stages_for(&self, crop: &str) -> Vec<&str> {
        match self.stages_by_crop.get(crop) {
            Some(stages) if !stages.is_empty() => stages.iter().map(String::as_str).collect(),
            _ => vec![DEFAULT_STAGE],
        }
    }

    /// Stage assumed for forecast days: the middle of the crop's cycle.
    pub fn default_stage(&self, crop: &str) -> &str {
        let stages = self.stages_for(crop);
        stages[stages.len() / 2]
    }

    pub fn is_registered(&self, municipality: &str) -> bool {
        self.municipalities.iter().any(|m| m == municipality)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.forecast_days == 0 {
            return Err(ConfigValidationError::InvalidForecastDays);
        }
        if self.forecast_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.irrigation_time.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("irrigation_time".to_string()));
        }
        if self.forecast_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("forecast_url".to_string()));
        }
        self.thresholds.validate()
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("forecast_days must be at least 1")]
    InvalidForecastDays,

    #[error("forecast_timeout_secs must be at least 1")]
    InvalidTimeout,

    #[error("'{0}' must not be empty")]
    EmptyField(String),

    #[error("Threshold '{0}' must be a non-negative number")]
    InvalidThreshold(String),

    #[error("Inconsistent thresholds: {0}")]
    ThresholdOrder(String),
}

/// Builder for [`AdvisorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    stages_by_crop: Option<BTreeMap<String, Vec<String>>>,
    municipalities: Option<Vec<String>>,
    forecast_days: Option<usize>,
    irrigation_time: Option<String>,
    forecast_timeout_secs: Option<u64>,
    forecast_url: Option<String>,
    thresholds: Option<DecisionThresholds>,
}

impl AdvisorConfigBuilder {
    /// Register or replace the stages of one crop.
    pub fn crop_stages<I, S>(mut self, crop: impl Into<String>, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages_by_crop
            .get_or_insert_with(default_stages)
            .insert(crop.into(), stages.into_iter().map(Into::into).collect());
        self
    }

    pub fn municipalities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.municipalities = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn forecast_days(mut self, days: usize) -> Self {
        self.forecast_days = Some(days);
        self
    }

    pub fn irrigation_time(mut self, time: impl Into<String>) -> Self {
        self.irrigation_time = Some(time.into());
        self
    }

    pub fn forecast_timeout_secs(mut self, secs: u64) -> Self {
        self.forecast_timeout_secs = Some(secs);
        self
    }

    /// Point the live forecast client at another endpoint.
    pub fn forecast_url(mut self, url: impl Into<String>) -> Self {
        self.forecast_url = Some(url.into());
        self
    }

    pub fn thresholds(mut self, thresholds: DecisionThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AdvisorConfig` or an error if validation fails.
    pub fn build(self) -> Result<AdvisorConfig, ConfigValidationError> {
        let defaults = AdvisorConfig::default();
        let config = AdvisorConfig {
            stages_by_crop: self.stages_by_crop.unwrap_or(defaults.stages_by_crop),
            municipalities: self.municipalities.unwrap_or(defaults.municipalities),
            forecast_days: self.forecast_days.unwrap_or(defaults.forecast_days),
            irrigation_time: self.irrigation_time.unwrap_or(defaults.irrigation_time),
            forecast_timeout_secs: self
                .forecast_timeout_secs
                .unwrap_or(defaults.forecast_timeout_secs),
            forecast_url: self.forecast_url.unwrap_or(defaults.forecast_url),
            thresholds: self.thresholds.unwrap_or(defaults.thresholds),
        };

        config.validate()?;
        Ok(config)
    }
}
