//! Open-Meteo forecast client (<https://open-meteo.com/>).
//!
//! The service returns hourly readings; they are folded into one
//! [`ForecastDay`] per calendar date: mean temperature and humidity, the
//! highest rain probability, the summed rain volume and the description of
//! the day's first reading.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ForecastDay, round1};
use crate::error::{ForecastError, Result};

/// Hourly variables requested from the service.
pub(crate) const HOURLY_VARIABLES: &str =
    "temperature_2m,relative_humidity_2m,precipitation_probability,precipitation,weather_code";

/// Longest forecast the service offers.
pub(crate) const MAX_FORECAST_DAYS: usize = 16;

/// Body of a forecast response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenMeteoResponse {
    #[serde(default)]
    hourly: Option<HourlySeries>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HourlySeries {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i64>>,
}

/// Running totals of one calendar date.
#[derive(Debug)]
struct DayAccumulator {
    date: String,
    temperature: (f64, usize),
    humidity: (f64, usize),
    max_probability: Option<f64>,
    rain_mm: f64,
    weather_code: Option<i64>,
}

impl DayAccumulator {
    fn new(date: &str) -> Self {
        Self {
            date: date.to_string(),
            temperature: (0.0, 0),
            humidity: (0.0, 0),
            max_probability: None,
            rain_mm: 0.0,
            weather_code: None,
        }
    }

    fn finish(self) -> Option<ForecastDay> {
        let (t_sum, t_n) = self.temperature;
        if t_n == 0 {
            debug!("No temperature readings for {}, skipping day", self.date);
            return None;
        }
        let (h_sum, h_n) = self.humidity;
        Some(ForecastDay {
            date: self.date,
            temperature: round1(t_sum / t_n as f64),
            humidity: if h_n == 0 { 0.0 } else { round1(h_sum / h_n as f64) },
            rain_probability: self.max_probability.unwrap_or(0.0),
            rain_mm: round1(self.rain_mm),
            description: self
                .weather_code
                .map(weather_description)
                .unwrap_or("sem descrição")
                .to_string(),
        })
    }
}

fn value_at<T: Copy>(series: &[Option<T>], idx: usize) -> Option<T> {
    series.get(idx).copied().flatten()
}

impl OpenMeteoResponse {
    /// Fold hourly readings into at most `days` daily rows, in date order.
    ///
    /// # Errors
    ///
    /// - [`ForecastError::MalformedResponse`] if the hourly block is missing,
    ///   a series has the wrong length or a timestamp has no date
    /// - [`ForecastError::Empty`] if no day has a temperature reading
    pub fn daily(&self, days: usize) -> Result<Vec<ForecastDay>> {
        let hourly = self
            .hourly
            .as_ref()
            .ok_or_else(|| ForecastError::MalformedResponse("missing 'hourly' block".into()))?;

        let n = hourly.time.len();
        let lengths = [
            ("temperature_2m", hourly.temperature_2m.len()),
            ("relative_humidity_2m", hourly.relative_humidity_2m.len()),
            ("precipitation_probability", hourly.precipitation_probability.len()),
            ("precipitation", hourly.precipitation.len()),
        ];
        if let Some((name, len)) = lengths.iter().find(|(_, len)| *len != n) {
            return Err(ForecastError::MalformedResponse(format!(
                "'{name}' has {len} readings for {n} timestamps"
            )));
        }

        let mut accumulators: Vec<DayAccumulator> = Vec::new();
        for (idx, stamp) in hourly.time.iter().enumerate() {
            let date = stamp.get(..10).ok_or_else(|| {
                ForecastError::MalformedResponse(format!("timestamp '{stamp}' has no date"))
            })?;
            if accumulators.last().is_none_or(|acc| acc.date != date) {
                if accumulators.len() == days {
                    break;
                }
                accumulators.push(DayAccumulator::new(date));
            }
            let Some(acc) = accumulators.last_mut() else {
                continue;
            };

            if let Some(t) = value_at(&hourly.temperature_2m, idx) {
                acc.temperature.0 += t;
                acc.temperature.1 += 1;
            }
            if let Some(h) = value_at(&hourly.relative_humidity_2m, idx) {
                acc.humidity.0 += h;
                acc.humidity.1 += 1;
            }
            if let Some(p) = value_at(&hourly.precipitation_probability, idx) {
                acc.max_probability = Some(acc.max_probability.map_or(p, |m| m.max(p)));
            }
            acc.rain_mm += value_at(&hourly.precipitation, idx).unwrap_or(0.0);
            if acc.weather_code.is_none() {
                acc.weather_code = value_at(&hourly.weather_code, idx);
            }
        }

        let forecast: Vec<ForecastDay> = accumulators
            .into_iter()
            .filter_map(DayAccumulator::finish)
            .collect();
        if forecast.is_empty() {
            return Err(ForecastError::Empty);
        }
        Ok(forecast)
    }
}

/// Portuguese description of a WMO weather code.
pub fn weather_description(code: i64) -> &'static str {
    match code {
        0 => "céu limpo",
        1 | 2 => "céu parcialmente nublado",
        3 => "céu encoberto",
        45 | 48 => "nevoeiro",
        51..=57 => "garoa",
        61..=67 => "chuva",
        71..=77 => "neve",
        80..=82 => "pancadas de chuva",
        85 | 86 => "pancadas de neve",
        95..=99 => "trovoada",
        _ => "condição desconhecida",
    }
}

#[cfg(feature = "http")]
mod client {
    use std::time::Duration;

    use reqwest::blocking::Client;
    use tracing::info;

    use super::{HOURLY_VARIABLES, MAX_FORECAST_DAYS, OpenMeteoResponse};
    use crate::config::AdvisorConfig;
    use crate::error::{ForecastError, Result};
    use crate::forecast::{ForecastDay, ForecastProvider, coordinates_for};

    /// Live forecast from the Open-Meteo API.
    ///
    /// Requests are blocking and bounded by the configured timeout. There is
    /// no retry; wrap the provider in a
    /// [`FallbackForecast`](crate::forecast::FallbackForecast) to degrade to
    /// the simulation.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use irrigation_advisor::{AdvisorConfig, forecast::{ForecastProvider, OpenMeteoForecast}};
    ///
    /// let provider = OpenMeteoForecast::new(&AdvisorConfig::default())?;
    /// let days = provider.forecast("Ribeirão Preto", 7)?;
    /// ```
    #[derive(Debug, Clone)]
    pub struct OpenMeteoForecast {
        client: Client,
        base_url: String,
        timezone: String,
    }

    impl OpenMeteoForecast {
        /// # Errors
        ///
        /// Returns an error if the HTTP client cannot be created.
        pub fn new(config: &AdvisorConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.forecast_timeout_secs))
                .build()?;
            Ok(Self {
                client,
                base_url: config.forecast_url.clone(),
                timezone: "America/Sao_Paulo".to_string(),
            })
        }

        /// Report dates in another IANA timezone.
        #[must_use]
        pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
            self.timezone = timezone.into();
            self
        }
    }

    impl ForecastProvider for OpenMeteoForecast {
        fn forecast(&self, location: &str, days: usize) -> Result<Vec<ForecastDay>> {
            if location.trim().is_empty() {
                return Err(ForecastError::UnknownLocation(location.to_string()));
            }
            if days == 0 {
                return Ok(Vec::new());
            }
            let days = days.min(MAX_FORECAST_DAYS);
            let coords = coordinates_for(location);

            let response = self
                .client
                .get(&self.base_url)
                .query(&[
                    ("latitude", coords.latitude.to_string()),
                    ("longitude", coords.longitude.to_string()),
                    ("hourly", HOURLY_VARIABLES.to_string()),
                    ("forecast_days", days.to_string()),
                    ("timezone", self.timezone.clone()),
                ])
                .send()?;

            let status = response.status();
            if !status.is_success() {
                return Err(ForecastError::Status {
                    status: status.as_u16(),
                    body: response.text().unwrap_or_default(),
                });
            }

            let payload: OpenMeteoResponse = response.json()?;
            let forecast = payload.daily(days)?;
            info!("Open-Meteo returned {} days for {}", forecast.len(), location);
            Ok(forecast)
        }

        fn name(&self) -> &str {
            "open-meteo"
        }
    }
}

#[cfg(feature = "http")]
pub use client::OpenMeteoForecast;
