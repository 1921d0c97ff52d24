//! Daily weather forecasts.
//!
//! The [`ForecastProvider`] trait abstracts where forecasts come from so
//! schedule generation works the same against a live service or a simulation.
//!
//! - [`SimulatedForecast`] - seasonal random forecast, seedable
//! - [`OpenMeteoForecast`] - Open-Meteo HTTP API (requires `http` feature)
//! - [`FallbackForecast`] - a primary provider, replaced by the simulation
//!   when it fails
//!
//! # Example
//!
//! ```rust,ignore
//! use irrigation_advisor::forecast::{ForecastProvider, SimulatedForecast};
//!
//! let provider = SimulatedForecast::with_seed(7);
//! for day in provider.forecast("Campinas", 7)? {
//!     println!("{} {:.1}°C {:.0}%", day.date, day.temperature, day.rain_probability);
//! }
//! ```

mod coordinates;
mod fallback;
mod open_meteo;
mod simulated;

pub use coordinates::{Coordinates, DEFAULT_COORDINATES, coordinates_for};
pub use fallback::FallbackForecast;
#[cfg(feature = "http")]
pub use open_meteo::OpenMeteoForecast;
pub use open_meteo::{OpenMeteoResponse, weather_description};
pub use simulated::SimulatedForecast;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One day of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Mean temperature, °C.
    pub temperature: f64,
    /// Mean relative air humidity, percent.
    pub humidity: f64,
    /// Chance of rain, percent.
    pub rain_probability: f64,
    /// Expected rain volume, mm.
    pub rain_mm: f64,
    pub description: String,
}

/// Source of daily forecasts.
///
/// Implementations return days in chronological order, at most `days` of
/// them. Fewer rows than requested are valid.
pub trait ForecastProvider: Send + Sync {
    fn forecast(&self, location: &str, days: usize) -> Result<Vec<ForecastDay>>;

    /// Provider name for logs and reports.
    fn name(&self) -> &str;

    /// Forecast plus the name of the provider that actually answered.
    ///
    /// Differs from [`name`](Self::name) only for composite providers.
    fn forecast_with_source(&self, location: &str, days: usize) -> Result<(Vec<ForecastDay>, &str)> {
        Ok((self.forecast(location, days)?, self.name()))
    }
}

static_assertions::assert_impl_all!(SimulatedForecast: Send, Sync);
static_assertions::assert_impl_all!(FallbackForecast: Send, Sync);

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
