use tracing::{info, warn};

use super::{ForecastDay, ForecastProvider, SimulatedForecast};
use crate::error::Result;

/// A primary provider backed by the seasonal simulation.
///
/// When the primary fails or returns no rows the simulation answers instead,
/// and the switch is logged. [`ForecastProvider::forecast_with_source`]
/// reports which of the two answered.
pub struct FallbackForecast {
    primary: Box<dyn ForecastProvider>,
    fallback: SimulatedForecast,
}

impl FallbackForecast {
    pub fn new(primary: Box<dyn ForecastProvider>, fallback: SimulatedForecast) -> Self {
        Self { primary, fallback }
    }
}

impl ForecastProvider for FallbackForecast {
    fn forecast(&self, location: &str, days: usize) -> Result<Vec<ForecastDay>> {
        self.forecast_with_source(location, days)
            .map(|(forecast, _)| forecast)
    }

    fn name(&self) -> &str {
        self.primary.name()
    }

    fn forecast_with_source(&self, location: &str, days: usize) -> Result<(Vec<ForecastDay>, &str)> {
        match self.primary.forecast(location, days) {
            Ok(forecast) if !forecast.is_empty() || days == 0 => {
                Ok((forecast, self.primary.name()))
            }
            Ok(_) => {
                warn!(
                    "{} returned no forecast for {}; using simulated weather",
                    self.primary.name(),
                    location
                );
                Ok((self.fallback.forecast(location, days)?, self.fallback.name()))
            }
            Err(e) => {
                warn!(
                    "{} failed for {} ({}); using simulated weather",
                    self.primary.name(),
                    location,
                    e
                );
                let forecast = self.fallback.forecast(location, days)?;
                info!("Simulated forecast: {} days", forecast.len());
                Ok((forecast, self.fallback.name()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;

    struct Failing;

    impl ForecastProvider for Failing {
        fn forecast(&self, _location: &str, _days: usize) -> Result<Vec<ForecastDay>> {
            Err(ForecastError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Fixed(Vec<ForecastDay>);

    impl ForecastProvider for Fixed {
        fn forecast(&self, _location: &str, days: usize) -> Result<Vec<ForecastDay>> {
            Ok(self.0.iter().take(days).cloned().collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn sample_day() -> ForecastDay {
        ForecastDay {
            date: "2025-06-02".to_string(),
            temperature: 22.0,
            humidity: 65.0,
            rain_probability: 10.0,
            rain_mm: 0.0,
            description: "céu claro".to_string(),
        }
    }

    #[test]
    fn test_primary_used_when_healthy() {
        let provider =
            FallbackForecast::new(Box::new(Fixed(vec![sample_day()])), SimulatedForecast::with_seed(1));
        let (forecast, source) = provider.forecast_with_source("Campinas", 7).unwrap();
        assert_eq!(source, "fixed");
        assert_eq!(forecast, vec![sample_day()]);
    }

    #[test]
    fn test_failure_switches_to_simulation() {
        let provider = FallbackForecast::new(Box::new(Failing), SimulatedForecast::with_seed(1));
        let (forecast, source) = provider.forecast_with_source("Campinas", 5).unwrap();
        assert_eq!(source, "simulated");
        assert_eq!(forecast.len(), 5);
    }

    #[test]
    fn test_empty_primary_switches_to_simulation() {
        let provider = FallbackForecast::new(Box::new(Fixed(Vec::new())), SimulatedForecast::with_seed(1));
        let (forecast, source) = provider.forecast_with_source("Londrina", 3).unwrap();
        assert_eq!(source, "simulated");
        assert_eq!(forecast.len(), 3);
    }
}
