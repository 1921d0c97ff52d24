use chrono::{Datelike, Duration, Local, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Exp1, StandardNormal};
use tracing::debug;

use super::{ForecastDay, ForecastProvider, round1};
use crate::error::{ForecastError, Result};

/// Day-of-year window of the warm, wet season.
const WET_SEASON: std::ops::RangeInclusive<u32> = 80..=172;
const MEAN_RAIN_MM: f64 = 2.0;

/// Seasonal random forecast.
///
/// Within day-of-year 80..=172 the base temperature is 25 °C and the base
/// rain probability 40%; otherwise 20 °C and 20%. Temperature gets Gaussian
/// noise with σ = 3 °C, probability σ = 15 points clamped to [0, 100]. Rain
/// falls with that probability, its volume drawn from an exponential with a
/// 2 mm mean. Humidity is 60 ± 10 clamped to [30, 90].
///
/// The same seed and start date always produce the same forecast.
#[derive(Debug, Clone)]
pub struct SimulatedForecast {
    seed: u64,
    start: Option<NaiveDate>,
}

impl Default for SimulatedForecast {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedForecast {
    /// A simulation with a random seed, starting today.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed, start: None }
    }

    /// Start at `date` instead of today.
    #[must_use]
    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start = Some(date);
        self
    }

    fn simulate_day(rng: &mut ChaCha8Rng, date: NaiveDate) -> ForecastDay {
        let wet = WET_SEASON.contains(&date.ordinal());
        let (base_temperature, base_probability) = if wet { (25.0, 40.0) } else { (20.0, 20.0) };

        let z: f64 = rng.sample(StandardNormal);
        let temperature = base_temperature + 3.0 * z;

        let z: f64 = rng.sample(StandardNormal);
        let rain_probability = (base_probability + 15.0 * z).clamp(0.0, 100.0);

        let rain_mm = if rng.gen_bool(rain_probability / 100.0) {
            let e: f64 = rng.sample(Exp1);
            MEAN_RAIN_MM * e
        } else {
            0.0
        };

        let z: f64 = rng.sample(StandardNormal);
        let humidity = (60.0 + 10.0 * z).clamp(30.0, 90.0);

        let rain_probability = round1(rain_probability);
        let description = if rain_probability > 50.0 {
            "céu parcialmente nublado"
        } else {
            "céu claro"
        };

        ForecastDay {
            date: date.format("%Y-%m-%d").to_string(),
            temperature: round1(temperature),
            humidity: round1(humidity),
            rain_probability,
            rain_mm: round1(rain_mm),
            description: description.to_string(),
        }
    }
}

impl ForecastProvider for SimulatedForecast {
    fn forecast(&self, location: &str, days: usize) -> Result<Vec<ForecastDay>> {
        if location.trim().is_empty() {
            return Err(ForecastError::UnknownLocation(location.to_string()));
        }
        let start = self.start.unwrap_or_else(|| Local::now().date_naive());
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let forecast: Vec<ForecastDay> = (0..days)
            .map(|offset| {
                let date = start + Duration::days(offset as i64);
                Self::simulate_day(&mut rng, date)
            })
            .collect();
        debug!("Simulated {} forecast days for {}", forecast.len(), location);
        Ok(forecast)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
