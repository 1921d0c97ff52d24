//! Rule-based irrigation decision.
//!
//! [`DecisionEngine::decide`] maps a predicted soil moisture and the day's rain
//! forecast to an irrigate/hold decision. Rules are checked in order and the
//! first match wins:
//!
//! | # | Condition | Irrigate |
//! |---|---|---|
//! | 1 | moisture > adequate | no |
//! | 2 | probability > high and volume > significant | no |
//! | 3 | moisture < critical | yes |
//! | 4 | moisture < adequate and (probability < moderate or volume < low) | yes |
//! | 5 | otherwise (monitor) | no |
//!
//! With the default thresholds (30 / 70 / 5 / 20 / 50 / 3) a moisture of exactly
//! 30% falls through to rule 5.

use serde::{Deserialize, Serialize};

use crate::config::{AdvisorConfig, DEFAULT_IRRIGATION_TIME, DecisionThresholds};

const SEPARATOR: &str = " | ";

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    AdequateMoisture,
    RainCoverage,
    CriticalMoisture,
    BelowIdealLowRain,
    Monitor,
}

impl DecisionRule {
    pub fn should_irrigate(&self) -> bool {
        matches!(self, Self::CriticalMoisture | Self::BelowIdealLowRain)
    }
}

/// Outcome of one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub should_irrigate: bool,
    pub rule: DecisionRule,
    /// Set only when irrigating.
    pub recommended_time: Option<String>,
    pub recommendation: String,
    pub justification: String,
}

/// Stateless decision procedure over fixed thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionEngine {
    thresholds: DecisionThresholds,
    irrigation_time: String,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionThresholds::default(), DEFAULT_IRRIGATION_TIME)
    }
}

impl DecisionEngine {
    pub fn new(thresholds: DecisionThresholds, irrigation_time: impl Into<String>) -> Self {
        Self {
            thresholds,
            irrigation_time: irrigation_time.into(),
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(config.thresholds, config.irrigation_time.clone())
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    /// Decide for one day.
    ///
    /// `rain_probability` is in percent, `rain_mm` in millimetres.
    pub fn decide(&self, moisture: f64, rain_probability: f64, rain_mm: f64) -> Decision {
        let rule = self.rule(moisture, rain_probability, rain_mm);
        let should_irrigate = rule.should_irrigate();
        Decision {
            should_irrigate,
            rule,
            recommended_time: should_irrigate.then(|| self.irrigation_time.clone()),
            recommendation: self.recommendation(should_irrigate, moisture, rain_probability, rain_mm),
            justification: self.justification(moisture, rain_probability, rain_mm),
        }
    }

    /// The first matching rule.
    pub fn rule(&self, moisture: f64, rain_probability: f64, rain_mm: f64) -> DecisionRule {
        let t = &self.thresholds;
        if moisture > t.adequate_moisture {
            DecisionRule::AdequateMoisture
        } else if rain_probability > t.high_rain_probability && rain_mm > t.significant_rain_mm {
            DecisionRule::RainCoverage
        } else if moisture < t.critical_moisture {
            DecisionRule::CriticalMoisture
        } else if moisture < t.adequate_moisture
            && (rain_probability < t.moderate_rain_probability || rain_mm < t.low_rain_mm)
        {
            DecisionRule::BelowIdealLowRain
        } else {
            DecisionRule::Monitor
        }
    }

    fn recommendation(
        &self,
        should_irrigate: bool,
        moisture: f64,
        rain_probability: f64,
        rain_mm: f64,
    ) -> String {
        let t = &self.thresholds;
        if should_irrigate {
            if rain_probability > t.moderate_rain_probability {
                format!("Irrigar com cautela. Chuva prevista: {rain_probability:.1}%")
            } else {
                "Irrigar. Condições favoráveis para aplicação.".to_string()
            }
        } else if rain_probability > t.high_rain_probability {
            format!("Não irrigar. Chuva prevista: {rain_probability:.1}% ({rain_mm:.1}mm)")
        } else if moisture > t.adequate_moisture {
            format!("Não irrigar. Umidade adequada: {moisture:.1}%")
        } else {
            "Aguardar. Monitorar condições.".to_string()
        }
    }

    /// Moisture tier, then rain probability tier, then rain volume.
    fn justification(&self, moisture: f64, rain_probability: f64, rain_mm: f64) -> String {
        let t = &self.thresholds;
        let mut clauses = Vec::with_capacity(3);

        clauses.push(if moisture < t.critical_moisture {
            format!("Umidade crítica ({moisture:.1}%) - risco de estresse hídrico")
        } else if moisture < t.adequate_moisture {
            format!("Umidade abaixo do ideal ({moisture:.1}%)")
        } else {
            format!("Umidade adequada ({moisture:.1}%)")
        });

        if rain_probability > t.high_rain_probability {
            clauses.push(format!("Alta probabilidade de chuva ({rain_probability:.1}%)"));
        } else if rain_probability > t.moderate_rain_probability {
            clauses.push(format!(
                "Probabilidade moderada de chuva ({rain_probability:.1}%)"
            ));
        }

        if rain_mm > t.significant_rain_mm {
            clauses.push(format!("Volume de chuva significativo ({rain_mm:.1}mm)"));
        }

        clauses.join(SEPARATOR)
    }
}

/// Decide with the default thresholds and irrigation time.
pub fn decide(moisture: f64, rain_probability: f64, rain_mm: f64) -> Decision {
    DecisionEngine::default().decide(moisture, rain_probability, rain_mm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Rule order
    // =========================================================================

    #[test]
    fn test_adequate_moisture_wins_over_everything() {
        let d = decide(35.0, 0.0, 0.0);
        assert_eq!(d.rule, DecisionRule::AdequateMoisture);
        assert!(!d.should_irrigate);
        assert_eq!(d.recommendation, "Não irrigar. Umidade adequada: 35.0%");
        assert_eq!(d.recommended_time, None);
    }

    #[test]
    fn test_boundary_at_thirty_is_monitor() {
        let d = decide(30.0, 0.0, 0.0);
        assert_eq!(d.rule, DecisionRule::Monitor);
        assert!(!d.should_irrigate);
        assert_eq!(d.recommendation, "Aguardar. Monitorar condições.");
        assert_eq!(d.justification, "Umidade adequada (30.0%)");
    }

    #[test]
    fn test_boundary_at_twenty_is_not_critical() {
        let d = decide(20.0, 10.0, 0.0);
        assert_eq!(d.rule, DecisionRule::BelowIdealLowRain);
        assert!(d.should_irrigate);
        assert_eq!(d.justification, "Umidade abaixo do ideal (20.0%)");
    }

    #[test]
    fn test_critical_moisture() {
        let d = decide(15.0, 10.0, 0.0);
        assert_eq!(d.rule, DecisionRule::CriticalMoisture);
        assert!(d.should_irrigate);
        assert_eq!(d.recommended_time.as_deref(), Some("03:00"));
        assert_eq!(d.recommendation, "Irrigar. Condições favoráveis para aplicação.");
        assert!(d.justification.contains("Umidade crítica (15.0%)"));
    }

    #[test]
    fn test_rain_covers_demand() {
        let d = decide(25.0, 80.0, 6.0);
        assert_eq!(d.rule, DecisionRule::RainCoverage);
        assert!(!d.should_irrigate);
        assert_eq!(d.recommendation, "Não irrigar. Chuva prevista: 80.0% (6.0mm)");
        assert_eq!(
            d.justification,
            "Umidade abaixo do ideal (25.0%) | Alta probabilidade de chuva (80.0%) | \
             Volume de chuva significativo (6.0mm)"
        );
    }

    #[test]
    fn test_rain_coverage_beats_critical_moisture() {
        assert_eq!(decide(12.0, 90.0, 10.0).rule, DecisionRule::RainCoverage);
    }

    #[test]
    fn test_below_ideal_with_low_rain() {
        let d = decide(25.0, 40.0, 1.0);
        assert_eq!(d.rule, DecisionRule::BelowIdealLowRain);
        assert!(d.should_irrigate);
    }

    #[test]
    fn test_below_ideal_with_likely_rain_is_monitor() {
        let d = decide(25.0, 60.0, 4.0);
        assert_eq!(d.rule, DecisionRule::Monitor);
        assert!(!d.should_irrigate);
        assert_eq!(
            d.justification,
            "Umidade abaixo do ideal (25.0%) | Probabilidade moderada de chuva (60.0%)"
        );
    }

    // =========================================================================
    // Texts
    // =========================================================================

    #[test]
    fn test_cautious_irrigation_text() {
        // Probability above 50 but volume below 3mm still irrigates.
        let d = decide(25.0, 65.0, 1.0);
        assert!(d.should_irrigate);
        assert_eq!(d.recommendation, "Irrigar com cautela. Chuva prevista: 65.0%");
    }

    #[test]
    fn test_high_probability_without_volume_mentions_rain() {
        let d = decide(31.0, 75.0, 2.0);
        assert_eq!(d.recommendation, "Não irrigar. Chuva prevista: 75.0% (2.0mm)");
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = DecisionEngine::new(
            DecisionThresholds {
                adequate_moisture: 40.0,
                ..Default::default()
            },
            "04:30",
        );
        let d = engine.decide(35.0, 10.0, 0.0);
        assert!(d.should_irrigate);
        assert_eq!(d.recommended_time.as_deref(), Some("04:30"));
    }
}
