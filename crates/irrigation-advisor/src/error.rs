//! Error types for weather forecast providers.
//!
//! Forecast errors stop at the schedule boundary: [`crate::ScheduleGenerator`]
//! logs them and returns an empty schedule.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// Failure of a forecast provider.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// The location name was blank.
    #[error("Unknown location '{0}'")]
    UnknownLocation(String),

    /// Transport-level failure, including timeouts.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Forecast service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The payload could not be turned into daily rows.
    #[error("Malformed forecast response: {0}")]
    MalformedResponse(String),

    /// The provider produced no rows.
    #[error("Forecast returned no data")]
    Empty,
}

impl ForecastError {
    /// Get a stable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownLocation(_) => "UNKNOWN_LOCATION",
            #[cfg(feature = "http")]
            Self::Http(_) => "HTTP_ERROR",
            Self::Status { .. } => "FORECAST_STATUS",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Self::Empty => "EMPTY_FORECAST",
        }
    }

    /// Whether asking again later may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            #[cfg(feature = "http")]
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Empty => true,
            Self::UnknownLocation(_) | Self::MalformedResponse(_) => false,
        }
    }
}

impl Serialize for ForecastError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ForecastError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(ForecastError::Empty.error_code(), "EMPTY_FORECAST");
        assert_eq!(
            ForecastError::UnknownLocation(String::new()).error_code(),
            "UNKNOWN_LOCATION"
        );
    }

    #[test]
    fn test_server_errors_are_recoverable() {
        let unavailable = ForecastError::Status {
            status: 503,
            body: String::new(),
        };
        let bad_request = ForecastError::Status {
            status: 400,
            body: "invalid latitude".to_string(),
        };
        assert!(unavailable.is_recoverable());
        assert!(!bad_request.is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&ForecastError::MalformedResponse("no hourly".into()))
            .unwrap();
        assert!(json.contains("MALFORMED_RESPONSE"));
        assert!(json.contains("no hourly"));
    }
}
