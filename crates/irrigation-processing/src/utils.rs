//! Shared helpers for dtype checks and value parsing.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date, datetime or time.
#[inline]
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Check if a DataType holds text.
#[inline]
pub fn is_text_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Check whether a text value parses as a date, datetime or time of day.
///
/// Used to recognise timestamp columns that survived the explicit drop list.
pub fn looks_like_date(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
        || TIME_FORMATS
            .iter()
            .any(|fmt| NaiveTime::parse_from_str(value, fmt).is_ok())
}

/// Parse a text cell as `f64`, trimming surrounding whitespace.
///
/// Anything that is not a plain number yields `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

// =============================================================================
// Series Utilities
// =============================================================================

/// First non-null value of a text Series.
pub fn first_text_value(series: &Series) -> Option<String> {
    let chunked = series.str().ok()?;
    chunked.into_iter().flatten().next().map(str::to_string)
}

/// Convert a text Series to `Float64`, turning unparseable cells into nulls.
pub fn text_to_float(series: &Series) -> PolarsResult<Series> {
    let chunked = series.str()?;
    let values: Vec<Option<f64>> = chunked
        .into_iter()
        .map(|opt| opt.and_then(parse_number))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Convert any Series to `Float64`: text is parsed, everything else is cast.
pub fn to_float(series: &Series) -> PolarsResult<Series> {
    if is_text_dtype(series.dtype()) {
        let as_text = series.cast(&DataType::String)?;
        text_to_float(&as_text)
    } else {
        series.cast(&DataType::Float64)
    }
}

/// Per-row validity of a `Float64` Series: false for null or NaN.
pub fn finite_mask(series: &Series) -> PolarsResult<Vec<bool>> {
    let floats = series.f64()?;
    Ok(floats
        .into_iter()
        .map(|opt| opt.is_some_and(|v| !v.is_nan()))
        .collect())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_temporal_dtype() {
        assert!(is_temporal_dtype(&DataType::Date));
        assert!(is_temporal_dtype(&DataType::Datetime(
            TimeUnit::Milliseconds,
            None
        )));
        assert!(!is_temporal_dtype(&DataType::String));
    }

    #[test]
    fn test_looks_like_date() {
        assert!(looks_like_date("2024-03-15"));
        assert!(looks_like_date("15/03/2024"));
        assert!(looks_like_date("2024-03-15 08:30:00"));
        assert!(looks_like_date("08:30"));
        assert!(!looks_like_date("SOJA"));
        assert!(!looks_like_date("6.5"));
        assert!(!looks_like_date(""));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_text_to_float_nulls_invalid_cells() {
        let series = Series::new("v".into(), &[Some("1.5"), Some("x"), None]);
        let result = text_to_float(&series).unwrap();
        let values: Vec<Option<f64>> = result.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.5), None, None]);
    }

    #[test]
    fn test_finite_mask() {
        let series = Series::new("v".into(), &[Some(1.0), Some(f64::NAN), None]);
        assert_eq!(finite_mask(&series).unwrap(), vec![true, false, false]);
    }
}
