//! Dataset-level helpers: crop filtering, summary and feature means.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DatasetConfig;
use crate::error::{Result, ResultExt};
use crate::utils::{is_numeric_dtype, to_float};

/// Date formats accepted for the summary period.
const PERIOD_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// First and last date covered by a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

/// Overview of a raw dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_rows: usize,
    /// Distinct crops in first-seen order.
    pub crops: Vec<String>,
    /// `None` when the date column is absent or empty.
    pub period: Option<Period>,
    pub columns: Vec<String>,
}

/// Keep the rows whose crop column equals `crop`.
///
/// Returns the table unchanged when the crop column does not exist.
pub fn filter_by_crop(df: &DataFrame, config: &DatasetConfig, crop: &str) -> Result<DataFrame> {
    if df.column(&config.crop_column).is_err() {
        debug!(
            "Crop column '{}' absent, skipping crop filter",
            config.crop_column
        );
        return Ok(df.clone());
    }

    let filtered = df
        .clone()
        .lazy()
        .filter(
            col(config.crop_column.as_str())
                .cast(DataType::String)
                .eq(lit(crop)),
        )
        .collect()
        .context(format!("Filtering rows for crop '{crop}'"))?;

    debug!("Crop filter '{}': {} -> {} rows", crop, df.height(), filtered.height());
    Ok(filtered)
}

/// Summarize row count, crops, covered period and columns.
pub fn summarize(df: &DataFrame, config: &DatasetConfig) -> Result<DatasetSummary> {
    let crops = match df.column(&config.crop_column) {
        Ok(column) => {
            let as_text = column.as_materialized_series().cast(&DataType::String)?;
            let mut seen: Vec<String> = Vec::new();
            for value in as_text.str()?.into_iter().flatten() {
                if !seen.iter().any(|s| s == value) {
                    seen.push(value.to_string());
                }
            }
            seen
        }
        Err(_) => Vec::new(),
    };

    let period = match df.column(&config.date_column) {
        Ok(column) => period_of(column.as_materialized_series())?,
        Err(_) => None,
    };

    Ok(DatasetSummary {
        total_rows: df.height(),
        crops,
        period,
        columns: df
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect(),
    })
}

/// Min and max of a date column.
///
/// Values that parse as calendar dates are compared chronologically and
/// rendered as `YYYY-MM-DD`; otherwise the raw text is compared.
fn period_of(series: &Series) -> Result<Option<Period>> {
    let as_text = series.cast(&DataType::String)?;
    let values: Vec<&str> = as_text.str()?.into_iter().flatten().collect();
    if values.is_empty() {
        return Ok(None);
    }

    let dates: Vec<NaiveDate> = values.iter().filter_map(|v| parse_date(v)).collect();
    if dates.len() == values.len() {
        let (Some(start), Some(end)) = (dates.iter().min(), dates.iter().max()) else {
            return Ok(None);
        };
        return Ok(Some(Period {
            start: start.format("%Y-%m-%d").to_string(),
            end: end.format("%Y-%m-%d").to_string(),
        }));
    }

    let start = values.iter().min().map(|s| s.to_string());
    let end = values.iter().max().map(|s| s.to_string());
    Ok(start.zip(end).map(|(start, end)| Period { start, end }))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    // Datetime text: keep the date part.
    let date_part = value.split([' ', 'T']).next().unwrap_or(value);
    PERIOD_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Mean of each requested numeric column.
///
/// Missing, non-numeric and all-null columns are skipped.
pub fn column_means<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<BTreeMap<String, f64>> {
    let mut means = BTreeMap::new();
    for name in columns {
        let name = name.as_ref();
        let Ok(column) = df.column(name) else {
            continue;
        };
        let series = column.as_materialized_series();
        if !is_numeric_dtype(series.dtype()) {
            continue;
        }
        let values = to_float(series)?;
        if let Some(mean) = values.mean() {
            means.insert(name.to_string(), mean);
        }
    }
    Ok(means)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame() -> DataFrame {
        df!(
            "Data" => &["15/03/2024", "01/02/2024", "20/01/2024"],
            "Cultura" => &["SOJA", "MILHO", "SOJA"],
            "Temperatura" => &[24.0, 26.0, 28.0],
            "PH" => &[Some(6.0), None, Some(7.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_by_crop() {
        let config = DatasetConfig::default();
        let filtered = filter_by_crop(&frame(), &config, "SOJA").unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_filter_by_crop_absent_column() {
        let df = frame().drop("Cultura").unwrap();
        let filtered = filter_by_crop(&df, &DatasetConfig::default(), "SOJA").unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&frame(), &DatasetConfig::default()).unwrap();
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.crops, vec!["SOJA", "MILHO"]);
        assert_eq!(
            summary.period,
            Some(Period {
                start: "2024-01-20".to_string(),
                end: "2024-03-15".to_string(),
            })
        );
        assert_eq!(summary.columns.len(), 4);
    }

    #[test]
    fn test_summarize_without_date_column() {
        let df = frame().drop("Data").unwrap();
        let summary = summarize(&df, &DatasetConfig::default()).unwrap();
        assert!(summary.period.is_none());
    }

    #[test]
    fn test_column_means() {
        let means = column_means(&frame(), &["Temperatura", "PH", "Cultura", "Nope"]).unwrap();
        assert_eq!(means.len(), 2);
        assert_eq!(means["Temperatura"], 26.0);
        assert_eq!(means["PH"], 6.5);
    }
}
