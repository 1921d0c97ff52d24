//! Type coercion of feature columns to `Float64`.

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::utils::{first_text_value, is_numeric_dtype, is_temporal_dtype, is_text_dtype, looks_like_date, to_float};

/// Why a column was removed from the feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Native date/time dtype, or text whose first value parses as one.
    Temporal,
    /// Text where no cell parsed as a number.
    NotNumeric,
    /// Boolean, list or any other non-numeric dtype.
    UnsupportedType,
}

/// Outcome of coercing a single column.
pub(crate) enum Coerced {
    Keep(Series),
    Drop(DropReason),
}

/// Coerce one column to `Float64`, or decide to drop it.
///
/// Text columns are checked for dates on their first non-null value, then
/// parsed cell by cell; unparseable cells become null and are removed later
/// with the rest of the row.
pub(crate) fn coerce_column(series: &Series) -> Result<Coerced> {
    let dtype = series.dtype();

    if is_temporal_dtype(dtype) {
        return Ok(Coerced::Drop(DropReason::Temporal));
    }

    if is_numeric_dtype(dtype) {
        return Ok(Coerced::Keep(series.cast(&DataType::Float64)?));
    }

    if is_text_dtype(dtype) {
        let as_text = series.cast(&DataType::String)?;
        if first_text_value(&as_text).is_some_and(|v| looks_like_date(&v)) {
            return Ok(Coerced::Drop(DropReason::Temporal));
        }

        let parsed = to_float(&as_text)?;
        if parsed.null_count() == parsed.len() && !parsed.is_empty() {
            return Ok(Coerced::Drop(DropReason::NotNumeric));
        }
        return Ok(Coerced::Keep(parsed));
    }

    Ok(Coerced::Drop(DropReason::UnsupportedType))
}

/// Coerce every column of `df`, returning the numeric frame and the dropped
/// column names with their reason.
pub fn coerce_features(df: &DataFrame) -> Result<(DataFrame, Vec<(String, DropReason)>)> {
    let mut kept = Vec::with_capacity(df.width());
    let mut dropped = Vec::new();

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        match coerce_column(series)? {
            Coerced::Keep(values) => kept.push(values.into_column()),
            Coerced::Drop(reason) => {
                debug!("Dropping feature column '{}' ({:?})", series.name(), reason);
                dropped.push((series.name().to_string(), reason));
            }
        }
    }

    Ok((DataFrame::new(kept)?, dropped))
}
