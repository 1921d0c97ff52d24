//! Feature preparation: raw sensor table to numeric `(X, y)`.
//!
//! The pipeline is:
//!
//! 1. drop identifier, timestamp and status columns (plus the relay state
//!    for regression)
//! 2. one-hot encode crop and phenological stage
//! 3. split off the target column
//! 4. coerce the remaining columns to `Float64`, dropping date-like and
//!    non-numeric ones
//! 5. drop rows with a null or NaN in any feature or in the target
//!
//! One-hot columns only exist for categories observed in the input, so two
//! datasets can yield different feature sets. Consumers must align features
//! by name.

mod coercion;
mod encoding;

pub use coercion::{DropReason, coerce_features};
pub use encoding::{categories, one_hot};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{DatasetConfig, Task};
use crate::error::{ProcessingError, Result, ResultExt};
use crate::utils::{finite_mask, to_float};

/// Numeric features and target ready for training.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    /// All-`Float64` feature matrix, columns in `feature_names` order.
    pub features: DataFrame,
    /// `Float64` target aligned row-for-row with `features`.
    pub target: Series,
    pub feature_names: Vec<String>,
    pub report: PreparationReport,
}

impl PreparedDataset {
    /// Number of usable rows.
    pub fn n_rows(&self) -> usize {
        self.features.height()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Target values as a plain vector.
    pub fn target_values(&self) -> Result<Vec<f64>> {
        Ok(self.target.f64()?.into_no_null_iter().collect())
    }

    /// Feature matrix as row-major `f64` values.
    pub fn feature_rows(&self) -> Result<Vec<Vec<f64>>> {
        let columns: Vec<Vec<f64>> = self
            .features
            .get_columns()
            .iter()
            .map(|c| Ok(c.f64()?.into_no_null_iter().collect()))
            .collect::<Result<_>>()?;

        Ok((0..self.n_rows())
            .map(|row| columns.iter().map(|col| col[row]).collect())
            .collect())
    }
}

/// What preparation removed, for logging and reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparationReport {
    pub task: Option<Task>,
    pub input_rows: usize,
    pub rows_dropped: usize,
    pub columns_removed: Vec<String>,
    pub encoded_columns: Vec<String>,
}

/// Turns a raw dataset into a numeric feature matrix and target vector.
#[derive(Debug, Clone, Default)]
pub struct FeaturePreprocessor {
    config: DatasetConfig,
}

impl FeaturePreprocessor {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Prepare `df` for `task`.
    ///
    /// # Errors
    ///
    /// - [`ProcessingError::MissingTargetColumn`] if the task's target is absent
    /// - [`ProcessingError::EmptyDataset`] if no row survives missing-value filtering
    pub fn prepare(&self, df: &DataFrame, task: Task) -> Result<PreparedDataset> {
        let target = self.config.target_for(task);
        let mut report = PreparationReport {
            task: Some(task),
            input_rows: df.height(),
            ..Default::default()
        };

        let mut table = df.clone();
        for column in self.config.columns_to_drop(task) {
            if table.column(column).is_ok() {
                table = table.drop(column)?;
                report.columns_removed.push(column.to_string());
            }
        }

        let (table, crop_columns) =
            one_hot(&table, &self.config.crop_column, &self.config.crop_prefix)
                .context("Encoding crop column")?;
        let (table, stage_columns) =
            one_hot(&table, &self.config.stage_column, &self.config.stage_prefix)
                .context("Encoding stage column")?;
        report.encoded_columns.extend(crop_columns);
        report.encoded_columns.extend(stage_columns);

        let target_series = table
            .column(target)
            .map_err(|_| ProcessingError::MissingTargetColumn(target.to_string()))?
            .as_materialized_series()
            .clone();
        let target_series = to_float(&target_series).context("Converting target to numeric")?;

        let (features, dropped) = coerce_features(&table.drop(target)?)?;
        report
            .columns_removed
            .extend(dropped.into_iter().map(|(name, _)| name));

        let mut keep = finite_mask(&target_series)?;
        for column in features.get_columns() {
            let valid = finite_mask(column.as_materialized_series())?;
            for (k, v) in keep.iter_mut().zip(valid) {
                *k = *k && v;
            }
        }
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let features = features.filter(&mask)?;
        let target_series = target_series.filter(&mask)?;

        report.rows_dropped = report.input_rows - features.height();
        if report.rows_dropped > 0 {
            debug!("Dropped {} rows with missing values", report.rows_dropped);
        }
        if features.height() == 0 {
            return Err(ProcessingError::EmptyDataset);
        }

        let feature_names: Vec<String> = features
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();

        info!(
            "Prepared {} dataset: {} rows, {} features (target '{}')",
            task,
            features.height(),
            feature_names.len(),
            target
        );

        Ok(PreparedDataset {
            features,
            target: target_series,
            feature_names,
            report,
        })
    }
}
